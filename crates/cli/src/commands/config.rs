use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;

use signoff_core::config::{AppConfig, LoadOptions};

use crate::commands::CommandResult;

pub fn run(explicit_path: Option<&Path>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        config_path: explicit_path.map(Path::to_path_buf),
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("config", "config", format!("config validation failed: {error}"), 2)
        }
    };

    let config_file_path = explicit_path.map(Path::to_path_buf).or_else(detect_config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let mut push = |key: &str, value: &str, env_key: &str| {
        lines.push(render_line(
            key,
            value,
            field_source(key, Some(env_key), config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    };

    push("api.base_url", &config.api.base_url, "SIGNOFF_API_BASE_URL");
    push("api.monthly_base_url", &config.api.monthly_base_url, "SIGNOFF_API_MONTHLY_BASE_URL");
    push(
        "api.token",
        &redact_token(config.api.token.expose_secret()),
        "SIGNOFF_API_TOKEN",
    );
    push("api.timeout_secs", &config.api.timeout_secs.to_string(), "SIGNOFF_API_TIMEOUT_SECS");
    push("api.operator", &config.api.operator, "SIGNOFF_OPERATOR");
    push(
        "refresh.interval_secs",
        &config.refresh.interval_secs.to_string(),
        "SIGNOFF_REFRESH_INTERVAL_SECS",
    );
    push(
        "session.path",
        &config.session.path.display().to_string(),
        "SIGNOFF_SESSION_PATH",
    );
    push("logging.level", &config.logging.level, "SIGNOFF_LOGGING_LEVEL");
    push("logging.format", &format!("{:?}", config.logging.format), "SIGNOFF_LOGGING_FORMAT");

    CommandResult::text(lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("signoff.toml"), PathBuf::from("config/signoff.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::redact_token;

    #[test]
    fn tokens_render_only_their_prefix() {
        assert_eq!(redact_token("svc-abcdef123456"), "svc-***");
        assert_eq!(redact_token("opaquetoken"), "<redacted>");
        assert_eq!(redact_token("  "), "<empty>");
    }
}
