use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub refresh: RefreshConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// General back-office API.
    pub base_url: String,
    /// Monthly-process API (file ingestion, batch lifecycle).
    pub monthly_base_url: String,
    pub token: SecretString,
    pub timeout_secs: u64,
    /// Operator identity recorded in the local audit sink.
    pub operator: String,
}

#[derive(Clone, Debug)]
pub struct RefreshConfig {
    pub interval_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub monthly_base_url: Option<String>,
    pub token: Option<String>,
    pub operator: Option<String>,
    pub session_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://reporting.internal/api".to_string(),
                monthly_base_url: "https://reporting.internal/monthly-api".to_string(),
                token: String::new().into(),
                timeout_secs: 30,
                operator: whoami_fallback(),
            },
            refresh: RefreshConfig { interval_secs: 30 },
            session: SessionConfig { path: PathBuf::from(".signoff-session.toml") },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn whoami_fallback() -> String {
    env::var("USER").ok().filter(|value| !value.trim().is_empty()).unwrap_or_else(|| "signoff-operator".to_string())
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("signoff.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api) = patch.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(monthly_base_url) = api.monthly_base_url {
                self.api.monthly_base_url = monthly_base_url;
            }
            if let Some(token_value) = api.token {
                self.api.token = token_value.into();
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.api.timeout_secs = timeout_secs;
            }
            if let Some(operator) = api.operator {
                self.api.operator = operator;
            }
        }

        if let Some(refresh) = patch.refresh {
            if let Some(interval_secs) = refresh.interval_secs {
                self.refresh.interval_secs = interval_secs;
            }
        }

        if let Some(session) = patch.session {
            if let Some(path) = session.path {
                self.session.path = PathBuf::from(path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SIGNOFF_API_BASE_URL") {
            self.api.base_url = value;
        }
        if let Some(value) = read_env("SIGNOFF_API_MONTHLY_BASE_URL") {
            self.api.monthly_base_url = value;
        }
        if let Some(value) = read_env("SIGNOFF_API_TOKEN") {
            self.api.token = value.into();
        }
        if let Some(value) = read_env("SIGNOFF_API_TIMEOUT_SECS") {
            self.api.timeout_secs = parse_u64("SIGNOFF_API_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SIGNOFF_OPERATOR") {
            self.api.operator = value;
        }

        if let Some(value) = read_env("SIGNOFF_REFRESH_INTERVAL_SECS") {
            self.refresh.interval_secs = parse_u64("SIGNOFF_REFRESH_INTERVAL_SECS", &value)?;
        }

        if let Some(value) = read_env("SIGNOFF_SESSION_PATH") {
            self.session.path = PathBuf::from(value);
        }

        let log_level = read_env("SIGNOFF_LOGGING_LEVEL").or_else(|| read_env("SIGNOFF_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SIGNOFF_LOGGING_FORMAT").or_else(|| read_env("SIGNOFF_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.api.base_url = base_url;
        }
        if let Some(monthly_base_url) = overrides.monthly_base_url {
            self.api.monthly_base_url = monthly_base_url;
        }
        if let Some(token_value) = overrides.token {
            self.api.token = token_value.into();
        }
        if let Some(operator) = overrides.operator {
            self.api.operator = operator;
        }
        if let Some(session_path) = overrides.session_path {
            self.session.path = session_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api(&self.api)?;
        validate_refresh(&self.refresh)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("signoff.toml"), PathBuf::from("config/signoff.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    for (name, url) in [("api.base_url", &api.base_url), ("api.monthly_base_url", &api.monthly_base_url)] {
        let url = url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "{name} must start with http:// or https://"
            )));
        }
    }

    if api.token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "api.token is required. Request a back-office service token from operations"
                .to_string(),
        ));
    }

    if api.timeout_secs == 0 || api.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "api.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if api.operator.trim().is_empty() {
        return Err(ConfigError::Validation("api.operator must not be empty".to_string()));
    }

    Ok(())
}

fn validate_refresh(refresh: &RefreshConfig) -> Result<(), ConfigError> {
    if refresh.interval_secs < 5 || refresh.interval_secs > 600 {
        return Err(ConfigError::Validation(
            "refresh.interval_secs must be in range 5..=600".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    refresh: Option<RefreshPatch>,
    session: Option<SessionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    base_url: Option<String>,
    monthly_base_url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
    operator: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RefreshPatch {
    interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
