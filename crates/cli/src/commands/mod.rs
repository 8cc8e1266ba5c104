pub mod approvals;
pub mod batches;
pub mod config;
pub mod doctor;
pub mod files;
pub mod instruments;
pub mod logs;
pub mod market;

use serde::Serialize;

use signoff_core::errors::ClientError;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    /// Plain rendered output for listings and detail views.
    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Backend failures keep their taxonomy class and surface the
    /// user-facing message.
    pub fn client_failure(command: &str, error: &ClientError) -> Self {
        Self::failure(command, error_class(error), error.user_message(), 1)
    }
}

fn error_class(error: &ClientError) -> &'static str {
    match error {
        ClientError::Network(_) => "network",
        ClientError::Api { .. } => "api",
        ClientError::Validation(_) => "validation",
        ClientError::AccessDenied => "access_denied",
        ClientError::PrerequisiteNotMet { .. } => "prerequisite_not_met",
        ClientError::Decode(_) => "decode",
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[cfg(test)]
mod tests {
    use signoff_core::errors::ClientError;

    use super::CommandResult;

    #[test]
    fn client_failures_carry_class_and_user_message() {
        let result = CommandResult::client_failure(
            "approvals.approve",
            &ClientError::Network("timeout".to_owned()),
        );
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("\"error_class\":\"network\""));
        assert!(result.output.contains("try again later"));
    }
}
