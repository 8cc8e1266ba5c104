use thiserror::Error;

use crate::domain::approval::ApprovalLevel;

/// Failure taxonomy for every backend interaction. Errors are converted to
/// user-facing output at the command boundary; none propagate past it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("api error ({status}): {}", first_or_default(.messages))]
    Api { status: u16, messages: Vec<String> },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("access denied for this approval level")]
    AccessDenied,
    #[error("{level} must be approved first")]
    PrerequisiteNotMet { level: ApprovalLevel },
    #[error("response decode failed: {0}")]
    Decode(String),
}

fn first_or_default(messages: &[String]) -> &str {
    messages.first().map(String::as_str).unwrap_or("unknown error")
}

impl ClientError {
    pub fn api(status: u16, messages: Vec<String>) -> Self {
        Self::Api { status, messages }
    }

    /// The message shown to the operator. `Api` surfaces the backend's
    /// first message verbatim; everything else maps to a fixed string.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "The service could not be reached. Please try again later.".to_owned()
            }
            Self::Api { messages, .. } => first_or_default(messages).to_owned(),
            Self::Validation(message) => message.clone(),
            Self::AccessDenied => {
                "You do not have permission to view this approval level.".to_owned()
            }
            Self::PrerequisiteNotMet { level } => {
                format!("{level} must be approved before this action is available.")
            }
            Self::Decode(_) => "The service returned an unexpected response.".to_owned(),
        }
    }

    /// Initial-load failures that should render as a dedicated view rather
    /// than a banner.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied)
    }
}
