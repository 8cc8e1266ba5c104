pub mod approval;
pub mod batch;
pub mod form;
pub mod ingestion;
pub mod instrument;
pub mod logs;
pub mod market;
pub mod page;

use serde::{Deserialize, Serialize};

/// Common mutation acknowledgement: `{ success, message? }`. Several
/// endpoints return this shape; a `success: false` body is a failure even
/// on HTTP 200.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true, message: None }
    }
}
