pub mod approvals;
pub mod batches;
pub mod files;
pub mod http;
pub mod instruments;
pub mod logs;
pub mod market;

pub use approvals::HttpApprovalService;
pub use batches::BatchClient;
pub use files::HttpIngestionService;
pub use http::{ApiBase, ApiConnection};
pub use instruments::InstrumentClient;
pub use logs::LogClient;
pub use market::MarketDataClient;
