use signoff_core::domain::instrument::{Instrument, InstrumentDraft};
use signoff_core::domain::logs::ExportFile;
use signoff_core::domain::page::{Page, PageRequest};
use signoff_core::errors::ClientError;

use crate::http::{ApiBase, ApiConnection};

const INSTRUMENTS: &str = "v1/instruments";

/// CRUD + export client for instrument static data.
#[derive(Clone)]
pub struct InstrumentClient {
    conn: ApiConnection,
}

impl InstrumentClient {
    pub fn new(conn: ApiConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, request: &PageRequest) -> Result<Page<Instrument>, ClientError> {
        self.conn.get_json(ApiBase::General, INSTRUMENTS, &request.to_query_pairs()).await
    }

    pub async fn get(&self, id: &str) -> Result<Instrument, ClientError> {
        self.conn.get_json(ApiBase::General, &format!("{INSTRUMENTS}/{id}"), &[]).await
    }

    pub async fn create(&self, draft: &InstrumentDraft) -> Result<Instrument, ClientError> {
        self.conn.post_json(ApiBase::General, INSTRUMENTS, draft).await
    }

    pub async fn update(
        &self,
        id: &str,
        draft: &InstrumentDraft,
    ) -> Result<Instrument, ClientError> {
        self.conn.put_json(ApiBase::General, &format!("{INSTRUMENTS}/{id}"), draft).await
    }

    pub async fn export(&self) -> Result<ExportFile, ClientError> {
        self.conn
            .get_export(ApiBase::General, &format!("{INSTRUMENTS}/export"), &[], "instruments")
            .await
    }
}
