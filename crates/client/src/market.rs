use serde::de::DeserializeOwned;
use serde::Serialize;

use signoff_core::domain::logs::ExportFile;
use signoff_core::domain::market::{
    IndexBeta, IndexBetaDraft, IndexDuration, IndexDurationDraft, IndexPrice, IndexPriceDraft,
};
use signoff_core::domain::page::{Page, PageRequest};
use signoff_core::errors::ClientError;

use crate::http::{ApiBase, ApiConnection};

const INDEX_PRICES: &str = "v1/market-data/index-prices";
const DURATIONS: &str = "v1/market-data/durations";
const BETAS: &str = "v1/market-data/betas";

/// CRUD + export client for the three independent market-data resources.
#[derive(Clone)]
pub struct MarketDataClient {
    conn: ApiConnection,
}

impl MarketDataClient {
    pub fn new(conn: ApiConnection) -> Self {
        Self { conn }
    }

    pub async fn list_index_prices(
        &self,
        request: &PageRequest,
    ) -> Result<Page<IndexPrice>, ClientError> {
        self.list(INDEX_PRICES, request).await
    }

    pub async fn get_index_price(&self, id: &str) -> Result<IndexPrice, ClientError> {
        self.get(INDEX_PRICES, id).await
    }

    pub async fn create_index_price(
        &self,
        draft: &IndexPriceDraft,
    ) -> Result<IndexPrice, ClientError> {
        self.create(INDEX_PRICES, draft).await
    }

    pub async fn update_index_price(
        &self,
        id: &str,
        draft: &IndexPriceDraft,
    ) -> Result<IndexPrice, ClientError> {
        self.update(INDEX_PRICES, id, draft).await
    }

    pub async fn export_index_prices(&self) -> Result<ExportFile, ClientError> {
        self.export(INDEX_PRICES, "index-prices").await
    }

    pub async fn list_durations(
        &self,
        request: &PageRequest,
    ) -> Result<Page<IndexDuration>, ClientError> {
        self.list(DURATIONS, request).await
    }

    pub async fn get_duration(&self, id: &str) -> Result<IndexDuration, ClientError> {
        self.get(DURATIONS, id).await
    }

    pub async fn create_duration(
        &self,
        draft: &IndexDurationDraft,
    ) -> Result<IndexDuration, ClientError> {
        self.create(DURATIONS, draft).await
    }

    pub async fn update_duration(
        &self,
        id: &str,
        draft: &IndexDurationDraft,
    ) -> Result<IndexDuration, ClientError> {
        self.update(DURATIONS, id, draft).await
    }

    pub async fn export_durations(&self) -> Result<ExportFile, ClientError> {
        self.export(DURATIONS, "durations").await
    }

    pub async fn list_betas(&self, request: &PageRequest) -> Result<Page<IndexBeta>, ClientError> {
        self.list(BETAS, request).await
    }

    pub async fn get_beta(&self, id: &str) -> Result<IndexBeta, ClientError> {
        self.get(BETAS, id).await
    }

    pub async fn create_beta(&self, draft: &IndexBetaDraft) -> Result<IndexBeta, ClientError> {
        self.create(BETAS, draft).await
    }

    pub async fn update_beta(
        &self,
        id: &str,
        draft: &IndexBetaDraft,
    ) -> Result<IndexBeta, ClientError> {
        self.update(BETAS, id, draft).await
    }

    pub async fn export_betas(&self) -> Result<ExportFile, ClientError> {
        self.export(BETAS, "betas").await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        request: &PageRequest,
    ) -> Result<Page<T>, ClientError> {
        self.conn.get_json(ApiBase::General, resource, &request.to_query_pairs()).await
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, id: &str) -> Result<T, ClientError> {
        self.conn.get_json(ApiBase::General, &format!("{resource}/{id}"), &[]).await
    }

    async fn create<B: Serialize, T: DeserializeOwned>(
        &self,
        resource: &str,
        draft: &B,
    ) -> Result<T, ClientError> {
        self.conn.post_json(ApiBase::General, resource, draft).await
    }

    async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        resource: &str,
        id: &str,
        draft: &B,
    ) -> Result<T, ClientError> {
        self.conn.put_json(ApiBase::General, &format!("{resource}/{id}"), draft).await
    }

    async fn export(&self, resource: &str, stem: &str) -> Result<ExportFile, ClientError> {
        self.conn.get_export(ApiBase::General, &format!("{resource}/export"), &[], stem).await
    }
}
