use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use signoff_core::domain::batch::BatchId;
use signoff_core::domain::ingestion::{
    FileError, FileId, FileKind, FileUpload, PortfolioFiles, PortfolioId,
};
use signoff_core::domain::Ack;
use signoff_core::errors::ClientError;
use signoff_core::monitor::IngestionService;

use crate::http::{ApiBase, ApiConnection};

/// HTTP implementation of the file-ingestion seam against the
/// monthly-process API.
#[derive(Clone)]
pub struct HttpIngestionService {
    conn: ApiConnection,
}

impl HttpIngestionService {
    pub fn new(conn: ApiConnection) -> Self {
        Self { conn }
    }

    fn file_path(batch_id: &BatchId, file_id: &FileId, action: &str) -> String {
        format!("v1/report-batches/{}/files/{}/{action}", batch_id.0, file_id.0)
    }
}

#[async_trait]
impl IngestionService for HttpIngestionService {
    async fn portfolio_files(
        &self,
        batch_id: &BatchId,
    ) -> Result<Vec<PortfolioFiles>, ClientError> {
        let path = format!("v1/report-batches/{}/portfolio-files", batch_id.0);
        self.conn.get_json(ApiBase::Monthly, &path, &[]).await
    }

    async fn upload(
        &self,
        batch_id: &BatchId,
        portfolio_id: &PortfolioId,
        kind: FileKind,
        upload: FileUpload,
    ) -> Result<Ack, ClientError> {
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|_| {
                ClientError::Validation(format!(
                    "invalid content type `{}` for upload",
                    upload.content_type
                ))
            })?;
        let form = Form::new().part("file", part).text("fileName", upload.file_name);

        let path = format!(
            "v1/report-batches/{}/portfolios/{}/files/{}/upload",
            batch_id.0,
            portfolio_id.0,
            kind.as_path_segment()
        );
        self.conn.post_multipart(ApiBase::Monthly, &path, form).await
    }

    async fn reimport(&self, batch_id: &BatchId, file_id: &FileId) -> Result<Ack, ClientError> {
        self.conn
            .post_empty(ApiBase::Monthly, &Self::file_path(batch_id, file_id, "reimport"))
            .await
    }

    async fn cancel(&self, batch_id: &BatchId, file_id: &FileId) -> Result<Ack, ClientError> {
        self.conn
            .post_empty(ApiBase::Monthly, &Self::file_path(batch_id, file_id, "cancel"))
            .await
    }

    async fn file_errors(
        &self,
        batch_id: &BatchId,
        file_id: &FileId,
    ) -> Result<Vec<FileError>, ClientError> {
        self.conn
            .get_json(ApiBase::Monthly, &Self::file_path(batch_id, file_id, "errors"), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use signoff_core::domain::batch::BatchId;
    use signoff_core::domain::ingestion::FileId;

    use super::HttpIngestionService;

    #[test]
    fn file_action_paths_match_the_backend_routes() {
        let batch = BatchId("batch-42".to_owned());
        let file = FileId("f-7".to_owned());
        assert_eq!(
            HttpIngestionService::file_path(&batch, &file, "cancel"),
            "v1/report-batches/batch-42/files/f-7/cancel"
        );
        assert_eq!(
            HttpIngestionService::file_path(&batch, &file, "errors"),
            "v1/report-batches/batch-42/files/f-7/errors"
        );
    }
}
