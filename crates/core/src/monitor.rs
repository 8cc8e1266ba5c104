use async_trait::async_trait;
use thiserror::Error;

use crate::domain::batch::BatchId;
use crate::domain::ingestion::{
    any_processing, ingestion_complete, FileError, FileId, FileKind, FileStatus, FileUpload,
    PortfolioFiles, PortfolioId,
};
use crate::domain::Ack;
use crate::errors::ClientError;
use crate::refresh::{RefreshTimer, RefreshTimerState};

/// Backend seam for the per-portfolio file grid and its import actions.
#[async_trait]
pub trait IngestionService: Send + Sync {
    async fn portfolio_files(&self, batch_id: &BatchId)
        -> Result<Vec<PortfolioFiles>, ClientError>;

    async fn upload(
        &self,
        batch_id: &BatchId,
        portfolio_id: &PortfolioId,
        kind: FileKind,
        upload: FileUpload,
    ) -> Result<Ack, ClientError>;

    async fn reimport(&self, batch_id: &BatchId, file_id: &FileId) -> Result<Ack, ClientError>;

    /// Server-side cancellation of an in-flight import; a distinct API
    /// call, not an abort of the HTTP request.
    async fn cancel(&self, batch_id: &BatchId, file_id: &FileId) -> Result<Ack, ClientError>;

    async fn file_errors(
        &self,
        batch_id: &BatchId,
        file_id: &FileId,
    ) -> Result<Vec<FileError>, ClientError>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("file grid has not been loaded")]
    NotLoaded,
    #[error("file `{file_id}` is {status:?}; only a processing import can be canceled")]
    NotProcessing { file_id: FileId, status: FileStatus },
    #[error("file `{file_id}` is not present in the grid")]
    UnknownFile { file_id: FileId },
    #[error(transparent)]
    Service(#[from] ClientError),
}

/// Result of one auto-refresh tick. Refresh failures after a successful
/// initial load are non-fatal: the last good grid is preserved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    /// Timer state did not permit a tick.
    Skipped,
    Failed { consecutive_failures: u32, disabled: bool },
}

/// Tracks the per-portfolio/per-file-type import grid for one batch and
/// drives the bounded auto-refresh policy.
pub struct FileStatusMonitor<S> {
    service: S,
    batch_id: BatchId,
    timer: RefreshTimer,
    grid: Vec<PortfolioFiles>,
    loaded: bool,
}

impl<S> FileStatusMonitor<S>
where
    S: IngestionService,
{
    pub fn new(service: S, batch_id: BatchId, timer: RefreshTimer) -> Self {
        Self { service, batch_id, timer, grid: Vec::new(), loaded: false }
    }

    pub fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    pub fn grid(&self) -> &[PortfolioFiles] {
        &self.grid
    }

    pub fn timer(&self) -> &RefreshTimer {
        &self.timer
    }

    pub fn pause(&mut self) {
        self.timer.stop();
    }

    pub fn resume(&mut self) {
        self.timer.start();
    }

    pub fn reset_refresh(&mut self) {
        self.timer.reset();
    }

    pub fn any_processing(&self) -> bool {
        any_processing(&self.grid)
    }

    pub fn ingestion_complete(&self) -> bool {
        self.loaded && ingestion_complete(&self.grid)
    }

    /// Initial (or manual) load. Failure here is fatal to the view: the
    /// caller renders an error state with a retry action.
    pub async fn load(&mut self) -> Result<&[PortfolioFiles], ClientError> {
        let grid = self.service.portfolio_files(&self.batch_id).await?;
        self.grid = grid;
        self.loaded = true;
        self.timer.tick_success();
        Ok(&self.grid)
    }

    /// One auto-refresh tick. Skipped unless the timer is running and a
    /// file is still processing; failures count toward the shutoff.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        if !self.loaded || !self.timer.should_tick() || !self.any_processing() {
            return RefreshOutcome::Skipped;
        }

        match self.service.portfolio_files(&self.batch_id).await {
            Ok(grid) => {
                self.grid = grid;
                self.timer.tick_success();
                RefreshOutcome::Updated
            }
            Err(_) => {
                let state = self.timer.tick_failure();
                RefreshOutcome::Failed {
                    consecutive_failures: self.timer.consecutive_failures(),
                    disabled: state == RefreshTimerState::Disabled,
                }
            }
        }
    }

    pub async fn upload(
        &mut self,
        portfolio_id: &PortfolioId,
        kind: FileKind,
        upload: FileUpload,
    ) -> Result<Ack, MonitorError> {
        let ack = self.service.upload(&self.batch_id, portfolio_id, kind, upload).await?;
        Ok(ack)
    }

    pub async fn reimport(&mut self, file_id: &FileId) -> Result<Ack, MonitorError> {
        let ack = self.service.reimport(&self.batch_id, file_id).await?;
        Ok(ack)
    }

    /// Valid only while the file is `Processing`; checked client-side
    /// before any network call.
    pub async fn cancel(&mut self, file_id: &FileId) -> Result<Ack, MonitorError> {
        if !self.loaded {
            return Err(MonitorError::NotLoaded);
        }
        let status = self
            .grid
            .iter()
            .flat_map(|portfolio| portfolio.files.values())
            .find(|file| file.file_id == *file_id)
            .map(|file| file.status)
            .ok_or_else(|| MonitorError::UnknownFile { file_id: file_id.clone() })?;

        if status != FileStatus::Processing {
            return Err(MonitorError::NotProcessing { file_id: file_id.clone(), status });
        }

        let ack = self.service.cancel(&self.batch_id, file_id).await?;
        Ok(ack)
    }

    pub async fn file_errors(&self, file_id: &FileId) -> Result<Vec<FileError>, ClientError> {
        self.service.file_errors(&self.batch_id, file_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::domain::batch::BatchId;
    use crate::domain::ingestion::{
        FileError, FileId, FileKind, FileStatus, FileUpload, PortfolioFile, PortfolioFiles,
        PortfolioId,
    };
    use crate::domain::Ack;
    use crate::errors::ClientError;
    use crate::monitor::{FileStatusMonitor, IngestionService, MonitorError, RefreshOutcome};
    use crate::refresh::{RefreshTimer, RefreshTimerState};

    fn grid(status: FileStatus) -> Vec<PortfolioFiles> {
        let mut files = BTreeMap::new();
        files.insert(
            FileKind::Positions,
            PortfolioFile {
                file_id: FileId("f-1".to_owned()),
                status,
                row_count: 10,
                error_count: 0,
                updated_at: Utc::now(),
            },
        );
        vec![PortfolioFiles {
            portfolio_id: PortfolioId("p-1".to_owned()),
            portfolio_name: "Global Equity".to_owned(),
            files,
        }]
    }

    struct FakeIngestionService {
        grid: Mutex<Result<Vec<PortfolioFiles>, ClientError>>,
        fetches: AtomicU32,
        cancels: AtomicU32,
    }

    impl FakeIngestionService {
        fn new(initial: Result<Vec<PortfolioFiles>, ClientError>) -> Arc<Self> {
            Arc::new(Self {
                grid: Mutex::new(initial),
                fetches: AtomicU32::new(0),
                cancels: AtomicU32::new(0),
            })
        }

        fn set_grid(&self, next: Result<Vec<PortfolioFiles>, ClientError>) {
            *self.grid.lock().expect("grid lock") = next;
        }
    }

    #[async_trait]
    impl IngestionService for Arc<FakeIngestionService> {
        async fn portfolio_files(
            &self,
            _batch_id: &BatchId,
        ) -> Result<Vec<PortfolioFiles>, ClientError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.grid.lock().expect("grid lock").clone()
        }

        async fn upload(
            &self,
            _batch_id: &BatchId,
            _portfolio_id: &PortfolioId,
            _kind: FileKind,
            _upload: FileUpload,
        ) -> Result<Ack, ClientError> {
            Ok(Ack::ok())
        }

        async fn reimport(
            &self,
            _batch_id: &BatchId,
            _file_id: &FileId,
        ) -> Result<Ack, ClientError> {
            Ok(Ack::ok())
        }

        async fn cancel(&self, _batch_id: &BatchId, _file_id: &FileId) -> Result<Ack, ClientError> {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            Ok(Ack::ok())
        }

        async fn file_errors(
            &self,
            _batch_id: &BatchId,
            _file_id: &FileId,
        ) -> Result<Vec<FileError>, ClientError> {
            Ok(Vec::new())
        }
    }

    fn monitor(
        service: Arc<FakeIngestionService>,
    ) -> FileStatusMonitor<Arc<FakeIngestionService>> {
        FileStatusMonitor::new(service, BatchId("batch-42".to_owned()), RefreshTimer::default())
    }

    #[tokio::test]
    async fn initial_load_failure_is_fatal_and_retryable() {
        let service =
            FakeIngestionService::new(Err(ClientError::Network("unreachable".to_owned())));
        let mut monitor = monitor(Arc::clone(&service));

        monitor.load().await.expect_err("initial failure surfaces");
        assert!(monitor.grid().is_empty());

        service.set_grid(Ok(grid(FileStatus::Processing)));
        let loaded = monitor.load().await.expect("manual retry succeeds");
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn refresh_failures_preserve_the_last_good_grid_until_shutoff() {
        let service = FakeIngestionService::new(Ok(grid(FileStatus::Processing)));
        let mut monitor = monitor(Arc::clone(&service));
        monitor.load().await.expect("initial load");

        service.set_grid(Err(ClientError::Network("refresh failed".to_owned())));
        for expected in 1..=2u32 {
            let outcome = monitor.refresh().await;
            assert_eq!(
                outcome,
                RefreshOutcome::Failed { consecutive_failures: expected, disabled: false }
            );
            assert_eq!(monitor.grid().len(), 1, "last good grid is preserved");
        }

        let outcome = monitor.refresh().await;
        assert_eq!(outcome, RefreshOutcome::Failed { consecutive_failures: 3, disabled: true });
        assert_eq!(monitor.timer().state(), RefreshTimerState::Disabled);

        // The fourth tick never reaches the service.
        let fetches_before = service.fetches.load(Ordering::SeqCst);
        assert_eq!(monitor.refresh().await, RefreshOutcome::Skipped);
        assert_eq!(service.fetches.load(Ordering::SeqCst), fetches_before);
    }

    #[tokio::test]
    async fn refresh_skips_when_nothing_is_processing() {
        let service = FakeIngestionService::new(Ok(grid(FileStatus::Success)));
        let mut monitor = monitor(Arc::clone(&service));
        monitor.load().await.expect("initial load");

        assert_eq!(monitor.refresh().await, RefreshOutcome::Skipped);
        assert!(monitor.ingestion_complete());
    }

    #[tokio::test]
    async fn paused_monitor_does_not_poll() {
        let service = FakeIngestionService::new(Ok(grid(FileStatus::Processing)));
        let mut monitor = monitor(Arc::clone(&service));
        monitor.load().await.expect("initial load");

        monitor.pause();
        let fetches_before = service.fetches.load(Ordering::SeqCst);
        assert_eq!(monitor.refresh().await, RefreshOutcome::Skipped);
        assert_eq!(service.fetches.load(Ordering::SeqCst), fetches_before);

        monitor.resume();
        assert_eq!(monitor.refresh().await, RefreshOutcome::Updated);
    }

    #[tokio::test]
    async fn cancel_is_refused_unless_the_file_is_processing() {
        let service = FakeIngestionService::new(Ok(grid(FileStatus::Success)));
        let mut monitor = monitor(Arc::clone(&service));
        monitor.load().await.expect("initial load");

        let error = monitor
            .cancel(&FileId("f-1".to_owned()))
            .await
            .expect_err("completed import cannot be canceled");
        assert!(matches!(error, MonitorError::NotProcessing { .. }));
        assert_eq!(service.cancels.load(Ordering::SeqCst), 0);

        let error = monitor
            .cancel(&FileId("missing".to_owned()))
            .await
            .expect_err("unknown file is refused");
        assert!(matches!(error, MonitorError::UnknownFile { .. }));

        service.set_grid(Ok(grid(FileStatus::Processing)));
        monitor.load().await.expect("reload");
        monitor.cancel(&FileId("f-1".to_owned())).await.expect("processing import cancels");
        assert_eq!(service.cancels.load(Ordering::SeqCst), 1);
    }
}
