//! Application context - dependency injection container

use std::sync::Arc;

use course_export_core::{ApiSettingsSource, ExportService, ExportTaskExecutor, ExportTaskScheduler};
use course_export_domain::{CompletionEvent, Config, CourseExportError, Result};
use course_export_infra::config::loader::ENV_API_URL;
use course_export_infra::config::{load as load_config, EnvApiSettings};
use course_export_infra::tasks::BatchSummary;
use course_export_infra::{
    BroadcastEventPublisher, CompletionListener, DbManager, ExportTaskWorker,
    HttpCompletionTransport, InMemoryTaskQueue, SqliteExportRecordRepository, SqliteUserDirectory,
};
use tokio::sync::mpsc;
use tracing::info;

/// Capacity of the export completed broadcast channel.
const EVENT_CAPACITY: usize = 256;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub queue: Arc<InMemoryTaskQueue>,
    pub records: Arc<SqliteExportRecordRepository>,
    pub users: Arc<SqliteUserDirectory>,
    pub events: Arc<BroadcastEventPublisher>,
    pub export_service: Arc<ExportService>,
    pub scheduler: Arc<ExportTaskScheduler>,

    worker: ExportTaskWorker,
    listener: CompletionListener,
}

impl AppContext {
    /// Load configuration and build the context.
    pub fn new() -> Result<Self> {
        Self::from_loaded(load_config()?)
    }

    /// Build the context from an already loaded configuration.
    ///
    /// When the API endpoint comes from the environment it is re-read on
    /// every send, so the token can be rotated without a restart.
    pub fn from_loaded(config: Config) -> Result<Self> {
        let settings: Arc<dyn ApiSettingsSource> = if std::env::var(ENV_API_URL).is_ok() {
            Arc::new(EnvApiSettings)
        } else {
            Arc::new(config.api.clone())
        };
        Self::with_settings(config, settings)
    }

    /// Build the context with the API settings fixed to `config.api`.
    pub fn new_with_config(config: Config) -> Result<Self> {
        let settings = Arc::new(config.api.clone());
        Self::with_settings(config, settings)
    }

    pub fn with_settings(config: Config, settings: Arc<dyn ApiSettingsSource>) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let queue = Arc::new(InMemoryTaskQueue::new());
        let records = Arc::new(SqliteExportRecordRepository::new(Arc::clone(&db)));
        let users = Arc::new(SqliteUserDirectory::new(Arc::clone(&db)));
        let events = Arc::new(BroadcastEventPublisher::new(EVENT_CAPACITY));
        let transport = Arc::new(HttpCompletionTransport::with_settings(settings)?);

        let export_service = Arc::new(ExportService::new(
            users.clone(),
            transport,
            records.clone(),
            events.clone(),
        ));
        let scheduler = Arc::new(ExportTaskScheduler::new(queue.clone()));
        let executor = Arc::new(ExportTaskExecutor::new(Arc::clone(&export_service)));

        let worker = ExportTaskWorker::new(queue.clone(), executor, config.worker.clone());
        let listener = CompletionListener::new(Arc::clone(&scheduler));

        info!(db_path = %config.database.path, "application context initialised");

        Ok(Self {
            config,
            db,
            queue,
            records,
            users,
            events,
            export_service,
            scheduler,
            worker,
            listener,
        })
    }

    /// Start the task worker and begin scheduling events from `completions`.
    pub fn start(&mut self, completions: mpsc::Receiver<CompletionEvent>) -> Result<()> {
        self.worker.start().map_err(internal)?;
        self.listener.start(completions).map_err(internal)?;
        Ok(())
    }

    /// Wait until every completion sender is dropped and all received events
    /// are queued. Returns how many were scheduled.
    pub async fn finish_intake(&mut self) -> Result<usize> {
        self.listener.join().await.map_err(internal)
    }

    /// Stop intake and the background worker, then run every task still due.
    pub async fn shutdown(&mut self) -> Result<BatchSummary> {
        info!("shutdown called on AppContext");

        if self.listener.is_running() {
            self.listener.stop().await.map_err(internal)?;
        }
        // An in-flight batch is awaited by stop; the drain still runs if the
        // worker task failed so queued exports are not left behind.
        let stopped =
            if self.worker.is_running() { self.worker.stop().await } else { Ok(()) };

        let summary = self.worker.drain().await.map_err(internal)?;
        stopped.map_err(internal)?;
        info!(
            drained = summary.claimed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "pending exports drained"
        );
        Ok(summary)
    }

    pub fn health_check(&self) -> Result<()> {
        self.db.health_check()
    }
}

fn internal(err: impl std::fmt::Display) -> CourseExportError {
    CourseExportError::Internal(err.to_string())
}
