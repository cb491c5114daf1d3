//! Shared fixtures for infra integration tests.

use std::sync::Arc;

use course_export_core::{ExportService, ExportTaskExecutor, ExportTaskScheduler};
use course_export_domain::{ApiConfig, WorkerConfig};
use course_export_infra::database::{
    DbManager, SqliteExportRecordRepository, SqliteUserDirectory,
};
use course_export_infra::events::BroadcastEventPublisher;
use course_export_infra::export::HttpCompletionTransport;
use course_export_infra::tasks::{ExportTaskWorker, InMemoryTaskQueue};
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new migrated temporary database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("migrations should run");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    /// Execute a batch of SQL statements against the database.
    pub fn execute_batch(&self, sql: &str) {
        let conn = self
            .manager
            .get_connection()
            .expect("connection should be available for execute_batch");
        conn.execute_batch(sql).expect("SQL batch execution should succeed");
    }

    /// Number of rows in `course_export_records`.
    pub fn record_count(&self) -> i64 {
        let conn = self.manager.get_connection().expect("connection");
        conn.query_row("SELECT COUNT(*) FROM course_export_records", [], |row| row.get(0))
            .expect("count query")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Every real component wired against a test database and an API URL.
pub struct Pipeline {
    pub db: TestDatabase,
    pub queue: Arc<InMemoryTaskQueue>,
    pub records: Arc<SqliteExportRecordRepository>,
    pub events: Arc<BroadcastEventPublisher>,
    pub scheduler: Arc<ExportTaskScheduler>,
    pub worker: ExportTaskWorker,
}

impl Pipeline {
    pub fn new(api_url: impl Into<String>, worker: WorkerConfig) -> Self {
        let db = TestDatabase::new();
        db.execute_batch(
            "INSERT INTO users (id, idnumber) VALUES (42, 'EXT42');
             INSERT INTO users (id, idnumber) VALUES (43, NULL);",
        );

        let queue = Arc::new(InMemoryTaskQueue::new());
        let records = Arc::new(SqliteExportRecordRepository::new(Arc::clone(&db.manager)));
        let events = Arc::new(BroadcastEventPublisher::new(64));
        let directory = Arc::new(SqliteUserDirectory::new(Arc::clone(&db.manager)));
        let transport = Arc::new(
            HttpCompletionTransport::with_settings(Arc::new(ApiConfig::new(api_url, "token-123")))
                .expect("transport"),
        );

        let service = Arc::new(ExportService::new(
            directory,
            transport,
            records.clone(),
            events.clone(),
        ));
        let scheduler = Arc::new(ExportTaskScheduler::new(queue.clone()));
        let worker = ExportTaskWorker::new(
            queue.clone(),
            Arc::new(ExportTaskExecutor::new(service)),
            worker,
        );

        Self { db, queue, records, events, scheduler, worker }
    }
}
