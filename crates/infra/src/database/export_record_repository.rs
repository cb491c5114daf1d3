//! SQLite-backed export record store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use course_export_core::ExportRecordRepository;
use course_export_domain::{
    CourseExportError, ExportRecord, NewExportRecord, Result as DomainResult,
};
use rusqlite::{params, Row};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbConnection, DbManager};

/// Append-only repository over `course_export_records`.
pub struct SqliteExportRecordRepository {
    db: Arc<DbManager>,
}

impl SqliteExportRecordRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn insert_record(conn: &DbConnection, record: &NewExportRecord) -> DomainResult<i64> {
        conn.execute(
            RECORD_INSERT_SQL,
            params![record.user_id, record.completion_id, record.time_created.timestamp()],
        )
        .map_err(map_sql_error)?;
        Ok(conn.last_insert_rowid())
    }

    /// Every record exported for `user_id`, oldest first.
    pub async fn list_for_user(&self, user_id: i64) -> DomainResult<Vec<ExportRecord>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<ExportRecord>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(RECORD_BY_USER_SQL).map_err(map_sql_error)?;
            let rows = stmt.query_map(params![user_id], map_record_row).map_err(map_sql_error)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Look up a single record.
    pub async fn get(&self, id: i64) -> DomainResult<Option<ExportRecord>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<ExportRecord>> {
            let conn = db.get_connection()?;
            match conn.query_row(RECORD_BY_ID_SQL, params![id], map_record_row) {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(map_sql_error(err)),
            }
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl ExportRecordRepository for SqliteExportRecordRepository {
    async fn insert(&self, record: &NewExportRecord) -> DomainResult<i64> {
        let db = Arc::clone(&self.db);
        let to_insert = record.clone();

        task::spawn_blocking(move || -> DomainResult<i64> {
            let conn = db.get_connection()?;
            Self::insert_record(&conn, &to_insert)
        })
        .await
        .map_err(map_join_error)?
    }
}

const RECORD_INSERT_SQL: &str =
    "INSERT INTO course_export_records (user_id, completion_id, time_created) VALUES (?1, ?2, ?3)";

const RECORD_BY_USER_SQL: &str = "SELECT id, user_id, completion_id, time_created
    FROM course_export_records WHERE user_id = ?1 ORDER BY id";

const RECORD_BY_ID_SQL: &str = "SELECT id, user_id, completion_id, time_created
    FROM course_export_records WHERE id = ?1";

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<ExportRecord> {
    let seconds: i64 = row.get(3)?;
    let time_created = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Integer,
            Box::new(CourseExportError::Database(format!("timestamp out of range: {seconds}"))),
        )
    })?;

    Ok(ExportRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        completion_id: row.get(2)?,
        time_created,
    })
}
