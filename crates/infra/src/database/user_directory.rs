//! SQLite-backed user directory.

use std::sync::Arc;

use async_trait::async_trait;
use course_export_core::UserDirectory;
use course_export_domain::Result as DomainResult;
use rusqlite::{params, OptionalExtension};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager};

/// Reads a user's external identifier from `users.idnumber`.
pub struct SqliteUserDirectory {
    db: Arc<DbManager>,
}

impl SqliteUserDirectory {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or replace a user row.
    pub async fn upsert_user(&self, user_id: i64, idnumber: Option<String>) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO users (id, idnumber) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET idnumber = excluded.idnumber",
                params![user_id, idnumber],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn external_id(&self, user_id: i64) -> DomainResult<Option<String>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<String>> {
            let conn = db.get_connection()?;
            let idnumber: Option<Option<String>> = conn
                .query_row("SELECT idnumber FROM users WHERE id = ?1", params![user_id], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(map_sql_error)?;
            Ok(idnumber.flatten())
        })
        .await
        .map_err(map_join_error)?
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn directory() -> (TempDir, SqliteUserDirectory) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db = DbManager::new(temp_dir.path().join("users.db"), 2).expect("manager created");
        db.run_migrations().expect("migrations run");
        (temp_dir, SqliteUserDirectory::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn returns_idnumber() {
        let (_dir, users) = directory();
        users.upsert_user(42, Some("EXT42".into())).await.unwrap();

        assert_eq!(users.external_id(42).await.unwrap().as_deref(), Some("EXT42"));
    }

    #[tokio::test]
    async fn null_idnumber_is_none() {
        let (_dir, users) = directory();
        users.upsert_user(42, None).await.unwrap();

        assert_eq!(users.external_id(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_user_is_none() {
        let (_dir, users) = directory();

        assert_eq!(users.external_id(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn upsert_replaces_idnumber() {
        let (_dir, users) = directory();
        users.upsert_user(42, Some("OLD".into())).await.unwrap();
        users.upsert_user(42, Some("NEW".into())).await.unwrap();

        assert_eq!(users.external_id(42).await.unwrap().as_deref(), Some("NEW"));
    }
}
