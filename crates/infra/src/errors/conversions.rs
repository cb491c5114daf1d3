//! Conversions from external infrastructure errors into domain errors.

use course_export_domain::CourseExportError;
use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CourseExportError);

impl From<InfraError> for CourseExportError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CourseExportError> for InfraError {
    fn from(value: CourseExportError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCourseExportError {
    fn into_domain(self) -> CourseExportError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → CourseExportError */
/* -------------------------------------------------------------------------- */

impl IntoCourseExportError for SqlError {
    fn into_domain(self) -> CourseExportError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        CourseExportError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        CourseExportError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        CourseExportError::Database("unique constraint violation".into())
                    }
                    _ => CourseExportError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                CourseExportError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                CourseExportError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                CourseExportError::Database(format!("invalid column type for '{name}': {ty}"))
            }
            RE::InvalidPath(path) => CourseExportError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => CourseExportError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_domain())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → CourseExportError */
/* -------------------------------------------------------------------------- */

impl IntoCourseExportError for PoolError {
    fn into_domain(self) -> CourseExportError {
        CourseExportError::Database(format!("failed to get pooled connection: {self}"))
    }
}

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        Self(value.into_domain())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CourseExportError */
/* -------------------------------------------------------------------------- */

impl IntoCourseExportError for HttpError {
    fn into_domain(self) -> CourseExportError {
        if self.is_builder() {
            return CourseExportError::Config(format!("invalid HTTP client setup: {self}"));
        }
        if self.is_timeout() {
            return CourseExportError::Network("HTTP request timed out".into());
        }
        if self.is_connect() {
            return CourseExportError::Network("HTTP connection failure".into());
        }
        CourseExportError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_domain())
    }
}

/* -------------------------------------------------------------------------- */
/* tokio::task::JoinError → CourseExportError */
/* -------------------------------------------------------------------------- */

impl From<tokio::task::JoinError> for InfraError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self(CourseExportError::Internal(format!("blocking task failed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
