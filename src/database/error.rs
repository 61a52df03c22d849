use thiserror::Error;

use crate::recharge::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseErrorKind {
    ConnectionFailed { message: String },
    QueryFailed { message: String },
    Migration { message: String },
    Decode { message: String },
}

#[derive(Debug, Clone, Error)]
#[error("{kind:?}")]
pub struct DatabaseError {
    pub kind: DatabaseErrorKind,
}

impl DatabaseError {
    pub fn new(kind: DatabaseErrorKind) -> Self {
        Self { kind }
    }

    pub fn from_sqlx(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseErrorKind::ConnectionFailed {
                    message: err.to_string(),
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseErrorKind::Decode {
                    message: err.to_string(),
                }
            }
            _ => DatabaseErrorKind::QueryFailed {
                message: err.to_string(),
            },
        };
        Self::new(kind)
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::new(DatabaseErrorKind::Migration {
            message: err.to_string(),
        })
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err.kind {
            DatabaseErrorKind::Decode { message } => StoreError::Corrupt(message),
            DatabaseErrorKind::ConnectionFailed { message }
            | DatabaseErrorKind::QueryFailed { message }
            | DatabaseErrorKind::Migration { message } => StoreError::Unavailable(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeouts_are_connection_failures() {
        let err = DatabaseError::from_sqlx(sqlx::Error::PoolTimedOut);
        assert!(matches!(err.kind, DatabaseErrorKind::ConnectionFailed { .. }));
        assert!(matches!(StoreError::from(err), StoreError::Unavailable(_)));
    }

    #[test]
    fn decode_errors_mean_corrupt_records() {
        let err = DatabaseError::new(DatabaseErrorKind::Decode {
            message: "bad record".to_string(),
        });
        assert_eq!(StoreError::from(err), StoreError::Corrupt("bad record".to_string()));
    }
}
