use diesel::result::{DatabaseErrorKind, Error as DieselError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Connection,
    Query,
    Constraint,
    NotFound,
    Unavailable,
}

/// Failure reported by a record store. `message` is shown to users as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Connection, message)
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Query, message)
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Constraint, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unavailable, message)
    }

    pub fn unknown_column(table: &str, column: &str) -> Self {
        Self::query(format!("column {table}.{column} does not exist"))
    }
}

impl From<DieselError> for BackendError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::new(BackendErrorKind::NotFound, "record not found"),
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation,
                info,
            ) => Self::constraint(info.message()),
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
                Self::connection(info.message())
            }
            DieselError::DatabaseError(_, info) => Self::query(info.message()),
            other => Self::query(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for BackendError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        Self::connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_mapping() {
        let err = BackendError::from(DieselError::NotFound);
        assert_eq!(err.kind, BackendErrorKind::NotFound);
    }

    #[test]
    fn test_message_is_displayed_verbatim() {
        let err = BackendError::constraint(
            "duplicate key value violates unique constraint \"documents_document_number_key\"",
        );
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint \"documents_document_number_key\""
        );
    }

    #[test]
    fn test_unknown_column() {
        let err = BackendError::unknown_column("audits", "foo");
        assert_eq!(err.kind, BackendErrorKind::Query);
        assert_eq!(err.message, "column audits.foo does not exist");
    }
}
