//! Store errors shared by stores, repositories and services.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// A stored enumeration key that does not match any known constant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Why a write statement sequence was rejected.
#[derive(Debug, Error)]
pub enum WriteFailure {
    #[error("statement failed")]
    Sql(#[source] Error),

    #[error("expected {expected} affected row(s), got {actual}")]
    RowCount { expected: u64, actual: u64 },

    #[error("record has no identity")]
    MissingIdentity,

    #[error("referenced {entity} has not been saved")]
    UnsavedReference { entity: &'static str },

    #[error("{field} has more than {max_scale} decimal places")]
    Scale {
        field: &'static str,
        max_scale: u32,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to connect to database")]
    Connection(#[source] Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("unable to create {entity}")]
    Create {
        entity: &'static str,
        #[source]
        failure: WriteFailure,
    },

    #[error("unable to update {entity}")]
    Update {
        entity: &'static str,
        #[source]
        failure: WriteFailure,
    },

    #[error("unable to delete {entity}")]
    Delete {
        entity: &'static str,
        #[source]
        failure: WriteFailure,
    },

    #[error("unable to deserialize stored value")]
    Deserialization(#[from] UnknownVariant),

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("amount out of range")]
    InvalidAmount,
}

impl StoreError {
    /// Classify a failed read statement.
    pub(crate) fn read(error: Error) -> Self {
        match unknown_variant(&error) {
            Some(unknown) => Self::Deserialization(unknown.clone()),
            None => Self::Sql(error),
        }
    }

    pub(crate) fn create(entity: &'static str, failure: impl Into<WriteFailure>) -> Self {
        Self::Create {
            entity,
            failure: failure.into(),
        }
    }

    pub(crate) fn update(entity: &'static str, failure: impl Into<WriteFailure>) -> Self {
        Self::Update {
            entity,
            failure: failure.into(),
        }
    }

    pub(crate) fn delete(entity: &'static str, failure: impl Into<WriteFailure>) -> Self {
        Self::Delete {
            entity,
            failure: failure.into(),
        }
    }

    /// Returns `true` when a write referenced a row that does not exist.
    pub fn is_invalid_reference(&self) -> bool {
        self.database_error_kind()
            .is_some_and(|kind| matches!(kind, ErrorKind::ForeignKeyViolation))
    }

    /// Returns `true` when a write was rejected by a schema constraint.
    pub fn is_constraint_violation(&self) -> bool {
        self.database_error_kind().is_some_and(|kind| {
            matches!(
                kind,
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            )
        })
    }

    fn database_error_kind(&self) -> Option<ErrorKind> {
        let error = match self {
            Self::Create { failure, .. }
            | Self::Update { failure, .. }
            | Self::Delete { failure, .. } => match failure {
                WriteFailure::Sql(error) => error,
                _ => return None,
            },
            Self::Sql(error) | Self::Connection(error) => error,
            _ => return None,
        };

        error.as_database_error().map(DatabaseError::kind)
    }
}

impl From<Error> for WriteFailure {
    fn from(error: Error) -> Self {
        Self::Sql(error)
    }
}

/// Checks an affected-row count against the expected one.
pub(crate) fn expect_rows(actual: u64, expected: u64) -> Result<(), WriteFailure> {
    if actual == expected {
        Ok(())
    } else {
        Err(WriteFailure::RowCount { expected, actual })
    }
}

/// Wraps an [`UnknownVariant`] so it can travel through `FromRow`.
pub(crate) fn decode_error(column: &str, unknown: UnknownVariant) -> Error {
    Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(unknown),
    }
}

fn unknown_variant(error: &Error) -> Option<&UnknownVariant> {
    match error {
        Error::ColumnDecode { source, .. } | Error::Decode(source) => source.downcast_ref(),
        _ => None,
    }
}
