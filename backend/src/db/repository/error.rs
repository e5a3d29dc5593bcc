//! Errors raised by history stores.
//!
//! The history layer never retries a store error. `NotFound` is the only
//! kind a client sees as such; the rest become a generic storage failure with
//! the detail kept in the logs.

use std::fmt;

use crate::api::HistoryId;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Which store operation failed, and on which record when there is one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub operation: Option<&'static str>,
    pub record: Option<HistoryId>,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.operation, self.record) {
            (Some(op), Some(id)) => write!(f, " ({} #{})", op, id),
            (Some(op), None) => write!(f, " ({})", op),
            (None, Some(id)) => write!(f, " (#{})", id),
            (None, None) => Ok(()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The backing store cannot be reached: pool exhausted, server down or a
    /// simulated outage.
    #[error("history store unavailable: {message}{context}")]
    Unavailable {
        message: String,
        context: ErrorContext,
    },

    /// The store rejected a statement.
    #[error("history query failed: {message}{context}")]
    Query {
        message: String,
        context: ErrorContext,
    },

    /// No record with this id belongs to the session.
    #[error("history record not found{context}")]
    NotFound { context: ErrorContext },

    /// A row could not be encoded for storage or decoded back into a record.
    #[error("history record is corrupt: {message}{context}")]
    Corrupt {
        message: String,
        context: ErrorContext,
    },

    /// The blocking worker running a store call died before answering.
    #[error("history store worker failed: {message}{context}")]
    Worker {
        message: String,
        context: ErrorContext,
    },

    /// Backend selection or start-up failed.
    #[error("history store misconfigured: {0}")]
    Configuration(String),
}

impl RepositoryError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// The error every backend returns for an absent or foreign record.
    pub fn not_found(id: HistoryId) -> Self {
        Self::NotFound {
            context: ErrorContext {
                operation: None,
                record: Some(id),
            },
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Configuration errors carry no context and report the default.
    pub fn context(&self) -> ErrorContext {
        match self {
            Self::Unavailable { context, .. }
            | Self::Query { context, .. }
            | Self::NotFound { context }
            | Self::Corrupt { context, .. }
            | Self::Worker { context, .. } => *context,
            Self::Configuration(_) => ErrorContext::default(),
        }
    }

    fn context_mut(&mut self) -> Option<&mut ErrorContext> {
        match self {
            Self::Unavailable { context, .. }
            | Self::Query { context, .. }
            | Self::NotFound { context }
            | Self::Corrupt { context, .. }
            | Self::Worker { context, .. } => Some(context),
            Self::Configuration(_) => None,
        }
    }

    /// Tag the error with the store operation that raised it.
    pub fn during(mut self, operation: &'static str) -> Self {
        if let Some(context) = self.context_mut() {
            context.operation = Some(operation);
        }
        self
    }

    /// Tag the error with the record it concerns.
    pub fn for_record(mut self, id: HistoryId) -> Self {
        if let Some(context) = self.context_mut() {
            context.record = Some(id);
        }
        self
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
                RepositoryError::unavailable(info.message().to_string())
            }
            Error::DatabaseError(kind, info) => {
                RepositoryError::query(format!("{} ({:?})", info.message(), kind))
            }
            Error::DeserializationError(e) | Error::SerializationError(e) => {
                RepositoryError::corrupt(e.to_string())
            }
            other => RepositoryError::query(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        RepositoryError::unavailable(format!("no pooled connection: {}", err))
    }
}
