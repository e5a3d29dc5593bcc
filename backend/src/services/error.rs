//! Error types for the planning pipeline.

use chrono::NaiveDate;
use thiserror::Error;

use crate::provider::ProviderError;

/// A travel request failed normalization. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    /// Offending request field, in wire naming.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Provider output could not be turned into a consistent itinerary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("no structured payload in provider output")]
    NoStructuredPayload,

    #[error("payload is not valid JSON even after repair: {detail}")]
    Unparsable { detail: String },

    #[error("payload has the wrong shape at {path}: {detail}")]
    InvalidShape { path: String, detail: String },

    #[error("required field {field} is missing or empty")]
    MissingField { field: String },

    #[error("field {field} has an invalid value: {detail}")]
    InvalidValue { field: String, detail: String },

    #[error("total_days is {actual}, requested {expected}")]
    TotalDaysMismatch { expected: u32, actual: i64 },

    #[error("daily has {actual} entries, expected {expected}")]
    DayCountMismatch { expected: u32, actual: usize },

    #[error("{field} is {actual}, expected {expected}")]
    DateMismatch {
        field: String,
        expected: NaiveDate,
        actual: NaiveDate,
    },
}

impl SchemaError {
    /// Stable machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            SchemaError::NoStructuredPayload => "no_structured_payload",
            SchemaError::Unparsable { .. } => "unparsable",
            SchemaError::InvalidShape { .. } => "invalid_shape",
            SchemaError::MissingField { .. } => "missing_field",
            SchemaError::InvalidValue { .. } => "invalid_value",
            SchemaError::TotalDaysMismatch { .. } => "total_days_mismatch",
            SchemaError::DayCountMismatch { .. } => "day_count_mismatch",
            SchemaError::DateMismatch { .. } => "date_mismatch",
        }
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        SchemaError::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, detail: impl Into<String>) -> Self {
        SchemaError::InvalidValue {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

/// Why a single synthesis attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("schema: {0}")]
    Schema(#[from] SchemaError),
}

impl AttemptError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Provider(e) => e.is_retryable(),
            AttemptError::Schema(_) => true,
        }
    }

    /// `provider:<kind>` or `schema:<reason>`.
    pub fn code(&self) -> String {
        match self {
            AttemptError::Provider(e) => format!("provider:{}", e.kind()),
            AttemptError::Schema(e) => format!("schema:{}", e.reason()),
        }
    }
}

/// Synthesis gave up. Nothing was persisted.
#[derive(Debug, Error)]
#[error("itinerary synthesis failed after {attempts} attempt(s): {}", last_failure(.failures))]
pub struct SynthesisError {
    pub attempts: u32,
    /// One entry per attempt, oldest first.
    pub failures: Vec<AttemptError>,
}

impl SynthesisError {
    /// Failure of the final attempt.
    pub fn cause(&self) -> Option<&AttemptError> {
        self.failures.last()
    }

    /// Codes of every attempt's failure, oldest first.
    pub fn failure_codes(&self) -> Vec<String> {
        self.failures.iter().map(AttemptError::code).collect()
    }
}

fn last_failure(failures: &[AttemptError]) -> String {
    failures
        .last()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "no attempt was made".to_string())
}
