//! Unified error handling for the session pipeline.
//!
//! Record-level problems (`MalformedRecord`) are recovered by the loaders and
//! only counted. Per-user statistic failures (`MissingCoordinates`,
//! `EmptyLocationUnion`) exclude that user from the dataset. Configuration
//! problems fail the run before any work starts.

use thiserror::Error;

/// Errors produced while loading, segmenting or summarising check-in traces.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A raw line could not be parsed into a check-in record.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Train-session visits reference locations with no coordinate entry.
    #[error(
        "user {user}: {} train location(s) have no coordinate: {}",
        .locations.len(),
        .locations.join(", ")
    )]
    MissingCoordinates { user: String, locations: Vec<String> },

    /// Train and test location sets are both empty.
    #[error("user {user}: train and test location sets are both empty")]
    EmptyLocationUnion { user: String },

    /// A configuration value is out of range.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether this error only affects a single user (as opposed to the run).
    pub fn is_per_user(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingCoordinates { .. } | PipelineError::EmptyLocationUnion { .. }
        )
    }

    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait turning missing record fields into `MalformedRecord` errors.
pub trait OptionExt<T> {
    fn ok_or_malformed(self, line: usize, reason: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_malformed(self, line: usize, reason: &str) -> Result<T> {
        self.ok_or_else(|| PipelineError::MalformedRecord {
            line,
            reason: reason.to_string(),
        })
    }
}
