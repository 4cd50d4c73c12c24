//! Error taxonomy for the tracker.
//!
//! Precondition failures are reported, never fatal, and never mutate state.
//! Acquisition failures leave the tracker `Inactive`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The operation is not valid in the current mode or presence state.
    #[error("precondition not met for {operation}: {reason}")]
    PreconditionNotMet {
        operation: &'static str,
        reason: String,
    },

    /// A capture device could not be opened or read.
    #[error("acquisition failed for {source_name}: {reason}")]
    Acquisition { source_name: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TrackerError {
    pub(crate) fn precondition(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::PreconditionNotMet {
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn acquisition(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Acquisition {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::PreconditionNotMet { .. })
    }
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
