use thiserror::Error;

/// Error types shared across the Summit workspace.
#[derive(Debug, Error)]
pub enum SummitError {
    /// A monetary amount violated a documented precondition (e.g. zero top-up).
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A non-monetary parameter violated a documented precondition
    /// (out-of-range reinvest percentage, target below current balance).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A debit exceeds the available wallet balance.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Invalid state transition (e.g. completing an already-completed task).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Record not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Optimistic conditional write lost the race: the record's version
    /// changed between read and write. Re-read and retry.
    #[error("Version conflict: {0}")]
    Conflict(String),

    /// Storage layer error (backend unavailable, I/O failure). Transient.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Notification delivery error. Best-effort only; never rolls back
    /// the state change it describes.
    #[error("Notification error: {0}")]
    Notification(String),
}

impl SummitError {
    /// True for error classes that are safe to retry with backoff.
    ///
    /// Validation and state errors are definitive; only storage-layer
    /// failures and optimistic write conflicts warrant another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, SummitError::Storage(_) | SummitError::Conflict(_))
    }
}

impl From<serde_json::Error> for SummitError {
    fn from(e: serde_json::Error) -> Self {
        SummitError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SummitError::Storage("down".into()).is_transient());
        assert!(SummitError::Conflict("v3 != v4".into()).is_transient());
        assert!(!SummitError::InvalidAmount("0".into()).is_transient());
        assert!(!SummitError::InvalidState("completed".into()).is_transient());
        assert!(!SummitError::InsufficientFunds("30 < 50".into()).is_transient());
    }
}
