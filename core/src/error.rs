/// Ledger error type.
///
/// `InvalidInput` and `EmptySelection` are shown to the user and leave the
/// store untouched. `Store` wraps an unexpected persistence failure and ends
/// the session.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Select an entry to delete first")]
    EmptySelection,

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl LedgerError {
    /// True for failures the user can correct and retry.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LedgerError::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
