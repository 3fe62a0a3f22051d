use agenda_gate::{DenialKind, GateError};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A guard refused the operation. Nothing was written.
    #[error(transparent)]
    Rejected(#[from] GateError),

    /// A commit hook (typically the durable journal) refused the entry.
    #[error("journal rejected commit: {0}")]
    Journal(String),

    #[error("integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    /// The caller-correctable denial behind this error, if it is one.
    pub fn denial(&self) -> Option<DenialKind> {
        match self {
            Self::Rejected(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn integrity(seq: u64, reason: impl Into<String>) -> Self {
        Self::IntegrityViolation {
            seq,
            reason: reason.into(),
        }
    }
}
