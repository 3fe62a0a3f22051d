use std::io;

/// Errors produced by the notification fabric and the journal.
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// I/O error during journal or file operations.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An entry exceeds the configured frame size.
    #[error("journal entry of {length} bytes exceeds limit of {limit}")]
    EntryTooLarge { length: u64, limit: u64 },

    /// A lock guarding fabric state was poisoned by a panicking writer.
    #[error("fabric lock poisoned")]
    LockPoisoned,

    /// Truncation point lies beyond the current end of the journal.
    #[error("truncation offset {requested} exceeds current write position {current}")]
    InvalidTruncation { requested: u64, current: u64 },

    /// A failed append could not be cut back; the journal refuses writes
    /// until it is reopened and its tail repaired.
    #[error("journal wedged at offset {offset}")]
    Wedged { offset: u64 },
}

/// Convenience alias used throughout the fabric crate.
pub type Result<T> = std::result::Result<T, FabricError>;
