//! Notification fabric and journal for Agenda.
//!
//! Provides the sequenced, integrity-hashed notification log with filtered
//! broadcast subscribers, and the CRC-framed write-ahead log the ledger
//! journal is persisted in.

pub mod error;
pub mod event;
pub mod fabric;
pub mod wal;

pub use error::FabricError;
pub use event::FabricEvent;
pub use fabric::{EventFilter, EventStream, FabricConfig, NotificationFabric};
pub use wal::{Recovery, SyncMode, WalConfig, WriteAheadLog};
