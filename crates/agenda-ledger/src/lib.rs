//! The appointment and invitation ledger.
//!
//! This crate is the heart of Agenda. It provides:
//! - `AgendaState`, a prepare/apply state machine over the appointment,
//!   invitation and owner-index tables
//! - `AgendaReader` / `AgendaWriter` trait boundaries and the `CommitHook`
//!   seam used for journaling and notification delivery
//! - `InMemoryAgenda`, the single-writer implementation
//! - Journal records and deterministic replay
//! - Cross-table consistency validation

pub mod error;
pub mod memory;
pub mod records;
pub mod replay;
pub mod state;
pub mod traits;
pub mod validation;

pub use error::LedgerError;
pub use memory::InMemoryAgenda;
pub use records::{JournalEntry, Operation, Receipt, Record};
pub use replay::{ReplayEngine, ReplayResult};
pub use state::AgendaState;
pub use traits::{AgendaReader, AgendaWriter, CommitHook};
pub use validation::{ConsistencyValidator, ValidationReport, Violation, ViolationKind};
