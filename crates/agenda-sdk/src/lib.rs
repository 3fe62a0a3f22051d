//! High-level SDK for Agenda.
//!
//! Provides one API over the ledger, its durable journal, the notification
//! fabric and the clock. This is the main entry point for applications
//! embedding Agenda.

pub mod agenda;
pub mod config;
pub mod error;
pub mod hooks;

pub use agenda::{Agenda, OpenReport, VerifyReport};
pub use config::AgendaConfig;
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use agenda_fabric::{EventFilter, EventStream, FabricEvent, SyncMode};
pub use agenda_gate::DenialKind;
pub use agenda_ledger::{LedgerError, Operation, Receipt, ValidationReport};
pub use agenda_types::{
    Appointment, AppointmentId, CallContext, Clock, Identity, Invitation, InvitationId,
    InvitationStatus, ManualClock, Notification, NotificationKind, SystemClock, TimeUnit,
    Timestamp,
};
