//! Guard pipeline for the Agenda ledger.
//!
//! Every mutation is checked by a gate before the ledger touches its state.
//! A gate is an ordered pipeline of guards (existence, ownership, invitee,
//! temporal window, time range) that either passes or refuses with the
//! first applicable [`GateError`].
//!
//! # Quick Start
//!
//! ```rust
//! use agenda_gate::{Gate, OperationKind, Subject};
//! use agenda_types::{CallContext, Identity, Timestamp};
//!
//! let gate = Gate::for_operation(OperationKind::Schedule);
//! let ctx = CallContext::new(Identity::from_raw([1u8; 32]), Timestamp(0));
//! assert!(gate.check(&Subject::window(Timestamp(10), Timestamp(20)), &ctx).is_ok());
//! assert!(gate.check(&Subject::window(Timestamp(20), Timestamp(10)), &ctx).is_err());
//! ```

pub mod error;
pub mod gate;
pub mod guard;
pub mod guards;

pub use error::{DenialKind, GateError};
pub use gate::{Gate, Gatekeeper};
pub use guard::{Guard, OperationKind, Subject};
pub use guards::{AppointmentExists, InvitationExists, InviteeOnly, OpenWindow, OwnerOnly, ValidWindow};
