//! Foundation types for the Agenda ledger.
//!
//! This crate provides the identity, temporal, and record types shared by
//! every other Agenda crate.
//!
//! # Key Types
//!
//! - [`Identity`]: Caller identity derived from genesis material or a handle
//! - [`AppointmentId`] / [`InvitationId`]: Monotonic record identifiers
//! - [`Timestamp`]: Opaque, totally ordered point in time
//! - [`Clock`]: Source of the current execution time
//! - [`CallContext`]: Who is calling, and when
//! - [`Appointment`] / [`Invitation`]: Ledger records
//! - [`Notification`]: Typed event emitted by every successful mutation

pub mod appointment;
pub mod context;
pub mod error;
pub mod identity;
pub mod ids;
pub mod notification;
pub mod temporal;

pub use appointment::{Appointment, Invitation, InvitationStatus};
pub use context::CallContext;
pub use error::TypeError;
pub use identity::{Identity, IdentityMaterial};
pub use ids::{AppointmentId, InvitationId};
pub use notification::{Notification, NotificationKind};
pub use temporal::{Clock, ManualClock, SystemClock, TimeUnit, Timestamp};
