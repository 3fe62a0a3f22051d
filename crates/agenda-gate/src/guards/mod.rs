//! Built-in guards.

pub mod existence;
pub mod ownership;
pub mod range;
pub mod temporal;

pub use existence::{AppointmentExists, InvitationExists};
pub use ownership::{InviteeOnly, OwnerOnly};
pub use range::ValidWindow;
pub use temporal::OpenWindow;
