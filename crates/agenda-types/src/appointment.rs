use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::ids::{AppointmentId, InvitationId};
use crate::temporal::Timestamp;

/// A time-windowed record owned by one identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    /// Creator of the appointment. Never changes.
    pub owner: Identity,
    pub from: Timestamp,
    pub to: Timestamp,
    /// Informational only; no expansion into occurrences happens.
    pub recurring: bool,
    /// Identities invited when the appointment was scheduled.
    pub invitees: Vec<Identity>,
}

impl Appointment {
    /// An appointment is past once its window has closed: `to <= now`.
    pub fn is_past_at(&self, now: Timestamp) -> bool {
        self.to <= now
    }

    /// Structural edits are only allowed while the window is still open.
    pub fn is_editable_at(&self, now: Timestamp) -> bool {
        !self.is_past_at(now)
    }

    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.owner == *identity
    }
}

/// Response state of an invitation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvitationStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

impl InvitationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        };
        write!(f, "{s}")
    }
}

/// One identity's invitation to one appointment.
///
/// The appointment does not own the invitation; it is only referenced for
/// existence, ownership, and time checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub appointment_id: AppointmentId,
    pub invitee: Identity,
    pub status: InvitationStatus,
}

impl Invitation {
    /// A fresh pending invitation.
    pub fn pending(appointment_id: AppointmentId, id: InvitationId, invitee: Identity) -> Self {
        Self {
            id,
            appointment_id,
            invitee,
            status: InvitationStatus::Pending,
        }
    }

    pub fn is_addressed_to(&self, identity: &Identity) -> bool {
        self.invitee == *identity
    }
}
