use std::fmt;

use serde::{Deserialize, Serialize};

use agenda_types::{AppointmentId, InvitationId, Timestamp};

/// Caller-correctable reasons an operation can be refused.
///
/// None of these are retryable as-is: the caller has to fix the range, use
/// an id that exists, act as the right identity, or act before expiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenialKind {
    InvalidRange,
    NotFound,
    Forbidden,
    Expired,
}

impl fmt::Display for DenialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidRange => "invalid_range",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// A guard refused the operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("appointment {0} does not exist")]
    AppointmentNotFound(AppointmentId),

    #[error("invitation {invitation} does not exist on appointment {appointment}")]
    InvitationNotFound {
        appointment: AppointmentId,
        invitation: InvitationId,
    },

    #[error("appointment {0} is not yours")]
    NotOwner(AppointmentId),

    #[error("invitation {invitation} on appointment {appointment} is not your invitation")]
    NotInvitee {
        appointment: AppointmentId,
        invitation: InvitationId,
    },

    #[error("appointment {0} has already ended; editing past appointments is not allowed")]
    Expired(AppointmentId),

    #[error("invalid range: from ({from}) must be before to ({to})")]
    InvalidRange { from: Timestamp, to: Timestamp },
}

impl GateError {
    pub fn kind(&self) -> DenialKind {
        match self {
            Self::AppointmentNotFound(_) | Self::InvitationNotFound { .. } => DenialKind::NotFound,
            Self::NotOwner(_) | Self::NotInvitee { .. } => DenialKind::Forbidden,
            Self::Expired(_) => DenialKind::Expired,
            Self::InvalidRange { .. } => DenialKind::InvalidRange,
        }
    }
}
