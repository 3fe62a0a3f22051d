use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of an appointment.
///
/// Allocated from a ledger-wide counter starting at 1. Identifiers are never
/// reused, even after the appointment is unscheduled.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(pub u64);

/// Identifier of an invitation, scoped to its appointment.
///
/// Each appointment numbers its invitations from 1, so an invitation is
/// addressed by the pair `(AppointmentId, InvitationId)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvitationId(pub u64);

macro_rules! sequence_id {
    ($name:ident, $label:literal) => {
        impl $name {
            /// The first identifier handed out by a fresh sequence.
            pub const FIRST: Self = Self(1);

            /// Raw numeric value.
            pub fn get(self) -> u64 {
                self.0
            }

            /// The identifier following this one.
            pub fn next(self) -> Self {
                Self(self.0.saturating_add(1))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim_start_matches('#')
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| TypeError::InvalidId(s.to_string()))
            }
        }
    };
}

sequence_id!(AppointmentId, "AppointmentId");
sequence_id!(InvitationId, "InvitationId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_start_at_one() {
        assert_eq!(AppointmentId::FIRST.get(), 1);
        assert_eq!(InvitationId::FIRST.next(), InvitationId(2));
    }

    #[test]
    fn parse_accepts_hash_prefix() {
        assert_eq!("#7".parse::<AppointmentId>().unwrap(), AppointmentId(7));
        assert_eq!("12".parse::<InvitationId>().unwrap(), InvitationId(12));
        assert_eq!(
            "seven".parse::<AppointmentId>(),
            Err(TypeError::InvalidId("seven".into()))
        );
    }

    #[test]
    fn serializes_as_bare_number() {
        assert_eq!(serde_json::to_string(&AppointmentId(3)).unwrap(), "3");
    }
}
