use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::ids::{AppointmentId, InvitationId};
use crate::temporal::Timestamp;

/// Classification of notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    AppointmentCreated,
    AppointmentUnscheduled,
    AppointmentMoved,
    MemberInvited,
    MemberUninvited,
    InvitationApproved,
    InvitationDenied,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 7] = [
        Self::AppointmentCreated,
        Self::AppointmentUnscheduled,
        Self::AppointmentMoved,
        Self::MemberInvited,
        Self::MemberUninvited,
        Self::InvitationApproved,
        Self::InvitationDenied,
    ];
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AppointmentCreated => "AppointmentCreated",
            Self::AppointmentUnscheduled => "AppointmentUnscheduled",
            Self::AppointmentMoved => "AppointmentMoved",
            Self::MemberInvited => "MemberInvited",
            Self::MemberUninvited => "MemberUninvited",
            Self::InvitationApproved => "InvitationApproved",
            Self::InvitationDenied => "InvitationDenied",
        };
        write!(f, "{s}")
    }
}

/// Observable event produced by a successful mutation.
///
/// Each variant carries exactly the fields subscribers are promised.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Notification {
    AppointmentCreated {
        id: AppointmentId,
        owner: Identity,
        from: Timestamp,
        to: Timestamp,
    },
    AppointmentUnscheduled {
        id: AppointmentId,
        owner: Identity,
    },
    AppointmentMoved {
        id: AppointmentId,
        from: Timestamp,
        to: Timestamp,
    },
    MemberInvited {
        appointment_id: AppointmentId,
        invitation_id: InvitationId,
        invitee: Identity,
    },
    MemberUninvited {
        appointment_id: AppointmentId,
        invitation_id: InvitationId,
        invitee: Identity,
    },
    InvitationApproved {
        appointment_id: AppointmentId,
        invitation_id: InvitationId,
        invitee: Identity,
    },
    InvitationDenied {
        appointment_id: AppointmentId,
        invitation_id: InvitationId,
        invitee: Identity,
    },
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::AppointmentCreated { .. } => NotificationKind::AppointmentCreated,
            Self::AppointmentUnscheduled { .. } => NotificationKind::AppointmentUnscheduled,
            Self::AppointmentMoved { .. } => NotificationKind::AppointmentMoved,
            Self::MemberInvited { .. } => NotificationKind::MemberInvited,
            Self::MemberUninvited { .. } => NotificationKind::MemberUninvited,
            Self::InvitationApproved { .. } => NotificationKind::InvitationApproved,
            Self::InvitationDenied { .. } => NotificationKind::InvitationDenied,
        }
    }

    /// The appointment this notification is about.
    pub fn appointment_id(&self) -> AppointmentId {
        match self {
            Self::AppointmentCreated { id, .. }
            | Self::AppointmentUnscheduled { id, .. }
            | Self::AppointmentMoved { id, .. } => *id,
            Self::MemberInvited { appointment_id, .. }
            | Self::MemberUninvited { appointment_id, .. }
            | Self::InvitationApproved { appointment_id, .. }
            | Self::InvitationDenied { appointment_id, .. } => *appointment_id,
        }
    }

    /// Identities named by this notification (owner or invitee).
    pub fn identities(&self) -> Vec<&Identity> {
        match self {
            Self::AppointmentCreated { owner, .. } | Self::AppointmentUnscheduled { owner, .. } => {
                vec![owner]
            }
            Self::AppointmentMoved { .. } => vec![],
            Self::MemberInvited { invitee, .. }
            | Self::MemberUninvited { invitee, .. }
            | Self::InvitationApproved { invitee, .. }
            | Self::InvitationDenied { invitee, .. } => vec![invitee],
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AppointmentCreated { id, owner, from, to } => {
                write!(f, "AppointmentCreated({id}, {owner}, {from}, {to})")
            }
            Self::AppointmentUnscheduled { id, owner } => {
                write!(f, "AppointmentUnscheduled({id}, {owner})")
            }
            Self::AppointmentMoved { id, from, to } => {
                write!(f, "AppointmentMoved({id}, {from}, {to})")
            }
            Self::MemberInvited {
                appointment_id,
                invitation_id,
                invitee,
            }
            | Self::MemberUninvited {
                appointment_id,
                invitation_id,
                invitee,
            }
            | Self::InvitationApproved {
                appointment_id,
                invitation_id,
                invitee,
            }
            | Self::InvitationDenied {
                appointment_id,
                invitation_id,
                invitee,
            } => write!(
                f,
                "{}({appointment_id}, {invitation_id}, {invitee})",
                self.kind()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_display_agree() {
        let n = Notification::AppointmentMoved {
            id: AppointmentId(3),
            from: Timestamp(10),
            to: Timestamp(20),
        };
        assert_eq!(n.kind(), NotificationKind::AppointmentMoved);
        assert_eq!(format!("{n}"), "AppointmentMoved(3, 10, 20)");
    }

    #[test]
    fn invitation_notifications_carry_invitee() {
        let invitee = Identity::from_raw([5; 32]);
        let n = Notification::InvitationApproved {
            appointment_id: AppointmentId(1),
            invitation_id: InvitationId(1),
            invitee: invitee.clone(),
        };
        assert_eq!(n.appointment_id(), AppointmentId(1));
        assert_eq!(n.identities(), vec![&invitee]);
        assert_eq!(
            format!("{n}"),
            format!("InvitationApproved(1, 1, {invitee})")
        );
    }

    #[test]
    fn json_is_internally_tagged() {
        let n = Notification::AppointmentUnscheduled {
            id: AppointmentId(2),
            owner: Identity::from_raw([0; 32]),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["kind"], "AppointmentUnscheduled");
        assert_eq!(json["id"], 2);
    }
}
