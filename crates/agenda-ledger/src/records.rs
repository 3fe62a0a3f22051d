use serde::{Deserialize, Serialize};

use agenda_gate::OperationKind;
use agenda_types::{
    Appointment, AppointmentId, Identity, Invitation, InvitationId, InvitationStatus,
    Notification, Timestamp,
};

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A requested mutation, before any guard has looked at it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Schedule {
        from: Timestamp,
        to: Timestamp,
        invitees: Vec<Identity>,
        recurring: bool,
    },
    Unschedule {
        id: AppointmentId,
    },
    Move {
        id: AppointmentId,
        from: Timestamp,
        to: Timestamp,
    },
    InviteMembers {
        appointment_id: AppointmentId,
        identities: Vec<Identity>,
    },
    UninviteMembers {
        appointment_id: AppointmentId,
        invitation_id: InvitationId,
        identities: Vec<Identity>,
    },
    ApproveInvite {
        appointment_id: AppointmentId,
        invitation_id: InvitationId,
    },
    DenyInvite {
        appointment_id: AppointmentId,
        invitation_id: InvitationId,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Schedule { .. } => OperationKind::Schedule,
            Self::Unschedule { .. } => OperationKind::Unschedule,
            Self::Move { .. } => OperationKind::Move,
            Self::InviteMembers { .. } => OperationKind::InviteMembers,
            Self::UninviteMembers { .. } => OperationKind::UninviteMembers,
            Self::ApproveInvite { .. } => OperationKind::ApproveInvite,
            Self::DenyInvite { .. } => OperationKind::DenyInvite,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// The fact a committed operation established.
///
/// Records carry everything needed to re-apply them without re-running the
/// guards, which is what makes journal replay deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Scheduled {
        appointment: Appointment,
        invitations: Vec<Invitation>,
    },
    Unscheduled {
        id: AppointmentId,
        owner: Identity,
    },
    Moved {
        id: AppointmentId,
        from: Timestamp,
        to: Timestamp,
    },
    Invited {
        appointment_id: AppointmentId,
        invitations: Vec<Invitation>,
    },
    Uninvited {
        appointment_id: AppointmentId,
        invitation: Invitation,
    },
    Answered {
        appointment_id: AppointmentId,
        invitation_id: InvitationId,
        invitee: Identity,
        status: InvitationStatus,
    },
}

impl Record {
    /// The appointment this record is about.
    pub fn appointment_id(&self) -> AppointmentId {
        match self {
            Self::Scheduled { appointment, .. } => appointment.id,
            Self::Unscheduled { id, .. } | Self::Moved { id, .. } => *id,
            Self::Invited { appointment_id, .. }
            | Self::Uninvited { appointment_id, .. }
            | Self::Answered { appointment_id, .. } => *appointment_id,
        }
    }

    /// Notifications subscribers see for this record.
    ///
    /// Invitation batches fan out to one notification per invitation; the
    /// invitations created alongside a new appointment are carried by the
    /// record and reported only through `AppointmentCreated`.
    pub fn notifications(&self) -> Vec<Notification> {
        match self {
            Self::Scheduled { appointment, .. } => vec![Notification::AppointmentCreated {
                id: appointment.id,
                owner: appointment.owner.clone(),
                from: appointment.from,
                to: appointment.to,
            }],
            Self::Unscheduled { id, owner } => vec![Notification::AppointmentUnscheduled {
                id: *id,
                owner: owner.clone(),
            }],
            Self::Moved { id, from, to } => vec![Notification::AppointmentMoved {
                id: *id,
                from: *from,
                to: *to,
            }],
            Self::Invited {
                appointment_id,
                invitations,
            } => invitations
                .iter()
                .map(|inv| Notification::MemberInvited {
                    appointment_id: *appointment_id,
                    invitation_id: inv.id,
                    invitee: inv.invitee.clone(),
                })
                .collect(),
            Self::Uninvited {
                appointment_id,
                invitation,
            } => vec![Notification::MemberUninvited {
                appointment_id: *appointment_id,
                invitation_id: invitation.id,
                invitee: invitation.invitee.clone(),
            }],
            Self::Answered {
                appointment_id,
                invitation_id,
                invitee,
                status,
            } => match status {
                InvitationStatus::Approved => vec![Notification::InvitationApproved {
                    appointment_id: *appointment_id,
                    invitation_id: *invitation_id,
                    invitee: invitee.clone(),
                }],
                InvitationStatus::Denied => vec![Notification::InvitationDenied {
                    appointment_id: *appointment_id,
                    invitation_id: *invitation_id,
                    invitee: invitee.clone(),
                }],
                InvitationStatus::Pending => vec![],
            },
        }
    }
}

// ---------------------------------------------------------------------------
// JournalEntry / Receipt
// ---------------------------------------------------------------------------

/// One committed record, as written to the journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the ledger, starting at 1 with no gaps.
    pub seq: u64,
    /// Who performed the operation.
    pub caller: Identity,
    /// Execution time the guards evaluated against.
    pub at: Timestamp,
    pub record: Record,
}

/// What a successful mutation hands back to its caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub entry: JournalEntry,
    pub notifications: Vec<Notification>,
}

impl Receipt {
    pub fn seq(&self) -> u64 {
        self.entry.seq
    }

    pub fn record(&self) -> &Record {
        &self.entry.record
    }

    pub fn appointment_id(&self) -> AppointmentId {
        self.entry.record.appointment_id()
    }

    /// Invitations created by this mutation, in creation order.
    pub fn invitation_ids(&self) -> Vec<InvitationId> {
        match &self.entry.record {
            Record::Scheduled { invitations, .. } | Record::Invited { invitations, .. } => {
                invitations.iter().map(|inv| inv.id).collect()
            }
            _ => vec![],
        }
    }

    /// The window a move committed.
    pub fn moved_window(&self) -> Option<(Timestamp, Timestamp)> {
        match &self.entry.record {
            Record::Moved { from, to, .. } => Some((*from, *to)),
            _ => None,
        }
    }

    /// The invitation as this answer left it.
    pub fn answered(&self) -> Option<Invitation> {
        match &self.entry.record {
            Record::Answered {
                appointment_id,
                invitation_id,
                invitee,
                status,
            } => Some(Invitation {
                id: *invitation_id,
                appointment_id: *appointment_id,
                invitee: invitee.clone(),
                status: *status,
            }),
            _ => None,
        }
    }
}
