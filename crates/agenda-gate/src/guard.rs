use agenda_types::{Appointment, AppointmentId, CallContext, Invitation, InvitationId, Timestamp};

use crate::error::GateError;

// ---------------------------------------------------------------------------
// OperationKind
// ---------------------------------------------------------------------------

/// The mutating operations the gate knows a guard pipeline for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Schedule,
    Unschedule,
    Move,
    InviteMembers,
    UninviteMembers,
    ApproveInvite,
    DenyInvite,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Unschedule => "unschedule",
            Self::Move => "move",
            Self::InviteMembers => "invite_members",
            Self::UninviteMembers => "uninvite_members",
            Self::ApproveInvite => "approve_invite",
            Self::DenyInvite => "deny_invite",
        }
    }
}

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// What an operation is about, as looked up by the ledger before any guard
/// runs.
///
/// An id that was requested but not found is recorded as `Some(id)` with a
/// `None` record, which is how the existence guards tell "not requested"
/// from "requested and missing".
#[derive(Clone, Debug, Default)]
pub struct Subject<'a> {
    pub appointment_id: Option<AppointmentId>,
    pub appointment: Option<&'a Appointment>,
    pub invitation_id: Option<InvitationId>,
    pub invitation: Option<&'a Invitation>,
    /// The `(from, to)` window being written, for schedule and move.
    pub window: Option<(Timestamp, Timestamp)>,
}

impl<'a> Subject<'a> {
    /// Subject for an operation that only writes a new window.
    pub fn window(from: Timestamp, to: Timestamp) -> Self {
        Self {
            window: Some((from, to)),
            ..Default::default()
        }
    }

    /// Subject for an operation addressed to an appointment.
    pub fn appointment(id: AppointmentId, record: Option<&'a Appointment>) -> Self {
        Self {
            appointment_id: Some(id),
            appointment: record,
            ..Default::default()
        }
    }

    pub fn with_invitation(mut self, id: InvitationId, record: Option<&'a Invitation>) -> Self {
        self.invitation_id = Some(id);
        self.invitation = record;
        self
    }

    pub fn with_window(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.window = Some((from, to));
        self
    }
}

// ---------------------------------------------------------------------------
// Guard trait
// ---------------------------------------------------------------------------

/// A single check in a gate pipeline.
///
/// Guards never mutate anything. A guard that finds nothing to check in the
/// subject passes.
pub trait Guard: Send + Sync {
    /// Short name used in logs (e.g. "ownership").
    fn name(&self) -> &'static str;

    fn check(&self, subject: &Subject<'_>, ctx: &CallContext) -> Result<(), GateError>;
}
