use agenda_types::{AppointmentId, CallContext};

use crate::error::GateError;
use crate::guard::{Guard, Subject};

/// Only the appointment's owner may pass.
pub struct OwnerOnly;

impl Guard for OwnerOnly {
    fn name(&self) -> &'static str {
        "owner_only"
    }

    fn check(&self, subject: &Subject<'_>, ctx: &CallContext) -> Result<(), GateError> {
        match subject.appointment {
            Some(appt) if !appt.is_owned_by(&ctx.caller) => Err(GateError::NotOwner(appt.id)),
            _ => Ok(()),
        }
    }
}

/// Only the identity an invitation is addressed to may pass.
pub struct InviteeOnly;

impl Guard for InviteeOnly {
    fn name(&self) -> &'static str {
        "invitee_only"
    }

    fn check(&self, subject: &Subject<'_>, ctx: &CallContext) -> Result<(), GateError> {
        match subject.invitation {
            Some(inv) if !inv.is_addressed_to(&ctx.caller) => Err(GateError::NotInvitee {
                appointment: subject.appointment_id.unwrap_or(AppointmentId(0)),
                invitation: inv.id,
            }),
            _ => Ok(()),
        }
    }
}
