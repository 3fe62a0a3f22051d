use agenda_types::{AppointmentId, CallContext};

use crate::error::GateError;
use crate::guard::{Guard, Subject};

/// Fails with `NotFound` when a requested appointment is missing.
pub struct AppointmentExists;

impl Guard for AppointmentExists {
    fn name(&self) -> &'static str {
        "appointment_exists"
    }

    fn check(&self, subject: &Subject<'_>, _ctx: &CallContext) -> Result<(), GateError> {
        match (subject.appointment_id, subject.appointment) {
            (Some(id), None) => Err(GateError::AppointmentNotFound(id)),
            _ => Ok(()),
        }
    }
}

/// Fails with `NotFound` when a requested invitation is missing, or when the
/// record found belongs to a different appointment.
pub struct InvitationExists;

impl Guard for InvitationExists {
    fn name(&self) -> &'static str {
        "invitation_exists"
    }

    fn check(&self, subject: &Subject<'_>, _ctx: &CallContext) -> Result<(), GateError> {
        let Some(invitation_id) = subject.invitation_id else {
            return Ok(());
        };
        let appointment = subject.appointment_id.unwrap_or(AppointmentId(0));
        match subject.invitation {
            Some(inv) if inv.appointment_id == appointment && inv.id == invitation_id => Ok(()),
            _ => Err(GateError::InvitationNotFound {
                appointment,
                invitation: invitation_id,
            }),
        }
    }
}
