use agenda_types::CallContext;

use crate::error::GateError;
use crate::guard::{Guard, Subject};

/// Refuses structural edits once the appointment's window has closed.
///
/// The comparison is against `ctx.now`, so every guard in one evaluation
/// sees the same instant.
pub struct OpenWindow;

impl Guard for OpenWindow {
    fn name(&self) -> &'static str {
        "open_window"
    }

    fn check(&self, subject: &Subject<'_>, ctx: &CallContext) -> Result<(), GateError> {
        match subject.appointment {
            Some(appt) if appt.is_past_at(ctx.now) => Err(GateError::Expired(appt.id)),
            _ => Ok(()),
        }
    }
}
