use agenda_types::CallContext;

use crate::error::GateError;
use crate::guard::{Guard, Subject};

/// A window is valid only when `from < to`.
pub struct ValidWindow;

impl Guard for ValidWindow {
    fn name(&self) -> &'static str {
        "valid_window"
    }

    fn check(&self, subject: &Subject<'_>, _ctx: &CallContext) -> Result<(), GateError> {
        match subject.window {
            Some((from, to)) if from >= to => Err(GateError::InvalidRange { from, to }),
            _ => Ok(()),
        }
    }
}
