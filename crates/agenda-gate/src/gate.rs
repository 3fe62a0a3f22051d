use tracing::debug;

use agenda_types::CallContext;

use crate::error::GateError;
use crate::guard::{Guard, OperationKind, Subject};
use crate::guards::{
    AppointmentExists, InvitationExists, InviteeOnly, OpenWindow, OwnerOnly, ValidWindow,
};

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// An ordered pipeline of guards.
///
/// Evaluation is **fail-fast**: the first guard that refuses stops the
/// pipeline, and its error is the operation's error. Because guards are
/// ordered existence → ownership → temporal → range, a caller always learns
/// about the most fundamental problem first.
pub struct Gate {
    stages: Vec<Box<dyn Guard>>,
}

impl Gate {
    /// An empty pipeline; it passes everything.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// The standard pipeline for one operation.
    pub fn for_operation(kind: OperationKind) -> Self {
        let mut gate = Self::new();
        match kind {
            OperationKind::Schedule => {
                gate.add_stage(Box::new(ValidWindow));
            }
            OperationKind::Unschedule => {
                gate.add_stage(Box::new(AppointmentExists));
                gate.add_stage(Box::new(OwnerOnly));
            }
            OperationKind::Move => {
                gate.add_stage(Box::new(AppointmentExists));
                gate.add_stage(Box::new(OwnerOnly));
                gate.add_stage(Box::new(OpenWindow));
                gate.add_stage(Box::new(ValidWindow));
            }
            OperationKind::InviteMembers => {
                gate.add_stage(Box::new(AppointmentExists));
                gate.add_stage(Box::new(OwnerOnly));
                gate.add_stage(Box::new(OpenWindow));
            }
            OperationKind::UninviteMembers => {
                gate.add_stage(Box::new(AppointmentExists));
                gate.add_stage(Box::new(OwnerOnly));
                gate.add_stage(Box::new(OpenWindow));
                gate.add_stage(Box::new(InvitationExists));
            }
            OperationKind::ApproveInvite | OperationKind::DenyInvite => {
                gate.add_stage(Box::new(AppointmentExists));
                gate.add_stage(Box::new(InvitationExists));
                gate.add_stage(Box::new(InviteeOnly));
            }
        }
        gate
    }

    /// Append a guard to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn Guard>) {
        self.stages.push(stage);
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every guard in order, stopping at the first refusal.
    pub fn check(&self, subject: &Subject<'_>, ctx: &CallContext) -> Result<(), GateError> {
        for stage in &self.stages {
            if let Err(error) = stage.check(subject, ctx) {
                debug!(guard = stage.name(), caller = %ctx.caller, %error, "guard refused");
                return Err(error);
            }
        }
        Ok(())
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Gatekeeper
// ---------------------------------------------------------------------------

/// One prebuilt [`Gate`] per operation.
pub struct Gatekeeper {
    schedule: Gate,
    unschedule: Gate,
    move_: Gate,
    invite: Gate,
    uninvite: Gate,
    approve: Gate,
    deny: Gate,
}

impl Gatekeeper {
    /// The standard pipelines for every operation.
    pub fn standard() -> Self {
        Self {
            schedule: Gate::for_operation(OperationKind::Schedule),
            unschedule: Gate::for_operation(OperationKind::Unschedule),
            move_: Gate::for_operation(OperationKind::Move),
            invite: Gate::for_operation(OperationKind::InviteMembers),
            uninvite: Gate::for_operation(OperationKind::UninviteMembers),
            approve: Gate::for_operation(OperationKind::ApproveInvite),
            deny: Gate::for_operation(OperationKind::DenyInvite),
        }
    }

    pub fn gate(&self, kind: OperationKind) -> &Gate {
        match kind {
            OperationKind::Schedule => &self.schedule,
            OperationKind::Unschedule => &self.unschedule,
            OperationKind::Move => &self.move_,
            OperationKind::InviteMembers => &self.invite,
            OperationKind::UninviteMembers => &self.uninvite,
            OperationKind::ApproveInvite => &self.approve,
            OperationKind::DenyInvite => &self.deny,
        }
    }

    pub fn check(
        &self,
        kind: OperationKind,
        subject: &Subject<'_>,
        ctx: &CallContext,
    ) -> Result<(), GateError> {
        self.gate(kind).check(subject, ctx)
    }
}

impl Default for Gatekeeper {
    fn default() -> Self {
        Self::standard()
    }
}
