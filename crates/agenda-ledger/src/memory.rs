use std::sync::{Arc, RwLock};

use tracing::debug;

use agenda_gate::{GateError, Gatekeeper};
use agenda_types::{Appointment, AppointmentId, CallContext, Identity, Invitation, InvitationId};

use crate::error::LedgerError;
use crate::records::{JournalEntry, Operation, Receipt};
use crate::replay::ReplayResult;
use crate::state::AgendaState;
use crate::traits::{AgendaReader, AgendaWriter, CommitHook};
use crate::validation::{ConsistencyValidator, ValidationReport};

/// In-memory agenda: the state machine behind one single-writer lock.
///
/// All mutations take the write lock for their whole prepare → hook → apply
/// sequence, so operations are strictly serialized and no reader ever sees a
/// half-applied record.
pub struct InMemoryAgenda {
    gates: Gatekeeper,
    inner: RwLock<Inner>,
    hooks: Vec<Arc<dyn CommitHook>>,
}

struct Inner {
    state: AgendaState,
    seq: u64,
}

impl InMemoryAgenda {
    pub fn new() -> Self {
        Self::from_parts(AgendaState::new(), 0)
    }

    /// Resume from a replayed journal.
    pub fn from_replay(result: ReplayResult) -> Self {
        Self::from_parts(result.state, result.last_seq)
    }

    fn from_parts(state: AgendaState, seq: u64) -> Self {
        Self {
            gates: Gatekeeper::standard(),
            inner: RwLock::new(Inner { state, seq }),
            hooks: Vec::new(),
        }
    }

    /// Register a hook. Hooks run in registration order.
    pub fn with_hook(mut self, hook: Arc<dyn CommitHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Replace the guard pipelines.
    pub fn with_gatekeeper(mut self, gates: Gatekeeper) -> Self {
        self.gates = gates;
        self
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> Result<AgendaState, LedgerError> {
        Ok(self.read()?.state.clone())
    }

    /// Check the cross-table invariants of the current state.
    pub fn validate(&self) -> Result<ValidationReport, LedgerError> {
        let inner = self.read()?;
        Ok(ConsistencyValidator::validate(&inner.state))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, LedgerError> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }
}

impl Default for InMemoryAgenda {
    fn default() -> Self {
        Self::new()
    }
}

impl AgendaWriter for InMemoryAgenda {
    fn execute(&self, ctx: &CallContext, operation: Operation) -> Result<Receipt, LedgerError> {
        let mut inner = self.inner.write().map_err(|_| LedgerError::LockPoisoned)?;
        let kind = operation.kind();

        let record = match inner.state.prepare(&self.gates, ctx, &operation) {
            Ok(record) => record,
            Err(error) => {
                debug!(operation = kind.name(), caller = %ctx.caller, %error, "operation rejected");
                return Err(error);
            }
        };

        let entry = JournalEntry {
            seq: inner.seq + 1,
            caller: ctx.caller.clone(),
            at: ctx.now,
            record,
        };
        for hook in &self.hooks {
            hook.pre_commit(&entry)?;
        }

        inner.state.apply(entry.seq, &entry.record)?;
        inner.seq = entry.seq;

        let notifications = entry.record.notifications();
        let receipt = Receipt {
            entry,
            notifications,
        };
        debug!(
            operation = kind.name(),
            seq = receipt.seq(),
            appointment = %receipt.appointment_id(),
            notifications = receipt.notifications.len(),
            "operation committed"
        );

        for hook in &self.hooks {
            hook.post_commit(&receipt);
        }
        Ok(receipt)
    }
}

impl AgendaReader for InMemoryAgenda {
    fn appointment(&self, id: AppointmentId) -> Result<Appointment, LedgerError> {
        self.read()?
            .state
            .appointment(id)
            .cloned()
            .ok_or(GateError::AppointmentNotFound(id).into())
    }

    fn appointments_of(&self, owner: &Identity) -> Result<Vec<Appointment>, LedgerError> {
        Ok(self
            .read()?
            .state
            .appointments_of(owner)
            .into_iter()
            .cloned()
            .collect())
    }

    fn invitations(&self, appointment: AppointmentId) -> Result<Vec<Invitation>, LedgerError> {
        let inner = self.read()?;
        if inner.state.appointment(appointment).is_none() {
            return Err(GateError::AppointmentNotFound(appointment).into());
        }
        Ok(inner
            .state
            .invitations_of(appointment)
            .into_iter()
            .cloned()
            .collect())
    }

    fn invitation(
        &self,
        appointment: AppointmentId,
        invitation: InvitationId,
    ) -> Result<Invitation, LedgerError> {
        let inner = self.read()?;
        if inner.state.appointment(appointment).is_none() {
            return Err(GateError::AppointmentNotFound(appointment).into());
        }
        inner
            .state
            .invitation(appointment, invitation)
            .cloned()
            .ok_or(
                GateError::InvitationNotFound {
                    appointment,
                    invitation,
                }
                .into(),
            )
    }

    fn appointment_count(&self) -> Result<usize, LedgerError> {
        Ok(self.read()?.state.appointment_count())
    }

    fn head_seq(&self) -> Result<u64, LedgerError> {
        Ok(self.read()?.seq)
    }
}
