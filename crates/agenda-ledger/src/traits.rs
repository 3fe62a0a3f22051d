use agenda_types::{
    Appointment, AppointmentId, CallContext, Identity, Invitation, InvitationId, Timestamp,
};

use crate::error::LedgerError;
use crate::records::{JournalEntry, Operation, Receipt};

/// Read boundary for the agenda.
pub trait AgendaReader: Send + Sync {
    /// The appointment with `id`; `NotFound` if it does not exist.
    fn appointment(&self, id: AppointmentId) -> Result<Appointment, LedgerError>;

    /// Everything `owner` has scheduled and not unscheduled, in creation
    /// order. Empty when the owner has nothing.
    fn appointments_of(&self, owner: &Identity) -> Result<Vec<Appointment>, LedgerError>;

    /// The owner's appointments whose window has not closed at `now`.
    fn upcoming_of(
        &self,
        owner: &Identity,
        now: Timestamp,
    ) -> Result<Vec<Appointment>, LedgerError> {
        Ok(self
            .appointments_of(owner)?
            .into_iter()
            .filter(|a| a.is_editable_at(now))
            .collect())
    }

    /// Invitations of an appointment ordered by id; `NotFound` if the
    /// appointment does not exist.
    fn invitations(&self, appointment: AppointmentId) -> Result<Vec<Invitation>, LedgerError>;

    fn invitation(
        &self,
        appointment: AppointmentId,
        invitation: InvitationId,
    ) -> Result<Invitation, LedgerError>;

    fn appointment_count(&self) -> Result<usize, LedgerError>;

    /// Sequence number of the last committed entry, 0 when empty.
    fn head_seq(&self) -> Result<u64, LedgerError>;
}

/// Write boundary for the agenda.
///
/// Every mutation goes through [`execute`](Self::execute); the named methods
/// are conveniences that build the [`Operation`] and unpack the receipt.
pub trait AgendaWriter: Send + Sync {
    fn execute(&self, ctx: &CallContext, operation: Operation) -> Result<Receipt, LedgerError>;

    fn schedule(
        &self,
        ctx: &CallContext,
        from: Timestamp,
        to: Timestamp,
        invitees: Vec<Identity>,
        recurring: bool,
    ) -> Result<AppointmentId, LedgerError> {
        let receipt = self.execute(
            ctx,
            Operation::Schedule {
                from,
                to,
                invitees,
                recurring,
            },
        )?;
        Ok(receipt.appointment_id())
    }

    fn unschedule(&self, ctx: &CallContext, id: AppointmentId) -> Result<(), LedgerError> {
        self.execute(ctx, Operation::Unschedule { id }).map(|_| ())
    }

    fn move_appointment(
        &self,
        ctx: &CallContext,
        id: AppointmentId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<(), LedgerError> {
        self.execute(ctx, Operation::Move { id, from, to }).map(|_| ())
    }

    fn invite_members(
        &self,
        ctx: &CallContext,
        appointment_id: AppointmentId,
        identities: Vec<Identity>,
    ) -> Result<Vec<InvitationId>, LedgerError> {
        let receipt = self.execute(
            ctx,
            Operation::InviteMembers {
                appointment_id,
                identities,
            },
        )?;
        Ok(receipt.invitation_ids())
    }

    fn uninvite_members(
        &self,
        ctx: &CallContext,
        appointment_id: AppointmentId,
        invitation_id: InvitationId,
        identities: Vec<Identity>,
    ) -> Result<(), LedgerError> {
        self.execute(
            ctx,
            Operation::UninviteMembers {
                appointment_id,
                invitation_id,
                identities,
            },
        )
        .map(|_| ())
    }

    fn approve_invite(
        &self,
        ctx: &CallContext,
        appointment_id: AppointmentId,
        invitation_id: InvitationId,
    ) -> Result<(), LedgerError> {
        self.execute(
            ctx,
            Operation::ApproveInvite {
                appointment_id,
                invitation_id,
            },
        )
        .map(|_| ())
    }

    fn deny_invite(
        &self,
        ctx: &CallContext,
        appointment_id: AppointmentId,
        invitation_id: InvitationId,
    ) -> Result<(), LedgerError> {
        self.execute(
            ctx,
            Operation::DenyInvite {
                appointment_id,
                invitation_id,
            },
        )
        .map(|_| ())
    }
}

/// Observer of the commit path.
///
/// `pre_commit` runs after the guards pass and before the state changes; an
/// error aborts the operation with nothing applied. `post_commit` runs once
/// the state has changed and cannot fail the operation.
pub trait CommitHook: Send + Sync {
    fn pre_commit(&self, _entry: &JournalEntry) -> Result<(), LedgerError> {
        Ok(())
    }

    fn post_commit(&self, _receipt: &Receipt) {}
}
