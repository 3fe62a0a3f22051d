use std::collections::{BTreeMap, HashMap};

use agenda_gate::{GateError, Gatekeeper, Subject};
use agenda_types::{
    Appointment, AppointmentId, CallContext, Identity, Invitation, InvitationId, InvitationStatus,
};

use crate::error::LedgerError;
use crate::records::{Operation, Record};

/// The three shared tables plus their id counters.
///
/// `AgendaState` is a pure state machine: [`prepare`](Self::prepare) runs
/// the guards and computes the [`Record`] an operation would commit without
/// touching anything, and [`apply`](Self::apply) writes a record in. Keeping
/// the two apart is what lets a failed operation leave no trace, not even a
/// consumed id.
#[derive(Clone, Debug)]
pub struct AgendaState {
    pub(crate) appointments: BTreeMap<AppointmentId, Appointment>,
    pub(crate) invitations: BTreeMap<(AppointmentId, InvitationId), Invitation>,
    /// Last invitation id handed out per live appointment.
    pub(crate) invitation_seq: HashMap<AppointmentId, InvitationId>,
    pub(crate) owner_index: HashMap<Identity, Vec<AppointmentId>>,
    pub(crate) next_appointment: AppointmentId,
}

impl Default for AgendaState {
    fn default() -> Self {
        Self {
            appointments: BTreeMap::new(),
            invitations: BTreeMap::new(),
            invitation_seq: HashMap::new(),
            owner_index: HashMap::new(),
            next_appointment: AppointmentId::FIRST,
        }
    }
}

impl AgendaState {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Reads ----

    pub fn appointment(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments.get(&id)
    }

    /// Appointments created by `owner`, in creation order.
    pub fn appointments_of(&self, owner: &Identity) -> Vec<&Appointment> {
        self.owner_index
            .get(owner)
            .map(|ids| ids.iter().filter_map(|id| self.appointments.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn invitation(&self, appointment: AppointmentId, id: InvitationId) -> Option<&Invitation> {
        self.invitations.get(&(appointment, id))
    }

    /// Invitations of one appointment, ordered by invitation id.
    pub fn invitations_of(&self, appointment: AppointmentId) -> Vec<&Invitation> {
        self.invitations
            .range((appointment, InvitationId(0))..=(appointment, InvitationId(u64::MAX)))
            .map(|(_, inv)| inv)
            .collect()
    }

    pub fn appointment_count(&self) -> usize {
        self.appointments.len()
    }

    pub fn invitation_count(&self) -> usize {
        self.invitations.len()
    }

    /// The id the next `schedule` will receive.
    pub fn next_appointment_id(&self) -> AppointmentId {
        self.next_appointment
    }

    fn next_invitation_id(&self, appointment: AppointmentId) -> InvitationId {
        self.invitation_seq
            .get(&appointment)
            .map(|last| last.next())
            .unwrap_or(InvitationId::FIRST)
    }

    // ---- Prepare ----

    /// Check `operation` against the guards and compute its record.
    ///
    /// Never mutates. Every refusal is reported here, so an `Ok` record is
    /// guaranteed to apply cleanly to this exact state.
    pub fn prepare(
        &self,
        gates: &Gatekeeper,
        ctx: &CallContext,
        operation: &Operation,
    ) -> Result<Record, LedgerError> {
        let kind = operation.kind();
        match operation {
            Operation::Schedule {
                from,
                to,
                invitees,
                recurring,
            } => {
                gates.check(kind, &Subject::window(*from, *to), ctx)?;
                let id = self.next_appointment;
                let invitations = Self::pending_batch(id, InvitationId::FIRST, invitees);
                Ok(Record::Scheduled {
                    appointment: Appointment {
                        id,
                        owner: ctx.caller.clone(),
                        from: *from,
                        to: *to,
                        recurring: *recurring,
                        invitees: invitees.clone(),
                    },
                    invitations,
                })
            }
            Operation::Unschedule { id } => {
                let appointment = self.appointments.get(id);
                gates.check(kind, &Subject::appointment(*id, appointment), ctx)?;
                Ok(Record::Unscheduled {
                    id: *id,
                    owner: ctx.caller.clone(),
                })
            }
            Operation::Move { id, from, to } => {
                let subject =
                    Subject::appointment(*id, self.appointments.get(id)).with_window(*from, *to);
                gates.check(kind, &subject, ctx)?;
                Ok(Record::Moved {
                    id: *id,
                    from: *from,
                    to: *to,
                })
            }
            Operation::InviteMembers {
                appointment_id,
                identities,
            } => {
                let subject =
                    Subject::appointment(*appointment_id, self.appointments.get(appointment_id));
                gates.check(kind, &subject, ctx)?;
                let first = self.next_invitation_id(*appointment_id);
                Ok(Record::Invited {
                    appointment_id: *appointment_id,
                    invitations: Self::pending_batch(*appointment_id, first, identities),
                })
            }
            Operation::UninviteMembers {
                appointment_id,
                invitation_id,
                identities,
            } => {
                let invitation = self.invitation(*appointment_id, *invitation_id);
                let subject =
                    Subject::appointment(*appointment_id, self.appointments.get(appointment_id))
                        .with_invitation(*invitation_id, invitation);
                gates.check(kind, &subject, ctx)?;
                // The listed identities confirm who the invitation is for; an
                // invitation addressed to someone not listed is not a match.
                match invitation {
                    Some(inv) if identities.contains(&inv.invitee) => Ok(Record::Uninvited {
                        appointment_id: *appointment_id,
                        invitation: inv.clone(),
                    }),
                    _ => Err(GateError::InvitationNotFound {
                        appointment: *appointment_id,
                        invitation: *invitation_id,
                    }
                    .into()),
                }
            }
            Operation::ApproveInvite {
                appointment_id,
                invitation_id,
            }
            | Operation::DenyInvite {
                appointment_id,
                invitation_id,
            } => {
                let invitation = self.invitation(*appointment_id, *invitation_id);
                let subject =
                    Subject::appointment(*appointment_id, self.appointments.get(appointment_id))
                        .with_invitation(*invitation_id, invitation);
                gates.check(kind, &subject, ctx)?;
                let status = if matches!(operation, Operation::ApproveInvite { .. }) {
                    InvitationStatus::Approved
                } else {
                    InvitationStatus::Denied
                };
                Ok(Record::Answered {
                    appointment_id: *appointment_id,
                    invitation_id: *invitation_id,
                    invitee: ctx.caller.clone(),
                    status,
                })
            }
        }
    }

    fn pending_batch(
        appointment: AppointmentId,
        first: InvitationId,
        identities: &[Identity],
    ) -> Vec<Invitation> {
        identities
            .iter()
            .enumerate()
            .map(|(offset, who)| {
                Invitation::pending(
                    appointment,
                    InvitationId(first.get() + offset as u64),
                    who.clone(),
                )
            })
            .collect()
    }

    // ---- Apply ----

    /// Write a record into the tables.
    ///
    /// Every consistency check runs before the first write, so an error
    /// leaves the state untouched. `seq` is only used for error reporting.
    pub fn apply(&mut self, seq: u64, record: &Record) -> Result<(), LedgerError> {
        match record {
            Record::Scheduled {
                appointment,
                invitations,
            } => {
                if self.appointments.contains_key(&appointment.id)
                    || appointment.id < self.next_appointment
                {
                    return Err(LedgerError::integrity(
                        seq,
                        format!("appointment id {} reused", appointment.id),
                    ));
                }
                if appointment.from >= appointment.to {
                    return Err(LedgerError::integrity(seq, "scheduled window is empty"));
                }
                self.check_batch(seq, appointment.id, InvitationId::FIRST, invitations)?;

                let id = appointment.id;
                self.next_appointment = id.next();
                self.owner_index
                    .entry(appointment.owner.clone())
                    .or_default()
                    .push(id);
                self.appointments.insert(id, appointment.clone());
                self.insert_batch(id, invitations);
            }
            Record::Unscheduled { id, owner } => {
                let appointment = self.existing(seq, *id)?;
                if appointment.owner != *owner {
                    return Err(LedgerError::integrity(
                        seq,
                        format!("appointment {id} unscheduled by non-owner"),
                    ));
                }
                self.appointments.remove(id);
                if let Some(ids) = self.owner_index.get_mut(owner) {
                    ids.retain(|candidate| candidate != id);
                    if ids.is_empty() {
                        self.owner_index.remove(owner);
                    }
                }
                let keys: Vec<_> = self
                    .invitations
                    .range((*id, InvitationId(0))..=(*id, InvitationId(u64::MAX)))
                    .map(|(key, _)| *key)
                    .collect();
                for key in keys {
                    self.invitations.remove(&key);
                }
                self.invitation_seq.remove(id);
            }
            Record::Moved { id, from, to } => {
                self.existing(seq, *id)?;
                if from >= to {
                    return Err(LedgerError::integrity(seq, "moved window is empty"));
                }
                if let Some(appointment) = self.appointments.get_mut(id) {
                    appointment.from = *from;
                    appointment.to = *to;
                }
            }
            Record::Invited {
                appointment_id,
                invitations,
            } => {
                self.existing(seq, *appointment_id)?;
                let first = self.next_invitation_id(*appointment_id);
                self.check_batch(seq, *appointment_id, first, invitations)?;
                self.insert_batch(*appointment_id, invitations);
            }
            Record::Uninvited {
                appointment_id,
                invitation,
            } => {
                self.existing(seq, *appointment_id)?;
                let key = (*appointment_id, invitation.id);
                if !self.invitations.contains_key(&key) {
                    return Err(LedgerError::integrity(
                        seq,
                        format!("invitation {} not present on {appointment_id}", invitation.id),
                    ));
                }
                self.invitations.remove(&key);
            }
            Record::Answered {
                appointment_id,
                invitation_id,
                invitee,
                status,
            } => {
                self.existing(seq, *appointment_id)?;
                match self.invitations.get_mut(&(*appointment_id, *invitation_id)) {
                    Some(inv) if inv.invitee == *invitee => inv.status = *status,
                    _ => {
                        return Err(LedgerError::integrity(
                            seq,
                            format!(
                                "answer for unknown invitation {invitation_id} on {appointment_id}"
                            ),
                        ))
                    }
                }
            }
        }
        Ok(())
    }

    fn existing(&self, seq: u64, id: AppointmentId) -> Result<&Appointment, LedgerError> {
        self.appointments
            .get(&id)
            .ok_or_else(|| LedgerError::integrity(seq, format!("appointment {id} not present")))
    }

    fn check_batch(
        &self,
        seq: u64,
        appointment: AppointmentId,
        first: InvitationId,
        invitations: &[Invitation],
    ) -> Result<(), LedgerError> {
        for (offset, inv) in invitations.iter().enumerate() {
            let expected = InvitationId(first.get() + offset as u64);
            if inv.appointment_id != appointment || inv.id != expected {
                return Err(LedgerError::integrity(
                    seq,
                    format!("invitation {} out of sequence, expected {expected}", inv.id),
                ));
            }
        }
        Ok(())
    }

    fn insert_batch(&mut self, appointment: AppointmentId, invitations: &[Invitation]) {
        for inv in invitations {
            self.invitations.insert((appointment, inv.id), inv.clone());
        }
        if let Some(last) = invitations.last() {
            self.invitation_seq.insert(appointment, last.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_gate::DenialKind;
    use agenda_types::Timestamp;

    fn who(seed: u8) -> Identity {
        Identity::from_raw([seed; 32])
    }

    fn ctx(seed: u8, now: u64) -> CallContext {
        CallContext::new(who(seed), Timestamp(now))
    }

    fn schedule(from: u64, to: u64) -> Operation {
        Operation::Schedule {
            from: Timestamp(from),
            to: Timestamp(to),
            invitees: vec![],
            recurring: false,
        }
    }

    fn run(state: &mut AgendaState, ctx: &CallContext, op: Operation) -> Result<Record, LedgerError> {
        let gates = Gatekeeper::standard();
        let record = state.prepare(&gates, ctx, &op)?;
        state.apply(0, &record)?;
        Ok(record)
    }

    #[test]
    fn prepare_does_not_consume_ids() {
        let state = AgendaState::new();
        let gates = Gatekeeper::standard();
        state.prepare(&gates, &ctx(1, 0), &schedule(10, 20)).unwrap();
        assert!(state.prepare(&gates, &ctx(1, 0), &schedule(20, 10)).is_err());
        assert_eq!(state.next_appointment_id(), AppointmentId(1));
    }

    #[test]
    fn invitation_ids_continue_per_appointment() {
        let mut state = AgendaState::new();
        run(&mut state, &ctx(1, 0), Operation::Schedule {
            from: Timestamp(10),
            to: Timestamp(20),
            invitees: vec![who(2)],
            recurring: false,
        })
        .unwrap();
        run(&mut state, &ctx(1, 0), schedule(10, 20)).unwrap();

        let record = run(&mut state, &ctx(1, 0), Operation::InviteMembers {
            appointment_id: AppointmentId(1),
            identities: vec![who(3), who(3)],
        })
        .unwrap();
        let Record::Invited { invitations, .. } = record else {
            panic!("expected invited record");
        };
        assert_eq!(invitations[0].id, InvitationId(2));
        assert_eq!(invitations[1].id, InvitationId(3));

        // The second appointment numbers its own invitations from 1.
        let record = run(&mut state, &ctx(1, 0), Operation::InviteMembers {
            appointment_id: AppointmentId(2),
            identities: vec![who(4)],
        })
        .unwrap();
        assert!(matches!(
            record,
            Record::Invited { ref invitations, .. } if invitations[0].id == InvitationId(1)
        ));
    }

    #[test]
    fn unschedule_removes_invitations_and_index_entry() {
        let mut state = AgendaState::new();
        run(&mut state, &ctx(1, 0), Operation::Schedule {
            from: Timestamp(10),
            to: Timestamp(20),
            invitees: vec![who(2), who(3)],
            recurring: false,
        })
        .unwrap();
        assert_eq!(state.invitation_count(), 2);

        run(&mut state, &ctx(1, 0), Operation::Unschedule { id: AppointmentId(1) }).unwrap();
        assert_eq!(state.invitation_count(), 0);
        assert!(state.appointments_of(&who(1)).is_empty());
        assert!(state.appointment(AppointmentId(1)).is_none());
        // Ids are never reused.
        assert_eq!(state.next_appointment_id(), AppointmentId(2));
    }

    #[test]
    fn uninvite_requires_listed_identity() {
        let mut state = AgendaState::new();
        run(&mut state, &ctx(1, 0), Operation::Schedule {
            from: Timestamp(10),
            to: Timestamp(20),
            invitees: vec![who(2)],
            recurring: false,
        })
        .unwrap();

        let err = run(&mut state, &ctx(1, 0), Operation::UninviteMembers {
            appointment_id: AppointmentId(1),
            invitation_id: InvitationId(1),
            identities: vec![who(3)],
        })
        .unwrap_err();
        assert_eq!(err.denial(), Some(DenialKind::NotFound));
        assert_eq!(state.invitation_count(), 1);
    }

    #[test]
    fn apply_rejects_answer_for_missing_invitation_without_writing() {
        let mut state = AgendaState::new();
        run(&mut state, &ctx(1, 0), schedule(10, 20)).unwrap();
        let err = state
            .apply(
                5,
                &Record::Answered {
                    appointment_id: AppointmentId(1),
                    invitation_id: InvitationId(1),
                    invitee: who(2),
                    status: InvitationStatus::Approved,
                },
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::IntegrityViolation { seq: 5, .. }));
    }

    #[test]
    fn apply_rejects_reused_appointment_id() {
        let mut state = AgendaState::new();
        let record = run(&mut state, &ctx(1, 0), schedule(10, 20)).unwrap();
        assert!(state.apply(2, &record).is_err());
        assert_eq!(state.appointment_count(), 1);
    }
}
