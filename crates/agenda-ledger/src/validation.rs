use std::collections::HashSet;

use agenda_types::AppointmentId;

use crate::state::AgendaState;

/// Result of a consistency check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub appointment_count: u64,
    pub invitation_count: u64,
    pub indexed_owners: u64,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific inconsistency between the tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub appointment: AppointmentId,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// An owner index entry points at a missing appointment.
    DanglingIndexEntry,
    /// An appointment is missing from, or listed twice in, its owner's index.
    IndexMismatch,
    /// An appointment is listed under an identity that does not own it.
    WrongOwner,
    /// An invitation refers to an appointment that no longer exists.
    OrphanedInvitation,
    /// An invitation id is at or beyond the appointment's counter.
    InvitationAheadOfCounter,
    EmptyWindow,
    /// An appointment id at or beyond the next id to be issued.
    AppointmentAheadOfCounter,
}

/// Cross-table invariant checker.
pub struct ConsistencyValidator;

impl ConsistencyValidator {
    pub fn validate(state: &AgendaState) -> ValidationReport {
        let mut violations = Vec::new();
        let mut push = |appointment, kind, description: String| {
            violations.push(Violation {
                appointment,
                kind,
                description,
            })
        };

        let mut seen = HashSet::new();
        for (owner, ids) in &state.owner_index {
            for id in ids {
                match state.appointments.get(id) {
                    None => push(
                        *id,
                        ViolationKind::DanglingIndexEntry,
                        format!("{owner} lists missing appointment {id}"),
                    ),
                    Some(appt) if appt.owner != *owner => push(
                        *id,
                        ViolationKind::WrongOwner,
                        format!("{id} listed under {owner} but owned by {}", appt.owner),
                    ),
                    Some(_) => {}
                }
                if !seen.insert(*id) {
                    push(
                        *id,
                        ViolationKind::IndexMismatch,
                        format!("{id} indexed more than once"),
                    );
                }
            }
        }

        for (id, appt) in &state.appointments {
            if !seen.contains(id) {
                push(
                    *id,
                    ViolationKind::IndexMismatch,
                    format!("{id} missing from index of {}", appt.owner),
                );
            }
            if appt.from >= appt.to {
                push(
                    *id,
                    ViolationKind::EmptyWindow,
                    format!("{id} has from {} >= to {}", appt.from, appt.to),
                );
            }
            if *id >= state.next_appointment {
                push(
                    *id,
                    ViolationKind::AppointmentAheadOfCounter,
                    format!("{id} not below next id {}", state.next_appointment),
                );
            }
        }

        for ((appointment, invitation), _) in &state.invitations {
            if !state.appointments.contains_key(appointment) {
                push(
                    *appointment,
                    ViolationKind::OrphanedInvitation,
                    format!("invitation {invitation} outlived {appointment}"),
                );
                continue;
            }
            let issued = state.invitation_seq.get(appointment).copied();
            if issued.map_or(true, |last| *invitation > last) {
                push(
                    *appointment,
                    ViolationKind::InvitationAheadOfCounter,
                    format!("invitation {invitation} on {appointment} was never issued"),
                );
            }
        }

        ValidationReport {
            appointment_count: state.appointments.len() as u64,
            invitation_count: state.invitations.len() as u64,
            indexed_owners: state.owner_index.len() as u64,
            violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use agenda_types::{Appointment, Identity, Invitation, InvitationId, Timestamp};

    use super::*;

    fn owner() -> Identity {
        Identity::from_raw([4; 32])
    }

    fn healthy() -> AgendaState {
        let mut state = AgendaState::new();
        let id = AppointmentId(1);
        state.appointments.insert(
            id,
            Appointment {
                id,
                owner: owner(),
                from: Timestamp(1),
                to: Timestamp(2),
                recurring: false,
                invitees: vec![],
            },
        );
        state.owner_index.insert(owner(), vec![id]);
        state.invitations.insert(
            (id, InvitationId(1)),
            Invitation::pending(id, InvitationId(1), Identity::from_raw([5; 32])),
        );
        state.invitation_seq.insert(id, InvitationId(1));
        state.next_appointment = AppointmentId(2);
        state
    }

    #[test]
    fn healthy_state_passes() {
        let report = ConsistencyValidator::validate(&healthy());
        assert!(report.is_valid());
        assert_eq!(report.appointment_count, 1);
        assert_eq!(report.invitation_count, 1);
    }

    #[test]
    fn detects_orphaned_invitation() {
        let mut state = healthy();
        state.appointments.clear();
        state.owner_index.clear();
        let report = ConsistencyValidator::validate(&state);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::OrphanedInvitation);
    }

    #[test]
    fn detects_unindexed_appointment() {
        let mut state = healthy();
        state.owner_index.clear();
        let report = ConsistencyValidator::validate(&state);
        assert!(report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::IndexMismatch));
    }

    #[test]
    fn detects_dangling_and_misfiled_index_entries() {
        let mut state = healthy();
        let stranger = Identity::from_raw([9; 32]);
        state.owner_index.insert(stranger, vec![AppointmentId(1), AppointmentId(7)]);
        let kinds: Vec<_> = ConsistencyValidator::validate(&state)
            .violations
            .into_iter()
            .map(|v| v.kind)
            .collect();
        assert!(kinds.contains(&ViolationKind::WrongOwner));
        assert!(kinds.contains(&ViolationKind::DanglingIndexEntry));
        assert!(kinds.contains(&ViolationKind::IndexMismatch));
    }

    #[test]
    fn detects_reused_counter() {
        let mut state = healthy();
        state.next_appointment = AppointmentId(1);
        let report = ConsistencyValidator::validate(&state);
        assert_eq!(
            report.violations[0].kind,
            ViolationKind::AppointmentAheadOfCounter
        );
    }
}
