use tracing::debug;

use agenda_types::Notification;

use crate::error::LedgerError;
use crate::records::JournalEntry;
use crate::state::AgendaState;

/// Result of replaying a journal into state.
#[derive(Clone, Debug)]
pub struct ReplayResult {
    pub state: AgendaState,
    /// Sequence number of the last applied entry, 0 for an empty journal.
    pub last_seq: u64,
    pub applied: u64,
    /// Notifications re-derived from the journal, in commit order.
    pub notifications: Vec<Notification>,
}

/// Deterministic replay of journal entries.
///
/// Entries are applied as recorded facts; guards are not re-run, so an
/// entry committed before its appointment expired still replays after it.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Rebuild state from the genesis of a journal.
    pub fn replay(entries: &[JournalEntry]) -> Result<ReplayResult, LedgerError> {
        Self::replay_onto(AgendaState::new(), 0, entries)
    }

    /// Apply `entries` on top of `state`, which must reflect everything up to
    /// and including `after_seq`.
    pub fn replay_onto(
        mut state: AgendaState,
        after_seq: u64,
        entries: &[JournalEntry],
    ) -> Result<ReplayResult, LedgerError> {
        let mut last_seq = after_seq;
        let mut notifications = Vec::new();

        for entry in entries {
            let expected = last_seq + 1;
            if entry.seq != expected {
                return Err(LedgerError::integrity(
                    entry.seq,
                    format!("expected seq {expected}, found {}", entry.seq),
                ));
            }
            state.apply(entry.seq, &entry.record)?;
            notifications.extend(entry.record.notifications());
            last_seq = entry.seq;
        }

        let applied = last_seq - after_seq;
        debug!(applied, last_seq, "journal replayed");
        Ok(ReplayResult {
            state,
            last_seq,
            applied,
            notifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use agenda_types::{
        Appointment, AppointmentId, Identity, Invitation, InvitationId, InvitationStatus,
        Timestamp,
    };

    use super::*;
    use crate::records::Record;

    fn who(seed: u8) -> Identity {
        Identity::from_raw([seed; 32])
    }

    fn entry(seq: u64, record: Record) -> JournalEntry {
        JournalEntry {
            seq,
            caller: who(1),
            at: Timestamp(seq),
            record,
        }
    }

    fn scheduled(id: u64, invitees: &[Identity]) -> Record {
        let id = AppointmentId(id);
        Record::Scheduled {
            appointment: Appointment {
                id,
                owner: who(1),
                from: Timestamp(10),
                to: Timestamp(20),
                recurring: false,
                invitees: invitees.to_vec(),
            },
            invitations: invitees
                .iter()
                .enumerate()
                .map(|(i, inv)| Invitation::pending(id, InvitationId(i as u64 + 1), inv.clone()))
                .collect(),
        }
    }

    #[test]
    fn replay_rebuilds_tables_and_notifications() {
        let entries = vec![
            entry(1, scheduled(1, &[who(2)])),
            entry(
                2,
                Record::Answered {
                    appointment_id: AppointmentId(1),
                    invitation_id: InvitationId(1),
                    invitee: who(2),
                    status: InvitationStatus::Approved,
                },
            ),
            entry(3, scheduled(2, &[])),
            entry(
                4,
                Record::Unscheduled {
                    id: AppointmentId(2),
                    owner: who(1),
                },
            ),
        ];

        let result = ReplayEngine::replay(&entries).unwrap();
        assert_eq!(result.last_seq, 4);
        assert_eq!(result.applied, 4);
        assert_eq!(result.notifications.len(), 4);
        assert_eq!(result.state.appointment_count(), 1);
        assert_eq!(result.state.next_appointment_id(), AppointmentId(3));
        assert_eq!(
            result
                .state
                .invitation(AppointmentId(1), InvitationId(1))
                .map(|inv| inv.status),
            Some(InvitationStatus::Approved)
        );
    }

    #[test]
    fn replay_empty_journal() {
        let result = ReplayEngine::replay(&[]).unwrap();
        assert_eq!(result.last_seq, 0);
        assert_eq!(result.applied, 0);
        assert!(result.notifications.is_empty());
        assert_eq!(result.state.appointment_count(), 0);
    }

    #[test]
    fn replay_refuses_sequence_gap() {
        let entries = vec![entry(1, scheduled(1, &[])), entry(3, scheduled(2, &[]))];
        let err = ReplayEngine::replay(&entries).unwrap_err();
        assert!(matches!(err, LedgerError::IntegrityViolation { seq: 3, .. }));
    }

    #[test]
    fn replay_refuses_inconsistent_record() {
        let entries = vec![entry(
            1,
            Record::Moved {
                id: AppointmentId(1),
                from: Timestamp(1),
                to: Timestamp(2),
            },
        )];
        assert!(ReplayEngine::replay(&entries).is_err());
    }

    #[test]
    fn replay_onto_continues_from_prefix() {
        let prefix = ReplayEngine::replay(&[entry(1, scheduled(1, &[]))]).unwrap();
        let rest = ReplayEngine::replay_onto(prefix.state, 1, &[entry(2, scheduled(2, &[]))])
            .unwrap();
        assert_eq!(rest.applied, 1);
        assert_eq!(rest.state.appointment_count(), 2);
    }
}
