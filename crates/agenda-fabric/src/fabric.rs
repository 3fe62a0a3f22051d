use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;
use tracing::debug;

use agenda_types::{AppointmentId, Identity, Notification, NotificationKind};

use crate::error::{FabricError, Result};
use crate::event::FabricEvent;

/// Filter for subscribing to a subset of notifications.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only notifications of these kinds are delivered.
    pub kinds: Option<Vec<NotificationKind>>,
    /// If set, only notifications about these appointments are delivered.
    pub appointments: Option<Vec<AppointmentId>>,
    /// If set, only notifications naming one of these identities (as owner
    /// or invitee) are delivered.
    pub identities: Option<Vec<Identity>>,
}

impl EventFilter {
    pub fn kinds(kinds: impl IntoIterator<Item = NotificationKind>) -> Self {
        Self {
            kinds: Some(kinds.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn appointment(id: AppointmentId) -> Self {
        Self {
            appointments: Some(vec![id]),
            ..Default::default()
        }
    }

    pub fn identity(identity: Identity) -> Self {
        Self {
            identities: Some(vec![identity]),
            ..Default::default()
        }
    }

    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &FabricEvent) -> bool {
        let notification = &event.notification;
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&notification.kind()) {
                return false;
            }
        }
        if let Some(ref appointments) = self.appointments {
            if !appointments.contains(&notification.appointment_id()) {
                return false;
            }
        }
        if let Some(ref identities) = self.identities {
            if !notification
                .identities()
                .into_iter()
                .any(|who| identities.contains(who))
            {
                return false;
            }
        }
        true
    }
}

/// A broadcast channel receiver for fabric events.
pub type EventStream = broadcast::Receiver<FabricEvent>;

struct Subscriber {
    filter: EventFilter,
    sender: broadcast::Sender<FabricEvent>,
}

/// Fan-out router that delivers events to matching subscribers.
struct EventRouter {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventRouter {
    fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    fn subscribe(&self, filter: EventFilter, capacity: usize) -> Result<EventStream> {
        let (tx, rx) = broadcast::channel(capacity);
        self.subscribers
            .write()
            .map_err(|_| FabricError::LockPoisoned)?
            .push(Subscriber { filter, sender: tx });
        Ok(rx)
    }

    /// Route an event to all matching subscribers, pruning closed channels.
    fn route(&self, event: &FabricEvent) -> Result<usize> {
        let mut subs = self
            .subscribers
            .write()
            .map_err(|_| FabricError::LockPoisoned)?;
        let mut delivered = 0;
        subs.retain(|sub| {
            if sub.filter.matches(event) {
                let sent = sub.sender.send(event.clone()).is_ok();
                if sent {
                    delivered += 1;
                }
                sent
            } else {
                sub.sender.receiver_count() > 0
            }
        });
        Ok(delivered)
    }

    fn subscriber_count(&self) -> Result<usize> {
        Ok(self
            .subscribers
            .read()
            .map_err(|_| FabricError::LockPoisoned)?
            .len())
    }
}

/// Configuration for the [`NotificationFabric`].
#[derive(Clone, Debug)]
pub struct FabricConfig {
    /// Capacity of per-subscriber broadcast channels.
    pub channel_capacity: usize,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Sequenced notification log with filtered live delivery.
///
/// Every published notification is stamped with the next sequence number,
/// appended to an in-memory log that pollers read with [`since`](Self::since),
/// and routed to matching subscribers. The log itself is rebuilt from the
/// journal on startup with [`restore`](Self::restore).
pub struct NotificationFabric {
    log: RwLock<Vec<FabricEvent>>,
    router: EventRouter,
    config: FabricConfig,
}

impl NotificationFabric {
    pub fn new(config: FabricConfig) -> Self {
        Self {
            log: RwLock::new(Vec::new()),
            router: EventRouter::new(),
            config,
        }
    }

    /// Publish one notification.
    pub fn publish(&self, notification: Notification) -> Result<FabricEvent> {
        let mut log = self.write_log()?;
        self.stamp_and_route(&mut log, notification)
    }

    /// Publish a batch of notifications in order.
    pub fn publish_all(&self, notifications: &[Notification]) -> Result<Vec<FabricEvent>> {
        let mut log = self.write_log()?;
        notifications
            .iter()
            .map(|notification| self.stamp_and_route(&mut log, notification.clone()))
            .collect()
    }

    // Routing happens under the log lock so subscribers observe log order.
    fn stamp_and_route(
        &self,
        log: &mut Vec<FabricEvent>,
        notification: Notification,
    ) -> Result<FabricEvent> {
        let event = FabricEvent::new(log.len() as u64 + 1, notification);
        log.push(event.clone());
        let delivered = self.router.route(&event)?;
        debug!(seq = event.seq, kind = %event.kind(), delivered, "notification published");
        Ok(event)
    }

    /// Append notifications to the log without routing them.
    pub fn restore(&self, notifications: Vec<Notification>) -> Result<()> {
        let mut log = self.write_log()?;
        let count = notifications.len();
        for notification in notifications {
            let seq = log.len() as u64 + 1;
            log.push(FabricEvent::new(seq, notification));
        }
        debug!(count, head = log.len(), "notification log restored");
        Ok(())
    }

    /// Events with a sequence number greater than `after`, in order.
    pub fn since(&self, after: u64) -> Result<Vec<FabricEvent>> {
        let log = self.read_log()?;
        let start = (after as usize).min(log.len());
        Ok(log[start..].to_vec())
    }

    /// Events after `after` that match `filter`.
    pub fn since_matching(&self, after: u64, filter: &EventFilter) -> Result<Vec<FabricEvent>> {
        Ok(self
            .since(after)?
            .into_iter()
            .filter(|event| filter.matches(event))
            .collect())
    }

    /// Sequence number of the newest event, 0 when the log is empty.
    pub fn head_seq(&self) -> Result<u64> {
        Ok(self.read_log()?.len() as u64)
    }

    /// Subscribe to future events matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> Result<EventStream> {
        self.router.subscribe(filter, self.config.channel_capacity)
    }

    pub fn subscriber_count(&self) -> Result<usize> {
        self.router.subscriber_count()
    }

    /// Sequence numbers of logged events whose integrity hash does not verify.
    pub fn verify(&self) -> Result<Vec<u64>> {
        Ok(self
            .read_log()?
            .iter()
            .filter(|event| !event.verify_integrity())
            .map(|event| event.seq)
            .collect())
    }

    fn read_log(&self) -> Result<RwLockReadGuard<'_, Vec<FabricEvent>>> {
        self.log.read().map_err(|_| FabricError::LockPoisoned)
    }

    fn write_log(&self) -> Result<RwLockWriteGuard<'_, Vec<FabricEvent>>> {
        self.log.write().map_err(|_| FabricError::LockPoisoned)
    }
}

impl Default for NotificationFabric {
    fn default() -> Self {
        Self::new(FabricConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_types::{InvitationId, Timestamp};

    fn who(seed: u8) -> Identity {
        Identity::from_raw([seed; 32])
    }

    fn created(id: u64, owner: u8) -> Notification {
        Notification::AppointmentCreated {
            id: AppointmentId(id),
            owner: who(owner),
            from: Timestamp(1),
            to: Timestamp(2),
        }
    }

    fn invited(id: u64, invitee: u8) -> Notification {
        Notification::MemberInvited {
            appointment_id: AppointmentId(id),
            invitation_id: InvitationId(1),
            invitee: who(invitee),
        }
    }

    #[test]
    fn publish_assigns_consecutive_sequence_numbers() {
        let fabric = NotificationFabric::default();
        let events = fabric
            .publish_all(&[created(1, 1), invited(1, 2), invited(1, 3)])
            .unwrap();
        assert_eq!(events.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(fabric.head_seq().unwrap(), 3);
        assert_eq!(fabric.publish(created(2, 1)).unwrap().seq, 4);
    }

    #[test]
    fn since_returns_tail_of_log() {
        let fabric = NotificationFabric::default();
        fabric
            .publish_all(&[created(1, 1), created(2, 1), created(3, 1)])
            .unwrap();
        let tail = fabric.since(1).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].seq, 2);
        assert!(fabric.since(3).unwrap().is_empty());
        assert!(fabric.since(99).unwrap().is_empty());
        assert_eq!(fabric.since(0).unwrap().len(), 3);
    }

    #[test]
    fn subscriber_receives_matching_events() {
        let fabric = NotificationFabric::default();
        let mut stream = fabric
            .subscribe(EventFilter::kinds([NotificationKind::MemberInvited]))
            .unwrap();
        assert_eq!(fabric.subscriber_count().unwrap(), 1);

        fabric.publish(created(1, 1)).unwrap();
        fabric.publish(invited(1, 2)).unwrap();

        let received = stream.try_recv().unwrap();
        assert_eq!(received.kind(), NotificationKind::MemberInvited);
        assert_eq!(received.seq, 2);
        assert!(stream.try_recv().is_err());
    }

    #[test]
    fn identity_filter_matches_owner_and_invitee() {
        let fabric = NotificationFabric::default();
        let mut stream = fabric.subscribe(EventFilter::identity(who(2))).unwrap();

        fabric.publish(created(1, 1)).unwrap();
        fabric.publish(invited(1, 2)).unwrap();
        fabric.publish(created(2, 2)).unwrap();

        assert_eq!(stream.try_recv().unwrap().seq, 2);
        assert_eq!(stream.try_recv().unwrap().seq, 3);
        assert!(stream.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let fabric = NotificationFabric::default();
        let stream = fabric.subscribe(EventFilter::default()).unwrap();
        drop(stream);
        fabric.publish(created(1, 1)).unwrap();
        assert_eq!(fabric.subscriber_count().unwrap(), 0);
    }

    #[test]
    fn restore_fills_log_without_delivery() {
        let fabric = NotificationFabric::default();
        let mut stream = fabric.subscribe(EventFilter::default()).unwrap();
        fabric.restore(vec![created(1, 1), created(2, 1)]).unwrap();

        assert!(stream.try_recv().is_err());
        assert_eq!(fabric.head_seq().unwrap(), 2);
        assert_eq!(fabric.publish(created(3, 1)).unwrap().seq, 3);
        assert_eq!(stream.try_recv().unwrap().seq, 3);
    }

    #[test]
    fn since_matching_filters_by_appointment() {
        let fabric = NotificationFabric::default();
        fabric
            .publish_all(&[created(1, 1), created(2, 1), invited(1, 3)])
            .unwrap();
        let events = fabric
            .since_matching(0, &EventFilter::appointment(AppointmentId(1)))
            .unwrap();
        assert_eq!(events.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn verify_reports_no_damage_for_published_log() {
        let fabric = NotificationFabric::default();
        fabric.publish_all(&[created(1, 1), invited(1, 2)]).unwrap();
        assert!(fabric.verify().unwrap().is_empty());
    }

    #[tokio::test]
    async fn async_subscriber_receives_in_order() {
        let fabric = NotificationFabric::default();
        let mut stream = fabric.subscribe(EventFilter::default()).unwrap();
        fabric.publish_all(&[created(1, 1), created(2, 1)]).unwrap();

        assert_eq!(stream.recv().await.unwrap().seq, 1);
        assert_eq!(stream.recv().await.unwrap().seq, 2);
    }

    #[test]
    fn concurrent_publish_keeps_sequence_dense() {
        use std::sync::Arc;
        use std::thread;

        let fabric = Arc::new(NotificationFabric::default());
        let mut handles = Vec::new();
        for owner in 0u8..4 {
            let fabric = Arc::clone(&fabric);
            handles.push(thread::spawn(move || {
                for id in 0..25 {
                    fabric.publish(created(id, owner)).unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let log = fabric.since(0).unwrap();
        assert_eq!(log.len(), 100);
        assert!(log.iter().enumerate().all(|(i, e)| e.seq == i as u64 + 1));
    }
}
