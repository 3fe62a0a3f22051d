use std::sync::Arc;

use tracing::{info, warn};

use agenda_fabric::{
    EventFilter, EventStream, FabricConfig, FabricEvent, NotificationFabric, WalConfig,
    WriteAheadLog,
};
use agenda_ledger::{
    AgendaReader, AgendaWriter, InMemoryAgenda, JournalEntry, Operation, Receipt, ReplayEngine,
    ValidationReport,
};
use agenda_types::{
    Appointment, AppointmentId, CallContext, Clock, Identity, Invitation, InvitationId,
    SystemClock, Timestamp,
};

use crate::config::AgendaConfig;
use crate::error::SdkResult;
use crate::hooks::{FabricHook, JournalHook};

/// What opening a journal found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenReport {
    /// Journal entries replayed into the ledger.
    pub replayed: u64,
    /// Complete frames dropped for failing their checksum.
    pub skipped_frames: u64,
    /// Bytes of torn tail cut from the journal.
    pub truncated_bytes: u64,
}

/// Result of [`Agenda::verify`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    pub ledger: ValidationReport,
    /// Notification sequence numbers whose integrity hash does not verify.
    pub damaged_notifications: Vec<u64>,
    pub head_seq: u64,
    pub notification_head: u64,
}

impl VerifyReport {
    pub fn is_valid(&self) -> bool {
        self.ledger.is_valid() && self.damaged_notifications.is_empty()
    }
}

/// High-level Agenda API.
///
/// Ties the ledger to its journal, its notification fabric and a clock.
/// Callers name themselves with an [`Identity`]; the execution time comes
/// from the clock.
pub struct Agenda {
    ledger: InMemoryAgenda,
    fabric: Arc<NotificationFabric>,
    journal: Option<Arc<WriteAheadLog<JournalEntry>>>,
    clock: Arc<dyn Clock>,
    config: AgendaConfig,
    open_report: OpenReport,
}

impl Agenda {
    /// An agenda with no journal, timed by the system clock in seconds.
    pub fn in_memory() -> Self {
        let config = AgendaConfig::default();
        let clock = Arc::new(SystemClock::new(config.time_unit));
        Self::assemble(InMemoryAgenda::new(), None, clock, config, OpenReport::default())
    }

    /// Open the agenda `config` describes, timed by the system clock.
    pub fn open(config: AgendaConfig) -> SdkResult<Self> {
        let clock = Arc::new(SystemClock::new(config.time_unit));
        Self::open_with_clock(config, clock)
    }

    /// Open the agenda `config` describes, replaying its journal if it has one.
    pub fn open_with_clock(config: AgendaConfig, clock: Arc<dyn Clock>) -> SdkResult<Self> {
        let Some(path) = config.journal_path.clone() else {
            return Ok(Self::assemble(
                InMemoryAgenda::new(),
                None,
                clock,
                config,
                OpenReport::default(),
            ));
        };

        let wal = WriteAheadLog::<JournalEntry>::open(
            &path,
            WalConfig {
                sync_mode: config.sync_mode,
                ..WalConfig::default()
            },
        )?;
        let scan = wal.scan()?;
        let mut report = OpenReport {
            skipped_frames: scan.skipped,
            ..OpenReport::default()
        };
        if scan.has_torn_tail() {
            report.truncated_bytes = scan.file_len - scan.valid_len;
            warn!(
                path = %path.display(),
                bytes = report.truncated_bytes,
                "dropping torn journal tail"
            );
            wal.truncate_to(scan.valid_len)?;
        }

        let replay = ReplayEngine::replay(&scan.entries)?;
        report.replayed = replay.applied;
        let notifications = replay.notifications.clone();
        let ledger = InMemoryAgenda::from_replay(replay);

        let agenda = Self::assemble(ledger, Some(Arc::new(wal)), clock, config, report);
        agenda.fabric.restore(notifications)?;
        info!(
            path = %path.display(),
            replayed = agenda.open_report.replayed,
            "agenda opened"
        );
        Ok(agenda)
    }

    fn assemble(
        ledger: InMemoryAgenda,
        journal: Option<Arc<WriteAheadLog<JournalEntry>>>,
        clock: Arc<dyn Clock>,
        config: AgendaConfig,
        open_report: OpenReport,
    ) -> Self {
        let fabric = Arc::new(NotificationFabric::new(FabricConfig {
            channel_capacity: config.channel_capacity,
        }));
        let mut ledger = ledger;
        if let Some(wal) = &journal {
            ledger = ledger.with_hook(Arc::new(JournalHook::new(wal.clone())));
        }
        ledger = ledger.with_hook(Arc::new(FabricHook::new(fabric.clone())));

        Self {
            ledger,
            fabric,
            journal,
            clock,
            config,
            open_report,
        }
    }

    // ---- Context ----

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// `caller` acting at the clock's current time.
    pub fn context(&self, caller: &Identity) -> CallContext {
        CallContext::at_clock(caller.clone(), self.clock.as_ref())
    }

    // ---- Mutations ----

    /// Run any operation as `caller` now.
    pub fn execute(&self, caller: &Identity, operation: Operation) -> SdkResult<Receipt> {
        Ok(self.ledger.execute(&self.context(caller), operation)?)
    }

    pub fn schedule(
        &self,
        caller: &Identity,
        from: Timestamp,
        to: Timestamp,
        invitees: Vec<Identity>,
        recurring: bool,
    ) -> SdkResult<AppointmentId> {
        Ok(self
            .ledger
            .schedule(&self.context(caller), from, to, invitees, recurring)?)
    }

    pub fn unschedule(&self, caller: &Identity, id: AppointmentId) -> SdkResult<()> {
        Ok(self.ledger.unschedule(&self.context(caller), id)?)
    }

    pub fn move_appointment(
        &self,
        caller: &Identity,
        id: AppointmentId,
        from: Timestamp,
        to: Timestamp,
    ) -> SdkResult<()> {
        Ok(self
            .ledger
            .move_appointment(&self.context(caller), id, from, to)?)
    }

    pub fn invite_members(
        &self,
        caller: &Identity,
        id: AppointmentId,
        identities: Vec<Identity>,
    ) -> SdkResult<Vec<InvitationId>> {
        Ok(self
            .ledger
            .invite_members(&self.context(caller), id, identities)?)
    }

    pub fn uninvite_members(
        &self,
        caller: &Identity,
        id: AppointmentId,
        invitation: InvitationId,
        identities: Vec<Identity>,
    ) -> SdkResult<()> {
        Ok(self
            .ledger
            .uninvite_members(&self.context(caller), id, invitation, identities)?)
    }

    pub fn approve_invite(
        &self,
        caller: &Identity,
        id: AppointmentId,
        invitation: InvitationId,
    ) -> SdkResult<()> {
        Ok(self
            .ledger
            .approve_invite(&self.context(caller), id, invitation)?)
    }

    pub fn deny_invite(
        &self,
        caller: &Identity,
        id: AppointmentId,
        invitation: InvitationId,
    ) -> SdkResult<()> {
        Ok(self.ledger.deny_invite(&self.context(caller), id, invitation)?)
    }

    // ---- Reads ----

    pub fn appointment(&self, id: AppointmentId) -> SdkResult<Appointment> {
        Ok(self.ledger.appointment(id)?)
    }

    pub fn appointments_of(&self, owner: &Identity) -> SdkResult<Vec<Appointment>> {
        Ok(self.ledger.appointments_of(owner)?)
    }

    /// The owner's appointments whose window is still open now.
    pub fn upcoming_of(&self, owner: &Identity) -> SdkResult<Vec<Appointment>> {
        Ok(self.ledger.upcoming_of(owner, self.now())?)
    }

    pub fn invitations(&self, id: AppointmentId) -> SdkResult<Vec<Invitation>> {
        Ok(self.ledger.invitations(id)?)
    }

    pub fn invitation(&self, id: AppointmentId, invitation: InvitationId) -> SdkResult<Invitation> {
        Ok(self.ledger.invitation(id, invitation)?)
    }

    pub fn appointment_count(&self) -> SdkResult<usize> {
        Ok(self.ledger.appointment_count()?)
    }

    /// Sequence number of the last committed operation.
    pub fn head_seq(&self) -> SdkResult<u64> {
        Ok(self.ledger.head_seq()?)
    }

    // ---- Notifications ----

    /// Notifications published after sequence number `after`.
    pub fn notifications_since(&self, after: u64) -> SdkResult<Vec<FabricEvent>> {
        Ok(self.fabric.since(after)?)
    }

    pub fn notifications_matching(
        &self,
        after: u64,
        filter: &EventFilter,
    ) -> SdkResult<Vec<FabricEvent>> {
        Ok(self.fabric.since_matching(after, filter)?)
    }

    pub fn subscribe(&self, filter: EventFilter) -> SdkResult<EventStream> {
        Ok(self.fabric.subscribe(filter)?)
    }

    // ---- Maintenance ----

    pub fn verify(&self) -> SdkResult<VerifyReport> {
        Ok(VerifyReport {
            ledger: self.ledger.validate()?,
            damaged_notifications: self.fabric.verify()?,
            head_seq: self.ledger.head_seq()?,
            notification_head: self.fabric.head_seq()?,
        })
    }

    pub fn open_report(&self) -> &OpenReport {
        &self.open_report
    }

    pub fn is_durable(&self) -> bool {
        self.journal.is_some()
    }

    pub fn config(&self) -> &AgendaConfig {
        &self.config
    }

    pub fn ledger(&self) -> &InMemoryAgenda {
        &self.ledger
    }

    pub fn fabric(&self) -> &Arc<NotificationFabric> {
        &self.fabric
    }
}
