use std::sync::Arc;

use tracing::warn;

use agenda_fabric::{NotificationFabric, WriteAheadLog};
use agenda_ledger::{CommitHook, JournalEntry, LedgerError, Receipt};

/// Writes every entry to the journal before the ledger applies it.
pub struct JournalHook {
    wal: Arc<WriteAheadLog<JournalEntry>>,
}

impl JournalHook {
    pub fn new(wal: Arc<WriteAheadLog<JournalEntry>>) -> Self {
        Self { wal }
    }
}

impl CommitHook for JournalHook {
    fn pre_commit(&self, entry: &JournalEntry) -> Result<(), LedgerError> {
        self.wal
            .append(entry)
            .map(|_| ())
            .map_err(|e| LedgerError::Journal(e.to_string()))
    }
}

/// Publishes a committed receipt's notifications.
pub struct FabricHook {
    fabric: Arc<NotificationFabric>,
}

impl FabricHook {
    pub fn new(fabric: Arc<NotificationFabric>) -> Self {
        Self { fabric }
    }
}

impl CommitHook for FabricHook {
    fn post_commit(&self, receipt: &Receipt) {
        if let Err(error) = self.fabric.publish_all(&receipt.notifications) {
            warn!(seq = receipt.seq(), %error, "failed to publish notifications");
        }
    }
}
