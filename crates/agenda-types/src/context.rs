use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::temporal::{Clock, Timestamp};

/// Invocation context threaded through every ledger operation.
///
/// `caller` is the only authorization credential. `now` is the execution
/// time the temporal guard compares against; it is fixed for the whole
/// operation so every guard sees the same instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Identity,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Identity, now: Timestamp) -> Self {
        Self { caller, now }
    }

    /// Context stamped with the clock's current reading.
    pub fn at_clock(caller: Identity, clock: &dyn Clock) -> Self {
        Self {
            caller,
            now: clock.now(),
        }
    }
}
