use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// An opaque point in time.
///
/// The unit is fixed per deployment (see [`TimeUnit`]); the ledger only ever
/// compares timestamps, it never does arithmetic on them.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The zero timestamp.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Raw value in deployment units.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Returns `true` if this timestamp is strictly before `other`.
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    /// Returns `true` if this timestamp is strictly after `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    /// This timestamp moved forward by `units`, saturating at `u64::MAX`.
    pub fn plus(self, units: u64) -> Self {
        Self(self.0.saturating_add(units))
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unit in which a deployment expresses timestamps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Millis,
}

impl FromStr for TimeUnit {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seconds" | "s" => Ok(Self::Seconds),
            "millis" | "ms" => Ok(Self::Millis),
            other => Err(TypeError::UnknownTimeUnit(other.to_string())),
        }
    }
}

/// Source of the current execution time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock reading time since the UNIX epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock {
    unit: TimeUnit,
}

impl SystemClock {
    pub fn new(unit: TimeUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        match self.unit {
            TimeUnit::Seconds => Timestamp(elapsed.as_secs()),
            TimeUnit::Millis => Timestamp(elapsed.as_millis() as u64),
        }
    }
}

/// A clock that only moves when told to.
///
/// Used by tests to step past an appointment's window, and by the CLI's
/// `--at` override.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start.0),
        }
    }

    /// Jump to an absolute time. Moving backwards is allowed.
    pub fn set(&self, at: Timestamp) {
        self.now.store(at.0, Ordering::SeqCst);
    }

    /// Move forward by `units` and return the new time.
    pub fn advance(&self, units: u64) -> Timestamp {
        let previous = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(units))
            })
            .unwrap_or_else(|t| t);
        Timestamp(previous.saturating_add(units))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_numeric() {
        let a = Timestamp(100);
        let b = Timestamp(200);
        assert!(a.is_before(&b));
        assert!(b.is_after(&a));
        assert!(!a.is_after(&a));
    }

    #[test]
    fn system_clock_produces_reasonable_timestamp() {
        // After 2020-01-01.
        assert!(SystemClock::new(TimeUnit::Seconds).now().0 > 1_577_836_800);
        assert!(SystemClock::new(TimeUnit::Millis).now().0 > 1_577_836_800_000);
    }

    #[test]
    fn manual_clock_advances_and_sets() {
        let clock = ManualClock::new(Timestamp(10));
        assert_eq!(clock.now(), Timestamp(10));
        assert_eq!(clock.advance(5), Timestamp(15));
        assert_eq!(clock.now(), Timestamp(15));
        clock.set(Timestamp(3));
        assert_eq!(clock.now(), Timestamp(3));
    }

    #[test]
    fn plus_saturates() {
        assert_eq!(Timestamp(u64::MAX).plus(1), Timestamp(u64::MAX));
    }

    #[test]
    fn time_unit_parses() {
        assert_eq!("ms".parse::<TimeUnit>().unwrap(), TimeUnit::Millis);
        assert_eq!("seconds".parse::<TimeUnit>().unwrap(), TimeUnit::Seconds);
        assert!("fortnights".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", Timestamp(1000)), "1000");
    }
}
