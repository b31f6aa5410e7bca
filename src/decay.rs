//! Decay scheduling
//!
//! The scheduler is an explicit, independently schedulable unit: it owns a
//! cadence and delegates the actual decay math to the memory store. Time is
//! always passed in, so tests can simulate arbitrary elapsed spans; embedding
//! hosts that want wall-clock ticks use a [`Clock`].

use crate::memory::TieredMemoryStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default minimum interval between decay passes (seconds)
pub const DEFAULT_DECAY_INTERVAL_SEC: i64 = 3600;

/// Injectable time source
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time source for embedding hosts
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Periodic decay driver for the warning and baseline tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayScheduler {
    /// Minimum interval between passes (seconds)
    interval_sec: i64,
    /// When the last pass ran
    last_run: Option<DateTime<Utc>>,
}

impl Default for DecayScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_INTERVAL_SEC)
    }
}

impl DecayScheduler {
    /// Create a scheduler with the given minimum interval
    pub fn new(interval_sec: i64) -> Self {
        Self {
            interval_sec: interval_sec.max(0),
            last_run: None,
        }
    }

    /// Run a decay pass if the interval has elapsed since the last one.
    ///
    /// Returns whether a pass ran. The first call always runs.
    pub fn run_if_due(&mut self, store: &mut TieredMemoryStore, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_run {
            if now - last < Duration::seconds(self.interval_sec) {
                return false;
            }
        }
        self.run(store, now);
        true
    }

    /// Run a decay pass unconditionally
    pub fn run(&mut self, store: &mut TieredMemoryStore, now: DateTime<Utc>) {
        store.apply_decay(now);
        self.last_run = Some(now);
    }

    /// When the last pass ran, if any
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BehaviorCategory, Interpretation};
    use chrono::TimeZone;

    struct ManualClock {
        at: DateTime<Utc>,
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.at
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_first_call_runs() {
        let mut scheduler = DecayScheduler::default();
        let mut store = TieredMemoryStore::default();

        assert!(scheduler.run_if_due(&mut store, t0()));
        assert_eq!(scheduler.last_run(), Some(t0()));
    }

    #[test]
    fn test_cadence_respected() {
        let mut scheduler = DecayScheduler::new(3600);
        let mut store = TieredMemoryStore::default();

        scheduler.run_if_due(&mut store, t0());
        assert!(!scheduler.run_if_due(&mut store, t0() + Duration::minutes(30)));
        assert!(scheduler.run_if_due(&mut store, t0() + Duration::hours(1)));
    }

    #[test]
    fn test_run_decays_store() {
        let mut scheduler = DecayScheduler::new(0);
        let mut store = TieredMemoryStore::default();
        store.absorb(
            "user",
            &Interpretation::new(BehaviorCategory::Interest, 1.0, 10.0, t0()),
        );

        scheduler.run(&mut store, t0() + Duration::days(7));
        let impression = store.get_impression("user", BehaviorCategory::Interest);
        // One e-fold at the 7-day baseline constant.
        assert!((impression.value - 0.1 * (-1.0_f64).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_injectable_clock() {
        let clock = ManualClock { at: t0() };
        let mut scheduler = DecayScheduler::new(60);
        let mut store = TieredMemoryStore::default();

        assert!(scheduler.run_if_due(&mut store, clock.now()));

        let clock = ManualClock {
            at: t0() + Duration::seconds(59),
        };
        assert!(!scheduler.run_if_due(&mut store, clock.now()));

        let clock = ManualClock {
            at: t0() + Duration::seconds(60),
        };
        assert!(scheduler.run_if_due(&mut store, clock.now()));
    }
}
