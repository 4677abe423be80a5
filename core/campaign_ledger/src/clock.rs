//! Time source for the ledger.
//!
//! Transitions stamp records with `Clock::now`; tests drive a [`ManualClock`]
//! so that orderings and relative-time labels are deterministic.

use std::fmt::Debug;

use chrono::{DateTime, Utc};

pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "testutils"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "testutils"))]
mod manual {
    use std::sync::atomic::{AtomicI64, Ordering};

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::Clock;

    /// A clock that only moves when told to.
    #[derive(Debug)]
    pub struct ManualClock {
        millis: AtomicI64,
    }

    impl ManualClock {
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                millis: AtomicI64::new(start.timestamp_millis()),
            }
        }

        /// 2024-01-01T00:00:00Z.
        pub fn epoch() -> Self {
            Self::new(Utc.timestamp_opt(1_704_067_200, 0).single().unwrap_or_default())
        }

        pub fn advance(&self, by: Duration) {
            self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
        }

        pub fn set(&self, at: DateTime<Utc>) {
            self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            let millis = self.millis.load(Ordering::SeqCst);
            Utc.timestamp_millis_opt(millis)
                .single()
                .unwrap_or_else(Utc::now)
        }
    }
}
