//! Wall-clock access.
//!
//! Cache expiry and inventory timestamps read the time through [`Clock`] so
//! tests can move it by hand.

use std::time::SystemTime;

/// Source of the current time.
///
/// # Example
///
/// ```
/// use devconf::time::{Clock, SystemClock, unix_seconds};
///
/// let now = SystemClock.now();
/// assert!(unix_seconds(now) > 0);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// Clock backed by [`SystemTime::now()`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Seconds since the Unix epoch; times before the epoch map to `0`.
#[must_use]
pub fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    struct ManualClock {
        secs: AtomicU64,
    }

    impl ManualClock {
        const fn at(secs: u64) -> Self {
            Self {
                secs: AtomicU64::new(secs),
            }
        }

        fn advance(&self, secs: u64) {
            self.secs.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH + Duration::from_secs(self.secs.load(Ordering::SeqCst))
        }
    }

    #[test]
    fn system_clock_is_monotone_enough() {
        let before = SystemTime::now();
        let now = SystemClock.now();

        assert!(now >= before);
    }

    #[test]
    fn clocks_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SystemClock>();
        assert_send_sync::<ManualClock>();
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at(100);
        clock.advance(50);

        assert_eq!(unix_seconds(clock.now()), 150);
    }

    #[test]
    fn pre_epoch_times_clamp_to_zero() {
        let early = SystemTime::UNIX_EPOCH - Duration::from_secs(10);

        assert_eq!(unix_seconds(early), 0);
    }
}
