//! Environment abstraction for deterministic testing.
//!
//! Decouples coordinator logic from the system clock. The only timed behavior
//! on the bus is the cooperative worker unload, and its deadline must run on a
//! virtual clock in simulation and on `std::time::Instant` in production.

use std::{ops::Sub, time::Duration};

/// Abstract environment providing time.
///
/// # Invariants
///
/// - `now()` never goes backwards within a single execution context.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`; simulation uses a virtual
    /// instant advanced by the test.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;
}

/// Production environment backed by the system monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let env = SystemEnv;
        let first = env.now();
        let second = env.now();
        assert!(second >= first);
    }
}
