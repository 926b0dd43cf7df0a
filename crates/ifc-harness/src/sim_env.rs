//! Virtual clock.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use ifc_core::Environment;

/// Simulation environment with a manually advanced clock.
///
/// Clones share the clock, so a test can hold one handle and advance time
/// seen by every component built from another.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    elapsed_nanos: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .elapsed_nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| Some(now.saturating_add(nanos)));
    }
}

impl Environment for SimEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new();
        let other = env.clone();
        env.advance(Duration::from_millis(1500));
        assert_eq!(other.now(), Duration::from_millis(1500));
    }

    #[test]
    fn advance_saturates() {
        let env = SimEnv::new();
        env.advance(Duration::MAX);
        env.advance(Duration::from_secs(1));
        assert_eq!(env.now(), Duration::from_nanos(u64::MAX));
    }
}
