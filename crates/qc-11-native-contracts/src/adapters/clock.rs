//! Clock adapters.

use crate::ports::outbound::Clock;
use shared_types::TimePointSec;
use std::sync::atomic::{AtomicU32, Ordering};

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimePointSec {
        TimePointSec::now()
    }
}

/// Clock driven by the caller. Tests use it to cross the escrow deadline.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU32,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: TimePointSec) -> Self {
        Self {
            secs: AtomicU32::new(start.secs()),
        }
    }

    pub fn set(&self, time: TimePointSec) {
        self.secs.store(time.secs(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u32) {
        let _ = self
            .secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(secs))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimePointSec {
        TimePointSec::from_secs(self.secs.load(Ordering::SeqCst))
    }
}
