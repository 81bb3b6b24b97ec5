//! Logical clock supplied to the engine by its host.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::LogicalTime;

pub trait Clock: Send + Sync {
    fn now(&self) -> LogicalTime;
}

/// Wall-clock milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> LogicalTime {
        LogicalTime(chrono::Utc::now().timestamp_millis().max(0) as u64)
    }
}

/// Clock that only moves when told to, for tests and replay.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(start: u64) -> Self { Self(AtomicU64::new(start)) }
    pub fn set(&self, t: u64) { self.0.store(t, Ordering::SeqCst); }
    pub fn advance(&self, by: u64) -> LogicalTime { LogicalTime(self.0.fetch_add(by, Ordering::SeqCst) + by) }
}

impl Clock for ManualClock {
    fn now(&self) -> LogicalTime { LogicalTime(self.0.load(Ordering::SeqCst)) }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> LogicalTime { (**self).now() }
}
