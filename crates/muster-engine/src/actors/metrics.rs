//! Engine metrics.
//!
//! Shared between the actor system (which updates values) and whatever
//! observes the engine (health reporting, tests). All fields are atomic
//! for lock-free concurrent access.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Live counters for the sign-up engine.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Sign-ups currently open across all tenants.
    open_signups: AtomicU32,
    /// Members across all open sign-ups.
    members: AtomicU32,
    /// Total actor messages processed.
    messages_processed: AtomicU64,
    /// Total per-surface delivery failures (posts and updates).
    mirror_failures: AtomicU64,
}

/// Snapshot of engine metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub open_signups: u32,
    pub members: u32,
    pub messages_processed: u64,
    pub mirror_failures: u64,
}

impl EngineMetrics {
    /// Create zeroed metrics behind an `Arc` for sharing across actors.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn signup_opened(&self) {
        self.open_signups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn signup_closed(&self) {
        let _ = self
            .open_signups
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                v.checked_sub(1)
            });
    }

    pub fn member_joined(&self) {
        self.members.fetch_add(1, Ordering::Relaxed);
    }

    pub fn member_left(&self) {
        let _ = self
            .members
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// Account for a whole member set being discarded on close.
    pub fn members_discarded(&self, count: usize) {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        let _ = self
            .members
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v.saturating_sub(count))
            });
    }

    pub fn record_message_processed(&self) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mirror_failures(&self, count: usize) {
        if count > 0 {
            self.mirror_failures
                .fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    /// Current values, read together for reporting.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            open_signups: self.open_signups.load(Ordering::Relaxed),
            members: self.members.load(Ordering::Relaxed),
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            mirror_failures: self.mirror_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn open_close_cycle_balances() {
        let metrics = EngineMetrics::new();
        metrics.signup_opened();
        metrics.signup_opened();
        metrics.signup_closed();
        assert_eq!(metrics.snapshot().open_signups, 1);
    }

    #[test]
    fn close_never_underflows() {
        let metrics = EngineMetrics::new();
        metrics.signup_closed();
        assert_eq!(metrics.snapshot().open_signups, 0);
    }

    #[test]
    fn member_counters_track_discard() {
        let metrics = EngineMetrics::new();
        metrics.member_joined();
        metrics.member_joined();
        metrics.member_joined();
        metrics.member_left();
        metrics.members_discarded(2);
        assert_eq!(metrics.snapshot().members, 0);
    }

    #[test]
    fn mirror_failures_accumulate() {
        let metrics = EngineMetrics::new();
        metrics.record_mirror_failures(0);
        metrics.record_mirror_failures(2);
        metrics.record_mirror_failures(1);
        assert_eq!(metrics.snapshot().mirror_failures, 3);
    }
}
