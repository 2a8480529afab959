use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Which kind of refresh a cycle performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// Re-init, clear, whole-frame write. Removes ghosting.
    Full,
    /// Changed-region write against the reference frame.
    Partial,
}

impl RefreshKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshKind::Full => "full",
            RefreshKind::Partial => "partial",
        }
    }
}

impl fmt::Display for RefreshKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last-refresh bookkeeping.
///
/// A full refresh resets both timestamps; a partial refresh resets only the
/// quick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    last_quick: Instant,
    last_full: Instant,
    quick_interval: Duration,
    full_interval: Duration,
}

impl RefreshSchedule {
    /// Both timestamps start at `start`, so nothing is due until one quick
    /// interval has passed.
    pub fn new(quick_interval: Duration, full_interval: Duration, start: Instant) -> Self {
        Self {
            last_quick: start,
            last_full: start,
            quick_interval,
            full_interval,
        }
    }

    /// The refresh due at `now`, if any. Full takes precedence.
    pub fn due(&self, now: Instant) -> Option<RefreshKind> {
        if now.saturating_duration_since(self.last_full) >= self.full_interval {
            Some(RefreshKind::Full)
        } else if now.saturating_duration_since(self.last_quick) >= self.quick_interval {
            Some(RefreshKind::Partial)
        } else {
            None
        }
    }

    /// Record a completed refresh performed at `at`.
    pub fn record(&mut self, kind: RefreshKind, at: Instant) {
        self.last_quick = at;
        if kind == RefreshKind::Full {
            self.last_full = at;
        }
    }

    pub fn last_quick(&self) -> Instant {
        self.last_quick
    }

    pub fn last_full(&self) -> Instant {
        self.last_full
    }

    pub fn quick_interval(&self) -> Duration {
        self.quick_interval
    }

    pub fn full_interval(&self) -> Duration {
        self.full_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUICK: Duration = Duration::from_secs(15);
    const FULL: Duration = Duration::from_secs(1800);

    #[test]
    fn test_nothing_due_before_first_quick_interval() {
        let start = Instant::now();
        let schedule = RefreshSchedule::new(QUICK, FULL, start);

        assert_eq!(schedule.due(start), None);
        assert_eq!(schedule.due(start + Duration::from_secs(14)), None);
        assert_eq!(
            schedule.due(start + QUICK),
            Some(RefreshKind::Partial)
        );
    }

    #[test]
    fn test_full_takes_precedence() {
        let start = Instant::now();
        let schedule = RefreshSchedule::new(QUICK, FULL, start);
        assert_eq!(schedule.due(start + FULL), Some(RefreshKind::Full));
    }

    #[test]
    fn test_full_refresh_resets_both_timestamps() {
        let start = Instant::now();
        for offset in [0u64, 15, 900, 1799, 1800, 5000] {
            let mut schedule = RefreshSchedule::new(QUICK, FULL, start);
            schedule.record(RefreshKind::Partial, start + Duration::from_secs(3));
            let at = start + Duration::from_secs(offset);

            schedule.record(RefreshKind::Full, at);

            assert_eq!(schedule.last_full(), at);
            assert_eq!(schedule.last_quick(), at);
        }
    }

    #[test]
    fn test_partial_refresh_resets_only_quick() {
        let start = Instant::now();
        for offset in [15u64, 30, 1799, 4000] {
            let mut schedule = RefreshSchedule::new(QUICK, FULL, start);
            let at = start + Duration::from_secs(offset);

            schedule.record(RefreshKind::Partial, at);

            assert_eq!(schedule.last_quick(), at);
            assert_eq!(schedule.last_full(), start);
        }
    }

    #[test]
    fn test_partial_cadence_after_partial() {
        let start = Instant::now();
        let mut schedule = RefreshSchedule::new(QUICK, FULL, start);
        let t15 = start + QUICK;
        schedule.record(RefreshKind::Partial, t15);

        assert_eq!(schedule.due(t15 + Duration::from_secs(10)), None);
        assert_eq!(schedule.due(t15 + QUICK), Some(RefreshKind::Partial));
    }
}
