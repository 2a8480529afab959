use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Alternates between the primary view and the `second=true` view.
///
/// Flips at most once per evaluation, when a full period has passed since
/// the last flip. Independent of the refresh cadence.
#[derive(Debug, Clone)]
pub struct ViewToggle {
    enabled: bool,
    period: Duration,
    showing_second: bool,
    last_flip: Instant,
}

impl ViewToggle {
    pub fn new(enabled: bool, period: Duration, start: Instant) -> Self {
        Self {
            enabled,
            period,
            showing_second: false,
            last_flip: start,
        }
    }

    pub fn disabled(start: Instant) -> Self {
        Self::new(false, Duration::MAX, start)
    }

    /// Whether the second view should be rendered at `now`.
    pub fn second_view(&mut self, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        if now.saturating_duration_since(self.last_flip) >= self.period {
            self.showing_second = !self.showing_second;
            self.last_flip = now;
            debug!(
                event = "core.refresh.view_toggled",
                second_view = self.showing_second,
            );
        }
        self.showing_second
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn showing_second(&self) -> bool {
        self.showing_second
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_secs(300);

    #[test]
    fn test_disabled_never_shows_second() {
        let start = Instant::now();
        let mut toggle = ViewToggle::disabled(start);
        assert!(!toggle.second_view(start + Duration::from_secs(10_000)));
    }

    #[test]
    fn test_flips_every_period() {
        let start = Instant::now();
        let mut toggle = ViewToggle::new(true, PERIOD, start);

        assert!(!toggle.second_view(start + Duration::from_secs(299)));
        assert!(toggle.second_view(start + PERIOD));
        assert!(toggle.second_view(start + Duration::from_secs(450)));
        assert!(!toggle.second_view(start + PERIOD * 2));
    }

    #[test]
    fn test_long_gap_flips_once() {
        let start = Instant::now();
        let mut toggle = ViewToggle::new(true, PERIOD, start);

        assert!(toggle.second_view(start + PERIOD * 5));
        assert!(toggle.second_view(start + PERIOD * 5 + Duration::from_secs(1)));
    }
}
