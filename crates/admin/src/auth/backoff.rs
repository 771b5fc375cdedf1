//! Exponential backoff between admin lookup attempts.

use std::time::Duration;

/// Delay following `current`: doubled, clamped to `max`.
#[must_use]
pub fn next_delay(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delay_doubles() {
        let d = next_delay(Duration::from_millis(250), Duration::from_secs(2));
        assert_eq!(d, Duration::from_millis(500));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let d = next_delay(Duration::from_millis(1500), Duration::from_secs(2));
        assert_eq!(d, Duration::from_secs(2));
    }

    #[test]
    fn full_backoff_sequence() {
        let max = Duration::from_secs(2);
        let mut delay = Duration::from_millis(250);
        let expected = [250, 500, 1000, 2000, 2000];

        for &expected_ms in &expected {
            assert_eq!(delay.as_millis(), expected_ms);
            delay = next_delay(delay, max);
        }
    }
}
