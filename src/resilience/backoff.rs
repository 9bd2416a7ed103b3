//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Calculate the delay before the `retry`-th retry (1-based).
///
/// The first retry goes out immediately; retry `n >= 2` waits
/// `base_ms * 2^(n-1)`, capped at `max_ms`, plus up to 10% jitter.
pub fn calculate_backoff(retry: u32, base_ms: u64, max_ms: u64) -> Duration {
    if retry <= 1 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(retry - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_retry_is_immediate() {
        assert_eq!(calculate_backoff(0, 100, 120_000), Duration::ZERO);
        assert_eq!(calculate_backoff(1, 100, 120_000), Duration::ZERO);
    }

    #[test]
    fn test_backoff_calculation() {
        let b2 = calculate_backoff(2, 100, 120_000);
        assert!(b2.as_millis() >= 200 && b2.as_millis() < 220);

        let b3 = calculate_backoff(3, 100, 120_000);
        assert!(b3.as_millis() >= 400 && b3.as_millis() < 440);

        let max = calculate_backoff(30, 100, 1000);
        assert!(max.as_millis() >= 1000 && max.as_millis() < 1100);
    }
}
