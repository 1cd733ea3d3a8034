//! Utility functions for the match engine

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Game ticks per second on a standard server
pub const TICKS_PER_SECOND: u64 = 20;

/// Generate a new unique match ID
pub fn generate_match_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Convert whole seconds to ticks at the given rate
pub fn seconds_to_ticks(seconds: u64, ticks_per_second: u64) -> u64 {
    seconds.saturating_mul(ticks_per_second)
}

/// Wall-clock length of one tick at the given rate
pub fn tick_period(ticks_per_second: u64) -> Duration {
    Duration::from_millis(1000 / ticks_per_second.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_match_id();
        let id2 = generate_match_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_seconds_to_ticks() {
        assert_eq!(seconds_to_ticks(60, TICKS_PER_SECOND), 1200);
        assert_eq!(seconds_to_ticks(0, TICKS_PER_SECOND), 0);
        assert_eq!(seconds_to_ticks(u64::MAX, 2), u64::MAX);
    }

    #[test]
    fn test_tick_period() {
        assert_eq!(tick_period(20), Duration::from_millis(50));
        assert_eq!(tick_period(0), Duration::from_millis(1000));
    }
}
