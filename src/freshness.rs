//! Freshness policy for cached resources
//!
//! Decides, from the last fetch timestamp and the current time, whether a
//! cached payload may be served as-is or has to be refetched.

use chrono::{DateTime, Utc};

/// Age of a fetch timestamp in whole seconds
///
/// Negative ages (a `fetched_at` in the future because of clock skew) are
/// clamped to zero, so a skewed entry counts as just fetched rather than as
/// arbitrarily fresh.
pub fn age_seconds(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - fetched_at).num_seconds().max(0) as u64
}

/// Returns true when a cached value must be refreshed
///
/// A missing timestamp is always stale, and a `ttl_seconds` of zero makes every
/// entry stale.
///
/// # Arguments
/// * `fetched_at` - When the cached value was fetched, if ever
/// * `now` - The current time
/// * `ttl_seconds` - Maximum age before the value is considered stale
pub fn is_stale(fetched_at: Option<DateTime<Utc>>, now: DateTime<Utc>, ttl_seconds: u64) -> bool {
    match fetched_at {
        None => true,
        Some(fetched_at) => age_seconds(fetched_at, now) >= ttl_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_missing_timestamp_is_always_stale() {
        for ttl in [0, 1, 60, 3600, u64::MAX] {
            assert!(is_stale(None, t0(), ttl), "ttl {} should be stale", ttl);
        }
    }

    #[test]
    fn test_stale_iff_age_reaches_ttl() {
        let ttl = 3600;
        let cases = [
            (0, false),
            (1, false),
            (1000, false),
            (3599, false),
            (3600, true),
            (3700, true),
        ];

        for (elapsed, expected) in cases {
            let now = t0() + Duration::seconds(elapsed);
            assert_eq!(
                is_stale(Some(t0()), now, ttl),
                expected,
                "elapsed {}s with ttl {}s",
                elapsed,
                ttl
            );
        }
    }

    #[test]
    fn test_zero_ttl_is_always_stale() {
        assert!(is_stale(Some(t0()), t0(), 0));
        assert!(is_stale(Some(t0()), t0() + Duration::seconds(5), 0));
    }

    #[test]
    fn test_future_timestamp_is_clamped_to_zero_age() {
        let fetched_at = t0() + Duration::seconds(500);

        assert_eq!(age_seconds(fetched_at, t0()), 0);
        assert!(!is_stale(Some(fetched_at), t0(), 60));
        assert!(is_stale(Some(fetched_at), t0(), 0));
    }

    #[test]
    fn test_sub_second_age_rounds_down() {
        let now = t0() + Duration::milliseconds(59_900);
        assert_eq!(age_seconds(t0(), now), 59);
        assert!(!is_stale(Some(t0()), now, 60));
    }
}
