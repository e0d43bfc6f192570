//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, TimeZone, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get the current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given instant
    pub fn new(fixed_time: DateTime<Utc>) -> Self {
        Self { fixed_time }
    }

    /// Create a new fixed clock from a Unix timestamp in milliseconds.
    ///
    /// Out-of-range values fall back to the Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        let fixed_time = Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH);
        Self { fixed_time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.fixed_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_increasing_instants() {
        // テスト項目: SystemClock が呼び出すたびに増加する時刻を返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let first = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = clock.now();

        // then (期待する結果):
        assert!(second >= first);
    }

    #[test]
    fn test_fixed_clock_returns_consistent_instant() {
        // テスト項目: FixedClock が複数回呼び出しても同じ時刻を返す
        // given (前提条件):
        let clock = FixedClock::from_millis(1_672_531_200_000);

        // when (操作):
        let first = clock.now();
        let second = clock.now();

        // then (期待する結果):
        assert_eq!(first, second);
        assert_eq!(first.timestamp_millis(), 1_672_531_200_000);
    }

    #[test]
    fn test_fixed_clock_serializes_as_rfc3339() {
        // テスト項目: 固定時刻が RFC 3339 形式 (UTC) に変換される
        // given (前提条件):
        let clock = FixedClock::from_millis(1_672_531_200_123);

        // when (操作):
        let formatted = clock.now().to_rfc3339();

        // then (期待する結果):
        assert!(formatted.starts_with("2023-01-01T00:00:00.123"));
        assert!(formatted.ends_with("+00:00"));
    }
}
