//! Uniqueness tokens for artifact file names

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use contracts::SuffixSource;

/// Wall-clock nanoseconds, forced strictly increasing within the process.
///
/// Two flushes in the same nanosecond (or after a clock step backwards) still
/// get distinct suffixes.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicU64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn now_nanos() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

impl SuffixSource for MonotonicClock {
    fn next_suffix(&self) -> u64 {
        let now = Self::now_nanos();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Deterministic counter: `start`, `start + 1`, ...
#[derive(Debug)]
pub struct SequenceSuffix {
    next: AtomicU64,
}

impl SequenceSuffix {
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl SuffixSource for SequenceSuffix {
    fn next_suffix(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Always the same token. Only safe when a single artifact per worker is expected.
#[derive(Debug, Clone, Copy)]
pub struct FixedSuffix(pub u64);

impl SuffixSource for FixedSuffix {
    fn next_suffix(&self) -> u64 {
        self.0
    }
}
