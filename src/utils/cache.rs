// src/utils/cache.rs

//! A single-value cache with an expiry and an injectable clock.

use std::time::{Duration, Instant};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Holds one value until its time-to-live runs out.
///
/// The cache is owned by whoever needs it; there is no global instance.
#[derive(Debug)]
pub struct TimedCache<T, C = SystemClock> {
    entry: Option<(T, Instant)>,
    ttl: Duration,
    clock: C,
}

impl<T: Clone> TimedCache<T, SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<T: Clone, C: Clock> TimedCache<T, C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entry: None,
            ttl,
            clock,
        }
    }

    /// The cached value, if it has not expired.
    pub fn get(&self) -> Option<T> {
        match &self.entry {
            Some((value, expires)) if self.clock.now() < *expires => Some(value.clone()),
            _ => None,
        }
    }

    pub fn put(&mut self, value: T) {
        let expires = self.clock.now() + self.ttl;
        self.entry = Some((value, expires));
    }
}
