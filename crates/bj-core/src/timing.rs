//! Lightweight wall-clock timing.
//!
//! `Stopwatch` measures phases of a sweep (simulate, export, plot) and
//! `Deadline` enforces the optional per-integration wall-clock ceiling.

use std::time::{Duration, Instant};

/// A running timer that can be read repeatedly.
#[derive(Clone, Copy, Debug)]
pub struct Stopwatch {
    start: Instant,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed wall time in seconds.
    pub fn elapsed_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Elapsed time in seconds, restarting the stopwatch.
    pub fn lap_s(&mut self) -> f64 {
        let elapsed = self.elapsed_s();
        self.start = Instant::now();
        elapsed
    }
}

/// Optional wall-clock limit. `None` never expires.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A limit too large to represent never expires.
    pub fn after(limit: Option<Duration>) -> Self {
        Self {
            at: limit.and_then(|d| Instant::now().checked_add(d)),
        }
    }

    pub fn expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }
}
