//! Pacing between embedding calls

use std::thread;
use std::time::Duration;

/// Called between two consecutive external calls, never before the first
pub trait RateLimiter {
	fn pause(&mut self);
}

/// Sleeps a fixed delay
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl RateLimiter for FixedDelay {
	fn pause(&mut self) {
		if !self.0.is_zero() {
			thread::sleep(self.0);
		}
	}
}

/// No pacing, for tests and local embedding servers
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl RateLimiter for NoDelay {
	fn pause(&mut self) {}
}
