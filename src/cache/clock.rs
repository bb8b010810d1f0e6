//! Monotonic time sources used for access-based expiry.

// self
use crate::_prelude::*;

/// Source of monotonic instants.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> Instant;
}

/// Wall-independent clock backed by [`Instant::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}
}

/// Deterministic clock that only moves when [`ManualClock::advance`] is called.
#[derive(Debug)]
pub struct ManualClock {
	origin: Instant,
	offset: Mutex<StdDuration>,
}
impl ManualClock {
	/// Creates a clock frozen at the current instant.
	pub fn new() -> Self {
		Self { origin: Instant::now(), offset: Mutex::new(StdDuration::ZERO) }
	}

	/// Moves the clock forward by `by`.
	pub fn advance(&self, by: StdDuration) {
		*self.offset.lock() += by;
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new()
	}
}
impl Clock for ManualClock {
	fn now(&self) -> Instant {
		self.origin + *self.offset.lock()
	}
}
