// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing cache activity.
#[derive(Debug, Default)]
pub struct CacheMetrics {
	hits: AtomicU64,
	misses: AtomicU64,
	joins: AtomicU64,
	loads: AtomicU64,
	load_failures: AtomicU64,
}
impl CacheMetrics {
	/// Returns the number of lookups served from a live entry.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Returns the number of lookups that started a new load.
	pub fn misses(&self) -> u64 {
		self.misses.load(Ordering::Relaxed)
	}

	/// Returns the number of lookups that joined a load already in flight.
	pub fn joins(&self) -> u64 {
		self.joins.load(Ordering::Relaxed)
	}

	/// Returns the number of loader executions.
	pub fn loads(&self) -> u64 {
		self.loads.load(Ordering::Relaxed)
	}

	/// Returns the number of loader executions that failed.
	pub fn load_failures(&self) -> u64 {
		self.load_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_miss(&self) {
		self.misses.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_load(&self) {
		self.loads.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_load_failure(&self) {
		self.load_failures.fetch_add(1, Ordering::Relaxed);
	}
}
