//! Keyed access-token cache with access-based expiry and single-flight loading.
//!
//! Every key is in one of three states: absent, loading, or present. A lookup on a
//! present, unexpired entry refreshes its last-access instant and returns the value
//! immediately. A lookup on an absent (or expired) key registers an in-flight cell and
//! runs the caller's loader; concurrent lookups on the same key join that cell instead
//! of starting their own load, so at most one load runs per key at any time.
//!
//! Failed loads are never cached: every caller waiting on the cell receives the same
//! [`Error::CacheLoad`] (sharing the source through an [`Arc`]) and the next lookup
//! starts a fresh load.

pub mod clock;

mod counters;

pub use clock::*;
pub use counters::*;

// self
use crate::{
	_prelude::*,
	auth::{CacheKey, Secret},
	obs::{self, CacheEvent},
};

type LoadResult = Result<Secret, Arc<Error>>;
type LoadCell = Arc<OnceCell<LoadResult>>;

#[derive(Debug)]
struct CacheEntry {
	value: Secret,
	last_access: Instant,
}
impl CacheEntry {
	fn is_expired(&self, now: Instant, ttl: StdDuration) -> bool {
		now.saturating_duration_since(self.last_access) > ttl
	}
}

#[derive(Debug)]
struct InFlight {
	cell: LoadCell,
	waiters: usize,
}

#[derive(Debug, Default)]
struct CacheState {
	entries: HashMap<CacheKey, CacheEntry>,
	in_flight: HashMap<CacheKey, InFlight>,
}
impl CacheState {
	fn touch(&mut self, key: &CacheKey, now: Instant, ttl: StdDuration) -> Option<Secret> {
		let entry = self.entries.get_mut(key)?;

		if entry.is_expired(now, ttl) {
			self.entries.remove(key);

			return None;
		}

		entry.last_access = now;

		Some(entry.value.clone())
	}

	fn sweep(&mut self, now: Instant, ttl: StdDuration) -> usize {
		let before = self.entries.len();

		self.entries.retain(|_, entry| !entry.is_expired(now, ttl));

		before - self.entries.len()
	}
}

/// Keyed token cache shared by every clone of a provider.
///
/// Clones share the same entries, in-flight loads and counters.
#[derive(Clone)]
pub struct TokenCache {
	ttl: StdDuration,
	clock: Arc<dyn Clock>,
	state: Arc<Mutex<CacheState>>,
	metrics: Arc<CacheMetrics>,
}
impl TokenCache {
	/// Creates an empty cache whose entries expire `ttl` after their last access.
	pub fn new(ttl: StdDuration) -> Self {
		Self::with_clock(ttl, Arc::new(SystemClock))
	}

	/// Creates an empty cache driven by a custom [`Clock`].
	pub fn with_clock(ttl: StdDuration, clock: Arc<dyn Clock>) -> Self {
		Self { ttl, clock, state: Default::default(), metrics: Default::default() }
	}

	/// Returns the access-based expiry.
	pub fn ttl(&self) -> StdDuration {
		self.ttl
	}

	/// Returns the cache counters.
	pub fn metrics(&self) -> &CacheMetrics {
		&self.metrics
	}

	/// Returns the token cached under `key`, running `loader` when no live entry exists.
	///
	/// Concurrent calls for the same key share one loader execution. If the task running
	/// the loader is dropped, the next waiter runs its own loader instead.
	pub async fn get_with<F, Fut>(&self, key: &CacheKey, loader: F) -> Result<Secret>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<Secret>>,
	{
		let waiter = {
			let mut state = self.state.lock();

			if let Some(value) = state.touch(key, self.clock.now(), self.ttl) {
				self.observe(CacheEvent::Hit, key);

				return Ok(value);
			}

			let cell = match state.in_flight.get_mut(key) {
				Some(in_flight) => {
					in_flight.waiters += 1;
					self.observe(CacheEvent::Join, key);

					in_flight.cell.clone()
				},
				None => {
					let cell = Arc::new(OnceCell::new());

					state.in_flight.insert(key.clone(), InFlight { cell: cell.clone(), waiters: 1 });
					self.observe(CacheEvent::Miss, key);

					cell
				},
			};

			Waiter { state: &self.state, key, cell }
		};
		let result = waiter.cell.get_or_init(|| self.load(key, &waiter.cell, loader)).await;

		result.clone().map_err(|source| Error::CacheLoad { key: key.clone(), source })
	}

	/// Removes the entry for `key`; absent keys are ignored.
	///
	/// A load already in flight for `key` is not affected and its result is cached.
	pub fn invalidate(&self, key: impl AsRef<str>) {
		let key = key.as_ref();

		if self.state.lock().entries.remove(key).is_some() {
			obs::trace_cache_event(CacheEvent::Invalidate, key);
			obs::record_cache_event(CacheEvent::Invalidate);
		}
	}

	/// Removes the entries for exactly the provided keys.
	pub fn invalidate_all<I>(&self, keys: I)
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		let mut state = self.state.lock();

		for key in keys {
			let key = key.as_ref();

			if state.entries.remove(key).is_some() {
				obs::trace_cache_event(CacheEvent::Invalidate, key);
				obs::record_cache_event(CacheEvent::Invalidate);
			}
		}
	}

	/// Removes every entry. Loads in flight keep running and cache their result.
	pub fn invalidate_all_entries(&self) {
		let removed = {
			let mut state = self.state.lock();
			let removed = state.entries.len();

			state.entries.clear();

			removed
		};

		if removed > 0 {
			obs::trace_cache_event(CacheEvent::Invalidate, "*");
			obs::record_cache_event(CacheEvent::Invalidate);
		}
	}

	/// Drops every expired entry and returns how many were removed.
	pub fn purge_expired(&self) -> usize {
		let now = self.clock.now();

		self.state.lock().sweep(now, self.ttl)
	}

	/// Returns `true` when `key` holds a live entry. Does not refresh its last access.
	pub fn contains(&self, key: impl AsRef<str>) -> bool {
		let now = self.clock.now();

		self.state
			.lock()
			.entries
			.get(key.as_ref())
			.is_some_and(|entry| !entry.is_expired(now, self.ttl))
	}

	/// Returns `true` when a load for `key` is in flight.
	pub fn is_loading(&self, key: impl AsRef<str>) -> bool {
		self.state.lock().in_flight.contains_key(key.as_ref())
	}

	/// Returns the number of live entries.
	pub fn len(&self) -> usize {
		let now = self.clock.now();
		let state = self.state.lock();

		state.entries.values().filter(|entry| !entry.is_expired(now, self.ttl)).count()
	}

	/// Returns `true` when no live entry exists.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	async fn load<F, Fut>(&self, key: &CacheKey, cell: &LoadCell, loader: F) -> LoadResult
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<Secret>>,
	{
		self.metrics.record_load();

		let result = loader().await.map_err(Arc::new);

		{
			let mut state = self.state.lock();

			if state.in_flight.get(key).is_some_and(|current| Arc::ptr_eq(&current.cell, cell)) {
				state.in_flight.remove(key);
			}
			if let Ok(value) = &result {
				let now = self.clock.now();

				state.sweep(now, self.ttl);
				state
					.entries
					.insert(key.clone(), CacheEntry { value: value.clone(), last_access: now });
			}
		}

		match &result {
			Ok(_) => self.observe(CacheEvent::LoadSuccess, key),
			Err(_) => {
				self.metrics.record_load_failure();
				self.observe(CacheEvent::LoadFailure, key);
			},
		}

		result
	}

	fn observe(&self, event: CacheEvent, key: &CacheKey) {
		match event {
			CacheEvent::Hit => self.metrics.record_hit(),
			CacheEvent::Miss => self.metrics.record_miss(),
			CacheEvent::Join => self.metrics.record_join(),
			_ => (),
		}

		obs::trace_cache_event(event, key.as_str());
		obs::record_cache_event(event);
	}
}

// A caller's claim on an in-flight cell. The last claim dropped before the load finishes
// unregisters the cell.
struct Waiter<'a> {
	state: &'a Mutex<CacheState>,
	key: &'a CacheKey,
	cell: LoadCell,
}
impl Drop for Waiter<'_> {
	fn drop(&mut self) {
		let mut state = self.state.lock();
		let Some(in_flight) = state.in_flight.get_mut(self.key) else {
			return;
		};

		if !Arc::ptr_eq(&in_flight.cell, &self.cell) {
			return;
		}

		in_flight.waiters = in_flight.waiters.saturating_sub(1);

		if in_flight.waiters == 0 && self.cell.get().is_none() {
			state.in_flight.remove(self.key);
		}
	}
}

impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("TokenCache")
			.field("ttl", &self.ttl)
			.field("entries", &state.entries.len())
			.field("in_flight", &state.in_flight.len())
			.finish()
	}
}
