//! Optional observability helpers for the Okta protocol and the token cache.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `okta_pkce_broker.flow` with the `step`
//!   field for every protocol round trip, plus `debug` events for cache activity.
//! - Enable `metrics` to increment the `okta_pkce_broker_flow_total` counter for every
//!   attempt/success/failure (labeled by `step` + `outcome`) and the
//!   `okta_pkce_broker_cache_total` counter (labeled by `event`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Protocol steps executed by [`AuthorizationFlow`](crate::flows::AuthorizationFlow).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowStep {
	/// Primary authentication against `/api/v1/authn`.
	Authenticate,
	/// Authorization request against `/oauth2/{zone}/v1/authorize`.
	Authorize,
	/// Code exchange against `/oauth2/{zone}/v1/token`.
	Exchange,
}
impl FlowStep {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowStep::Authenticate => "authenticate",
			FlowStep::Authorize => "authorize",
			FlowStep::Exchange => "exchange",
		}
	}
}
impl Display for FlowStep {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a protocol step.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Cache activity labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEvent {
	/// A fresh entry was served.
	Hit,
	/// No usable entry existed and a new load was registered.
	Miss,
	/// The caller joined a load that was already in flight.
	Join,
	/// A load finished and its token was cached.
	LoadSuccess,
	/// A load failed and nothing was cached.
	LoadFailure,
	/// One or more entries were removed on request.
	Invalidate,
}
impl CacheEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheEvent::Hit => "hit",
			CacheEvent::Miss => "miss",
			CacheEvent::Join => "join",
			CacheEvent::LoadSuccess => "load_success",
			CacheEvent::LoadFailure => "load_failure",
			CacheEvent::Invalidate => "invalidate",
		}
	}
}
impl Display for CacheEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
