//! Okta connection settings and the endpoints derived from them.
//!
//! [`OktaConfig`] is immutable once built: [`OktaConfigBuilder::build`] validates every
//! field a single time and derives [`OktaEndpoints`], so flows never re-validate
//! configuration at call time.

/// Builder API for assembling [`OktaConfig`] values.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, IdentityZoneId, Secret},
};

/// Scopes requested by every authorize call.
pub const REQUESTED_SCOPES: &str = "openid profile offline_access email";

/// Endpoint set derived from the Okta base URL and identity zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OktaEndpoints {
	/// Primary authentication endpoint (`/api/v1/authn`).
	pub authn: Url,
	/// Authorization endpoint (`/oauth2/{zone}/v1/authorize`).
	pub authorize: Url,
	/// Token endpoint (`/oauth2/{zone}/v1/token`).
	pub token: Url,
}
impl OktaEndpoints {
	/// Derives the endpoint set by appending path segments to `base`.
	pub fn derive(base: &Url, zone: &IdentityZoneId) -> Result<Self, crate::error::ConfigError> {
		let zone: &str = zone;

		Ok(Self {
			authn: join_segments(base, &["api", "v1", "authn"])?,
			authorize: join_segments(base, &["oauth2", zone, "v1", "authorize"])?,
			token: join_segments(base, &["oauth2", zone, "v1", "token"])?,
		})
	}
}

/// Immutable Okta configuration consumed by the authorization flow and the cache.
#[derive(Clone, Debug)]
pub struct OktaConfig {
	/// Okta organization base URL, e.g. `https://example.okta.com`.
	pub base_url: Url,
	/// Authorization server identifier.
	pub identity_zone: IdentityZoneId,
	/// Account username used for primary authentication.
	pub username: String,
	/// Account password used for primary authentication.
	pub password: Secret,
	/// Client identifier of the target application.
	pub client_id: ClientId,
	/// Login redirect URI registered for the client.
	pub redirect_uri: Url,
	/// Access-based cache expiry.
	pub cache_ttl: Duration,
	/// Connect timeout applied by the default transport.
	pub connect_timeout: Duration,
	/// Per-request timeout applied by the default transport.
	pub request_timeout: Duration,
	/// Endpoints derived from `base_url` + `identity_zone`.
	pub endpoints: OktaEndpoints,
}
impl OktaConfig {
	/// Default access-based cache expiry, kept just under Okta's one-hour token lifetime.
	pub const DEFAULT_CACHE_TTL: Duration = Duration::seconds(3500);
	/// Default connect timeout for the reqwest transport.
	pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::seconds(10);
	/// Default per-request timeout for the reqwest transport.
	pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(30);

	/// Creates a new builder.
	pub fn builder() -> OktaConfigBuilder {
		OktaConfigBuilder::default()
	}

	/// Returns the cache TTL as a standard-library duration.
	pub fn cache_ttl_std(&self) -> StdDuration {
		to_std(self.cache_ttl)
	}

	/// Returns the connect timeout as a standard-library duration.
	pub fn connect_timeout_std(&self) -> StdDuration {
		to_std(self.connect_timeout)
	}

	/// Returns the request timeout as a standard-library duration.
	pub fn request_timeout_std(&self) -> StdDuration {
		to_std(self.request_timeout)
	}
}

// Durations are validated as positive by the builder.
fn to_std(value: Duration) -> StdDuration {
	StdDuration::try_from(value).unwrap_or_default()
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, crate::error::ConfigError> {
	let mut url = base.clone();

	url.set_query(None);
	url.set_fragment(None);
	url.path_segments_mut()
		.map_err(|_| crate::error::ConfigError::InvalidBaseUrl { url: base.to_string() })?
		.pop_if_empty()
		.extend(segments);

	Ok(url)
}
