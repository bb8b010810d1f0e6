// self
use crate::{
	_prelude::*,
	auth::{ClientId, IdentityZoneId, Secret},
	config::{OktaConfig, OktaEndpoints},
	error::ConfigError,
};

/// Builder for [`OktaConfig`] values.
#[derive(Debug, Default)]
pub struct OktaConfigBuilder {
	/// Okta organization base URL.
	pub base_url: Option<Url>,
	/// Authorization server identifier.
	pub identity_zone: Option<IdentityZoneId>,
	/// Account username.
	pub username: Option<String>,
	/// Account password.
	pub password: Option<Secret>,
	/// Target client identifier.
	pub client_id: Option<ClientId>,
	/// Login redirect URI.
	pub redirect_uri: Option<Url>,
	/// Access-based cache expiry (defaults to [`OktaConfig::DEFAULT_CACHE_TTL`]).
	pub cache_ttl: Option<Duration>,
	/// Connect timeout (defaults to [`OktaConfig::DEFAULT_CONNECT_TIMEOUT`]).
	pub connect_timeout: Option<Duration>,
	/// Per-request timeout (defaults to [`OktaConfig::DEFAULT_REQUEST_TIMEOUT`]).
	pub request_timeout: Option<Duration>,
	/// Accept plain `http` URLs (local development and mock servers only).
	pub allow_insecure_http: bool,
}
impl OktaConfigBuilder {
	/// Sets the Okta organization base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Sets the authorization server identifier.
	pub fn identity_zone(mut self, zone: IdentityZoneId) -> Self {
		self.identity_zone = Some(zone);

		self
	}

	/// Sets the account credentials used for primary authentication.
	pub fn credentials(mut self, username: impl Into<String>, password: impl Into<Secret>) -> Self {
		self.username = Some(username.into());
		self.password = Some(password.into());

		self
	}

	/// Sets the target client identifier.
	pub fn client_id(mut self, client_id: ClientId) -> Self {
		self.client_id = Some(client_id);

		self
	}

	/// Sets the login redirect URI.
	///
	/// Any absolute URI is accepted, including custom-scheme and loopback `http` URIs; the
	/// broker only sends it to Okta and never requests it.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Overrides the access-based cache expiry.
	pub fn cache_ttl(mut self, ttl: Duration) -> Self {
		self.cache_ttl = Some(ttl);

		self
	}

	/// Overrides the connect timeout of the default transport.
	pub fn connect_timeout(mut self, timeout: Duration) -> Self {
		self.connect_timeout = Some(timeout);

		self
	}

	/// Overrides the per-request timeout of the default transport.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Permits a plain `http` Okta base URL.
	pub fn allow_insecure_http(mut self, allow: bool) -> Self {
		self.allow_insecure_http = allow;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<OktaConfig, ConfigError> {
		let base_url = self.base_url.ok_or(ConfigError::MissingField { field: "base_url" })?;
		let identity_zone =
			self.identity_zone.ok_or(ConfigError::MissingField { field: "identity_zone" })?;
		let username = self
			.username
			.filter(|value| !value.is_empty())
			.ok_or(ConfigError::MissingField { field: "username" })?;
		let password = self.password.ok_or(ConfigError::MissingField { field: "password" })?;
		let client_id = self.client_id.ok_or(ConfigError::MissingField { field: "client_id" })?;
		let redirect_uri =
			self.redirect_uri.ok_or(ConfigError::MissingField { field: "redirect_uri" })?;
		let cache_ttl = positive("cache_ttl", self.cache_ttl, OktaConfig::DEFAULT_CACHE_TTL)?;
		let connect_timeout =
			positive("connect_timeout", self.connect_timeout, OktaConfig::DEFAULT_CONNECT_TIMEOUT)?;
		let request_timeout =
			positive("request_timeout", self.request_timeout, OktaConfig::DEFAULT_REQUEST_TIMEOUT)?;

		validate_base_scheme(&base_url, self.allow_insecure_http)?;

		let endpoints = OktaEndpoints::derive(&base_url, &identity_zone)?;

		Ok(OktaConfig {
			base_url,
			identity_zone,
			username,
			password,
			client_id,
			redirect_uri,
			cache_ttl,
			connect_timeout,
			request_timeout,
			endpoints,
		})
	}
}

fn positive(
	field: &'static str,
	value: Option<Duration>,
	default: Duration,
) -> Result<Duration, ConfigError> {
	let value = value.unwrap_or(default);

	if value.is_positive() { Ok(value) } else { Err(ConfigError::NonPositiveDuration { field }) }
}

fn validate_base_scheme(url: &Url, allow_http: bool) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if allow_http => Ok(()),
		_ => Err(ConfigError::InsecureEndpoint { endpoint: "base", url: url.to_string() }),
	}
}
