//! Token provider facade: the cache in front of the authorization flow.
//!
//! [`TokenProvider`] adds nothing beyond wiring. It substitutes the default cache key
//! when callers do not supply one and hands cache misses to
//! [`AuthorizationFlow::acquire_token`].

// std
use std::pin::pin;
// crates.io
use futures::future::{self, Either};
// self
use crate::{
	_prelude::*,
	auth::{CacheKey, Secret},
	cache::{Clock, TokenCache},
	config::OktaConfig,
	flows::{AuthorizationFlow, AuthorizeFormReader},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Provider specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenProvider = TokenProvider<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Hands out Okta access tokens, acquiring each key's token at most once per expiry window.
///
/// Clones share one cache, so a provider can be cloned freely into tasks.
pub struct TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	flow: AuthorizationFlow<C, M>,
	cache: TokenCache,
}
impl<C, M> TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a provider that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: OktaConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let cache = TokenCache::new(config.cache_ttl_std());
		let flow = AuthorizationFlow::new(Arc::new(config), http_client, mapper);

		Self { flow, cache }
	}

	/// Replaces the reader used to extract the code from the authorize page.
	pub fn with_form_reader(mut self, reader: Arc<dyn AuthorizeFormReader>) -> Self {
		self.flow = self.flow.with_form_reader(reader);

		self
	}

	/// Replaces the cache with an empty one driven by `clock`.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.cache = TokenCache::with_clock(self.cache.ttl(), clock);

		self
	}

	/// Returns the token cached under the default key, acquiring one if needed.
	pub async fn get_token(&self) -> Result<Secret> {
		self.get_token_for(CacheKey::default()).await
	}

	/// Returns the token cached under `key`, acquiring one if needed.
	pub async fn get_token_for(&self, key: impl Into<CacheKey>) -> Result<Secret> {
		let key = key.into();

		self.cache.get_with(&key, || self.flow.acquire_token()).await
	}

	/// Drops the default key's entry and returns a freshly acquired token.
	pub async fn get_new_token(&self) -> Result<Secret> {
		self.get_new_token_for(CacheKey::default()).await
	}

	/// Drops `key`'s entry and returns a freshly acquired token.
	///
	/// When a load for `key` is already in flight, its result is returned instead.
	pub async fn get_new_token_for(&self, key: impl Into<CacheKey>) -> Result<Secret> {
		let key = key.into();

		self.cache.invalidate(&key);

		self.get_token_for(key).await
	}

	/// Like [`TokenProvider::get_token_for`], but gives up with [`Error::Cancelled`] as soon
	/// as `cancel` resolves.
	///
	/// Giving up only ends this caller's wait. Other callers waiting on the same key keep
	/// waiting for (or take over) the load.
	pub async fn get_token_or_cancel<Fut>(
		&self,
		key: impl Into<CacheKey>,
		cancel: Fut,
	) -> Result<Secret>
	where
		Fut: Future,
	{
		let lookup = pin!(self.get_token_for(key));
		let cancel = pin!(cancel);

		match future::select(lookup, cancel).await {
			Either::Left((result, _)) => result,
			Either::Right(_) => Err(Error::Cancelled),
		}
	}

	/// Drops every cached token.
	pub fn expire_all(&self) {
		self.cache.invalidate_all_entries();
	}

	/// Drops the cached tokens for exactly the provided keys.
	pub fn expire_keys<I>(&self, keys: I)
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		self.cache.invalidate_all(keys);
	}

	/// Returns the underlying cache.
	pub fn cache(&self) -> &TokenCache {
		&self.cache
	}

	/// Returns the configuration the provider was built with.
	pub fn config(&self) -> &OktaConfig {
		&self.flow.config
	}

	/// Returns the authorization flow used on cache misses.
	pub fn flow(&self) -> &AuthorizationFlow<C, M> {
		&self.flow
	}
}
#[cfg(feature = "reqwest")]
impl TokenProvider<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a provider backed by a reqwest transport.
	///
	/// The transport applies the configured connect and request timeouts and never follows
	/// redirects.
	pub fn new(config: OktaConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeouts(
			config.connect_timeout_std(),
			config.request_timeout_std(),
		)?;

		Ok(Self::with_http_client(config, http_client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Clone for TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { flow: self.flow.clone(), cache: self.cache.clone() }
	}
}
impl<C, M> Debug for TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("flow", &self.flow)
			.field("cache", &self.cache)
			.finish()
	}
}
