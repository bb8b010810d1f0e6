//! The three-step Okta Authorization Code + PKCE flow.
//!
//! [`AuthorizationFlow::acquire_token`] runs primary authentication, the authorize call
//! and the code exchange strictly in order. Each step is one round trip wrapped in a
//! [`FlowSpan`], and any failure aborts the whole acquisition; retries are left to the
//! caller (the cache retries on the next `get`).

pub mod form;

mod authn;
mod authorize;
mod exchange;

pub use form::*;

// self
use crate::{
	_prelude::*,
	auth::{PkcePair, Secret},
	config::OktaConfig,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowOutcome, FlowSpan, FlowStep},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// OAuth error codes through which Okta reports a rejected session or login.
const SESSION_REJECTIONS: [&str; 4] =
	["login_required", "access_denied", "consent_required", "interaction_required"];

#[cfg(feature = "reqwest")]
/// Flow specialized for the crate's default reqwest transport stack.
pub type ReqwestAuthorizationFlow =
	AuthorizationFlow<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Runs the Okta protocol against a single configuration.
///
/// The flow owns the HTTP client, the transport error mapper and the authorize-page
/// reader so each step can focus on its own request and response shapes.
pub struct AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound Okta request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Validated Okta configuration.
	pub config: Arc<OktaConfig>,
	/// Extracts the authorization code from the `form_post` page.
	pub form_reader: Arc<dyn AuthorizeFormReader>,
}
impl<C, M> AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a flow that reuses the caller-provided transport + mapper pair.
	pub fn new(
		config: Arc<OktaConfig>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config,
			form_reader: Arc::new(AppFormReader::default()),
		}
	}

	/// Replaces the authorize-page reader.
	pub fn with_form_reader(mut self, reader: Arc<dyn AuthorizeFormReader>) -> Self {
		self.form_reader = reader;

		self
	}

	/// Acquires a fresh access token by running all three steps.
	pub async fn acquire_token(&self) -> Result<Secret> {
		let pkce = PkcePair::generate();
		let session = observe(FlowStep::Authenticate, self.authenticate()).await?;
		let code = observe(FlowStep::Authorize, self.authorize(&session, &pkce)).await?;

		observe(FlowStep::Exchange, self.exchange(&code, &pkce)).await
	}
}
impl<C, M> Clone for AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			config: self.config.clone(),
			form_reader: self.form_reader.clone(),
		}
	}
}
impl<C, M> Debug for AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationFlow")
			.field("endpoints", &self.config.endpoints)
			.field("client_id", &self.config.client_id)
			.finish()
	}
}

async fn observe<T, Fut>(step: FlowStep, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(step);

	obs::record_flow_outcome(step, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => obs::record_flow_outcome(step, FlowOutcome::Success),
		Err(e) => {
			obs::record_flow_outcome(step, FlowOutcome::Failure);
			obs::trace_step_failure(step, e);
		},
	}

	result
}

/// Classifies an OAuth error code reported during the authorize step.
fn classify_authorize_error(error: &str, description: Option<&str>) -> Error {
	let reason = match description {
		Some(description) if !description.is_empty() => format!("{error} ({description})"),
		_ => error.to_owned(),
	};

	if SESSION_REJECTIONS.contains(&error) {
		Error::authentication(FlowStep::Authorize, reason)
	} else {
		Error::protocol(FlowStep::Authorize, reason)
	}
}
