//! Step 2: the authorize call that trades the session token for an authorization code.

// crates.io
use oauth2::{
	HttpRequest, HttpResponse,
	http::{
		Method, Request, StatusCode,
		header::{ACCEPT, LOCATION},
	},
};
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	auth::PkcePair,
	config::{OktaConfig, REQUESTED_SCOPES},
	error::ConfigError,
	flows::{AuthorizationFlow, FormReadError, authn::OktaSession, classify_authorize_error},
	http::TokenHttpClient,
	oauth::{self, TransportErrorMapper},
	obs::FlowStep,
};

const STEP: FlowStep = FlowStep::Authorize;

impl<C, M> AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(super) async fn authorize(&self, session: &OktaSession, pkce: &PkcePair) -> Result<String> {
		let url = authorize_url(&self.config, session, pkce);
		let request = authorize_request(&url)?;
		let response =
			oauth::send(self.http_client.as_ref(), self.transport_mapper.as_ref(), STEP, request)
				.await?;
		let status = response.status();

		if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
			return Err(Error::authentication(
				STEP,
				format!("session was rejected with HTTP {}", status.as_u16()),
			));
		}

		oauth::reject_server_error(STEP, &response)?;

		if status.is_redirection() {
			return Err(self.classify_redirect(&response));
		}

		let html = String::from_utf8_lossy(response.body());

		self.form_reader.read_code(&html).map_err(|e| match e {
			FormReadError::Rejected { error, description } =>
				classify_authorize_error(&error, description.as_deref()),
			other => Error::protocol(STEP, other.to_string()),
		})
	}

	fn classify_redirect(&self, response: &HttpResponse) -> Error {
		let location = response
			.headers()
			.get(LOCATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| self.config.endpoints.authorize.join(value).ok());
		let Some(location) = location else {
			return Error::protocol(STEP, "redirect without a usable Location header");
		};
		let mut error = None;
		let mut description = None;

		for (name, value) in location.query_pairs() {
			match name.as_ref() {
				"error" => error = Some(value.into_owned()),
				"error_description" => description = Some(value.into_owned()),
				_ => (),
			}
		}

		match error {
			Some(error) => classify_authorize_error(&error, description.as_deref()),
			None => Error::protocol(STEP, "redirected without an authorization code"),
		}
	}
}

fn authorize_url(config: &OktaConfig, session: &OktaSession, pkce: &PkcePair) -> Url {
	let mut url = config.endpoints.authorize.clone();
	let redirect_uri = config.redirect_uri.as_str();

	url.query_pairs_mut()
		.append_pair("client_id", &config.client_id)
		.append_pair("code_challenge", pkce.challenge())
		.append_pair("code_challenge_method", pkce.method().as_str())
		.append_pair("nonce", &Uuid::new_v4().to_string())
		.append_pair("redirect_uri", redirect_uri)
		.append_pair("response_type", "code")
		// `state` mirrors the redirect URI.
		.append_pair("state", redirect_uri)
		.append_pair("scope", REQUESTED_SCOPES)
		.append_pair("response_mode", "form_post")
		.append_pair("sessionToken", session.token.expose());

	url
}

fn authorize_request(url: &Url) -> Result<HttpRequest> {
	Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.header(ACCEPT, "text/html")
		.body(Vec::new())
		.map_err(|e| ConfigError::from(e).into())
}
