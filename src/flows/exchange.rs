//! Step 3: exchanging the authorization code and PKCE verifier for an access token.

// crates.io
use oauth2::{
	HttpRequest,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	auth::{PkcePair, Secret},
	config::OktaConfig,
	error::ConfigError,
	flows::AuthorizationFlow,
	http::TokenHttpClient,
	oauth::{self, TransportErrorMapper},
	obs::FlowStep,
};

const STEP: FlowStep = FlowStep::Exchange;

#[derive(Debug, Deserialize)]
struct TokenResponse {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}
impl TokenResponse {
	fn missing_token_reason(&self) -> String {
		match (&self.error, &self.error_description) {
			(Some(error), Some(description)) =>
				format!("no access token was issued: {error} ({description})"),
			(Some(error), None) => format!("no access token was issued: {error}"),
			_ => "no access token was issued".into(),
		}
	}
}

impl<C, M> AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(super) async fn exchange(&self, code: &str, pkce: &PkcePair) -> Result<Secret> {
		let request = token_request(&self.config, code, pkce)?;
		let response =
			oauth::send(self.http_client.as_ref(), self.transport_mapper.as_ref(), STEP, request)
				.await?;

		oauth::reject_server_error(STEP, &response)?;

		let mut body: TokenResponse = oauth::parse_json(STEP, response.body())?;

		match body.access_token.take().filter(|token| !token.is_empty()) {
			Some(token) => Ok(Secret::new(token)),
			None => Err(Error::protocol(STEP, body.missing_token_reason())),
		}
	}
}

fn token_request(config: &OktaConfig, code: &str, pkce: &PkcePair) -> Result<HttpRequest> {
	let body = Serializer::new(String::new())
		.append_pair("client_id", &config.client_id)
		.append_pair("redirect_uri", config.redirect_uri.as_str())
		.append_pair("grant_type", "authorization_code")
		.append_pair("code_verifier", pkce.verifier())
		.append_pair("code", code)
		.finish();

	Request::builder()
		.method(Method::POST)
		.uri(config.endpoints.token.as_str())
		.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
		.header(ACCEPT, "application/json")
		.body(body.into_bytes())
		.map_err(|e| ConfigError::from(e).into())
}
