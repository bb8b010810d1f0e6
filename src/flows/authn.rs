//! Step 1: primary authentication against `/api/v1/authn`.

// crates.io
use oauth2::{
	HttpRequest,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::ConfigError,
	flows::AuthorizationFlow,
	http::TokenHttpClient,
	oauth::{self, TransportErrorMapper},
	obs::FlowStep,
};

const STEP: FlowStep = FlowStep::Authenticate;
const APPLICATION_JSON: &str = "application/json";

/// Short-lived Okta session produced by primary authentication.
#[derive(Debug)]
pub(crate) struct OktaSession {
	pub(crate) token: Secret,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthnResponse {
	#[serde(default)]
	session_token: Option<String>,
	#[serde(default)]
	status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OktaErrorBody {
	#[serde(default)]
	error_summary: Option<String>,
}

impl<C, M> AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(super) async fn authenticate(&self) -> Result<OktaSession> {
		let config = &self.config;
		let request = authn_request(&config.endpoints.authn, &config.username, &config.password)?;
		let response =
			oauth::send(self.http_client.as_ref(), self.transport_mapper.as_ref(), STEP, request)
				.await?;

		oauth::reject_server_error(STEP, &response)?;

		let status = response.status();

		if status.is_client_error() {
			let summary = serde_json::from_slice::<OktaErrorBody>(response.body())
				.ok()
				.and_then(|body| body.error_summary)
				.filter(|summary| !summary.is_empty());
			let reason = match summary {
				Some(summary) => format!("{summary} (HTTP {})", status.as_u16()),
				None => format!("credentials were rejected with HTTP {}", status.as_u16()),
			};

			return Err(Error::authentication(STEP, reason));
		}
		if !status.is_success() {
			return Err(Error::protocol(STEP, format!("unexpected HTTP {}", status.as_u16())));
		}

		let body: AuthnResponse = oauth::parse_json(STEP, response.body())?;

		match body.session_token.filter(|token| !token.is_empty()) {
			Some(token) => Ok(OktaSession { token: Secret::new(token) }),
			None => {
				let reason = match body.status {
					Some(status) => format!("no session token was issued (status {status})"),
					None => "no session token was issued".into(),
				};

				Err(Error::authentication(STEP, reason))
			},
		}
	}
}

fn authn_request(endpoint: &Url, username: &str, password: &Secret) -> Result<HttpRequest> {
	let body = serde_json::json!({
		"username": username,
		"password": password.expose(),
		"options": {
			"multiOptionalFactorEnroll": false,
			"warnBeforePasswordExpired": false,
		},
	});

	Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(CONTENT_TYPE, APPLICATION_JSON)
		.header(ACCEPT, APPLICATION_JSON)
		.body(body.to_string().into_bytes())
		.map_err(|e| ConfigError::from(e).into())
}
