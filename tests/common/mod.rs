//! Shared fixtures for integration tests: an in-memory Okta that answers each protocol step
//! from a scripted reply and records every request it receives.

#![allow(dead_code)]

// std
use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use parking_lot::Mutex;
use thiserror::Error as ThisError;
use url::Url;
// self
use okta_pkce_broker::{
	auth::{ClientId, IdentityZoneId},
	config::OktaConfig,
	error::{Error, TransportError},
	http::{HttpFuture, TokenHttpClient},
	oauth::{
		TransportErrorMapper,
		oauth2::{
			HttpClientError, HttpRequest, HttpResponse,
			http::{
				Response,
				header::{CONTENT_TYPE, LOCATION},
			},
		},
	},
	obs::FlowStep,
	provider::TokenProvider,
};

pub const BASE_URL: &str = "https://example.okta.com";
pub const REDIRECT_URI: &str = "https://app.example.com/callback";
pub const CLIENT_ID: &str = "0oa-client";
pub const ZONE: &str = "default";

pub type FakeProvider = TokenProvider<FakeOkta, FakeMapper>;

/// Builds a configuration pointing at `base_url`.
pub fn config_for(base_url: &str) -> OktaConfig {
	OktaConfig::builder()
		.base_url(Url::parse(base_url).expect("Base URL fixture should parse."))
		.identity_zone(IdentityZoneId::new(ZONE).expect("Zone fixture should be valid."))
		.credentials("user@example.com", "hunter2")
		.client_id(ClientId::new(CLIENT_ID).expect("Client fixture should be valid."))
		.redirect_uri(Url::parse(REDIRECT_URI).expect("Redirect URI fixture should parse."))
		.allow_insecure_http(true)
		.build()
		.expect("Configuration fixture should build.")
}

/// Builds a provider backed by `okta`.
pub fn provider(okta: &Arc<FakeOkta>) -> FakeProvider {
	TokenProvider::with_http_client(config_for(BASE_URL), okta.clone(), FakeMapper)
}

/// HTML returned by Okta for `response_mode=form_post`.
pub fn form_post_page(inputs: &[(&str, &str)]) -> String {
	let inputs = inputs
		.iter()
		.map(|(name, value)| format!(r#"<input type="hidden" name="{name}" value="{value}"/>"#))
		.collect::<String>();

	format!(
		r#"<html><body onload="document.forms[0].submit()"><form id="appForm" method="POST" action="{REDIRECT_URI}">{inputs}</form></body></html>"#
	)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
	Authn,
	Authorize,
	Token,
}
impl Route {
	fn of(url: &Url) -> Option<Self> {
		let path = url.path();

		if path.ends_with("/api/v1/authn") {
			Some(Self::Authn)
		} else if path.ends_with("/v1/authorize") {
			Some(Self::Authorize)
		} else if path.ends_with("/v1/token") {
			Some(Self::Token)
		} else {
			None
		}
	}
}

#[derive(Clone, Debug)]
pub enum Reply {
	/// Answers with the given status, content type, optional `Location` and body.
	Respond { status: u16, content_type: &'static str, location: Option<String>, body: String },
	/// Issues `tok-1`, `tok-2`, ... on successive token requests.
	SequentialTokens,
	/// Fails the round trip at the transport layer.
	Refused,
	/// Never answers.
	Hang,
}
impl Reply {
	pub fn json(status: u16, body: serde_json::Value) -> Self {
		Self::Respond {
			status,
			content_type: "application/json",
			location: None,
			body: body.to_string(),
		}
	}

	pub fn html(status: u16, body: impl Into<String>) -> Self {
		Self::Respond { status, content_type: "text/html", location: None, body: body.into() }
	}

	pub fn redirect(location: impl Into<String>) -> Self {
		Self::Respond {
			status: 302,
			content_type: "text/html",
			location: Some(location.into()),
			body: String::new(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub route: Route,
	pub method: String,
	pub url: Url,
	pub body: Vec<u8>,
}
impl RecordedRequest {
	pub fn query(&self) -> HashMap<String, String> {
		self.url.query_pairs().into_owned().collect()
	}

	pub fn form(&self) -> HashMap<String, String> {
		url::form_urlencoded::parse(&self.body).into_owned().collect()
	}

	pub fn json(&self) -> serde_json::Value {
		serde_json::from_slice(&self.body).expect("Recorded body should be JSON.")
	}
}

#[derive(Debug, ThisError)]
pub enum FakeTransportError {
	#[error("Connection refused.")]
	Refused,
}

/// Scripted in-memory Okta.
#[derive(Debug, Default)]
pub struct FakeOkta {
	replies: Mutex<HashMap<Route, Reply>>,
	requests: Mutex<Vec<RecordedRequest>>,
	delay: Mutex<Option<StdDuration>>,
	issued: AtomicUsize,
}
impl FakeOkta {
	/// Okta that completes the whole flow with `st1`, `authcode123` and `tok-abc`.
	pub fn happy() -> Arc<Self> {
		let okta = Self::default();

		okta.reply(Route::Authn, Self::session_reply());
		okta.reply(Route::Authorize, Reply::html(200, form_post_page(&[("code", "authcode123")])));
		okta.reply(
			Route::Token,
			Reply::json(
				200,
				serde_json::json!({
					"token_type": "Bearer",
					"expires_in": 3600,
					"access_token": "tok-abc",
					"scope": "openid profile offline_access email",
				}),
			),
		);

		Arc::new(okta)
	}

	pub fn session_reply() -> Reply {
		Reply::json(
			200,
			serde_json::json!({
				"expiresAt": "2030-01-01T00:00:00.000Z",
				"status": "SUCCESS",
				"sessionToken": "st1",
			}),
		)
	}

	pub fn reply(&self, route: Route, reply: Reply) {
		self.replies.lock().insert(route, reply);
	}

	/// Delays every answer by `delay`.
	pub fn delay(&self, delay: StdDuration) {
		*self.delay.lock() = Some(delay);
	}

	pub fn requests(&self, route: Route) -> Vec<RecordedRequest> {
		self.requests.lock().iter().filter(|request| request.route == route).cloned().collect()
	}

	pub fn calls(&self, route: Route) -> usize {
		self.requests(route).len()
	}
}
impl TokenHttpClient for FakeOkta {
	type TransportError = FakeTransportError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		Box::pin(async move {
			let url = Url::parse(&request.uri().to_string()).expect("Request URI should parse.");
			let route = Route::of(&url).expect("Request should target a known Okta route.");

			self.requests.lock().push(RecordedRequest {
				route,
				method: request.method().to_string(),
				url,
				body: request.body().clone(),
			});

			let delay = *self.delay.lock();

			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}

			let reply = self.replies.lock().get(&route).cloned();

			match reply.unwrap_or_else(|| Reply::html(404, "not found")) {
				Reply::Respond { status, content_type, location, body } => {
					let mut builder =
						Response::builder().status(status).header(CONTENT_TYPE, content_type);

					if let Some(location) = location {
						builder = builder.header(LOCATION, location);
					}

					Ok(builder.body(body.into_bytes()).expect("Fake response should build."))
				},
				Reply::SequentialTokens => {
					let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
					let body = serde_json::json!({ "access_token": format!("tok-{n}") });
					let response: HttpResponse = Response::builder()
						.status(200)
						.header(CONTENT_TYPE, "application/json")
						.body(body.to_string().into_bytes())
						.expect("Fake response should build.");

					Ok(response)
				},
				Reply::Refused =>
					Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Refused))),
				Reply::Hang => {
					futures::future::pending::<()>().await;

					Err(HttpClientError::Other("unreachable".into()))
				},
			}
		})
	}
}

/// Maps fake transport failures to network errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct FakeMapper;
impl TransportErrorMapper<FakeTransportError> for FakeMapper {
	fn map_transport_error(
		&self,
		step: FlowStep,
		error: HttpClientError<FakeTransportError>,
	) -> Error {
		match error {
			HttpClientError::Reqwest(inner) => TransportError::network(step, *inner).into(),
			HttpClientError::Io(source) => TransportError::Io { step, source }.into(),
			other => TransportError::Other { step, message: other.to_string() }.into(),
		}
	}
}
