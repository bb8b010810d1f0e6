//! Acquires an Okta access token through the default reqwest transport and shows the cache
//! absorbing repeated lookups.
//!
//! Set `OKTA_BASE_URL`, `OKTA_ZONE`, `OKTA_USERNAME`, `OKTA_PASSWORD`, `OKTA_CLIENT_ID` and
//! `OKTA_REDIRECT_URI` to run against a real organization. Without `OKTA_BASE_URL` the demo
//! spins up a local mock of the three Okta endpoints.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::WrapErr};
use httpmock::prelude::*;
use url::Url;
// self
use okta_pkce_broker::{
	auth::{ClientId, IdentityZoneId},
	config::OktaConfig,
	provider::ReqwestTokenProvider,
};

const MOCK_FORM_POST: &str = r#"<html><body onload="document.forms[0].submit()">
<form id="appForm" method="POST" action="https://app.example.com/callback">
<input type="hidden" name="code" value="demo-code"/>
</form></body></html>"#;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server;
	let config = match env::var("OKTA_BASE_URL") {
		Ok(base_url) => config_from_env(&base_url)?,
		Err(_) => {
			server = MockServer::start_async().await;

			mock_okta(&server).await;

			OktaConfig::builder()
				.base_url(Url::parse(&server.base_url())?)
				.identity_zone(IdentityZoneId::new("default")?)
				.credentials("demo@example.com", "demo-password")
				.client_id(ClientId::new("0oa-demo")?)
				.redirect_uri(Url::parse("https://app.example.com/callback")?)
				.allow_insecure_http(true)
				.build()?
		},
	};
	let provider = ReqwestTokenProvider::new(config)?;
	let token = provider.get_token().await?;

	println!("Acquired an access token ({} characters).", token.expose().len());

	for _ in 0..3 {
		provider.get_token().await?;
	}

	let metrics = provider.cache().metrics();

	println!(
		"Cache served {} lookups from memory after {} acquisition(s).",
		metrics.hits(),
		metrics.loads()
	);

	Ok(())
}

fn config_from_env(base_url: &str) -> Result<OktaConfig> {
	let var = |name: &str| env::var(name).wrap_err_with(|| format!("{name} must be set."));

	Ok(OktaConfig::builder()
		.base_url(Url::parse(base_url)?)
		.identity_zone(IdentityZoneId::new(var("OKTA_ZONE")?)?)
		.credentials(var("OKTA_USERNAME")?, var("OKTA_PASSWORD")?)
		.client_id(ClientId::new(var("OKTA_CLIENT_ID")?)?)
		.redirect_uri(Url::parse(&var("OKTA_REDIRECT_URI")?)?)
		.build()?)
}

async fn mock_okta(server: &MockServer) {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/authn");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"status":"SUCCESS","sessionToken":"demo-session"}"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth2/default/v1/authorize");
			then.status(200).header("content-type", "text/html").body(MOCK_FORM_POST);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/default/v1/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"token_type":"Bearer","expires_in":3600,"access_token":"demo-access"}"#);
		})
		.await;
}
