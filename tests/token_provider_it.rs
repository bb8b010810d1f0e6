mod common;

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use futures::future;
// self
use common::*;
use okta_pkce_broker::{
	auth::{CacheKey, PkcePair},
	cache::ManualClock,
	error::{Error, TransportError},
	flows::AppFormReader,
	obs::FlowStep,
};

#[tokio::test]
async fn get_token_runs_the_three_steps_and_caches_the_result() {
	let okta = FakeOkta::happy();
	let provider = provider(&okta);
	let token = provider.get_token().await.expect("Token acquisition should succeed.");

	assert_eq!(token.expose(), "tok-abc");

	let authn = &okta.requests(Route::Authn)[0];
	let authorize = &okta.requests(Route::Authorize)[0];
	let exchange = &okta.requests(Route::Token)[0];

	assert_eq!(authn.method, "POST");
	assert_eq!(authn.url.path(), "/api/v1/authn");
	assert_eq!(authn.json()["username"], "user@example.com");
	assert_eq!(authn.json()["password"], "hunter2");

	let query = authorize.query();

	assert_eq!(authorize.method, "GET");
	assert_eq!(authorize.url.path(), "/oauth2/default/v1/authorize");
	assert_eq!(query["sessionToken"], "st1");
	assert_eq!(query["client_id"], CLIENT_ID);
	assert_eq!(query["state"], REDIRECT_URI);
	assert_eq!(query["code_challenge_method"], "S256");

	let form = exchange.form();

	assert_eq!(exchange.method, "POST");
	assert_eq!(exchange.url.path(), "/oauth2/default/v1/token");
	assert_eq!(form["code"], "authcode123");
	assert_eq!(form["grant_type"], "authorization_code");
	assert_eq!(PkcePair::compute_challenge(&form["code_verifier"]), query["code_challenge"]);
	assert_ne!(form["code_verifier"], query["code_challenge"]);

	let again = provider.get_token().await.expect("Cached lookup should succeed.");

	assert_eq!(again.expose(), "tok-abc");
	assert_eq!(okta.calls(Route::Authn), 1);
	assert_eq!(okta.calls(Route::Token), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_acquisition() {
	let okta = FakeOkta::happy();

	okta.delay(StdDuration::from_millis(30));

	let provider = provider(&okta);
	let tasks = (0..10)
		.map(|_| {
			let provider = provider.clone();

			tokio::spawn(async move { provider.get_token().await })
		})
		.collect::<Vec<_>>();

	for result in future::join_all(tasks).await {
		let token = result.expect("Task should not panic.").expect("Lookup should succeed.");

		assert_eq!(token.expose(), "tok-abc");
	}

	assert_eq!(okta.calls(Route::Authn), 1);
	assert_eq!(okta.calls(Route::Authorize), 1);
	assert_eq!(okta.calls(Route::Token), 1);
	assert_eq!(provider.cache().metrics().loads(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_are_shared_and_retried() {
	let okta = FakeOkta::happy();

	okta.delay(StdDuration::from_millis(30));
	okta.reply(
		Route::Authn,
		Reply::json(
			401,
			serde_json::json!({
				"errorCode": "E0000004",
				"errorSummary": "Authentication failed",
				"errorCauses": [],
			}),
		),
	);

	let provider = provider(&okta);
	let tasks = (0..5)
		.map(|_| {
			let provider = provider.clone();

			tokio::spawn(async move { provider.get_token().await })
		})
		.collect::<Vec<_>>();
	let mut sources = Vec::new();

	for result in future::join_all(tasks).await {
		match result.expect("Task should not panic.") {
			Err(Error::CacheLoad { key, source }) => {
				assert_eq!(key, CacheKey::default());

				sources.push(source);
			},
			other => panic!("Unexpected lookup result: {other:?}."),
		}
	}

	assert!(sources.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));

	match sources[0].as_ref() {
		Error::Authentication { step, reason } => {
			assert_eq!(*step, FlowStep::Authenticate);
			assert!(reason.contains("Authentication failed"));
		},
		other => panic!("Unexpected root error: {other:?}."),
	}

	assert_eq!(okta.calls(Route::Authn), 1);
	assert_eq!(okta.calls(Route::Authorize), 0);
	assert!(provider.cache().is_empty());

	okta.reply(Route::Authn, FakeOkta::session_reply());

	let token = provider.get_token().await.expect("The next call should retry from scratch.");

	assert_eq!(token.expose(), "tok-abc");
	assert_eq!(okta.calls(Route::Authn), 2);
}

#[tokio::test]
async fn default_key_and_named_keys_are_partitioned() {
	let okta = FakeOkta::happy();

	okta.reply(Route::Token, Reply::SequentialTokens);

	let provider = provider(&okta);
	let default = provider.get_token().await.expect("Default lookup should succeed.");
	let explicit = provider.get_token_for("key").await.expect("Explicit lookup should succeed.");

	assert_eq!(default.expose(), "tok-1");
	assert_eq!(explicit.expose(), "tok-1");

	let a = provider.get_token_for("a").await.expect("Lookup for `a` should succeed.");
	let b = provider.get_token_for("b").await.expect("Lookup for `b` should succeed.");

	assert_eq!(a.expose(), "tok-2");
	assert_eq!(b.expose(), "tok-3");
	assert_eq!(provider.cache().len(), 3);

	provider.expire_keys(["a"]);

	assert!(!provider.cache().contains("a"));
	assert!(provider.cache().contains("b"));
	assert!(provider.cache().contains("key"));

	let fresh = provider.get_new_token().await.expect("Forced acquisition should succeed.");

	assert_eq!(fresh.expose(), "tok-4");
	assert_eq!(provider.get_token().await.expect("Lookup should hit.").expose(), "tok-4");

	provider.expire_all();

	assert!(provider.cache().is_empty());
	assert_eq!(
		provider.get_new_token_for("b").await.expect("Forced lookup should succeed.").expose(),
		"tok-5"
	);
}

#[tokio::test]
async fn missing_session_token_is_an_authentication_failure() {
	let okta = FakeOkta::happy();

	okta.reply(
		Route::Authn,
		Reply::json(
			200,
			serde_json::json!({ "status": "MFA_REQUIRED", "stateToken": "state-xyz" }),
		),
	);

	let provider = provider(&okta);
	let err = provider.get_token().await.expect_err("MFA challenges must fail.");

	match err.root() {
		Error::Authentication { step, reason } => {
			assert_eq!(*step, FlowStep::Authenticate);
			assert!(reason.contains("MFA_REQUIRED"));
		},
		other => panic!("Unexpected root error: {other:?}."),
	}

	assert!(provider.cache().is_empty());
	assert_eq!(okta.calls(Route::Authorize), 0);
}

#[tokio::test]
async fn authorize_failures_are_classified() {
	let cases = [
		(Reply::html(403, "Forbidden"), "auth"),
		(Reply::html(200, form_post_page(&[("error", "login_required")])), "auth"),
		(Reply::html(200, form_post_page(&[("error", "invalid_scope")])), "protocol"),
		(Reply::html(200, "<html><body>Sign in</body></html>"), "protocol"),
		(Reply::redirect(format!("{REDIRECT_URI}?error=access_denied")), "auth"),
		(Reply::redirect(format!("{REDIRECT_URI}?error=invalid_request")), "protocol"),
		(Reply::redirect(REDIRECT_URI), "protocol"),
		(Reply::html(503, "Service Unavailable"), "status"),
	];

	for (reply, expected) in cases {
		let okta = FakeOkta::happy();

		okta.reply(Route::Authorize, reply.clone());

		let err = provider(&okta).get_token().await.expect_err("Authorize failures must surface.");
		let root = err.root();

		assert_eq!(err.step(), Some(FlowStep::Authorize), "{reply:?}");

		match expected {
			"auth" => assert!(matches!(root, Error::Authentication { .. }), "{reply:?}"),
			"protocol" => assert!(matches!(root, Error::Protocol { .. }), "{reply:?}"),
			_ => assert!(
				matches!(
					root,
					Error::Transport(TransportError::UnexpectedStatus { status: 503, .. })
				),
				"{reply:?}"
			),
		}

		assert_eq!(okta.calls(Route::Token), 0);
	}
}

#[tokio::test]
async fn exchange_failures_are_classified() {
	let okta = FakeOkta::happy();

	okta.reply(
		Route::Token,
		Reply::json(
			400,
			serde_json::json!({
				"error": "invalid_grant",
				"error_description": "The authorization code is invalid or has expired.",
			}),
		),
	);

	let provider = provider(&okta);
	let err = provider.get_token().await.expect_err("Rejected exchanges must fail.");

	match err.root() {
		Error::Protocol { step, reason } => {
			assert_eq!(*step, FlowStep::Exchange);
			assert!(reason.contains("invalid_grant"));
		},
		other => panic!("Unexpected root error: {other:?}."),
	}

	okta.reply(Route::Token, Reply::html(200, "<html>not json</html>"));

	let err = provider.get_token().await.expect_err("Non-JSON bodies must fail.");

	assert!(matches!(
		err.root(),
		Error::Transport(TransportError::MalformedBody { step: FlowStep::Exchange, .. })
	));

	okta.reply(Route::Token, Reply::html(502, "Bad Gateway"));

	let err = provider.get_token().await.expect_err("Server errors must fail.");

	assert!(matches!(
		err.root(),
		Error::Transport(TransportError::UnexpectedStatus { step: FlowStep::Exchange, status: 502 })
	));
	assert!(provider.cache().is_empty());
}

#[tokio::test]
async fn transport_failures_carry_the_failing_step() {
	let okta = FakeOkta::happy();

	okta.reply(Route::Authn, Reply::Refused);

	let err = provider(&okta).get_token().await.expect_err("Refused connections must fail.");

	assert!(matches!(
		err.root(),
		Error::Transport(TransportError::Network { step: FlowStep::Authenticate, .. })
	));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelling_one_caller_leaves_other_waiters_running() {
	let okta = FakeOkta::happy();

	okta.delay(StdDuration::from_millis(40));

	let provider = provider(&okta);
	let cancelled = provider
		.get_token_or_cancel(CacheKey::default(), tokio::time::sleep(StdDuration::from_millis(10)));
	let waiter = {
		let provider = provider.clone();

		tokio::spawn(async move {
			tokio::time::sleep(StdDuration::from_millis(2)).await;

			provider.get_token().await
		})
	};

	assert!(matches!(cancelled.await, Err(Error::Cancelled)));

	let token = waiter.await.expect("Task should not panic.").expect("Waiter should succeed.");

	assert_eq!(token.expose(), "tok-abc");
	assert_eq!(okta.calls(Route::Token), 1);
	assert!(provider.cache().contains("key"));
}

#[tokio::test]
async fn cancel_signal_ends_a_hanging_acquisition() {
	let okta = FakeOkta::happy();

	okta.reply(Route::Authorize, Reply::Hang);

	let provider = provider(&okta);
	let err = provider
		.get_token_or_cancel("slow", tokio::time::sleep(StdDuration::from_millis(20)))
		.await
		.expect_err("The cancel signal should win.");

	assert!(matches!(err, Error::Cancelled));
	assert!(!provider.cache().contains("slow"));
	assert!(!provider.cache().is_loading("slow"));
}

#[tokio::test]
async fn custom_form_reader_and_clock_are_honored() {
	let okta = FakeOkta::happy();

	okta.reply(
		Route::Authorize,
		Reply::html(
			200,
			r#"<form id="loginForm"><input type="hidden" name="code" value="authcode123"/></form>"#,
		),
	);
	okta.reply(Route::Token, Reply::SequentialTokens);

	let clock = Arc::new(ManualClock::new());
	let provider = provider(&okta)
		.with_form_reader(Arc::new(AppFormReader::new("loginForm", "code")))
		.with_clock(clock.clone());
	let ttl = provider.config().cache_ttl_std();

	assert_eq!(provider.get_token().await.expect("First lookup should load.").expose(), "tok-1");

	clock.advance(ttl);

	assert_eq!(provider.get_token().await.expect("Exactly T should hit.").expose(), "tok-1");

	clock.advance(ttl + StdDuration::from_millis(1));

	assert_eq!(provider.get_token().await.expect("T + ε should reload.").expose(), "tok-2");
	assert_eq!(okta.requests(Route::Token)[1].form()["code"], "authcode123");
}
