#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use oidc_remote::{
	_preludet::*,
	auth::{ProviderId, Token},
	ext::{HookFuture, TokenUpdate, TokenUpdater},
	flows::CallbackParams,
	provider::ProviderConfig,
};

const CLIENT_ID: &str = "client-it";
const CLIENT_SECRET: &str = "secret-it";

#[derive(Clone, Default)]
struct RecordingUpdater(Arc<std::sync::Mutex<Vec<Token>>>);
impl RecordingUpdater {
	fn recorded(&self) -> Vec<Token> {
		self.0.lock().expect("Updater mutex should not be poisoned.").clone()
	}
}
impl TokenUpdater for RecordingUpdater {
	fn token_updated<'a>(&'a self, update: &'a TokenUpdate) -> HookFuture<'a, ()> {
		self.0.lock().expect("Updater mutex should not be poisoned.").push(update.token.clone());

		Box::pin(async { Ok(()) })
	}
}

fn provider_id(value: &str) -> ProviderId {
	ProviderId::new(value).expect("Provider identifier should be valid for auth code tests.")
}

fn url(value: &str) -> Url {
	Url::parse(value).expect("URL fixture should parse successfully.")
}

fn build_config(server: &MockServer) -> ProviderConfig {
	ProviderConfig::builder(provider_id("mock-oauth2"), CLIENT_ID)
		.client_secret(CLIENT_SECRET)
		.authorize_url(url(&server.url("/authorize")))
		.access_token_url(url(&server.url("/token")))
		.build()
		.expect("Provider configuration should build successfully.")
}

#[tokio::test]
async fn authorization_url_carries_client_id_redirect_and_generated_state() {
	let config = ProviderConfig::builder(provider_id("static-idp"), "cid")
		.authorize_url(url("https://idp/authorize"))
		.build()
		.expect("Static configuration should build.");
	let (remote, sessions) = build_reqwest_test_remote(config);
	let redirect = url("https://app/cb");
	let handshake = remote
		.create_authorization_url(Some(redirect.clone()), BTreeMap::new())
		.await
		.expect("Authorization URL construction should succeed.");
	let pairs: HashMap<_, _> = handshake.url.query_pairs().into_owned().collect();

	assert_eq!(pairs.get("client_id"), Some(&"cid".into()));
	assert_eq!(pairs.get("redirect_uri"), Some(&"https://app/cb".into()));
	assert_eq!(pairs.get("response_type"), Some(&"code".into()));

	let state = handshake.state.state.clone().expect("OAuth 2.0 handshakes must carry a state.");

	assert_eq!(pairs.get("state"), Some(&state));
	assert_eq!(state.len(), 32);
	assert!(
		handshake.url.as_str().contains("redirect_uri=https%3A%2F%2Fapp%2Fcb"),
		"Redirect URI must be URL-encoded into the query."
	);
	assert!(sessions.is_empty(), "create_authorization_url must not persist state by itself.");
}

#[tokio::test]
async fn openid_scope_generates_and_persists_a_nonce() {
	let config = ProviderConfig::builder(provider_id("oidc-idp"), "cid")
		.authorize_url(url("https://idp/authorize"))
		.authorize_param("scope", "openid email")
		.build()
		.expect("Static configuration should build.");
	let (remote, sessions) = build_reqwest_test_remote(config);
	let redirect_url = remote
		.handle_redirect(Some(url("https://app/cb")), BTreeMap::new())
		.await
		.expect("handle_redirect should succeed.");
	let pairs: HashMap<_, _> = redirect_url.query_pairs().into_owned().collect();

	assert!(pairs.contains_key("nonce"), "openid scope must force a nonce.");
	assert_eq!(pairs.get("scope"), Some(&"openid email".into()));
	assert_eq!(sessions.len(), 1, "handle_redirect must persist the handshake state.");
}

#[tokio::test]
async fn redirect_round_trip_exchanges_the_code_and_fires_the_updater() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let updater = RecordingUpdater::default();
	let (remote, sessions) = build_reqwest_test_remote(config);
	let remote = remote.with_token_updater(Arc::new(updater.clone()));
	let redirect_url = remote
		.handle_redirect(Some(url("https://app.example.com/callback")), BTreeMap::new())
		.await
		.expect("handle_redirect should succeed.");
	let state = redirect_url
		.query_pairs()
		.find(|(key, _)| key == "state")
		.map(|(_, value)| value.into_owned())
		.expect("Authorization URL must carry a state parameter.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "abc");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-success\",\"token_type\":\"bearer\",\
				 \"expires_in\":3600,\"refresh_token\":\"refresh-success\",\
				 \"id_token\":\"h.p.s\"}",
			);
		})
		.await;
	let exchange = remote
		.authorize_access_token(CallbackParams::from_query(&format!("code=abc&state={state}")))
		.await
		.expect("Callback redemption should succeed.");

	mock.assert_async().await;

	assert_eq!(exchange.token.bearer(), Some("access-success"));
	assert_eq!(exchange.token.id_token.as_deref(), Some("h.p.s"));
	assert_eq!(exchange.token.expires_in, Some(3600));
	assert_eq!(exchange.session.state.as_deref(), Some(state.as_str()));
	assert!(sessions.is_empty(), "Redemption must consume the persisted state.");

	let recorded = updater.recorded();

	assert_eq!(recorded.len(), 1, "The token updater must fire once per exchange.");
	assert_eq!(recorded[0].bearer(), Some("access-success"));
}

#[tokio::test]
async fn mismatched_state_fails_before_any_network_call() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (remote, _sessions) = build_reqwest_test_remote(config);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"never\",\"token_type\":\"bearer\",\"expires_in\":60}",
			);
		})
		.await;

	remote
		.handle_redirect(Some(url("https://app.example.com/callback")), BTreeMap::new())
		.await
		.expect("handle_redirect should succeed.");

	let err = remote
		.authorize_access_token(CallbackParams::from_query("code=abc&state=forged"))
		.await
		.expect_err("A forged state must be rejected.");

	assert!(matches!(err, Error::StateMismatch));

	mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn provider_denial_surfaces_without_an_exchange() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (remote, _sessions) = build_reqwest_test_remote(config);
	let err = remote
		.authorize_access_token(CallbackParams::from_query(
			"error=access_denied&error_description=user+cancelled",
		))
		.await
		.expect_err("Provider-reported callback errors must fail the redemption.");

	assert!(matches!(err, Error::Endpoint(_)));
	assert!(err.to_string().contains("access_denied"));
}
