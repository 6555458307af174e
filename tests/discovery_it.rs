#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use oidc_remote::{_preludet::*, auth::ProviderId, provider::ProviderConfig};

const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

fn provider_id(value: &str) -> ProviderId {
	ProviderId::new(value).expect("Provider identifier should be valid for discovery tests.")
}

fn url(value: &str) -> Url {
	Url::parse(value).expect("URL fixture should parse successfully.")
}

fn discovery_document(server: &MockServer) -> String {
	format!(
		"{{\"issuer\":\"https://idp.example.com\",\
		 \"authorization_endpoint\":\"{}\",\
		 \"token_endpoint\":\"{}\",\
		 \"userinfo_endpoint\":\"{}\",\
		 \"jwks_uri\":\"{}\",\
		 \"scopes_supported\":[\"openid\",\"email\"]}}",
		server.url("/authorize"),
		server.url("/token"),
		server.url("/userinfo"),
		server.url("/jwks"),
	)
}

#[tokio::test]
async fn discovery_is_fetched_at_most_once() {
	let server = MockServer::start_async().await;
	let document = discovery_document(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path(DISCOVERY_PATH);
			then.status(200).header("content-type", "application/json").body(&document);
		})
		.await;
	let config = ProviderConfig::builder(provider_id("discovered"), "cid")
		.server_metadata_url(url(&server.url(DISCOVERY_PATH)))
		.build()
		.expect("Discovery configuration should build.");
	let (remote, _sessions) = build_reqwest_test_remote(config);
	let first = remote.resolve_metadata().await.expect("First resolution should succeed.");
	let second = remote.resolve_metadata().await.expect("Second resolution should succeed.");

	mock.assert_hits_async(1).await;

	assert_eq!(first, second);
	assert_eq!(first.issuer.as_deref(), Some("https://idp.example.com"));
	assert!(first.token_endpoint.is_some());
	assert!(
		first.extra.contains_key("scopes_supported"),
		"Unknown discovery members must survive in extra."
	);
}

#[tokio::test]
async fn static_metadata_resolves_without_network() {
	let metadata = serde_json::from_value(serde_json::json!({
		"issuer": "https://static.example.com",
		"token_endpoint": "https://static.example.com/token",
	}))
	.expect("Static metadata fixture should deserialize.");
	let config = ProviderConfig::builder(provider_id("static"), "cid")
		.server_metadata(metadata)
		.build()
		.expect("Static configuration should build.");
	let (remote, _sessions) = build_reqwest_test_remote(config);
	let resolved = remote.resolve_metadata().await.expect("Static resolution should succeed.");

	assert_eq!(resolved.issuer.as_deref(), Some("https://static.example.com"));
}

#[tokio::test]
async fn failed_discovery_is_not_swallowed_and_can_be_retried() {
	let server = MockServer::start_async().await;
	let broken = server
		.mock_async(|when, then| {
			when.method(GET).path(DISCOVERY_PATH);
			then.status(500);
		})
		.await;
	let config = ProviderConfig::builder(provider_id("flaky"), "cid")
		.server_metadata_url(url(&server.url(DISCOVERY_PATH)))
		.build()
		.expect("Discovery configuration should build.");
	let (remote, _sessions) = build_reqwest_test_remote(config);
	let err = remote
		.resolve_metadata()
		.await
		.expect_err("A failing discovery endpoint must propagate an error.");

	assert!(matches!(err, Error::Endpoint(_)));

	broken.delete_async().await;

	let document = discovery_document(&server);
	let healthy = server
		.mock_async(|when, then| {
			when.method(GET).path(DISCOVERY_PATH);
			then.status(200).header("content-type", "application/json").body(&document);
		})
		.await;
	let resolved = remote
		.resolve_metadata()
		.await
		.expect("The discovery URL must survive a failed fetch for the caller to retry.");

	healthy.assert_async().await;

	assert_eq!(resolved.issuer.as_deref(), Some("https://idp.example.com"));
}
