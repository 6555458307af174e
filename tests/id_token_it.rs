#![cfg(feature = "reqwest")]

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::prelude::*;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;
use sha2::{Digest, Sha256};
// self
use oidc_remote::{
	_preludet::*,
	auth::{ProviderId, Token, TokenSecret},
	error::IdTokenError,
	provider::{ProviderConfig, ServerMetadata},
};

const SIGNING_SECRET: &[u8] = b"an-oct-signing-secret-for-hs256!";
const KID: &str = "k1";
const ISSUER: &str = "https://idp.example.com";
const CLIENT_ID: &str = "cid";
const ACCESS_TOKEN: &str = "access-1";

fn provider_id(value: &str) -> ProviderId {
	ProviderId::new(value).expect("Provider identifier should be valid for ID token tests.")
}

fn oct_jwk(kid: &str, secret: &[u8]) -> Value {
	json!({ "kty": "oct", "kid": kid, "k": URL_SAFE_NO_PAD.encode(secret) })
}

fn metadata(document: Value) -> ServerMetadata {
	serde_json::from_value(document).expect("Metadata fixture should deserialize.")
}

fn build_remote(document: Value) -> ReqwestTestRemote {
	let config = ProviderConfig::builder(provider_id("oidc"), CLIENT_ID)
		.server_metadata(metadata(document))
		.build()
		.expect("OIDC configuration should build.");

	build_reqwest_test_remote(config).0
}

fn sign_id_token(kid: &str, claims: &Value) -> String {
	let mut header = Header::new(Algorithm::HS256);

	header.kid = Some(kid.to_owned());

	jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(SIGNING_SECRET))
		.expect("Test ID token should sign successfully.")
}

fn at_hash_of(access_token: &str) -> String {
	let digest = Sha256::digest(access_token.as_bytes());

	URL_SAFE_NO_PAD.encode(&digest[..16])
}

fn base_claims(nonce: &str) -> Value {
	let now = OffsetDateTime::now_utc().unix_timestamp();

	json!({
		"iss": ISSUER,
		"sub": "user-42",
		"aud": CLIENT_ID,
		"exp": now + 600,
		"iat": now - 10,
		"nonce": nonce,
		"at_hash": at_hash_of(ACCESS_TOKEN),
	})
}

fn code_flow_token(id_token: String) -> Token {
	Token {
		access_token: Some(TokenSecret::new(ACCESS_TOKEN)),
		id_token: Some(id_token),
		..Default::default()
	}
}

#[tokio::test]
async fn missing_id_token_is_normal_control_flow() {
	let remote = build_remote(json!({ "issuer": ISSUER }));
	let claims = remote
		.parse_id_token(&Token::default(), None, None)
		.await
		.expect("A token response without an id_token must not error.");

	assert!(claims.is_none());
}

#[tokio::test]
async fn valid_code_flow_id_token_verifies_with_nonce_and_at_hash() {
	let remote = build_remote(json!({
		"issuer": ISSUER,
		"id_token_signing_alg_values_supported": ["HS256"],
		"jwks": { "keys": [oct_jwk(KID, SIGNING_SECRET)] },
	}));
	let token = code_flow_token(sign_id_token(KID, &base_claims("n-1")));
	let claims = remote
		.parse_id_token(&token, Some("n-1"), None)
		.await
		.expect("A well-formed ID token should verify.")
		.expect("An id_token member must produce claims.");

	assert_eq!(claims.sub.as_deref(), Some("user-42"));
	assert_eq!(claims.iss.as_deref(), Some(ISSUER));
	assert_eq!(claims.nonce.as_deref(), Some("n-1"));
}

#[tokio::test]
async fn disallowed_algorithm_fails_regardless_of_signature_validity() {
	// No advertised algorithms, so the allow-list defaults to RS256 only.
	let remote = build_remote(json!({
		"issuer": ISSUER,
		"jwks": { "keys": [oct_jwk(KID, SIGNING_SECRET)] },
	}));
	let token = code_flow_token(sign_id_token(KID, &base_claims("n-1")));
	let err = remote
		.parse_id_token(&token, Some("n-1"), None)
		.await
		.expect_err("HS256 outside the allow-list must be rejected.");

	assert!(matches!(
		err,
		Error::IdToken(IdTokenError::AlgorithmNotAllowed { .. })
	));
}

#[tokio::test]
async fn nonce_mismatch_fails_validation() {
	let remote = build_remote(json!({
		"issuer": ISSUER,
		"id_token_signing_alg_values_supported": ["HS256"],
		"jwks": { "keys": [oct_jwk(KID, SIGNING_SECRET)] },
	}));
	let token = code_flow_token(sign_id_token(KID, &base_claims("issued-nonce")));
	let err = remote
		.parse_id_token(&token, Some("different-nonce"), None)
		.await
		.expect_err("A nonce mismatch must be rejected.");

	assert!(matches!(
		err,
		Error::IdToken(IdTokenError::ClaimMismatch { claim: "nonce", .. })
	));
}

#[tokio::test]
async fn wrong_at_hash_fails_the_code_flow_binding() {
	let remote = build_remote(json!({
		"issuer": ISSUER,
		"id_token_signing_alg_values_supported": ["HS256"],
		"jwks": { "keys": [oct_jwk(KID, SIGNING_SECRET)] },
	}));
	let mut claims = base_claims("n-1");

	claims["at_hash"] = Value::String("forged".into());

	let token = code_flow_token(sign_id_token(KID, &claims));
	let err = remote
		.parse_id_token(&token, Some("n-1"), None)
		.await
		.expect_err("An at_hash that does not bind the access token must be rejected.");

	assert!(matches!(
		err,
		Error::IdToken(IdTokenError::ClaimMismatch { claim: "at_hash", .. })
	));
}

#[tokio::test]
async fn implicit_tokens_skip_the_at_hash_binding() {
	let remote = build_remote(json!({
		"issuer": ISSUER,
		"id_token_signing_alg_values_supported": ["HS256"],
		"jwks": { "keys": [oct_jwk(KID, SIGNING_SECRET)] },
	}));
	let mut claims = base_claims("n-1");

	claims["at_hash"] = Value::String("unverifiable".into());

	// No access token in the response, so there is nothing to bind against.
	let token = Token { id_token: Some(sign_id_token(KID, &claims)), ..Default::default() };
	let parsed = remote
		.parse_id_token(&token, Some("n-1"), None)
		.await
		.expect("Implicit tokens must not require an at_hash binding.");

	assert!(parsed.is_some());
}

#[tokio::test]
async fn unknown_kid_forces_exactly_one_jwks_refresh() {
	let server = MockServer::start_async().await;
	let jwks_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/jwks");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "keys": [oct_jwk(KID, SIGNING_SECRET)] }));
		})
		.await;
	let remote = build_remote(json!({
		"issuer": ISSUER,
		"id_token_signing_alg_values_supported": ["HS256"],
		"jwks": { "keys": [oct_jwk("rotated-out", b"stale-secret")] },
		"jwks_uri": server.url("/jwks"),
	}));
	let token = code_flow_token(sign_id_token(KID, &base_claims("n-1")));
	let claims = remote
		.parse_id_token(&token, Some("n-1"), None)
		.await
		.expect("Verification should succeed after one forced JWKS refresh.");

	assert!(claims.is_some());

	jwks_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn still_unknown_kid_after_refresh_fails_without_further_retries() {
	let server = MockServer::start_async().await;
	let jwks_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/jwks");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "keys": [oct_jwk("still-not-it", b"stale-secret")] }));
		})
		.await;
	let remote = build_remote(json!({
		"issuer": ISSUER,
		"id_token_signing_alg_values_supported": ["HS256"],
		"jwks": { "keys": [oct_jwk("rotated-out", b"stale-secret")] },
		"jwks_uri": server.url("/jwks"),
	}));
	let token = code_flow_token(sign_id_token(KID, &base_claims("n-1")));
	let err = remote
		.parse_id_token(&token, Some("n-1"), None)
		.await
		.expect_err("An unknown key id must fail after the single forced refresh.");

	assert!(matches!(err, Error::IdToken(IdTokenError::UnknownKey { .. })));

	jwks_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn missing_jwks_uri_is_a_distinct_failure() {
	let remote = build_remote(json!({
		"issuer": ISSUER,
		"id_token_signing_alg_values_supported": ["HS256"],
	}));
	let token = code_flow_token(sign_id_token(KID, &base_claims("n-1")));
	let err = remote
		.parse_id_token(&token, Some("n-1"), None)
		.await
		.expect_err("Key resolution without jwks or jwks_uri must fail.");

	assert!(matches!(err, Error::MissingJwksUri));
}
