//! Redirect round-trip state shared by both protocol generations.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{ProviderId, RequestToken},
};

const STATE_LEN: usize = 32;
const NONCE_LEN: usize = 32;

/// Authorization handshake returned by
/// [`RemoteClient::create_authorization_url`](crate::remote::RemoteClient::create_authorization_url).
///
/// The caller sends end-users to `url` and MUST persist `state` until the provider redirects
/// back; [`handle_redirect`](crate::remote::RemoteClient::handle_redirect) does both at once.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthorizationHandshake {
	/// Fully-formed authorization URL end-users should be redirected to.
	pub url: Url,
	/// Round-trip state the caller must persist for redemption.
	pub state: AuthorizationState,
}

/// Ephemeral state persisted across the redirect round trip.
///
/// Exactly one of `state` (OAuth 2.0) or `request_token` (OAuth 1.0) is populated. The value is
/// created when the authorization URL is built and consumed (invalidated) when the callback is
/// processed; redemption with a value that does not match issuance fails hard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationState {
	/// OAuth 2.0 `state` parameter.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	/// OAuth 1.0 request token.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub request_token: Option<RequestToken>,
	/// Redirect URI the handshake was issued for.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub redirect_uri: Option<Url>,
	/// OpenID Connect replay-protection nonce.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub nonce: Option<String>,
}
impl AuthorizationState {
	/// Opaque per-flow identifier: the `state` value or the request token id.
	pub fn flow_key(&self) -> Option<&str> {
		self.state
			.as_deref()
			.or_else(|| self.request_token.as_ref().map(|token| token.oauth_token.as_str()))
	}

	/// Builds the session-store key for a flow identifier under the provider namespace.
	pub fn store_key(provider: &ProviderId, flow_key: &str) -> String {
		format!("authorize:{provider}:{flow_key}")
	}
}

/// Query parameters delivered to the redirect callback endpoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallbackParams {
	/// OAuth 2.0 authorization code.
	pub code: Option<String>,
	/// OAuth 2.0 `state` echo.
	pub state: Option<String>,
	/// OAuth 1.0 request token echo.
	pub oauth_token: Option<String>,
	/// OAuth 1.0 verifier.
	pub oauth_verifier: Option<String>,
	/// Provider-reported error code, when the user denied the request.
	pub error: Option<String>,
	/// Provider-reported error description.
	pub error_description: Option<String>,
	/// Any further callback parameters, forwarded into the exchange.
	pub extra: BTreeMap<String, String>,
}
impl CallbackParams {
	/// Parses a raw callback query string.
	pub fn from_query(query: &str) -> Self {
		let mut params = Self::default();

		for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
			let value = value.into_owned();

			match key.as_ref() {
				"code" => params.code = Some(value),
				"state" => params.state = Some(value),
				"oauth_token" => params.oauth_token = Some(value),
				"oauth_verifier" => params.oauth_verifier = Some(value),
				"error" => params.error = Some(value),
				"error_description" => params.error_description = Some(value),
				other => {
					params.extra.insert(other.to_owned(), value);
				},
			}
		}

		params
	}
}

pub(crate) fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

pub(crate) fn generate_state() -> String {
	random_string(STATE_LEN)
}

pub(crate) fn generate_nonce() -> String {
	random_string(NONCE_LEN)
}
