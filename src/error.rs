//! Engine-level error types shared across flows, metadata resolution, and the request gateway.

// self
use crate::_prelude::*;

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical engine error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session-store failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Provider endpoint rejected or mangled a request.
	#[error(transparent)]
	Endpoint(#[from] EndpointError),
	/// Transport failure (DNS, TCP, TLS), passed through unchanged.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// ID token failed decoding or validation.
	#[error(transparent)]
	IdToken(#[from] IdTokenError),

	/// No authorization endpoint is configured and none was discovered.
	#[error("No authorization endpoint is configured or discoverable.")]
	MissingAuthorizeUrl,
	/// No token endpoint is configured and none was discovered.
	#[error("No token endpoint is configured or discoverable.")]
	MissingTokenEndpoint,
	/// OAuth 1.0 access-token exchange attempted without a prior request token.
	#[error("An OAuth 1.0 access token exchange requires a previously issued request token.")]
	MissingRequestToken,
	/// The gateway could not resolve a token for an authenticated request.
	#[error("No token was supplied and no token resolver produced one.")]
	MissingToken,
	/// Server metadata carries no `jwks_uri` to refresh keys from.
	#[error("Server metadata is missing jwks_uri.")]
	MissingJwksUri,
	/// Server metadata carries no `userinfo_endpoint`.
	#[error("Server metadata is missing userinfo_endpoint.")]
	MissingUserinfoEndpoint,
	/// A relative resource URL was used without an `api_base_url`.
	#[error("A relative URL requires api_base_url to be configured.")]
	MissingApiBaseUrl,
	/// Callback state does not match the value persisted at authorization time.
	#[error("Authorization state mismatch between issuance and redemption.")]
	StateMismatch,
}

/// Configuration and validation failures raised by the engine.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured or discovered endpoint URL failed to parse.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Callback parameters carry no authorization code to exchange.
	#[error("Callback parameters do not include an authorization code.")]
	MissingAuthorizationCode,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Malformed or rejecting provider endpoint responses.
#[derive(Debug, ThisError)]
pub enum EndpointError {
	/// Provider refused the request with an OAuth error payload.
	#[error("Endpoint rejected the request: {reason}.")]
	Rejected {
		/// Provider-supplied `error` (and `error_description`, when present).
		reason: String,
	},
	/// Endpoint responded with malformed JSON that could not be parsed.
	#[error("Endpoint returned malformed JSON.")]
	Json {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
	/// Endpoint responded with a form-encoded body missing required members.
	#[error("Endpoint returned a malformed form-encoded reply: {reason}.")]
	Form {
		/// Missing or malformed member description.
		reason: String,
	},
	/// Endpoint responded with a text body that is not valid UTF-8.
	#[error("Endpoint returned a non-UTF-8 text body.")]
	NonUtf8Body,
	/// Endpoint returned an unexpected response.
	#[error("Endpoint returned an unexpected response: {message}.")]
	Unexpected {
		/// Broker-assembled message summarizing the failure.
		message: String,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// ID token decoding and validation failures.
///
/// Every variant is a hard failure; the verifier never swallows one. A token response without an
/// `id_token` member is not an error and short-circuits before any of these can occur.
#[derive(Debug, ThisError)]
pub enum IdTokenError {
	/// JOSE header algorithm is outside the provider's allow-list.
	#[error("ID token is signed with a disallowed algorithm: {alg}.")]
	AlgorithmNotAllowed {
		/// Algorithm label taken from the JOSE header.
		alg: String,
	},
	/// No key in the (once-refreshed) JWK set matches the token header.
	#[error("No key in the provider JWK set matches the ID token header (kid: {kid:?}).")]
	UnknownKey {
		/// Key id from the JOSE header, when present.
		kid: Option<String>,
	},
	/// Token could not be decoded at all (header/segment structure).
	#[error("ID token is malformed.")]
	Malformed {
		/// Underlying decoding failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Signature or registered-claim validation failed.
	#[error("ID token failed signature or claims verification.")]
	Verification {
		/// Underlying verification failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// A claim decoded correctly but does not match the expected value.
	#[error("ID token claim `{claim}` failed validation: {reason}.")]
	ClaimMismatch {
		/// Claim name that failed.
		claim: &'static str,
		/// Human-readable mismatch description.
		reason: String,
	},
}
