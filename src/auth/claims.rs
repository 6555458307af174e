//! Validated ID-token claims and normalized userinfo types.

// self
use crate::_prelude::*;

/// Audience claim value, which OpenID Connect allows as a string or an array of strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
	/// Single-audience form.
	One(String),
	/// Multi-audience form.
	Many(Vec<String>),
}
impl Audience {
	/// Returns true if the audience contains the provided value.
	pub fn contains(&self, value: &str) -> bool {
		match self {
			Audience::One(aud) => aud == value,
			Audience::Many(auds) => auds.iter().any(|aud| aud == value),
		}
	}
}

/// Validated, decoded payload of an ID token.
///
/// Values only exist behind a successful signature and claims validation pass; see
/// [`RemoteClient::parse_id_token`](crate::remote::RemoteClient::parse_id_token).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
	/// Issuer identifier.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub iss: Option<String>,
	/// Subject identifier.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
	/// Audience(s) the token was issued to.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub aud: Option<Audience>,
	/// Expiry as seconds since the Unix epoch.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub exp: Option<i64>,
	/// Issued-at as seconds since the Unix epoch.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub iat: Option<i64>,
	/// Replay-protection nonce bound at authorization time.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub nonce: Option<String>,
	/// Access-token hash binding the token response together (code flow).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub at_hash: Option<String>,
	/// Authorized party, when the audience differs from the client.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub azp: Option<String>,
	/// Any additional claims the provider included.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Normalized claims object returned by the userinfo endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
	/// Subject identifier.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
	/// Display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Given name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub given_name: Option<String>,
	/// Family name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub family_name: Option<String>,
	/// Preferred username.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub preferred_username: Option<String>,
	/// Email address.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Whether the provider verified the email address.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email_verified: Option<bool>,
	/// Profile picture URL.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub picture: Option<String>,
	/// Any additional claims the provider included.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
