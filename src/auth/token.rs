//! Provider token responses and OAuth 1.0 temporary credentials.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// Token response returned by a provider's token endpoint.
///
/// OAuth 2.0 exchanges populate the named members; OAuth 1.0 exchanges return their
/// `oauth_token`/`oauth_token_secret` pairs through [`extra`](Self::extra), matching the
/// form-encoded replies those providers send. The engine never interprets members beyond the
/// named ones; callers own the value (typically via their session or a token store) for the
/// lifetime of the user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
	/// Access token secret; callers must avoid logging it.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Token type reported by the provider (`bearer` in practice).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Refresh token secret, if the provider issued one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Raw OpenID Connect ID token (compact JWS), if the provider issued one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
	/// Relative expiry in seconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<i64>,
	/// Granted scope string, when echoed by the provider.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Any additional members the provider returned.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
impl Token {
	/// Returns the bearer-attachable access token value, if any.
	pub fn bearer(&self) -> Option<&str> {
		self.access_token.as_ref().map(TokenSecret::expose)
	}

	/// Computes the absolute expiry instant relative to the provided issuance instant.
	pub fn expires_at(&self, issued_at: OffsetDateTime) -> Option<OffsetDateTime> {
		self.expires_in.map(|secs| issued_at + Duration::seconds(secs))
	}

	/// Builds a token from a form-encoded endpoint reply (OAuth 1.0 access-token responses).
	pub(crate) fn from_form_pairs<'a, I>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
	{
		let mut token = Self::default();

		for (key, value) in pairs {
			match key.as_ref() {
				"token_type" => token.token_type = Some(value.into_owned()),
				"expires_in" => token.expires_in = value.parse().ok(),
				other => {
					token.extra.insert(other.to_owned(), Value::String(value.into_owned()));
				},
			}
		}

		token
	}
}

/// OAuth 1.0 temporary credential returned by the request-token endpoint.
///
/// Callers must persist the value across the redirect round trip; the access-token exchange
/// cannot proceed without it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestToken {
	/// Public temporary token identifier, echoed as the `oauth_token` query parameter.
	pub oauth_token: String,
	/// Matching token secret used to sign the access-token exchange.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub oauth_token_secret: Option<TokenSecret>,
	/// Any additional members the provider returned (e.g. `oauth_callback_confirmed`).
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_deserializes_with_extra_members() {
		let token: Token = serde_json::from_str(
			"{\"access_token\":\"at\",\"token_type\":\"bearer\",\"expires_in\":3600,\
			 \"id_token\":\"header.payload.sig\",\"foo\":\"bar\"}",
		)
		.expect("Token payload should deserialize.");

		assert_eq!(token.bearer(), Some("at"));
		assert_eq!(token.token_type.as_deref(), Some("bearer"));
		assert_eq!(token.expires_in, Some(3600));
		assert_eq!(token.id_token.as_deref(), Some("header.payload.sig"));
		assert_eq!(token.extra.get("foo"), Some(&Value::String("bar".into())));
	}

	#[test]
	fn token_expiry_is_relative_to_issuance() {
		let token = Token { expires_in: Some(60), ..Default::default() };
		let issued_at = OffsetDateTime::from_unix_timestamp(1_000)
			.expect("Timestamp fixture should be valid.");

		assert_eq!(
			token.expires_at(issued_at),
			OffsetDateTime::from_unix_timestamp(1_060).ok()
		);
		assert_eq!(Token::default().expires_at(issued_at), None);
	}

	#[test]
	fn form_pairs_land_in_extra() {
		let body = "oauth_token=at&oauth_token_secret=ats&screen_name=octocat";
		let token = Token::from_form_pairs(url::form_urlencoded::parse(body.as_bytes()));

		assert!(token.access_token.is_none());
		assert_eq!(token.extra.get("oauth_token"), Some(&Value::String("at".into())));
		assert_eq!(token.extra.get("screen_name"), Some(&Value::String("octocat".into())));
	}

	#[test]
	fn request_token_serde_round_trips() {
		let request_token = RequestToken {
			oauth_token: "rt".into(),
			oauth_token_secret: Some(TokenSecret::new("rts")),
			extra: BTreeMap::from_iter([(
				"oauth_callback_confirmed".to_owned(),
				Value::String("true".into()),
			)]),
		};
		let payload = serde_json::to_value(&request_token)
			.expect("Request token should serialize to JSON.");
		let round_trip: RequestToken = serde_json::from_value(payload)
			.expect("Serialized request token should deserialize.");

		assert_eq!(round_trip, request_token);
	}
}
