//! Typed authorization-server metadata with idempotent merge semantics.

// crates.io
use jsonwebtoken::jwk::JwkSet;
// self
use crate::_prelude::*;

/// Authorization-server metadata, either statically seeded or fetched from a discovery document.
///
/// Named members cover everything the engine reads; any other discovery values survive inside
/// [`extra`](Self::extra) so integration layers can inspect them. [`merge`](Self::merge) is
/// idempotent and never erases a cached value with an absent one, which keeps a racing second
/// discovery fetch benign.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerMetadata {
	/// Issuer identifier expected inside ID tokens.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub issuer: Option<String>,
	/// Authorization endpoint used to build redirect URLs.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint used for code exchanges.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token_endpoint: Option<Url>,
	/// Userinfo endpoint consumed by the userinfo fetcher.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub userinfo_endpoint: Option<Url>,
	/// JWKS document location for key refreshes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub jwks_uri: Option<Url>,
	/// Cached JWK set used to verify ID token signatures.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub jwks: Option<JwkSet>,
	/// Signing-algorithm allow-list advertised by the provider.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id_token_signing_alg_values_supported: Option<Vec<String>>,
	/// Any additional discovery values.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
impl ServerMetadata {
	/// Merges another metadata document into this one.
	///
	/// Present fields in `other` win; absent fields never erase cached values. Extra members are
	/// inserted key-by-key with the same override rule.
	pub fn merge(&mut self, other: ServerMetadata) {
		let ServerMetadata {
			issuer,
			authorization_endpoint,
			token_endpoint,
			userinfo_endpoint,
			jwks_uri,
			jwks,
			id_token_signing_alg_values_supported,
			extra,
		} = other;

		merge_field(&mut self.issuer, issuer);
		merge_field(&mut self.authorization_endpoint, authorization_endpoint);
		merge_field(&mut self.token_endpoint, token_endpoint);
		merge_field(&mut self.userinfo_endpoint, userinfo_endpoint);
		merge_field(&mut self.jwks_uri, jwks_uri);
		merge_field(&mut self.jwks, jwks);
		merge_field(
			&mut self.id_token_signing_alg_values_supported,
			id_token_signing_alg_values_supported,
		);

		for (key, value) in extra {
			self.extra.insert(key, value);
		}
	}
}

fn merge_field<T>(slot: &mut Option<T>, incoming: Option<T>) {
	if incoming.is_some() {
		*slot = incoming;
	}
}
