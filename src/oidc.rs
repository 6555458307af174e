//! OpenID Connect surface: ID token verification and the userinfo fetcher.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
	Algorithm, DecodingKey, Validation, decode, decode_header,
	jwk::{Jwk, JwkSet},
};
use sha2::{Digest, Sha256, Sha384, Sha512};
// self
use crate::{
	_prelude::*,
	api::{Method, RequestOptions},
	auth::{IdTokenClaims, Token, UserInfo},
	error::IdTokenError,
	http::RemoteHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	remote::RemoteClient,
};

/// Clock-skew tolerance applied to time-based ID token claims.
const LEEWAY_SECS: u64 = 120;

/// Claim expectations that override the metadata-derived defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimsOptions {
	/// Expected issuer; defaults to the discovered `issuer` when unset.
	pub issuer: Option<String>,
	/// Expected audience; defaults to the configured client id when unset.
	pub audience: Option<String>,
}

impl<C> RemoteClient<C>
where
	C: ?Sized + RemoteHttpClient,
{
	/// Verifies and decodes the ID token inside a token response.
	///
	/// Returns `Ok(None)` when the response carries no `id_token` member; implicit and plain
	/// OAuth 2.0 responses are legal and this is not an error. Otherwise the token must pass the
	/// provider's signing-algorithm allow-list (defaulting to `RS256`), signature verification
	/// against the cached JWK set (with one forced refresh when the key id is unknown), and
	/// claims validation: issuer, audience, expiry/issued-at within a 120-second leeway, the
	/// `nonce` persisted at authorization time, and (when the response carries an access token)
	/// the `at_hash` binding.
	pub async fn parse_id_token(
		&self,
		token: &Token,
		nonce: Option<&str>,
		claims_options: Option<ClaimsOptions>,
	) -> Result<Option<IdTokenClaims>> {
		let Some(raw) = token.id_token.as_deref() else {
			return Ok(None);
		};
		let metadata = self.resolve_metadata().await?;
		let options = claims_options.unwrap_or_default();
		let header =
			decode_header(raw).map_err(|source| IdTokenError::Malformed { source })?;
		let allowed = metadata
			.id_token_signing_alg_values_supported
			.clone()
			.unwrap_or_else(|| vec!["RS256".to_owned()]);
		let allowed_algs: Vec<Algorithm> =
			allowed.iter().filter_map(|name| Algorithm::from_str(name).ok()).collect();

		if !allowed_algs.contains(&header.alg) {
			return Err(IdTokenError::AlgorithmNotAllowed { alg: format!("{:?}", header.alg) }.into());
		}

		let jwk = self.resolve_signing_key(header.kid.as_deref()).await?;
		let key =
			DecodingKey::from_jwk(&jwk).map_err(|source| IdTokenError::Verification { source })?;
		let mut validation = Validation::new(header.alg);

		validation.leeway = LEEWAY_SECS;
		validation
			.set_audience(&[options.audience.as_deref().unwrap_or(&self.config.client_id)]);

		if let Some(issuer) = options.issuer.as_deref().or(metadata.issuer.as_deref()) {
			validation.set_issuer(&[issuer]);
		}

		let decoded = decode::<IdTokenClaims>(raw, &key, &validation)
			.map_err(|source| IdTokenError::Verification { source })?;
		let claims = decoded.claims;

		validate_issued_at(&claims)?;
		validate_nonce(&claims, nonce)?;

		if token.access_token.is_some() {
			validate_at_hash(&claims, token, header.alg)?;
		}

		Ok(Some(claims))
	}

	/// Fetches and normalizes claims from the discovered `userinfo_endpoint`.
	///
	/// The call goes through the authenticated request gateway, so `options` controls how the
	/// token is resolved. A registered compliance-fix hook transforms the raw JSON first.
	pub async fn fetch_userinfo(&self, options: RequestOptions) -> Result<UserInfo> {
		const KIND: FlowKind = FlowKind::UserInfo;

		let span = FlowSpan::new(KIND, "fetch_userinfo");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let metadata = self.resolve_metadata().await?;
				let endpoint =
					metadata.userinfo_endpoint.ok_or(Error::MissingUserinfoEndpoint)?;
				let response =
					self.request(Method::GET, endpoint.as_str(), options).await?.ensure_success()?;
				let mut raw: Value = response.json()?;

				if let Some(fix) = &self.compliance_fix {
					raw = fix.fix_userinfo(raw).await?;
				}

				crate::api::from_json_value(raw).map_err(Error::from)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Resolves the signing key by key id, forcing exactly one JWKS refresh on a miss.
	async fn resolve_signing_key(&self, kid: Option<&str>) -> Result<Jwk> {
		let jwks = self.fetch_jwk_set(false).await?;

		if let Some(jwk) = find_key(&jwks, kid) {
			return Ok(jwk.clone());
		}

		let refreshed = self.fetch_jwk_set(true).await?;

		find_key(&refreshed, kid)
			.cloned()
			.ok_or_else(|| IdTokenError::UnknownKey { kid: kid.map(str::to_owned) }.into())
	}
}

fn find_key<'a>(jwks: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
	match kid {
		Some(kid) => jwks.find(kid),
		// A set with a single key needs no key id to disambiguate.
		None if jwks.keys.len() == 1 => jwks.keys.first(),
		None => None,
	}
}

fn validate_issued_at(claims: &IdTokenClaims) -> Result<()> {
	let Some(iat) = claims.iat else {
		return Ok(());
	};
	let now = OffsetDateTime::now_utc().unix_timestamp();

	if iat > now + LEEWAY_SECS as i64 {
		return Err(IdTokenError::ClaimMismatch {
			claim: "iat",
			reason: "issued-at instant lies in the future".into(),
		}
		.into());
	}

	Ok(())
}

fn validate_nonce(claims: &IdTokenClaims, expected: Option<&str>) -> Result<()> {
	let Some(expected) = expected else {
		return Ok(());
	};

	if claims.nonce.as_deref() != Some(expected) {
		return Err(IdTokenError::ClaimMismatch {
			claim: "nonce",
			reason: "value does not match the nonce persisted at authorization time".into(),
		}
		.into());
	}

	Ok(())
}

/// OpenID Connect Core §3.1.3.6: base64url of the left half of the access token's digest under
/// the ID token's signing-algorithm hash.
fn validate_at_hash(claims: &IdTokenClaims, token: &Token, alg: Algorithm) -> Result<()> {
	let Some(at_hash) = claims.at_hash.as_deref() else {
		return Ok(());
	};
	let Some(access_token) = token.bearer() else {
		return Ok(());
	};
	let digest = match alg {
		Algorithm::HS256 | Algorithm::RS256 | Algorithm::PS256 | Algorithm::ES256 =>
			Sha256::digest(access_token.as_bytes()).to_vec(),
		Algorithm::HS384 | Algorithm::RS384 | Algorithm::PS384 | Algorithm::ES384 =>
			Sha384::digest(access_token.as_bytes()).to_vec(),
		_ => Sha512::digest(access_token.as_bytes()).to_vec(),
	};
	let expected = URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2]);

	if at_hash != expected {
		return Err(IdTokenError::ClaimMismatch {
			claim: "at_hash",
			reason: "hash does not bind the returned access token".into(),
		}
		.into());
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::TokenSecret;

	fn claims_with(at_hash: Option<&str>, nonce: Option<&str>) -> IdTokenClaims {
		IdTokenClaims {
			iss: None,
			sub: None,
			aud: None,
			exp: None,
			iat: None,
			nonce: nonce.map(str::to_owned),
			at_hash: at_hash.map(str::to_owned),
			azp: None,
			extra: BTreeMap::new(),
		}
	}

	#[test]
	fn nonce_validation_requires_equality() {
		assert!(validate_nonce(&claims_with(None, Some("n-1")), Some("n-1")).is_ok());
		assert!(validate_nonce(&claims_with(None, None), None).is_ok());

		let err = validate_nonce(&claims_with(None, Some("n-1")), Some("n-2"))
			.expect_err("Nonce mismatch should fail.");

		assert!(matches!(
			err,
			Error::IdToken(IdTokenError::ClaimMismatch { claim: "nonce", .. })
		));

		let err = validate_nonce(&claims_with(None, None), Some("n-1"))
			.expect_err("Missing nonce claim should fail when one was issued.");

		assert!(matches!(err, Error::IdToken(IdTokenError::ClaimMismatch { .. })));
	}

	#[test]
	fn at_hash_binds_the_access_token() {
		let access_token = "access-token-value";
		let digest = Sha256::digest(access_token.as_bytes());
		let expected = URL_SAFE_NO_PAD.encode(&digest[..16]);
		let token = Token {
			access_token: Some(TokenSecret::new(access_token)),
			..Default::default()
		};

		assert!(
			validate_at_hash(&claims_with(Some(&expected), None), &token, Algorithm::RS256).is_ok()
		);

		let err = validate_at_hash(&claims_with(Some("bogus"), None), &token, Algorithm::RS256)
			.expect_err("Wrong at_hash should fail.");

		assert!(matches!(
			err,
			Error::IdToken(IdTokenError::ClaimMismatch { claim: "at_hash", .. })
		));
		assert!(
			validate_at_hash(&claims_with(None, None), &token, Algorithm::RS256).is_ok(),
			"Absent at_hash claims are not validated."
		);
	}

	#[test]
	fn future_issued_at_is_rejected_beyond_leeway() {
		let now = OffsetDateTime::now_utc().unix_timestamp();
		let mut claims = claims_with(None, None);

		claims.iat = Some(now + 60);

		assert!(validate_issued_at(&claims).is_ok(), "Small skew stays within leeway.");

		claims.iat = Some(now + 600);

		assert!(validate_issued_at(&claims).is_err());
	}
}
