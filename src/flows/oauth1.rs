//! OAuth 1.0 driver: RFC 5849 request signing, request-token acquisition, and the verifier
//! exchange.

// std
use std::borrow::Cow;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
// self
use crate::{
	_prelude::*,
	api::{ApiResponse, Method, RequestOptions},
	auth::{RequestToken, Token, TokenSecret},
	error::EndpointError,
	flows::session::{self, AuthorizationHandshake, AuthorizationState},
	http::RemoteHttpClient,
	remote::RemoteClient,
};

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 16;
// RFC 5849 §3.6: everything outside `ALPHA / DIGIT / - . _ ~` is percent-encoded.
const OAUTH1_UNRESERVED: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

impl<C> RemoteClient<C>
where
	C: ?Sized + RemoteHttpClient,
{
	pub(crate) async fn create_oauth1_authorization_url(
		&self,
		request_token_url: &Url,
		redirect_uri: Option<Url>,
		params: BTreeMap<String, String>,
	) -> Result<AuthorizationHandshake> {
		let mut oauth_params = Vec::new();

		if let Some(redirect) = &redirect_uri {
			oauth_params.push(("oauth_callback".to_owned(), redirect.to_string()));
		}

		let response = self
			.signed_oauth1_post(
				request_token_url,
				oauth_params,
				None,
				&self.config.request_token_params,
			)
			.await?;
		let request_token = parse_request_token(&response)?;

		#[cfg(feature = "tracing")]
		tracing::debug!(
			provider = %self.config.id,
			oauth_token = %request_token.oauth_token,
			"Fetched OAuth 1.0 request token."
		);

		let mut url = self.config.authorize_url.clone().ok_or(Error::MissingAuthorizeUrl)?;
		let mut merged = self.config.authorize_params.clone();

		merged.extend(params);

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair("oauth_token", &request_token.oauth_token);

			for (key, value) in &merged {
				pairs.append_pair(key, value);
			}
		}

		Ok(AuthorizationHandshake {
			url,
			state: AuthorizationState {
				state: None,
				request_token: Some(request_token),
				redirect_uri,
				nonce: None,
			},
		})
	}

	pub(crate) async fn fetch_oauth1_access_token(
		&self,
		request_token: Option<RequestToken>,
		params: BTreeMap<String, String>,
	) -> Result<Token> {
		let request_token = request_token.ok_or(Error::MissingRequestToken)?;
		let endpoint = self.config.access_token_url.clone().ok_or(Error::MissingTokenEndpoint)?;
		// The request token merged with the verifier becomes the active credential.
		let mut oauth_params = vec![("oauth_token".to_owned(), request_token.oauth_token.clone())];
		let mut extra_query = self.config.access_token_params.clone();

		for (key, value) in params {
			if key.starts_with("oauth_") {
				oauth_params.push((key, value));
			} else {
				extra_query.insert(key, value);
			}
		}

		let token_secret = request_token.oauth_token_secret.as_ref().map(TokenSecret::expose);
		let response =
			self.signed_oauth1_post(&endpoint, oauth_params, token_secret, &extra_query).await?;

		Ok(Token::from_form_pairs(response.form_pairs()))
	}

	async fn signed_oauth1_post(
		&self,
		endpoint: &Url,
		mut oauth_params: Vec<(String, String)>,
		token_secret: Option<&str>,
		extra_query: &BTreeMap<String, String>,
	) -> Result<ApiResponse> {
		let mut url = endpoint.clone();

		if !extra_query.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in extra_query {
				pairs.append_pair(key, value);
			}
		}

		oauth_params.push(("oauth_consumer_key".to_owned(), self.config.client_id.clone()));
		oauth_params.push(("oauth_nonce".to_owned(), session::random_string(NONCE_LEN)));
		oauth_params.push(("oauth_signature_method".to_owned(), SIGNATURE_METHOD.to_owned()));
		oauth_params.push((
			"oauth_timestamp".to_owned(),
			OffsetDateTime::now_utc().unix_timestamp().to_string(),
		));
		oauth_params.push(("oauth_version".to_owned(), OAUTH_VERSION.to_owned()));

		let mut signed_params = oauth_params.clone();

		for (key, value) in url.query_pairs() {
			signed_params.push((key.into_owned(), value.into_owned()));
		}

		let consumer_secret =
			self.config.client_secret.as_ref().map(TokenSecret::expose).unwrap_or("");
		let base = signature_base_string("POST", &url, &signed_params);
		let signature = sign(&base, consumer_secret, token_secret.unwrap_or(""));

		oauth_params.push(("oauth_signature".to_owned(), signature));

		let options =
			RequestOptions::new().bypass_auth().header("authorization", authorization_header(&oauth_params));

		self.request(Method::POST, url.as_str(), options).await?.ensure_success()
	}
}

fn oauth1_encode(value: &str) -> Cow<'_, str> {
	utf8_percent_encode(value, OAUTH1_UNRESERVED).into()
}

/// RFC 5849 §3.4.1: `METHOD & enc(base URL) & enc(normalized parameters)`.
fn signature_base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
	let mut encoded: Vec<(String, String)> = params
		.iter()
		.map(|(key, value)| (oauth1_encode(key).into_owned(), oauth1_encode(value).into_owned()))
		.collect();

	encoded.sort();

	let normalized =
		encoded.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&");
	let base_url = {
		let mut base = url.clone();

		base.set_query(None);
		base.set_fragment(None);

		base.to_string()
	};

	format!(
		"{}&{}&{}",
		method.to_ascii_uppercase(),
		oauth1_encode(&base_url),
		oauth1_encode(&normalized)
	)
}

fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> String {
	let key = format!("{}&{}", oauth1_encode(consumer_secret), oauth1_encode(token_secret));
	let mut mac =
		HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC-SHA1 accepts keys of any length.");

	mac.update(base.as_bytes());

	STANDARD.encode(mac.finalize().into_bytes())
}

fn authorization_header(oauth_params: &[(String, String)]) -> String {
	let rendered = oauth_params
		.iter()
		.map(|(key, value)| format!("{}=\"{}\"", oauth1_encode(key), oauth1_encode(value)))
		.collect::<Vec<_>>()
		.join(", ");

	format!("OAuth {rendered}")
}

fn parse_request_token(response: &ApiResponse) -> Result<RequestToken> {
	let mut oauth_token = None;
	let mut oauth_token_secret = None;
	let mut extra = BTreeMap::new();

	for (key, value) in response.form_pairs() {
		match key.as_ref() {
			"oauth_token" => oauth_token = Some(value.into_owned()),
			"oauth_token_secret" => oauth_token_secret = Some(TokenSecret::new(value.into_owned())),
			other => {
				extra.insert(other.to_owned(), Value::String(value.into_owned()));
			},
		}
	}

	let oauth_token = oauth_token.ok_or_else(|| EndpointError::Form {
		reason: "request token response is missing oauth_token".into(),
	})?;

	Ok(RequestToken { oauth_token, oauth_token_secret, extra })
}
