//! OAuth 2.0 authorization-code driver built on the `oauth2` facade.

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, ExtraTokenFields,
	HttpClientError, RedirectUrl, RequestTokenError, StandardRevocableToken,
	StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::{Token, TokenSecret},
	error::{ConfigError, EndpointError},
	flows::session::{self, AuthorizationHandshake, AuthorizationState},
	http::{RemoteHttpClient, map_http_client_error},
	provider::ServerMetadata,
	remote::RemoteClient,
};

/// Token-response members captured beyond RFC 6749: the OpenID Connect `id_token` plus any other
/// extra members the provider returns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OidcTokenFields {
	/// Raw ID token (compact JWS).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
	/// Any further response members.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
impl ExtraTokenFields for OidcTokenFields {}

type OidcTokenResponse = StandardTokenResponse<OidcTokenFields, BasicTokenType>;
type UnconfiguredOidcClient = oauth2::Client<
	BasicErrorResponse,
	OidcTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
>;

impl<C> RemoteClient<C>
where
	C: ?Sized + RemoteHttpClient,
{
	pub(crate) fn create_oauth2_authorization_url(
		&self,
		metadata: &ServerMetadata,
		redirect_uri: Option<Url>,
		params: BTreeMap<String, String>,
	) -> Result<AuthorizationHandshake> {
		let mut url = self
			.config
			.authorize_url
			.clone()
			.or_else(|| metadata.authorization_endpoint.clone())
			.ok_or(Error::MissingAuthorizeUrl)?;
		let mut merged = self.config.authorize_params.clone();

		merged.extend(params);

		let state = merged.remove("state").unwrap_or_else(session::generate_state);
		let nonce = match merged.remove("nonce") {
			Some(nonce) => Some(nonce),
			None if scope_requests_openid(&merged) => Some(session::generate_nonce()),
			None => None,
		};
		let response_type = merged.remove("response_type").unwrap_or_else(|| "code".to_owned());

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair("response_type", &response_type);
			pairs.append_pair("client_id", &self.config.client_id);

			if let Some(redirect) = &redirect_uri {
				pairs.append_pair("redirect_uri", redirect.as_str());
			}

			pairs.append_pair("state", &state);

			if let Some(nonce) = &nonce {
				pairs.append_pair("nonce", nonce);
			}

			for (key, value) in &merged {
				pairs.append_pair(key, value);
			}
		}

		Ok(AuthorizationHandshake {
			url,
			state: AuthorizationState {
				state: Some(state),
				request_token: None,
				redirect_uri,
				nonce,
			},
		})
	}

	pub(crate) async fn fetch_oauth2_access_token(
		&self,
		metadata: &ServerMetadata,
		redirect_uri: Option<Url>,
		params: BTreeMap<String, String>,
	) -> Result<Token> {
		let endpoint = self
			.config
			.access_token_url
			.clone()
			.or_else(|| metadata.token_endpoint.clone())
			.ok_or(Error::MissingTokenEndpoint)?;
		let mut merged = self.config.access_token_params.clone();

		merged.extend(params);

		let code = merged.remove("code").ok_or(ConfigError::MissingAuthorizationCode)?;

		// Validated upstream against the persisted handshake; never forwarded.
		merged.remove("state");

		let token_url = TokenUrl::new(endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let mut oauth_client = UnconfiguredOidcClient::new(ClientId::new(
			self.config.client_id.clone(),
		))
		.set_token_uri(token_url);

		if let Some(secret) = &self.config.client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
		}

		let mut request = oauth_client.exchange_code(AuthorizationCode::new(code));

		if let Some(redirect) = &redirect_uri {
			let redirect_url = RedirectUrl::new(redirect.to_string())
				.map_err(|source| ConfigError::InvalidRedirect { source })?;

			request = request.set_redirect_uri(Cow::Owned(redirect_url));
		}

		for (key, value) in &merged {
			request = request.add_extra_param(key, value);
		}

		let handle = self.http_client.handle();
		let response = request.request_async(&handle).await.map_err(map_exchange_error)?;

		Ok(token_from_response(response))
	}
}

fn scope_requests_openid(params: &BTreeMap<String, String>) -> bool {
	params
		.get("scope")
		.map(|scope| scope.split_whitespace().any(|value| value == "openid"))
		.unwrap_or(false)
}

fn token_from_response(response: OidcTokenResponse) -> Token {
	Token {
		access_token: Some(TokenSecret::new(response.access_token().secret().clone())),
		token_type: Some(token_type_label(response.token_type())),
		refresh_token: response
			.refresh_token()
			.map(|secret| TokenSecret::new(secret.secret().clone())),
		id_token: response.extra_fields().id_token.clone(),
		expires_in: response.expires_in().and_then(|value| i64::try_from(value.as_secs()).ok()),
		scope: response.scopes().map(|scopes| {
			scopes.iter().map(|scope| scope.as_ref()).collect::<Vec<&str>>().join(" ")
		}),
		extra: response.extra_fields().extra.clone(),
	}
}

fn token_type_label(value: &BasicTokenType) -> String {
	serde_json::to_value(value)
		.ok()
		.and_then(|rendered| rendered.as_str().map(str::to_owned))
		.unwrap_or_else(|| "bearer".to_owned())
}

fn map_exchange_error<E>(err: RequestTokenError<HttpClientError<E>, BasicErrorResponse>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		RequestTokenError::ServerResponse(response) => {
			let error = response.error().as_ref().to_owned();
			let reason = match response.error_description() {
				Some(description) => format!("{error}: {description}"),
				None => error,
			};

			EndpointError::Rejected { reason }.into()
		},
		RequestTokenError::Request(error) => map_http_client_error(error),
		RequestTokenError::Parse(source, _body) => EndpointError::Json { source }.into(),
		RequestTokenError::Other(message) => EndpointError::Unexpected { message }.into(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn openid_scope_detection_is_word_exact() {
		let mut params = BTreeMap::new();

		params.insert("scope".to_owned(), "openid email".to_owned());

		assert!(scope_requests_openid(&params));

		params.insert("scope".to_owned(), "openidconnectish".to_owned());

		assert!(!scope_requests_openid(&params));
		assert!(!scope_requests_openid(&BTreeMap::new()));
	}

	#[test]
	fn oidc_token_fields_capture_id_token_and_extras() {
		let fields: OidcTokenFields =
			serde_json::from_str("{\"id_token\":\"a.b.c\",\"session_state\":\"s\"}")
				.expect("Extra token fields should deserialize.");

		assert_eq!(fields.id_token.as_deref(), Some("a.b.c"));
		assert_eq!(fields.extra.get("session_state"), Some(&Value::String("s".into())));
	}
}
