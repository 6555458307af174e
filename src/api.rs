//! Authenticated request gateway for provider APIs and discovery documents.
//!
//! [`RemoteClient::request`] resolves the target URL against the configured `api_base_url`,
//! resolves the current token (explicit argument, per-call resolver hook, then the client-level
//! registration), attaches it bearer-style, and executes the call through the pluggable
//! transport. Discovery and OAuth 1.0 request-token calls reuse the same path with
//! authentication bypassed.

pub use oauth2::http::Method;

// crates.io
use oauth2::{AsyncHttpClient, HttpResponse, http::Request, http::header::AUTHORIZATION};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::Token,
	error::{ConfigError, EndpointError},
	ext::TokenResolver,
	http::{RemoteHttpClient, map_http_client_error},
	remote::RemoteClient,
};

/// Per-call options accepted by [`RemoteClient::request`].
#[derive(Default)]
pub struct RequestOptions {
	/// Explicit token attached to the call, taking priority over every resolver.
	pub token: Option<Token>,
	/// Per-call token resolver, consulted when no explicit token is present.
	pub resolver: Option<Arc<dyn TokenResolver>>,
	/// Skips token resolution entirely (public/discovery endpoints).
	pub bypass_auth: bool,
	/// Additional request headers.
	pub headers: Vec<(String, String)>,
	/// Request body bytes.
	pub body: Option<Vec<u8>>,
}
impl RequestOptions {
	/// Creates empty options (authenticated call, no explicit token).
	pub fn new() -> Self {
		Self::default()
	}

	/// Attaches an explicit token.
	pub fn with_token(mut self, token: Token) -> Self {
		self.token = Some(token);

		self
	}

	/// Attaches a per-call token resolver.
	pub fn with_resolver(mut self, resolver: Arc<dyn TokenResolver>) -> Self {
		self.resolver = Some(resolver);

		self
	}

	/// Disables token resolution for this call.
	pub fn bypass_auth(mut self) -> Self {
		self.bypass_auth = true;

		self
	}

	/// Adds a request header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets the request body.
	pub fn body(mut self, bytes: Vec<u8>) -> Self {
		self.body = Some(bytes);

		self
	}
}
impl Debug for RequestOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestOptions")
			.field("token_set", &self.token.is_some())
			.field("resolver_set", &self.resolver.is_some())
			.field("bypass_auth", &self.bypass_auth)
			.field("headers", &self.headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}

/// Response wrapper produced by the gateway.
#[derive(Debug)]
pub struct ApiResponse(HttpResponse);
impl ApiResponse {
	/// HTTP status code.
	pub fn status(&self) -> u16 {
		self.0.status().as_u16()
	}

	/// Returns true for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.0.status().is_success()
	}

	/// Fails with an [`EndpointError`] unless the status is 2xx.
	pub fn ensure_success(self) -> Result<Self> {
		if self.is_success() {
			Ok(self)
		} else {
			Err(EndpointError::Unexpected { message: format!("HTTP status {}", self.status()) }
				.into())
		}
	}

	/// Returns the first value of the named header, when readable as a string.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.0.headers().get(name).and_then(|value| value.to_str().ok())
	}

	/// Raw response body bytes.
	pub fn body(&self) -> &[u8] {
		self.0.body()
	}

	/// Deserializes the body as JSON with path-aware errors.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(self.body());

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| EndpointError::Json { source }.into())
	}

	/// Interprets the body as UTF-8 text.
	pub fn text(&self) -> Result<String> {
		String::from_utf8(self.body().to_vec()).map_err(|_| EndpointError::NonUtf8Body.into())
	}

	/// Iterates the body as form-encoded key/value pairs.
	pub(crate) fn form_pairs(&self) -> url::form_urlencoded::Parse<'_> {
		url::form_urlencoded::parse(self.body())
	}
}
impl From<HttpResponse> for ApiResponse {
	fn from(response: HttpResponse) -> Self {
		Self(response)
	}
}

/// Deserializes an owned JSON value with path-aware errors.
pub(crate) fn from_json_value<T>(value: Value) -> Result<T, EndpointError>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(|source| EndpointError::Json { source })
}

impl<C> RemoteClient<C>
where
	C: ?Sized + RemoteHttpClient,
{
	/// Performs an HTTP call with automatic token attachment.
	///
	/// Relative URLs resolve against `api_base_url`. Unless `bypass_auth` is set, the token
	/// resolves in priority order: explicit option, per-call resolver, client-level resolver;
	/// exhausting all three fails with [`Error::MissingToken`] before any network activity.
	pub async fn request(
		&self,
		method: Method,
		url: &str,
		options: RequestOptions,
	) -> Result<ApiResponse> {
		let resolved_url = self.resolve_url(url)?;
		let token =
			if options.bypass_auth { None } else { Some(self.resolve_call_token(&options).await?) };
		let mut builder = Request::builder().method(method).uri(resolved_url.as_str());

		if let Some(token) = &token {
			let bearer = token.bearer().ok_or(Error::MissingToken)?;

			builder = builder.header(AUTHORIZATION, format!("Bearer {bearer}"));
		}

		for (name, value) in &options.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}

		let request =
			builder.body(options.body.unwrap_or_default()).map_err(ConfigError::HttpRequest)?;
		let handle = self.http_client.handle();
		let response = handle.call(request).await.map_err(map_http_client_error)?;

		Ok(response.into())
	}

	/// Convenience wrapper for authenticated GET requests.
	pub async fn get(&self, url: &str, options: RequestOptions) -> Result<ApiResponse> {
		self.request(Method::GET, url, options).await
	}

	/// Convenience wrapper for authenticated POST requests.
	pub async fn post(&self, url: &str, options: RequestOptions) -> Result<ApiResponse> {
		self.request(Method::POST, url, options).await
	}

	async fn resolve_call_token(&self, options: &RequestOptions) -> Result<Token> {
		if let Some(token) = &options.token {
			return Ok(token.clone());
		}
		if let Some(resolver) = &options.resolver {
			if let Some(token) = resolver.resolve_token().await? {
				return Ok(token);
			}
		}
		if let Some(resolver) = &self.token_resolver {
			if let Some(token) = resolver.resolve_token().await? {
				return Ok(token);
			}
		}

		Err(Error::MissingToken)
	}

	fn resolve_url(&self, url: &str) -> Result<Url> {
		if url.starts_with("https://") || url.starts_with("http://") {
			return Url::parse(url).map_err(|source| ConfigError::InvalidEndpoint { source }.into());
		}

		let base = self.config.api_base_url.as_ref().ok_or(Error::MissingApiBaseUrl)?;

		base.join(url).map_err(|source| ConfigError::InvalidEndpoint { source }.into())
	}
}
