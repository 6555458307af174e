//! Builder-validated static configuration for one remote provider.

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, TokenSecret},
	provider::ServerMetadata,
};

/// Errors raised while constructing or validating provider configuration.
#[derive(Debug, ThisError)]
pub enum ProviderConfigError {
	/// Client id is mandatory for every flow.
	#[error("Client id cannot be empty.")]
	EmptyClientId,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} URL must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// OAuth 1.0 providers cannot be discovered; their endpoints must be static.
	#[error("A request_token_url requires static authorize_url and access_token_url values.")]
	Oauth1RequiresStaticEndpoints,
}

/// Immutable static identity of one configured OAuth/OIDC provider.
///
/// Constructed once at startup via [`ProviderConfig::builder`]. Everything mutable at runtime
/// (the discovered metadata cache) lives on [`RemoteClient`](crate::remote::RemoteClient)
/// instead, so configs can be shared freely.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
	/// Provider identifier used in session keys and observability fields.
	pub id: ProviderId,
	/// OAuth client identifier issued by the provider.
	pub client_id: String,
	/// Client secret for confidential clients; redacted in `Debug` output.
	pub client_secret: Option<TokenSecret>,
	/// Static authorization endpoint override.
	pub authorize_url: Option<Url>,
	/// Static token endpoint override.
	pub access_token_url: Option<Url>,
	/// OAuth 1.0 request-token endpoint; its presence selects the OAuth 1.0 flow.
	pub request_token_url: Option<Url>,
	/// Base URL that relative resource paths resolve against.
	pub api_base_url: Option<Url>,
	/// Discovery document URL, fetched lazily at most once.
	pub server_metadata_url: Option<Url>,
	/// Default parameters merged into every authorization URL.
	pub authorize_params: BTreeMap<String, String>,
	/// Default parameters merged into every access-token exchange.
	pub access_token_params: BTreeMap<String, String>,
	/// Default parameters merged into every OAuth 1.0 request-token call.
	pub request_token_params: BTreeMap<String, String>,
	/// Statically seeded metadata (issuer, endpoints, JWKS) for providers without discovery.
	pub server_metadata: ServerMetadata,
}
impl ProviderConfig {
	/// Creates a new builder for the provided identifier and client id.
	pub fn builder(id: ProviderId, client_id: impl Into<String>) -> ProviderConfigBuilder {
		ProviderConfigBuilder::new(id, client_id)
	}
}

/// Builder for [`ProviderConfig`] values.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
	id: ProviderId,
	client_id: String,
	client_secret: Option<TokenSecret>,
	authorize_url: Option<Url>,
	access_token_url: Option<Url>,
	request_token_url: Option<Url>,
	api_base_url: Option<Url>,
	server_metadata_url: Option<Url>,
	authorize_params: BTreeMap<String, String>,
	access_token_params: BTreeMap<String, String>,
	request_token_params: BTreeMap<String, String>,
	server_metadata: ServerMetadata,
}
impl ProviderConfigBuilder {
	fn new(id: ProviderId, client_id: impl Into<String>) -> Self {
		Self {
			id,
			client_id: client_id.into(),
			client_secret: None,
			authorize_url: None,
			access_token_url: None,
			request_token_url: None,
			api_base_url: None,
			server_metadata_url: None,
			authorize_params: BTreeMap::new(),
			access_token_params: BTreeMap::new(),
			request_token_params: BTreeMap::new(),
			server_metadata: ServerMetadata::default(),
		}
	}

	/// Attaches a confidential client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the static authorization endpoint.
	pub fn authorize_url(mut self, url: Url) -> Self {
		self.authorize_url = Some(url);

		self
	}

	/// Sets the static token endpoint.
	pub fn access_token_url(mut self, url: Url) -> Self {
		self.access_token_url = Some(url);

		self
	}

	/// Sets the OAuth 1.0 request-token endpoint, selecting the OAuth 1.0 flow.
	pub fn request_token_url(mut self, url: Url) -> Self {
		self.request_token_url = Some(url);

		self
	}

	/// Sets the base URL for relative resource paths.
	pub fn api_base_url(mut self, url: Url) -> Self {
		self.api_base_url = Some(url);

		self
	}

	/// Sets the discovery document URL.
	pub fn server_metadata_url(mut self, url: Url) -> Self {
		self.server_metadata_url = Some(url);

		self
	}

	/// Adds a default authorization-URL parameter.
	pub fn authorize_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.authorize_params.insert(key.into(), value.into());

		self
	}

	/// Adds a default access-token exchange parameter.
	pub fn access_token_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.access_token_params.insert(key.into(), value.into());

		self
	}

	/// Adds a default request-token call parameter.
	pub fn request_token_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.request_token_params.insert(key.into(), value.into());

		self
	}

	/// Seeds static server metadata for providers without a discovery document.
	pub fn server_metadata(mut self, metadata: ServerMetadata) -> Self {
		self.server_metadata = metadata;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ProviderConfig, ProviderConfigError> {
		let config = ProviderConfig {
			id: self.id,
			client_id: self.client_id,
			client_secret: self.client_secret,
			authorize_url: self.authorize_url,
			access_token_url: self.access_token_url,
			request_token_url: self.request_token_url,
			api_base_url: self.api_base_url,
			server_metadata_url: self.server_metadata_url,
			authorize_params: self.authorize_params,
			access_token_params: self.access_token_params,
			request_token_params: self.request_token_params,
			server_metadata: self.server_metadata,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ProviderConfig {
	fn validate(&self) -> Result<(), ProviderConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ProviderConfigError::EmptyClientId);
		}
		if self.request_token_url.is_some()
			&& (self.authorize_url.is_none() || self.access_token_url.is_none())
		{
			return Err(ProviderConfigError::Oauth1RequiresStaticEndpoints);
		}

		validate_endpoint("authorize_url", self.authorize_url.as_ref())?;
		validate_endpoint("access_token_url", self.access_token_url.as_ref())?;
		validate_endpoint("request_token_url", self.request_token_url.as_ref())?;
		validate_endpoint("api_base_url", self.api_base_url.as_ref())?;
		validate_endpoint("server_metadata_url", self.server_metadata_url.as_ref())?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: Option<&Url>) -> Result<(), ProviderConfigError> {
	match url {
		Some(url) if url.scheme() != "https" =>
			Err(ProviderConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
		_ => Ok(()),
	}
}
