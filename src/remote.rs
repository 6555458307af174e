//! The remote-provider client engine and its lazy metadata resolver.

// crates.io
use jsonwebtoken::jwk::JwkSet;
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	api::RequestOptions,
	ext::{ComplianceFix, TokenResolver, TokenUpdater},
	http::RemoteHttpClient,
	provider::{ProviderConfig, ServerMetadata},
	store::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestRemoteClient = RemoteClient<ReqwestHttpClient>;

/// Drives every flow against a single configured OAuth/OIDC provider.
///
/// The client owns the HTTP transport, static configuration, session store, hook registrations,
/// and the mutable server-metadata cache so flow implementations can focus on protocol logic.
/// Cloning is cheap (everything shareable sits behind `Arc`) and clones observe the same
/// metadata cache.
pub struct RemoteClient<C>
where
	C: ?Sized + RemoteHttpClient,
{
	/// HTTP transport used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Static provider configuration.
	pub config: Arc<ProviderConfig>,
	/// Session store persisting redirect round-trip state.
	pub sessions: Arc<dyn SessionStore>,
	/// Persistence hook fired on every successful token exchange.
	pub token_updater: Option<Arc<dyn TokenUpdater>>,
	/// Client-level fallback resolver for authenticated requests.
	pub token_resolver: Option<Arc<dyn TokenResolver>>,
	/// Provider-specific userinfo normalization hook.
	pub compliance_fix: Option<Arc<dyn ComplianceFix>>,
	metadata: Arc<AsyncMutex<MetadataCache>>,
}
impl<C> RemoteClient<C>
where
	C: ?Sized + RemoteHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(
		sessions: Arc<dyn SessionStore>,
		config: ProviderConfig,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		let metadata = MetadataCache {
			metadata: config.server_metadata.clone(),
			discovery_url: config.server_metadata_url.clone(),
		};

		Self {
			http_client: http_client.into(),
			config: Arc::new(config),
			sessions,
			token_updater: None,
			token_resolver: None,
			compliance_fix: None,
			metadata: Arc::new(AsyncMutex::new(metadata)),
		}
	}

	/// Registers the token persistence hook.
	pub fn with_token_updater(mut self, hook: Arc<dyn TokenUpdater>) -> Self {
		self.token_updater = Some(hook);

		self
	}

	/// Registers the client-level token resolution hook.
	pub fn with_token_resolver(mut self, hook: Arc<dyn TokenResolver>) -> Self {
		self.token_resolver = Some(hook);

		self
	}

	/// Registers the userinfo compliance-fix hook.
	pub fn with_compliance_fix(mut self, hook: Arc<dyn ComplianceFix>) -> Self {
		self.compliance_fix = Some(hook);

		self
	}

	/// Resolves the provider's server metadata, fetching the discovery document at most once.
	///
	/// While a discovery URL remains configured the cache lock is held across the fetch, so
	/// concurrent first use serializes on one network call. The URL is cleared only after a
	/// successful fetch + merge; a failed fetch leaves it in place and propagates the transport
	/// error unchanged, with no retry.
	pub async fn resolve_metadata(&self) -> Result<ServerMetadata> {
		let mut cache = self.metadata.lock().await;

		if let Some(discovery_url) = cache.discovery_url.clone() {
			let raw = self.fetch_unauthenticated_json(&discovery_url).await?;
			let discovered: ServerMetadata =
				crate::api::from_json_value(raw).map_err(Error::from)?;

			#[cfg(feature = "tracing")]
			tracing::debug!(
				provider = %self.config.id,
				url = %discovery_url,
				"Fetched server metadata document."
			);

			cache.metadata.merge(discovered);
			// Only load once.
			cache.discovery_url = None;
		}

		Ok(cache.metadata.clone())
	}

	/// Returns the provider's JWK set, fetching `jwks_uri` when the cache is empty or `force`
	/// is set.
	pub async fn fetch_jwk_set(&self, force: bool) -> Result<JwkSet> {
		let metadata = self.resolve_metadata().await?;

		if !force {
			if let Some(jwks) = metadata.jwks {
				return Ok(jwks);
			}
		}

		let uri = metadata.jwks_uri.ok_or(Error::MissingJwksUri)?;
		let raw = self.fetch_unauthenticated_json(&uri).await?;
		let jwks: JwkSet = crate::api::from_json_value(raw).map_err(Error::from)?;

		self.metadata.lock().await.metadata.jwks = Some(jwks.clone());

		Ok(jwks)
	}

	async fn fetch_unauthenticated_json(&self, url: &Url) -> Result<Value> {
		let response = self
			.request(Method::GET, url.as_str(), RequestOptions::new().bypass_auth())
			.await?
			.ensure_success()?;

		response.json()
	}
}
impl<C> Clone for RemoteClient<C>
where
	C: ?Sized + RemoteHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			config: self.config.clone(),
			sessions: self.sessions.clone(),
			token_updater: self.token_updater.clone(),
			token_resolver: self.token_resolver.clone(),
			compliance_fix: self.compliance_fix.clone(),
			metadata: self.metadata.clone(),
		}
	}
}
impl<C> Debug for RemoteClient<C>
where
	C: ?Sized + RemoteHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RemoteClient")
			.field("config", &self.config)
			.field("token_updater_set", &self.token_updater.is_some())
			.field("token_resolver_set", &self.token_resolver.is_some())
			.field("compliance_fix_set", &self.compliance_fix.is_some())
			.finish()
	}
}
#[cfg(feature = "reqwest")]
impl RemoteClient<ReqwestHttpClient> {
	/// Creates a new client for the provided configuration and session store.
	///
	/// The client provisions its own reqwest-backed transport so callers do not need to pass
	/// HTTP handles explicitly.
	pub fn new(sessions: Arc<dyn SessionStore>, config: ProviderConfig) -> Self {
		Self::with_http_client(sessions, config, ReqwestHttpClient::default())
	}
}

#[derive(Debug)]
struct MetadataCache {
	metadata: ServerMetadata,
	discovery_url: Option<Url>,
}
