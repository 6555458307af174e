//! High-level flow orchestration dispatching between the protocol generations.
//!
//! A configured `request_token_url` selects the OAuth 1.0 driver; everything else goes through
//! the OAuth 2.0 authorization-code driver. The dispatchers own the session-store round trip
//! (persist on redirect, consume on redemption), the token-update hook, and observability, so
//! the drivers stay pure protocol logic.

pub mod auth_code;
pub mod oauth1;
pub mod session;

pub use auth_code::OidcTokenFields;
pub use session::*;

// self
use crate::{
	_prelude::*,
	auth::{RequestToken, Token},
	error::{ConfigError, EndpointError},
	ext::TokenUpdate,
	http::RemoteHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	remote::RemoteClient,
	store::StoreError,
};

/// Outcome of a processed redirect callback.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenExchange {
	/// Token map returned by the provider.
	pub token: Token,
	/// Handshake state consumed from the session store (carries the OIDC nonce).
	pub session: AuthorizationState,
}

impl<C> RemoteClient<C>
where
	C: ?Sized + RemoteHttpClient,
{
	/// Builds the authorization URL for the provider's configured protocol generation.
	///
	/// Caller-supplied `params` are merged over the statically configured authorize params. The
	/// returned handshake state must be persisted for redemption;
	/// [`handle_redirect`](Self::handle_redirect) does that automatically.
	pub async fn create_authorization_url(
		&self,
		redirect_uri: Option<Url>,
		params: BTreeMap<String, String>,
	) -> Result<AuthorizationHandshake> {
		const KIND: FlowKind = FlowKind::Authorize;

		let span = FlowSpan::new(KIND, "create_authorization_url");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Some(request_token_url) = self.config.request_token_url.clone() {
					self.create_oauth1_authorization_url(&request_token_url, redirect_uri, params)
						.await
				} else {
					let metadata = self.resolve_metadata().await?;

					self.create_oauth2_authorization_url(&metadata, redirect_uri, params)
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Builds the authorization URL, persists the handshake state, and returns the URL the
	/// integration layer should redirect the end-user to.
	pub async fn handle_redirect(
		&self,
		redirect_uri: Option<Url>,
		params: BTreeMap<String, String>,
	) -> Result<Url> {
		let handshake = self.create_authorization_url(redirect_uri, params).await?;
		// Both drivers always populate a flow key; a handshake without one cannot be redeemed.
		let flow_key = handshake.state.flow_key().ok_or(Error::StateMismatch)?;
		let key = AuthorizationState::store_key(&self.config.id, flow_key);
		let value = serde_json::to_value(&handshake.state)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

		self.sessions.save(&key, value).await?;

		Ok(handshake.url)
	}

	/// Processes the redirect callback: consumes the persisted handshake state, enforces the
	/// state/request-token match, and exchanges the callback credentials for a token.
	pub async fn authorize_access_token(&self, callback: CallbackParams) -> Result<TokenExchange> {
		if let Some(error) = callback.error {
			let reason = match callback.error_description {
				Some(description) => format!("{error}: {description}"),
				None => error,
			};

			return Err(EndpointError::Rejected { reason }.into());
		}

		if self.config.request_token_url.is_some() {
			self.authorize_oauth1(callback).await
		} else {
			self.authorize_oauth2(callback).await
		}
	}

	/// Exchanges callback credentials for an access token in one step.
	///
	/// OAuth 2.0 expects `code` inside `params`; OAuth 1.0 expects the previously issued
	/// `request_token` plus the verifier parameters. Fires the token-update hook on success.
	pub async fn fetch_access_token(
		&self,
		redirect_uri: Option<Url>,
		request_token: Option<RequestToken>,
		params: BTreeMap<String, String>,
	) -> Result<Token> {
		const KIND: FlowKind = FlowKind::Exchange;

		let span = FlowSpan::new(KIND, "fetch_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = if self.config.request_token_url.is_some() {
					self.fetch_oauth1_access_token(request_token, params).await?
				} else {
					let metadata = self.resolve_metadata().await?;

					self.fetch_oauth2_access_token(&metadata, redirect_uri, params).await?
				};

				if let Some(hook) = &self.token_updater {
					let update = TokenUpdate::new(token.clone());

					hook.token_updated(&update).await?;
				}

				Ok(token)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn authorize_oauth1(&self, callback: CallbackParams) -> Result<TokenExchange> {
		let oauth_token = callback.oauth_token.ok_or(Error::MissingRequestToken)?;
		let session = self.take_session_state(&oauth_token).await?.ok_or(Error::MissingRequestToken)?;
		let mut params = BTreeMap::new();

		if let Some(verifier) = callback.oauth_verifier {
			params.insert("oauth_verifier".to_owned(), verifier);
		}

		params.extend(callback.extra);

		let token = self
			.fetch_access_token(session.redirect_uri.clone(), session.request_token.clone(), params)
			.await?;

		Ok(TokenExchange { token, session })
	}

	async fn authorize_oauth2(&self, callback: CallbackParams) -> Result<TokenExchange> {
		let returned_state = callback.state.ok_or(Error::StateMismatch)?;
		let session = self.take_session_state(&returned_state).await?.ok_or(Error::StateMismatch)?;

		if session.state.as_deref() != Some(returned_state.as_str()) {
			return Err(Error::StateMismatch);
		}

		let code = callback.code.ok_or(ConfigError::MissingAuthorizationCode)?;
		let mut params = BTreeMap::new();

		params.insert("code".to_owned(), code);
		params.extend(callback.extra);

		let token = self.fetch_access_token(session.redirect_uri.clone(), None, params).await?;

		Ok(TokenExchange { token, session })
	}

	async fn take_session_state(&self, flow_key: &str) -> Result<Option<AuthorizationState>> {
		let key = AuthorizationState::store_key(&self.config.id, flow_key);
		let Some(value) = self.sessions.take(&key).await? else {
			return Ok(None);
		};
		let state = serde_json::from_value(value)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

		Ok(Some(state))
	}
}
