//! Public extension contracts wiring the engine into its hosting application.
//!
//! The crate intentionally exposes hook traits without concrete implementations so downstream
//! services can bridge their session layer, database, or cache without the engine depending on
//! any web framework. Every hook returns a boxed `Send` future; synchronous implementations wrap
//! their result in a ready future, so the call-site contract is identical whether a hook
//! suspends or not.

// self
use crate::{_prelude::*, auth::Token};

/// Boxed future returned by engine hooks.
pub type HookFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Payload delivered to [`TokenUpdater`] implementations.
///
/// The optional refresh/access token fields identify which stored credential a refreshed token
/// replaces, for backends that key persisted rows by the old secret.
#[derive(Clone, Debug)]
pub struct TokenUpdate {
	/// Full token map returned by the exchange.
	pub token: Token,
	/// Refresh token the exchange consumed, when the update stems from a refresh.
	pub refresh_token: Option<String>,
	/// Access token being replaced, when known.
	pub access_token: Option<String>,
}
impl TokenUpdate {
	/// Wraps a freshly exchanged token with no replaced-credential context.
	pub fn new(token: Token) -> Self {
		Self { token, refresh_token: None, access_token: None }
	}
}

/// Persistence hook invoked on every successful or refreshed token exchange.
pub trait TokenUpdater: Send + Sync {
	/// Persists the updated token map.
	fn token_updated<'a>(&'a self, update: &'a TokenUpdate) -> HookFuture<'a, ()>;
}

/// Resolution hook producing the current token for an authenticated request.
///
/// Implementations close over the hosting framework's inbound request context (session handle,
/// database row, header set) so the engine never sees framework types. Returning `Ok(None)`
/// signals that no token is available; the gateway then fails with
/// [`Error::MissingToken`](crate::error::Error::MissingToken).
pub trait TokenResolver: Send + Sync {
	/// Resolves the current token, if any.
	fn resolve_token(&self) -> HookFuture<'_, Option<Token>>;
}

/// Provider-specific normalization hook applied to raw userinfo JSON.
pub trait ComplianceFix: Send + Sync {
	/// Transforms the raw userinfo document before claim extraction.
	fn fix_userinfo<'a>(&'a self, raw: Value) -> HookFuture<'a, Value>;
}
