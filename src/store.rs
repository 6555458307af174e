//! Session-state storage contracts and the built-in in-memory implementation.
//!
//! The store persists the ephemeral authorization state (`state`, request token, `nonce`,
//! redirect URI) across the redirect round trip. Keys are opaque per-flow identifiers built by
//! the flow drivers, so one store instance can serve every concurrent handshake. Integration
//! layers typically adapt their framework session or a shared cache behind this trait.

pub mod memory;

pub use memory::MemorySessionStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for redirect round-trip state.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the value stored under the provided key.
	fn save<'a>(&'a self, key: &'a str, value: Value) -> StoreFuture<'a, ()>;

	/// Fetches the value stored under the key, if present.
	fn load<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>>;

	/// Fetches and invalidates the value stored under the key.
	///
	/// Redemption paths use this so a state or request token can never be replayed.
	fn take<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>>;
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
