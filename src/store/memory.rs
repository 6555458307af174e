//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{SessionStore, StoreError, StoreFuture},
};

type StateMap = Arc<RwLock<HashMap<String, Value>>>;

/// Thread-safe storage backend that keeps redirect state in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(StateMap);
impl MemorySessionStore {
	/// Number of entries currently stored.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when no entries are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn save_now(map: StateMap, key: String, value: Value) -> Result<(), StoreError> {
		map.write().insert(key, value);

		Ok(())
	}

	fn load_now(map: StateMap, key: String) -> Option<Value> {
		map.read().get(&key).cloned()
	}

	fn take_now(map: StateMap, key: String) -> Option<Value> {
		map.write().remove(&key)
	}
}
impl SessionStore for MemorySessionStore {
	fn save<'a>(&'a self, key: &'a str, value: Value) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Self::save_now(map, key, value) })
	}

	fn load<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::load_now(map, key)) })
	}

	fn take<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::take_now(map, key)) })
	}
}
