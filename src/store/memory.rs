//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{StoreFuture, TokenKey, TokenStore},
};

/// Thread-safe storage backend that keeps tokens in-process; nothing survives a restart.
///
/// Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<HashMap<TokenKey, TokenSecret>>>);
impl MemoryStore {
	/// Returns `true` when neither token is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenStore for MemoryStore {
	fn get(&self, key: TokenKey) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move { Ok(self.0.read().get(&key).cloned()) })
	}

	fn set(&self, key: TokenKey, value: TokenSecret) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.0.write().insert(key, value);

			Ok(())
		})
	}

	fn remove(&self, key: TokenKey) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.0.write().remove(&key);

			Ok(())
		})
	}
}
