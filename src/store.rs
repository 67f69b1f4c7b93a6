//! Storage contracts and built-in store implementations for session tokens.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value backend holding the session's access and refresh tokens.
///
/// Implementations must survive process restarts when used as the primary store, and every
/// `set`/`remove` must be an atomic single-key overwrite so concurrent readers never observe a
/// torn value.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the secret stored under `key`, if present.
	fn get(&self, key: TokenKey) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Stores or replaces the secret under `key`.
	fn set(&self, key: TokenKey, value: TokenSecret) -> StoreFuture<'_, ()>;

	/// Removes the secret under `key`; removing an absent key succeeds.
	fn remove(&self, key: TokenKey) -> StoreFuture<'_, ()>;
}
impl dyn TokenStore {
	/// Overwrites both secrets with the provided pair.
	pub async fn save_pair(&self, pair: &TokenPair) -> Result<(), StoreError> {
		self.set(TokenKey::AccessToken, pair.access_token.clone()).await?;
		self.set(TokenKey::RefreshToken, pair.refresh_token.clone()).await
	}

	/// Removes both secrets, attempting each removal even if the first fails.
	pub async fn clear(&self) -> Result<(), StoreError> {
		let access = self.remove(TokenKey::AccessToken).await;
		let refresh = self.remove(TokenKey::RefreshToken).await;

		access.and(refresh)
	}
}

/// Keys understood by every [`TokenStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TokenKey {
	/// Bearer token attached to outbound requests.
	#[serde(rename = "accessToken")]
	AccessToken,
	/// Secret exchanged for a new token pair.
	#[serde(rename = "refreshToken")]
	RefreshToken,
}
impl TokenKey {
	/// Returns the stable storage key.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKey::AccessToken => "accessToken",
			TokenKey::RefreshToken => "refreshToken",
		}
	}
}
impl Display for TokenKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error type produced by [`TokenStore`] implementations.
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
