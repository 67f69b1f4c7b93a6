// std
use std::sync::Arc;
// self
use bearer_session::{
	auth::{TokenPair, TokenSecret},
	store::{MemoryStore, TokenKey, TokenStore},
};

async fn read(store: &dyn TokenStore, key: TokenKey) -> Option<String> {
	store
		.get(key)
		.await
		.expect("Reading from the memory store should succeed.")
		.map(|secret| secret.expose().to_owned())
}

#[tokio::test]
async fn set_overwrites_and_remove_is_idempotent() {
	let store = MemoryStore::default();

	store
		.set(TokenKey::AccessToken, TokenSecret::new("access-1"))
		.await
		.expect("Saving the first access token should succeed.");
	store
		.set(TokenKey::AccessToken, TokenSecret::new("access-2"))
		.await
		.expect("Overwriting the access token should succeed.");

	assert_eq!(read(&store, TokenKey::AccessToken).await.as_deref(), Some("access-2"));
	assert_eq!(read(&store, TokenKey::RefreshToken).await, None);

	store.remove(TokenKey::AccessToken).await.expect("Removing a stored key should succeed.");
	store.remove(TokenKey::AccessToken).await.expect("Removing an absent key should succeed.");

	assert!(store.is_empty());
}

#[tokio::test]
async fn clones_share_the_same_tokens() {
	let store = MemoryStore::default();
	let shared: Arc<dyn TokenStore> = Arc::new(store.clone());

	shared
		.save_pair(&TokenPair::new("A1", "R1", time::Duration::minutes(15)))
		.await
		.expect("Saving a pair through the shared handle should succeed.");

	assert_eq!(read(&store, TokenKey::AccessToken).await.as_deref(), Some("A1"));
	assert_eq!(read(&store, TokenKey::RefreshToken).await.as_deref(), Some("R1"));

	shared.clear().await.expect("Clearing through the shared handle should succeed.");

	assert!(store.is_empty());
}

#[tokio::test]
async fn concurrent_writers_leave_one_whole_value() {
	let store = MemoryStore::default();
	let tasks = (0..8)
		.map(|i| {
			let store = store.clone();

			tokio::spawn(async move {
				store
					.set(TokenKey::AccessToken, TokenSecret::new(format!("access-{i}")))
					.await
					.expect("Concurrent write should succeed.");
			})
		})
		.collect::<Vec<_>>();

	for task in tasks {
		task.await.expect("Writer task should not panic.");
	}

	let value = read(&store, TokenKey::AccessToken)
		.await
		.expect("One of the written values should remain.");

	assert!((0..8).any(|i| value == format!("access-{i}")));
}
