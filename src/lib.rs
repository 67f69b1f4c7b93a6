//! Bearer-token HTTP client with single-flight session refresh.
//!
//! [`SessionClient`](session::SessionClient) attaches the stored access token to every request.
//! When the backend answers `401 Unauthorized`, one refresh call runs while every other request
//! that hit the expired session waits in a queue, then each is retried once with the new token.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod navigation;
pub mod obs;
pub mod session;
pub mod store;
pub mod strategy;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::ClientConfig,
		http::ReqwestTransport,
		navigation::{NavigateOptions, Navigator},
		session::SessionClient,
		store::{MemoryStore, TokenStore},
	};

	/// Session client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = SessionClient<ReqwestTransport>;

	/// Navigator that records every redirect so tests can assert on forced logouts.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingNavigator(Arc<Mutex<Vec<(String, NavigateOptions)>>>);
	impl RecordingNavigator {
		/// Returns every recorded navigation in call order.
		pub fn visits(&self) -> Vec<(String, NavigateOptions)> {
			self.0.lock().clone()
		}
	}
	impl Navigator for RecordingNavigator {
		fn navigate(&self, path: &str, options: NavigateOptions) {
			self.0.lock().push((path.to_owned(), options));
		}
	}

	/// Builds a plain reqwest transport for talking to `httpmock` servers.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client =
			ReqwestClient::builder().build().expect("Failed to build Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Builds a [`ClientConfig`] rooted at the provided mock server URL.
	pub fn test_config(base_url: &str) -> ClientConfig {
		let base_url = Url::parse(base_url).expect("Mock server URL should parse successfully.");

		ClientConfig::builder(base_url).build().expect("Test client config should build.")
	}

	/// Constructs a [`SessionClient`] backed by an in-memory store, a recording navigator, and
	/// the reqwest transport used across integration tests.
	pub fn build_test_client(
		config: ClientConfig,
	) -> (ReqwestTestClient, Arc<MemoryStore>, RecordingNavigator) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let navigator = RecordingNavigator::default();
		let client = SessionClient::<ReqwestTransport>::with_transport(
			config,
			store,
			Arc::new(navigator.clone()),
			test_reqwest_transport(),
		);

		(client, store_backend, navigator)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
