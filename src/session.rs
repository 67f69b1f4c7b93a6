//! Session client: bearer decoration, refresh-on-401 interception, and account helpers.

pub mod account;
pub mod refresh;

mod interceptor;

pub use account::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	http::{HttpTransport, ReqwestTransport},
	navigation::Navigator,
	store::TokenStore,
	strategy::{DefaultUnauthorizedStrategy, UnauthorizedStrategy},
};

/// Authenticated HTTP client bound to one backend session.
///
/// The client owns the transport, token store, navigator, and unauthorized strategy so the
/// interceptor can focus on the refresh protocol. Clones share the same
/// [`RefreshCoordinator`], which is what makes refresh single-flight across every handle; give
/// two clients the same coordinator via [`SessionClient::with_coordinator`] when they talk to
/// the same session through different transports.
pub struct SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// HTTP transport used for every outbound request.
	pub transport: Arc<T>,
	/// Token store holding the session's access and refresh tokens.
	pub store: Arc<dyn TokenStore>,
	/// Navigator invoked when the session ends.
	pub navigator: Arc<dyn Navigator>,
	/// Strategy deciding whether a 401 should trigger a refresh.
	pub strategy: Arc<dyn UnauthorizedStrategy>,
	/// Endpoint and deadline configuration.
	pub config: ClientConfig,
	/// Single-flight refresh state shared by every clone of the client.
	pub coordinator: Arc<RefreshCoordinator>,
}
impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn TokenStore>,
		navigator: Arc<dyn Navigator>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			navigator,
			strategy: Arc::new(DefaultUnauthorizedStrategy),
			config,
			coordinator: Default::default(),
		}
	}

	/// Replaces the unauthorized strategy.
	pub fn with_strategy(mut self, strategy: Arc<dyn UnauthorizedStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	/// Replaces the refresh coordinator.
	pub fn with_coordinator(mut self, coordinator: Arc<RefreshCoordinator>) -> Self {
		self.coordinator = coordinator;

		self
	}

	/// Returns the refresh counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		self.coordinator.metrics()
	}
}
impl SessionClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(
		config: ClientConfig,
		store: Arc<dyn TokenStore>,
		navigator: Arc<dyn Navigator>,
	) -> Self {
		Self::with_transport(config, store, navigator, ReqwestTransport::default())
	}
}
impl<T> Clone for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			navigator: self.navigator.clone(),
			strategy: self.strategy.clone(),
			config: self.config.clone(),
			coordinator: self.coordinator.clone(),
		}
	}
}
impl<T> Debug for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("config", &self.config)
			.field("coordinator", &self.coordinator)
			.finish()
	}
}
