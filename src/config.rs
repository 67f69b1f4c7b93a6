//! Client configuration: backend base URL, auth endpoint paths, login view, and deadlines.
//!
//! [`ClientConfig::builder`] validates every input once so the interceptor can rely on
//! resolved [`AuthEndpoints`] without re-parsing paths per request.

// self
use crate::{_prelude::*, error::ConfigError};

/// Errors raised while constructing or validating a [`ClientConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Base URL must use HTTP or HTTPS.
	#[error("The base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL cannot have relative paths appended to it.
	#[error("The base URL cannot act as a base: {url}.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Paths must be absolute and free of whitespace.
	#[error("The {name} path must start with `/` and contain no whitespace: {path}.")]
	InvalidPath {
		/// Which path failed validation.
		name: &'static str,
		/// Path that failed validation.
		path: String,
	},
	/// Refresh deadline must be positive.
	#[error("The refresh timeout must be positive.")]
	NonPositiveRefreshTimeout,
}

/// Fully resolved URLs for the backend's authentication endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEndpoints {
	/// `POST` endpoint exchanging credentials for a token pair.
	pub login: Url,
	/// `POST` endpoint exchanging a refresh token for a new pair.
	pub refresh: Url,
	/// `POST` endpoint ending the server-side session.
	pub logout: Url,
	/// `POST` endpoint changing the signed-in user's password.
	pub change_password: Url,
	/// `POST` endpoint creating an account.
	pub register: Url,
}
impl AuthEndpoints {
	/// Returns `true` for the login and refresh endpoints, whose 401s must never trigger a
	/// refresh.
	pub fn is_refresh_exempt(&self, url: &Url) -> bool {
		let path = url.path();

		path == self.login.path() || path == self.refresh.path()
	}
}

/// Immutable client configuration consumed by [`SessionClient`](crate::session::SessionClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Backend base URL; request paths are appended to its path.
	pub base_url: Url,
	/// Resolved authentication endpoints.
	pub endpoints: AuthEndpoints,
	/// View path the navigator receives when the session ends.
	pub login_view: String,
	/// Deadline applied to every refresh call.
	pub refresh_timeout: Duration,
}
impl ClientConfig {
	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Resolves a request path (e.g. `/projects?page=2`) against the base URL.
	pub fn url(&self, path: &str) -> Result<Url, ConfigError> {
		let (path_only, query) = match path.split_once('?') {
			Some((path_only, query)) => (path_only, Some(query)),
			None => (path, None),
		};

		if !is_valid_path(path_only) {
			return Err(ConfigError::InvalidPath { path: path.into() });
		}

		let mut url = resolve(&self.base_url, path_only);

		url.set_query(query);

		Ok(url)
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Backend base URL.
	pub base_url: Url,
	/// Login endpoint path.
	pub login_path: String,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Logout endpoint path.
	pub logout_path: String,
	/// Change-password endpoint path.
	pub change_password_path: String,
	/// Registration endpoint path.
	pub register_path: String,
	/// View path used by forced logouts.
	pub login_view: String,
	/// Deadline applied to refresh calls.
	pub refresh_timeout: Duration,
}
impl ClientConfigBuilder {
	const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::seconds(15);

	/// Creates a builder seeded with the backend's default `/auth/*` paths.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			login_path: "/auth/login".into(),
			refresh_path: "/auth/refresh-token".into(),
			logout_path: "/auth/logout".into(),
			change_password_path: "/auth/change-password".into(),
			register_path: "/auth/register".into(),
			login_view: "/login".into(),
			refresh_timeout: Self::DEFAULT_REFRESH_TIMEOUT,
		}
	}

	/// Overrides the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the logout endpoint path.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.logout_path = path.into();

		self
	}

	/// Overrides the change-password endpoint path.
	pub fn change_password_path(mut self, path: impl Into<String>) -> Self {
		self.change_password_path = path.into();

		self
	}

	/// Overrides the registration endpoint path.
	pub fn register_path(mut self, path: impl Into<String>) -> Self {
		self.register_path = path.into();

		self
	}

	/// Overrides the view path used when the session ends (defaults to `/login`).
	pub fn login_view(mut self, path: impl Into<String>) -> Self {
		self.login_view = path.into();

		self
	}

	/// Overrides the refresh deadline (defaults to 15 seconds).
	pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
		self.refresh_timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let base_url = self.base_url;

		if !matches!(base_url.scheme(), "http" | "https") {
			return Err(ClientConfigError::UnsupportedScheme { url: base_url.to_string() });
		}
		if base_url.cannot_be_a_base() {
			return Err(ClientConfigError::CannotBeABase { url: base_url.to_string() });
		}
		if !self.refresh_timeout.is_positive() {
			return Err(ClientConfigError::NonPositiveRefreshTimeout);
		}

		validate_path("login view", &self.login_view)?;

		let endpoint = |name: &'static str, path: &str| -> Result<Url, ClientConfigError> {
			validate_path(name, path)?;

			Ok(resolve(&base_url, path))
		};
		let endpoints = AuthEndpoints {
			login: endpoint("login", &self.login_path)?,
			refresh: endpoint("refresh", &self.refresh_path)?,
			logout: endpoint("logout", &self.logout_path)?,
			change_password: endpoint("change password", &self.change_password_path)?,
			register: endpoint("register", &self.register_path)?,
		};

		Ok(ClientConfig {
			base_url,
			endpoints,
			login_view: self.login_view,
			refresh_timeout: self.refresh_timeout,
		})
	}
}

fn is_valid_path(path: &str) -> bool {
	path.starts_with('/') && !path.chars().any(char::is_whitespace)
}

fn validate_path(name: &'static str, path: &str) -> Result<(), ClientConfigError> {
	if is_valid_path(path) {
		Ok(())
	} else {
		Err(ClientConfigError::InvalidPath { name, path: path.into() })
	}
}

// Appends rather than joins so a base path prefix (e.g. `/api/v1`) is preserved.
fn resolve(base: &Url, path: &str) -> Url {
	let mut url = base.clone();
	let joined = format!("{}{}", base.path().trim_end_matches('/'), path);

	url.set_path(&joined);
	url.set_query(None);
	url.set_fragment(None);

	url
}
