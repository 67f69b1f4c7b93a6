//! Secure token secret wrapper that redacts sensitive material.

// crates.io
use reqwest::header::HeaderValue;
// self
use crate::{_prelude::*, error::ConfigError};

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the secret as a sensitive `Authorization: Bearer` header value.
	pub fn bearer_header(&self) -> Result<HeaderValue, ConfigError> {
		let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0))?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
