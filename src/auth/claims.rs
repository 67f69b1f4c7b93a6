//! Unverified access-token claims used to describe the signed-in user.
//!
//! The backend signs access tokens as JWTs carrying `id`, `email`, `role`, `iat`, and `exp`.
//! The client never verifies signatures (the backend does that on every request); it only
//! reads the payload to know who is signed in.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Errors produced while decoding an access token payload.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// Token does not have the `header.payload.signature` shape.
	#[error("Access token is not a three-part JWT.")]
	Malformed,
	/// Payload segment is not valid base64url.
	#[error("Access token payload is not valid base64url.")]
	Encoding(#[from] base64::DecodeError),
	/// Payload JSON is missing fields or has the wrong types.
	#[error("Access token payload could not be parsed.")]
	Payload(#[from] serde_path_to_error::Error<serde_json::Error>),
}

/// Claims carried by the backend's access tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
	/// Numeric user identifier.
	pub id: u64,
	/// Account email.
	pub email: String,
	/// Role name assigned by the backend.
	pub role: String,
	/// Issued-at, seconds since the Unix epoch.
	pub iat: i64,
	/// Expiry, seconds since the Unix epoch.
	pub exp: i64,
}
impl AccessClaims {
	/// Decodes the payload segment of `token` without verifying its signature.
	pub fn decode(token: &str) -> Result<Self, ClaimsError> {
		let mut segments = token.split('.');
		let (Some(_header), Some(payload), Some(_signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(ClaimsError::Malformed);
		};
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
		let mut de = serde_json::Deserializer::from_slice(&bytes);

		Ok(serde_path_to_error::deserialize(&mut de)?)
	}

	/// Returns the expiry instant, or `None` when `exp` is out of range.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.exp).ok()
	}

	/// Returns `true` if the token is expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at().is_none_or(|expires_at| instant >= expires_at)
	}

	/// Projects the claims onto the user identity exposed to callers.
	pub fn user(&self) -> AuthUser {
		AuthUser { id: self.id, email: self.email.clone(), role: self.role.clone() }
	}
}

/// Signed-in user as described by the current access token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthUser {
	/// Numeric user identifier.
	pub id: u64,
	/// Account email.
	pub email: String,
	/// Role name assigned by the backend.
	pub role: String,
}
