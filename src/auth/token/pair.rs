//! Access/refresh token pairs issued by the login and refresh endpoints.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Token pair returned by `POST /auth/login` and `POST /auth/refresh-token`.
///
/// The pair is stored wholesale: every successful login or refresh overwrites both
/// secrets, and logout clears both.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
	/// Bearer token attached to outbound requests.
	pub access_token: TokenSecret,
	/// Secret exchanged for a new pair once the access token expires.
	pub refresh_token: TokenSecret,
	/// Access token lifetime in whole seconds; `0` when the backend omits it.
	#[serde(default)]
	pub expires_in: i64,
}
impl TokenPair {
	/// Creates a pair from raw secrets and a lifetime.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		lifetime: Duration,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			expires_in: lifetime.whole_seconds(),
		}
	}

	/// Returns the access token lifetime.
	pub fn lifetime(&self) -> Duration {
		Duration::seconds(self.expires_in)
	}

	/// Computes when the access token expires if it was issued at `issued_at`.
	///
	/// Returns `None` when the advertised lifetime overflows the representable range.
	pub fn expires_at(&self, issued_at: OffsetDateTime) -> Option<OffsetDateTime> {
		issued_at.checked_add(self.lifetime())
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.finish()
	}
}
