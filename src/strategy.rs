//! Classification hooks deciding whether a `401 Unauthorized` means "token expired".
//!
//! Backends differ on whether they reuse 401 for missing permissions. The default strategy
//! treats every 401 as an expired session; [`ErrorCodeStrategy`] lets a backend mark specific
//! `errorCode` values as permission failures that must not trigger a refresh.

// self
use crate::{_prelude::*, error::StatusError};

/// Strategy hook classifying unauthorized responses.
///
/// Implementors are required to be `Send + Sync` and only see crate-owned data, so they stay
/// independent of the HTTP stack in use.
pub trait UnauthorizedStrategy
where
	Self: Send + Sync,
{
	/// Classifies a 401 response captured as `error`.
	fn classify(&self, error: &StatusError) -> UnauthorizedKind;
}

/// Canonical meanings of a 401 response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnauthorizedKind {
	/// The access token expired; a refresh should be attempted.
	Expired,
	/// The caller lacks permission; the error propagates untouched.
	Forbidden,
}

/// Treats every 401 as an expired access token.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultUnauthorizedStrategy;
impl UnauthorizedStrategy for DefaultUnauthorizedStrategy {
	fn classify(&self, _: &StatusError) -> UnauthorizedKind {
		UnauthorizedKind::Expired
	}
}

/// Treats a 401 as a permission failure when its JSON `errorCode` is in a configured set.
#[derive(Clone, Debug, Default)]
pub struct ErrorCodeStrategy {
	forbidden_codes: BTreeSet<String>,
}
impl ErrorCodeStrategy {
	/// Creates a strategy that treats the provided error codes as permission failures.
	pub fn new<I, S>(codes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { forbidden_codes: codes.into_iter().map(Into::into).collect() }
	}
}
impl UnauthorizedStrategy for ErrorCodeStrategy {
	fn classify(&self, error: &StatusError) -> UnauthorizedKind {
		let forbidden = error
			.api_error()
			.and_then(|body| body.error_code)
			.is_some_and(|code| self.forbidden_codes.contains(&code));

		if forbidden { UnauthorizedKind::Forbidden } else { UnauthorizedKind::Expired }
	}
}
