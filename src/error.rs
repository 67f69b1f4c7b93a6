//! Client-level error types shared across the interceptor, session helpers, and stores.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, deadline).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Server answered with a non-success status that the client did not recover from.
	#[error(transparent)]
	Status(#[from] StatusError),
	/// Token refresh failed and the local session was terminated.
	#[error(transparent)]
	Refresh(#[from] RefreshFailure),

	/// Response body could not be decoded into the expected shape.
	#[error("Response body from HTTP {status} could not be parsed.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Input rejected before any network call was made.
	#[error("Request was rejected locally: {reason}.")]
	InvalidInput {
		/// Human-readable rejection reason.
		reason: String,
	},
}
impl Error {
	/// Returns the HTTP status that caused this error, when one is known.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status(failure) => Some(failure.status),
			Self::ResponseParse { status, .. } => Some(*status),
			Self::Refresh(RefreshFailure::MissingToken { original }) => Some(original.status),
			Self::Refresh(RefreshFailure::Rejected { source }) => source.status(),
			_ => None,
		}
	}

	/// Returns `true` if the error ended the local session.
	pub fn is_session_terminated(&self) -> bool {
		matches!(
			self,
			Self::Refresh(RefreshFailure::MissingToken { .. } | RefreshFailure::Rejected { .. })
		)
	}
}

/// Configuration and request construction failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Token or header value contains characters that cannot appear in a header.
	#[error("Header value is invalid.")]
	InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized.")]
	RequestBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Relative path could not be resolved against the base URL.
	#[error("Path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO, deadlines).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded its deadline.
	#[error("Request to the backend timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Non-success HTTP response surfaced to the caller.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Request to {path} failed with HTTP {status}.")]
pub struct StatusError {
	/// HTTP status code.
	pub status: u16,
	/// Path of the request that failed.
	pub path: String,
	/// Response body, decoded lossily as UTF-8.
	pub body: String,
	/// Retry-After hint from the backend, if supplied.
	pub retry_after: Option<Duration>,
}
impl StatusError {
	/// Returns `true` for HTTP 401 responses.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Parses the backend's structured error payload, if the body carries one.
	pub fn api_error(&self) -> Option<ApiErrorBody> {
		serde_json::from_str(&self.body).ok()
	}

	/// Builds the message a user should see for this failure.
	///
	/// Field-level errors win over the top-level message; a known error code maps to a
	/// friendlier sentence; otherwise a generic fallback is returned.
	pub fn display_message(&self) -> String {
		const FALLBACK: &str = "An unexpected error occurred.";

		let Some(body) = self.api_error() else {
			return FALLBACK.into();
		};

		if !body.errors.is_empty() {
			let messages = body.errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>();

			return messages.join(" | ");
		}
		if body.error_code.as_deref() == Some("INCORRECT_OLD_PASSWORD") {
			return "The old password you entered is incorrect.".into();
		}

		body.message.unwrap_or_else(|| FALLBACK.into())
	}
}

/// Structured error body returned by the backend on failures.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
	/// Top-level human-readable message.
	#[serde(default)]
	pub message: Option<String>,
	/// Machine-readable error code.
	#[serde(default)]
	pub error_code: Option<String>,
	/// Field-level validation errors.
	#[serde(default)]
	pub errors: Vec<FieldError>,
}

/// Single field-level validation error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
	/// Human-readable message for the field.
	#[serde(default)]
	pub message: String,
}

/// Outcome shared with every request that depended on a failed refresh.
///
/// The value is cloned once per queued waiter, so the refresh error itself sits behind an
/// [`Arc`].
#[derive(Clone, Debug, ThisError)]
pub enum RefreshFailure {
	/// No refresh token was stored when a refresh was needed.
	#[error("No refresh token is stored; the session was terminated.")]
	MissingToken {
		/// The authorization failure that required the refresh.
		#[source]
		original: StatusError,
	},
	/// The refresh call failed.
	#[error("Token refresh failed; the session was terminated.")]
	Rejected {
		/// Failure reported by the refresh endpoint or token store.
		#[source]
		source: Arc<Error>,
	},
	/// The refreshing task was dropped before it settled.
	#[error("Token refresh was abandoned before it settled.")]
	Abandoned,
}
impl RefreshFailure {
	/// Wraps a refresh error so it can be shared with every queued waiter.
	pub fn rejected(err: impl Into<Error>) -> Self {
		Self::Rejected { source: Arc::new(err.into()) }
	}
}
