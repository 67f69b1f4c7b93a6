//! Transport primitives for authenticated backend calls.
//!
//! The module exposes [`HttpTransport`] alongside the crate-owned [`ApiRequest`] and
//! [`ApiResponse`] types so downstream crates can plug in custom HTTP stacks (or fakes in
//! tests) without touching the interceptor. Transports only move bytes: status handling,
//! bearer decoration, and refresh coordination all live in
//! [`SessionClient`](crate::session::SessionClient).

// std
use std::ops::Deref;
// crates.io
use reqwest::{
	Method, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, StatusError, TransportError},
};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing backend requests.
///
/// The trait is the client's only dependency on an HTTP library. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by every in-flight request, and
/// the futures they return must be `Send` so interceptor futures can hop executors.
/// Implementations must honor [`ApiRequest::timeout`] when it is set; the refresh deadline
/// depends on it.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and returns the raw response, whatever its status.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// Outbound request descriptor, tagged with a one-shot retry marker.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Request headers; `Authorization` is overwritten by the client.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
	/// Optional per-request deadline.
	pub timeout: Option<Duration>,
	retried: bool,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None, timeout: None, retried: false }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// Serializes `body` as JSON and sets the matching content type.
	pub fn with_json<B>(mut self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		let bytes =
			serde_json::to_vec(body).map_err(|source| ConfigError::RequestBody { source })?;

		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.body = Some(bytes);

		Ok(self)
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a per-request deadline.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Returns `true` once the client has retried this request after a refresh.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	/// Returns the bearer token currently attached to the request, if any.
	pub fn bearer_token(&self) -> Option<&str> {
		self.headers.get(AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
	}

	pub(crate) fn mark_retried(&mut self) {
		self.retried = true;
	}

	pub(crate) fn set_bearer(&mut self, token: &TokenSecret) -> Result<(), ConfigError> {
		self.headers.insert(AUTHORIZATION, token.bearer_header()?);

		Ok(())
	}
}

/// Raw response returned by a transport.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response from its parts.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Returns the body decoded lossily as UTF-8.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON, reporting the failing field path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::ResponseParse { source, status: self.status.as_u16() })
	}

	/// Converts non-2xx responses into a [`StatusError`] tagged with `path`.
	pub fn error_for_status(self, path: &str) -> Result<Self, StatusError> {
		if self.is_success() {
			return Ok(self);
		}

		Err(StatusError {
			status: self.status.as_u16(),
			path: path.to_owned(),
			retry_after: parse_retry_after(&self.headers),
			body: self.text(),
		})
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a transport whose client sends `user_agent` on every request.
	pub fn with_user_agent(user_agent: &str) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.user_agent(user_agent)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}
}
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let ApiRequest { method, url, headers, body, timeout, .. } = request;
			let mut builder = client.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}
			if let Some(timeout) = timeout {
				builder = builder.timeout(timeout.unsigned_abs());
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return i64::try_from(secs).ok().map(Duration::seconds);
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url() -> Url {
		Url::parse("https://api.example.com/projects").expect("Fixture URL should parse.")
	}

	#[test]
	fn json_body_sets_content_type() {
		let request = ApiRequest::post(url())
			.with_json(&serde_json::json!({ "name": "demo" }))
			.expect("JSON body should serialize.");

		assert_eq!(
			request.headers.get(CONTENT_TYPE),
			Some(&HeaderValue::from_static("application/json"))
		);
		assert_eq!(request.body.as_deref(), Some(br#"{"name":"demo"}"#.as_slice()));
		assert!(!request.is_retried());
	}

	#[test]
	fn bearer_round_trips_through_headers() {
		let mut request = ApiRequest::get(url());

		assert_eq!(request.bearer_token(), None);

		request.set_bearer(&TokenSecret::new("A1")).expect("Bearer header should attach.");

		assert_eq!(request.bearer_token(), Some("A1"));

		request.set_bearer(&TokenSecret::new("A2")).expect("Bearer header should attach.");

		assert_eq!(request.bearer_token(), Some("A2"));
	}

	#[test]
	fn error_for_status_captures_body_and_retry_after() {
		let mut response = ApiResponse::new(StatusCode::TOO_MANY_REQUESTS, "slow down");

		response.headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));

		let failure =
			response.error_for_status("/projects").expect_err("429 should convert to an error.");

		assert_eq!(failure.status, 429);
		assert_eq!(failure.path, "/projects");
		assert_eq!(failure.body, "slow down");
		assert_eq!(failure.retry_after, Some(Duration::seconds(30)));
	}

	#[test]
	fn retry_after_beyond_range_is_dropped() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("18446744073709551615"));

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static("9223372036854775807"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(i64::MAX)));
	}

	#[test]
	fn json_reports_field_path() {
		let response = ApiResponse::new(StatusCode::OK, r#"{"accessToken":42}"#);
		let err = response
			.json::<crate::auth::TokenPair>()
			.expect_err("Numeric access token should fail to parse.");

		match err {
			Error::ResponseParse { source, status } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "accessToken");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
