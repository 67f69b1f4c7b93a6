// crates.io
use futures::future;
use httpmock::prelude::*;
use serde_json::json;
// self
use bearer_session::{
	_preludet::*,
	auth::TokenSecret,
	config::ClientConfig,
	error::{RefreshFailure, TransportError},
	navigation::NavigateOptions,
	store::{MemoryStore, TokenKey, TokenStore},
	strategy::ErrorCodeStrategy,
};

const PAIR_A2: &str = r#"{"accessToken":"A2","refreshToken":"R2","expiresIn":900}"#;

async fn seed(store: &MemoryStore, access: &str, refresh: Option<&str>) {
	store
		.set(TokenKey::AccessToken, TokenSecret::new(access))
		.await
		.expect("Failed to seed access token into the store.");

	if let Some(refresh) = refresh {
		store
			.set(TokenKey::RefreshToken, TokenSecret::new(refresh))
			.await
			.expect("Failed to seed refresh token into the store.");
	}
}

async fn stored(store: &MemoryStore, key: TokenKey) -> Option<String> {
	store
		.get(key)
		.await
		.expect("Token store read should succeed.")
		.map(|secret| secret.expose().to_owned())
}

#[tokio::test]
async fn stored_token_is_attached_as_bearer() {
	let server = MockServer::start_async().await;
	let (client, store, _) = build_test_client(test_config(&server.base_url()));

	seed(&store, "A1", Some("R1")).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/projects").header("authorization", "Bearer A1");
			then.status(200).body("[]");
		})
		.await;
	let response = client.get("/projects").await.expect("Authorized request should succeed.");

	mock.assert_async().await;

	assert_eq!(response.status.as_u16(), 200);
	assert_eq!(response.text(), "[]");
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried() {
	let server = MockServer::start_async().await;
	let (client, store, navigator) = build_test_client(test_config(&server.base_url()));

	seed(&store, "A1", Some("R1")).await;

	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/projects").header("authorization", "Bearer A1");
			then.status(401).json_body(json!({ "message": "jwt expired" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/refresh-token")
				.json_body(json!({ "refreshToken": "R1" }));
			then.status(200).header("content-type", "application/json").body(PAIR_A2);
		})
		.await;
	let retried = server
		.mock_async(|when, then| {
			when.method(GET).path("/projects").header("authorization", "Bearer A2");
			then.status(200).body("[\"demo\"]");
		})
		.await;
	let response = client.get("/projects").await.expect("Request should recover after refresh.");

	expired.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	retried.assert_calls_async(1).await;

	assert_eq!(response.text(), "[\"demo\"]");
	assert_eq!(stored(&store, TokenKey::AccessToken).await.as_deref(), Some("A2"));
	assert_eq!(stored(&store, TokenKey::RefreshToken).await.as_deref(), Some("R2"));
	assert!(navigator.visits().is_empty());
	assert_eq!(client.refresh_metrics().attempts(), 1);
	assert_eq!(client.refresh_metrics().successes(), 1);
	assert!(!client.coordinator.is_refreshing());
}

#[tokio::test]
async fn concurrent_expired_requests_share_one_refresh() {
	let server = MockServer::start_async().await;
	let (client, store, _) = build_test_client(test_config(&server.base_url()));

	seed(&store, "A1", Some("R1")).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path_prefix("/items/").header("authorization", "Bearer A1");
			then.status(401);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(300))
				.body(PAIR_A2);
		})
		.await;
	let retried = server
		.mock_async(|when, then| {
			when.method(GET).path_prefix("/items/").header("authorization", "Bearer A2");
			then.status(200).body("ok");
		})
		.await;
	let paths = (0..5).map(|i| format!("/items/{i}")).collect::<Vec<_>>();
	let results = future::join_all(paths.iter().map(|path| client.get(path))).await;

	for result in results {
		let response = result.expect("Every queued request should succeed after the refresh.");

		assert_eq!(response.text(), "ok");
	}

	refresh.assert_calls_async(1).await;
	retried.assert_calls_async(5).await;

	assert_eq!(client.refresh_metrics().attempts(), 1);
	assert_eq!(client.coordinator.queued(), 0);
	assert!(!client.coordinator.is_refreshing());
}

#[tokio::test]
async fn unauthorized_login_is_not_refreshed() {
	let server = MockServer::start_async().await;
	let (client, store, navigator) = build_test_client(test_config(&server.base_url()));

	seed(&store, "A1", Some("R1")).await;

	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(401).json_body(json!({ "message": "Invalid credentials" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).body(PAIR_A2);
		})
		.await;
	let err = client
		.login("ada@example.com", "wrong")
		.await
		.expect_err("Rejected credentials should surface to the caller.");

	login.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert!(matches!(err, Error::Status(ref failure) if failure.status == 401));
	assert!(navigator.visits().is_empty());
	assert_eq!(stored(&store, TokenKey::RefreshToken).await.as_deref(), Some("R1"));
}

#[tokio::test]
async fn unauthorized_refresh_endpoint_call_is_not_refreshed() {
	let server = MockServer::start_async().await;
	let (client, store, _) = build_test_client(test_config(&server.base_url()));

	seed(&store, "A1", Some("R1")).await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(401);
		})
		.await;
	let err = client
		.post_json("/auth/refresh-token", &json!({ "refreshToken": "R1" }))
		.await
		.expect_err("A direct refresh call must not recurse into another refresh.");

	refresh.assert_calls_async(1).await;

	assert_eq!(err.status(), Some(401));
	assert!(!err.is_session_terminated());
}

#[tokio::test]
async fn second_unauthorized_response_propagates() {
	let server = MockServer::start_async().await;
	let (client, store, navigator) = build_test_client(test_config(&server.base_url()));

	seed(&store, "A1", Some("R1")).await;

	let denied = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).header("content-type", "application/json").body(PAIR_A2);
		})
		.await;
	let err = client.get("/admin").await.expect_err("A retried 401 should surface to the caller.");

	denied.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;

	assert!(matches!(err, Error::Status(ref failure) if failure.status == 401));
	assert!(navigator.visits().is_empty());
	assert_eq!(stored(&store, TokenKey::AccessToken).await.as_deref(), Some("A2"));
}

#[tokio::test]
async fn rejected_refresh_ends_the_session() {
	let server = MockServer::start_async().await;
	let (client, store, navigator) = build_test_client(test_config(&server.base_url()));

	seed(&store, "A1", Some("R1")).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/projects");
			then.status(401);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(401).json_body(json!({ "message": "refresh token revoked" }));
		})
		.await;
	let err = client.get("/projects").await.expect_err("Rejected refresh should surface.");

	refresh.assert_calls_async(1).await;

	match &err {
		Error::Refresh(RefreshFailure::Rejected { source }) => {
			assert_eq!(source.status(), Some(401));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(err.is_session_terminated());
	assert!(store.is_empty());
	assert_eq!(navigator.visits(), vec![("/login".to_owned(), NavigateOptions { replace: true })]);
	assert_eq!(client.refresh_metrics().failures(), 1);
	assert!(!client.coordinator.is_refreshing());
}

#[tokio::test]
async fn missing_refresh_token_ends_the_session_without_refreshing() {
	let server = MockServer::start_async().await;
	let (client, store, navigator) = build_test_client(test_config(&server.base_url()));

	seed(&store, "A1", None).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/projects");
			then.status(401);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).body(PAIR_A2);
		})
		.await;
	let err = client.get("/projects").await.expect_err("Missing refresh token should surface.");

	refresh.assert_calls_async(0).await;

	match &err {
		Error::Refresh(RefreshFailure::MissingToken { original }) => {
			assert_eq!(original.status, 401);
			assert_eq!(original.path, "/projects");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(store.is_empty());
	assert_eq!(navigator.visits(), vec![("/login".to_owned(), NavigateOptions { replace: true })]);
}

#[tokio::test]
async fn permission_denials_bypass_refresh() {
	let server = MockServer::start_async().await;
	let (client, store, navigator) = build_test_client(test_config(&server.base_url()));
	let client = client.with_strategy(Arc::new(ErrorCodeStrategy::new(["FORBIDDEN"])));

	seed(&store, "A1", Some("R1")).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/admin");
			then.status(401).json_body(json!({ "errorCode": "FORBIDDEN" }));
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).body(PAIR_A2);
		})
		.await;
	let err = client.get("/admin").await.expect_err("Permission denial should surface.");

	refresh.assert_calls_async(0).await;

	assert!(matches!(err, Error::Status(ref failure) if failure.status == 401));
	assert!(navigator.visits().is_empty());
	assert_eq!(stored(&store, TokenKey::AccessToken).await.as_deref(), Some("A1"));
}

#[tokio::test]
async fn non_unauthorized_failures_propagate_untouched() {
	let server = MockServer::start_async().await;
	let (client, store, _) = build_test_client(test_config(&server.base_url()));

	seed(&store, "A1", Some("R1")).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/projects");
			then.status(503).header("retry-after", "5").body("maintenance");
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).body(PAIR_A2);
		})
		.await;
	let err = client.get("/projects").await.expect_err("503 should surface to the caller.");

	refresh.assert_calls_async(0).await;

	match err {
		Error::Status(failure) => {
			assert_eq!(failure.status, 503);
			assert_eq!(failure.body, "maintenance");
			assert_eq!(failure.retry_after, Some(Duration::seconds(5)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn slow_refresh_times_out() {
	let server = MockServer::start_async().await;
	let base_url = Url::parse(&server.base_url()).expect("Mock server URL should parse.");
	let config = ClientConfig::builder(base_url)
		.refresh_timeout(Duration::milliseconds(200))
		.build()
		.expect("Client config with a short refresh timeout should build.");
	let (client, store, navigator) = build_test_client(config);

	seed(&store, "A1", Some("R1")).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/projects");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).delay(std::time::Duration::from_secs(3)).body(PAIR_A2);
		})
		.await;

	let err = client.get("/projects").await.expect_err("Slow refresh should time out.");

	match &err {
		Error::Refresh(RefreshFailure::Rejected { source }) => {
			assert!(matches!(source.as_ref(), Error::Transport(TransportError::Timeout { .. })));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(store.is_empty());
	assert_eq!(navigator.visits().len(), 1);
}
