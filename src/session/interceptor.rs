//! Request decoration and the refresh-on-401 interceptor.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	error::{RefreshFailure, StatusError},
	http::{ApiRequest, ApiResponse, HttpTransport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{RefreshLease, RefreshOutcome, RefreshTicket, SessionClient},
	store::TokenKey,
	strategy::UnauthorizedKind,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
	refresh_token: &'a str,
}

impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Sends `request` with the stored bearer token, recovering from an expired session.
	///
	/// A `401 Unauthorized` on a request that has not been retried yet (and that does not
	/// target the login or refresh endpoint) triggers a single-flight refresh: the first such
	/// request refreshes the token pair while any concurrent ones wait, then every one of them
	/// is retried once with the new access token. Non-success responses that are not recovered
	/// surface as [`Error::Status`]; a failed refresh ends the session and surfaces as
	/// [`Error::Refresh`].
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.intercept(request)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Sends a `GET` request for `path`, resolved against the base URL.
	pub async fn get(&self, path: &str) -> Result<ApiResponse> {
		self.send(ApiRequest::get(self.config.url(path)?)).await
	}

	/// Sends a `GET` request for `path` and decodes the JSON response.
	pub async fn get_json<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.get(path).await?.json()
	}

	/// Sends a `POST` request with a JSON body to `path`, resolved against the base URL.
	pub async fn post_json<B>(&self, path: &str, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(ApiRequest::post(self.config.url(path)?).with_json(body)?).await
	}

	/// Executes `request` with the stored bearer token and no refresh recovery.
	pub(crate) async fn dispatch(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		self.decorate(&mut request).await?;

		let path = request.url.path().to_owned();
		let response = self.transport.execute(request).await?;

		Ok(response.error_for_status(&path)?)
	}

	async fn intercept(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		let sent = self.decorate(&mut request).await?;
		let response = self.transport.execute(request.clone()).await?;
		let failure = match response.error_for_status(request.url.path()) {
			Ok(response) => return Ok(response),
			Err(failure) => failure,
		};

		if !self.should_refresh(&request, &failure) {
			return Err(failure.into());
		}

		request.mark_retried();

		let token = match self.coordinator.begin() {
			RefreshTicket::Lead(lease) => self.lead_refresh(lease, sent.as_ref(), failure).await?,
			RefreshTicket::Wait(waiter) => {
				tracing::debug!(path = request.url.path(), "Waiting on in-flight token refresh.");

				waiter.wait().await?
			},
		};

		self.retry(request, &token).await
	}

	// Returns the token that was attached so a later refresh can detect rotation.
	async fn decorate(&self, request: &mut ApiRequest) -> Result<Option<TokenSecret>> {
		let token = self.store.get(TokenKey::AccessToken).await?;

		if let Some(token) = &token {
			request.set_bearer(token)?;
		}

		Ok(token)
	}

	fn should_refresh(&self, request: &ApiRequest, failure: &StatusError) -> bool {
		failure.is_unauthorized()
			&& !request.is_retried()
			&& !self.config.endpoints.is_refresh_exempt(&request.url)
			&& self.strategy.classify(failure) == UnauthorizedKind::Expired
	}

	async fn lead_refresh(
		&self,
		lease: RefreshLease<'_>,
		sent: Option<&TokenSecret>,
		original: StatusError,
	) -> RefreshOutcome {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "lead_refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let outcome = span.instrument(self.obtain_token(sent, original)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&outcome));

		match &outcome {
			Ok(_) => {
				self.refresh_metrics().record_success();

				let released = lease.settle(outcome.clone());

				tracing::debug!(released, "Token refresh settled.");
			},
			Err(e) => {
				self.refresh_metrics().record_failure();
				tracing::warn!(error = %e, "Token refresh failed; ending the session.");
				// Waiters are released only after the store is cleared.
				self.force_logout().await;

				let released = lease.settle(outcome.clone());

				tracing::debug!(released, "Token refresh settled.");
			},
		}

		outcome
	}

	async fn obtain_token(
		&self,
		sent: Option<&TokenSecret>,
		original: StatusError,
	) -> RefreshOutcome {
		let current =
			self.store.get(TokenKey::AccessToken).await.map_err(RefreshFailure::rejected)?;

		if let Some(current) = current.filter(|current| Some(current) != sent) {
			tracing::debug!("Access token rotated after the request was sent; skipping refresh.");

			return Ok(current);
		}

		let Some(refresh_token) =
			self.store.get(TokenKey::RefreshToken).await.map_err(RefreshFailure::rejected)?
		else {
			return Err(RefreshFailure::MissingToken { original });
		};

		tracing::debug!("Refreshing the token pair.");
		self.refresh_metrics().record_attempt();

		let pair = self.call_refresh(&refresh_token).await.map_err(RefreshFailure::rejected)?;

		self.store.save_pair(&pair).await.map_err(RefreshFailure::rejected)?;

		Ok(pair.access_token)
	}

	async fn call_refresh(&self, refresh_token: &TokenSecret) -> Result<TokenPair> {
		let request = ApiRequest::post(self.config.endpoints.refresh.clone())
			.with_json(&RefreshBody { refresh_token: refresh_token.expose() })?
			.with_timeout(self.config.refresh_timeout);

		self.dispatch(request).await?.json()
	}

	async fn retry(&self, mut request: ApiRequest, token: &TokenSecret) -> Result<ApiResponse> {
		request.set_bearer(token)?;

		let path = request.url.path().to_owned();
		let response = self.transport.execute(request).await?;

		Ok(response.error_for_status(&path)?)
	}
}
