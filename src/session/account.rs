//! Account operations: login, logout, password change, registration, and the current user.

// self
use crate::{
	_prelude::*,
	auth::{AccessClaims, AuthUser, TokenPair},
	http::{ApiRequest, HttpTransport},
	navigation::NavigateOptions,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::SessionClient,
	store::TokenKey,
};

#[derive(Serialize)]
struct LoginBody<'a> {
	email: &'a str,
	password: &'a str,
}

/// Payload for the change-password endpoint.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
	/// Current password.
	pub old_password: String,
	/// Desired password.
	pub new_password: String,
	/// Confirmation of the desired password.
	pub confirm_new_password: String,
}
impl ChangePassword {
	/// Creates a password change request.
	pub fn new(
		old_password: impl Into<String>,
		new_password: impl Into<String>,
		confirm_new_password: impl Into<String>,
	) -> Self {
		Self {
			old_password: old_password.into(),
			new_password: new_password.into(),
			confirm_new_password: confirm_new_password.into(),
		}
	}

	/// Rejects empty or mismatched new passwords before anything is sent.
	pub fn validate(&self) -> Result<()> {
		if self.new_password.is_empty() {
			return Err(Error::InvalidInput { reason: "The new password must not be empty".into() });
		}
		if self.new_password != self.confirm_new_password {
			return Err(Error::InvalidInput {
				reason: "The new password and its confirmation do not match".into(),
			});
		}

		Ok(())
	}
}
impl Debug for ChangePassword {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ChangePassword(..)")
	}
}

/// Payload for the registration endpoint.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
	/// Optional display name; omitted from the payload when absent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}
impl Registration {
	/// Creates a registration without a display name.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into(), name: None }
	}

	/// Sets the display name; an empty name is treated as absent.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into()).filter(|name| !name.is_empty());

		self
	}
}
impl Debug for Registration {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Registration")
			.field("email", &self.email)
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges credentials for a token pair and persists it.
	pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = ApiRequest::post(self.config.endpoints.login.clone())
					.with_json(&LoginBody { email, password })?;
				let pair = self.send(request).await?.json::<TokenPair>()?;

				self.store.save_pair(&pair).await?;
				tracing::info!("Signed in.");

				Ok(pair)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Ends the session: notifies the backend (best effort), clears the tokens, and navigates
	/// to the login view.
	///
	/// A failing logout call is logged and never surfaces to the caller.
	pub async fn logout(&self) {
		const KIND: FlowKind = FlowKind::Logout;

		let span = FlowSpan::new(KIND, "logout");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		span.instrument(async move {
			let request = ApiRequest::post(self.config.endpoints.logout.clone());

			match self.dispatch(request).await {
				Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
				Err(e) => {
					obs::record_flow_outcome(KIND, FlowOutcome::Failure);
					tracing::warn!(error = %e, "Logout call failed; ending the session anyway.");
				},
			}

			self.force_logout().await;
		})
		.await
	}

	/// Clears both tokens and navigates to the login view, replacing the current history entry.
	///
	/// Safe to call without an active session.
	pub async fn force_logout(&self) {
		if let Err(e) = self.store.clear().await {
			tracing::error!(error = %e, "Failed to clear stored tokens.");
		}

		tracing::info!(
			view = %self.config.login_view,
			"Session ended; navigating to the login view."
		);
		self.navigator.navigate(&self.config.login_view, NavigateOptions::REPLACE);
	}

	/// Changes the signed-in user's password.
	pub async fn change_password(&self, change: &ChangePassword) -> Result<()> {
		const KIND: FlowKind = FlowKind::Account;

		let span = FlowSpan::new(KIND, "change_password");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				change.validate()?;

				let request = ApiRequest::post(self.config.endpoints.change_password.clone())
					.with_json(change)?;

				self.send(request).await?;

				Ok(())
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Creates an account. The session is left untouched; call [`SessionClient::login`] next.
	pub async fn register(&self, registration: &Registration) -> Result<()> {
		const KIND: FlowKind = FlowKind::Account;

		let span = FlowSpan::new(KIND, "register");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = ApiRequest::post(self.config.endpoints.register.clone())
					.with_json(registration)?;

				self.send(request).await?;

				Ok(())
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Returns the user described by the stored access token.
	///
	/// A token whose payload cannot be decoded ends the local session and yields `None`.
	pub async fn current_user(&self) -> Result<Option<AuthUser>> {
		let Some(token) = self.store.get(TokenKey::AccessToken).await? else {
			return Ok(None);
		};

		match AccessClaims::decode(token.expose()) {
			Ok(claims) => Ok(Some(claims.user())),
			Err(e) => {
				tracing::error!(error = %e, "Failed to decode the stored access token.");
				self.store.clear().await?;

				Ok(None)
			},
		}
	}

	/// Returns `true` when the stored access token describes a user.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.current_user().await?.is_some())
	}
}
