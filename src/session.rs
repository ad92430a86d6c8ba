//! Session clients bound to one configuration and one persisted state.
//!
//! [`SyncSessionClient`] executes on the calling thread; [`SessionClient`] runs the same work
//! through a [`RequestDispatcher`](crate::dispatch::RequestDispatcher). Both build their
//! requests through [`SessionRequests`], so the two paths issue identical calls and surface
//! identical errors.

pub mod dispatched;
pub mod sync;

pub use dispatched::*;
pub use sync::*;

// self
use crate::{
	_prelude::*,
	auth::{TokenResponse, TokenSecret},
	config::{OidcConfig, ProviderConfiguration},
	error::AuthorizationError,
	http::{HttpMethod, JsonObject, Transport},
	obs,
	request::{
		AuthorizedRequest, IntrospectInfo, IntrospectRequest, RefreshTokenRequest, Request,
		RequestType, RevokeTokenRequest,
	},
	store::{CompareAndSwapOutcome, SessionState},
};

/// Produces the transport a session client issues its requests through.
pub trait TransportFactory
where
	Self: Send + Sync,
{
	/// Returns a transport; may be shared or freshly built.
	fn create(&self) -> Arc<dyn Transport>;
}
impl<F> TransportFactory for F
where
	F: Send + Sync + Fn() -> Arc<dyn Transport>,
{
	fn create(&self) -> Arc<dyn Transport> {
		self()
	}
}
impl<T> TransportFactory for Arc<T>
where
	T: Transport,
{
	fn create(&self) -> Arc<dyn Transport> {
		self.clone()
	}
}

/// Arguments of an arbitrary bearer-authorized call.
#[derive(Clone, Debug)]
pub struct AuthorizedCall {
	/// Target URL.
	pub uri: Url,
	/// Request method.
	pub method: HttpMethod,
	/// Extra headers. `Authorization` and `Accept` are always overridden.
	pub properties: BTreeMap<String, String>,
	/// POST parameters, sent as a form body when present.
	pub post_parameters: Option<BTreeMap<String, String>>,
}
impl AuthorizedCall {
	/// Describes a call with no extra headers or body.
	pub fn new(uri: Url, method: HttpMethod) -> Self {
		Self { uri, method, properties: BTreeMap::new(), post_parameters: None }
	}

	/// Adds one header.
	pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.properties.insert(name.into(), value.into());

		self
	}

	/// Sets the POST parameters.
	pub fn post_parameters<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.post_parameters = Some(params.into_iter().map(|(k, v)| (k.into(), v.into())).collect());

		self
	}
}

/// Builds session requests from configuration and persisted state.
#[derive(Clone)]
pub struct SessionRequests {
	config: OidcConfig,
	state: Arc<dyn SessionState>,
}
impl SessionRequests {
	/// Binds `config` to `state`.
	pub fn new(config: OidcConfig, state: Arc<dyn SessionState>) -> Self {
		Self { config, state }
	}

	/// Client configuration.
	pub fn config(&self) -> &OidcConfig {
		&self.config
	}

	/// Persisted state.
	pub fn state(&self) -> &Arc<dyn SessionState> {
		&self.state
	}

	/// Bearer-authorized call using the stored access token.
	pub fn authorized(&self, call: AuthorizedCall) -> Result<AuthorizedRequest, AuthorizationError> {
		let tokens = self.require_tokens()?;
		let mut builder = AuthorizedRequest::builder(call.uri)
			.method(call.method)
			.token(&tokens)
			.properties(call.properties);

		if let Some(params) = call.post_parameters {
			builder = builder.post_parameters(params);
		}

		Ok(builder.build()?)
	}

	/// Userinfo call using the stored access token.
	pub fn user_profile(&self) -> Result<AuthorizedRequest, AuthorizationError> {
		let provider = self.require_provider()?;
		let tokens = self.require_tokens()?;

		Ok(AuthorizedRequest::builder(provider.require_userinfo()?.clone())
			.method(HttpMethod::Get)
			.token(&tokens)
			.request_type(RequestType::Profile)
			.build()?)
	}

	/// Introspection call for `token`.
	pub fn introspect(
		&self,
		token: &str,
		token_type_hint: Option<&str>,
	) -> Result<IntrospectRequest, AuthorizationError> {
		let provider = self.require_provider()?;

		Ok(IntrospectRequest::new(
			provider.require_introspection()?.clone(),
			self.config.client_id(),
			&TokenSecret::new(token),
			token_type_hint,
		)?)
	}

	/// Revocation call for `token`.
	pub fn revoke(&self, token: &str) -> Result<RevokeTokenRequest, AuthorizationError> {
		let provider = self.require_provider()?;

		Ok(RevokeTokenRequest::new(
			provider.require_revocation()?.clone(),
			self.config.client_id(),
			&TokenSecret::new(token),
		)?)
	}

	/// Refresh grant for the stored refresh token, plus the tokens it replaces.
	pub fn refresh(&self) -> Result<(RefreshTokenRequest, TokenResponse), AuthorizationError> {
		let provider = self.require_provider()?;
		let tokens = self.require_tokens()?;
		let refresh_token = tokens
			.refresh_token
			.as_ref()
			.ok_or_else(|| AuthorizationError::general("No refresh token is available."))?;
		let scope = self.config.scope_string();
		let request = RefreshTokenRequest::new(
			provider.token_endpoint.clone(),
			self.config.client_id(),
			refresh_token,
			Some(&scope),
		)?;

		Ok((request, tokens))
	}

	/// Executes a refresh grant and persists the result.
	///
	/// Refresh and ID tokens the server did not rotate are carried over from `previous`. The
	/// result is stored only if the session still holds `previous`'s refresh token, so a
	/// concurrent refresh or sign-out is never overwritten.
	pub fn execute_refresh(
		&self,
		request: &RefreshTokenRequest,
		previous: &TokenResponse,
		transport: &dyn Transport,
	) -> Result<TokenResponse, AuthorizationError> {
		let mut refreshed = request.execute_request(transport)?;

		if refreshed.refresh_token.is_none() {
			refreshed.refresh_token = previous.refresh_token.clone();
		}
		if refreshed.id_token.is_none() {
			refreshed.id_token = previous.id_token.clone();
		}

		let expected = previous.refresh_token.as_ref().map(TokenSecret::expose);

		match self.state.compare_and_swap_tokens(expected, refreshed.clone())? {
			CompareAndSwapOutcome::Updated => {},
			outcome => obs::warn_event(
				"refresh",
				&format!("Refreshed tokens were not persisted: {outcome:?}."),
			),
		}

		Ok(refreshed)
	}

	/// Current tokens.
	pub fn tokens(&self) -> Result<Option<TokenResponse>, AuthorizationError> {
		Ok(self.state.tokens()?)
	}

	/// Returns `true` when a non-empty access token is stored.
	pub fn is_authenticated(&self) -> Result<bool, AuthorizationError> {
		Ok(self.state.tokens()?.is_some_and(|tokens| !tokens.access_token.is_empty()))
	}

	/// Drops the stored tokens.
	pub fn clear(&self) -> Result<(), AuthorizationError> {
		Ok(self.state.clear()?)
	}

	pub(crate) fn execute_authorized(
		&self,
		call: AuthorizedCall,
		transport: &dyn Transport,
	) -> Result<JsonObject, AuthorizationError> {
		self.authorized(call)?.execute_request(transport)
	}

	pub(crate) fn execute_user_profile(
		&self,
		transport: &dyn Transport,
	) -> Result<JsonObject, AuthorizationError> {
		self.user_profile()?.execute_request(transport)
	}

	pub(crate) fn execute_introspect(
		&self,
		token: &str,
		token_type_hint: Option<&str>,
		transport: &dyn Transport,
	) -> Result<IntrospectInfo, AuthorizationError> {
		self.introspect(token, token_type_hint)?.execute_request(transport)
	}

	pub(crate) fn execute_revoke(
		&self,
		token: &str,
		transport: &dyn Transport,
	) -> Result<bool, AuthorizationError> {
		self.revoke(token)?.execute_request(transport)
	}

	pub(crate) fn refresh_and_persist(
		&self,
		transport: &dyn Transport,
	) -> Result<TokenResponse, AuthorizationError> {
		let (request, previous) = self.refresh()?;

		self.execute_refresh(&request, &previous, transport)
	}

	fn require_provider(&self) -> Result<ProviderConfiguration, AuthorizationError> {
		self.state
			.provider_configuration()?
			.ok_or_else(|| AuthorizationError::general("Provider configuration is not loaded."))
	}

	fn require_tokens(&self) -> Result<TokenResponse, AuthorizationError> {
		self.state
			.tokens()?
			.ok_or_else(|| AuthorizationError::general("No access token is available."))
	}
}
impl Debug for SessionRequests {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionRequests").field("config", &self.config).finish_non_exhaustive()
	}
}
