//! Blocking session client for callers that manage their own threads.

// self
use crate::{
	_prelude::*,
	auth::TokenResponse,
	config::OidcConfig,
	error::AuthorizationError,
	http::{JsonObject, Transport},
	request::IntrospectInfo,
	session::{AuthorizedCall, SessionRequests, TransportFactory},
	store::SessionState,
};

/// Session client whose network calls block the calling thread.
///
/// Call it from a thread that may block; every method returns either its value or the typed
/// failure.
#[derive(Clone)]
pub struct SyncSessionClient {
	requests: SessionRequests,
	transport: Arc<dyn Transport>,
}
impl SyncSessionClient {
	/// Binds configuration, state, and transport.
	pub fn new(
		config: OidcConfig,
		state: Arc<dyn SessionState>,
		transport: Arc<dyn Transport>,
	) -> Self {
		Self { requests: SessionRequests::new(config, state), transport }
	}

	/// Request builders shared with the dispatched client.
	pub fn requests(&self) -> &SessionRequests {
		&self.requests
	}

	/// Issues an arbitrary bearer-authorized call and returns the JSON body.
	pub fn authorized_request(&self, call: AuthorizedCall) -> Result<JsonObject, AuthorizationError> {
		self.requests.execute_authorized(call, self.transport.as_ref())
	}

	/// Fetches the userinfo document.
	pub fn user_profile(&self) -> Result<JsonObject, AuthorizationError> {
		self.requests.execute_user_profile(self.transport.as_ref())
	}

	/// Introspects `token`.
	pub fn introspect_token(
		&self,
		token: &str,
		token_type_hint: Option<&str>,
	) -> Result<IntrospectInfo, AuthorizationError> {
		self.requests.execute_introspect(token, token_type_hint, self.transport.as_ref())
	}

	/// Revokes `token`.
	pub fn revoke_token(&self, token: &str) -> Result<bool, AuthorizationError> {
		self.requests.execute_revoke(token, self.transport.as_ref())
	}

	/// Refreshes the stored tokens and persists the result.
	pub fn refresh_token(&self) -> Result<TokenResponse, AuthorizationError> {
		self.requests.refresh_and_persist(self.transport.as_ref())
	}

	/// Current tokens.
	pub fn tokens(&self) -> Result<Option<TokenResponse>, AuthorizationError> {
		self.requests.tokens()
	}

	/// Returns `true` when an access token is stored.
	pub fn is_authenticated(&self) -> Result<bool, AuthorizationError> {
		self.requests.is_authenticated()
	}

	/// Drops the stored tokens.
	pub fn clear(&self) -> Result<(), AuthorizationError> {
		self.requests.clear()
	}
}
impl Debug for SyncSessionClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SyncSessionClient").field("requests", &self.requests).finish_non_exhaustive()
	}
}

/// Creates [`SyncSessionClient`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncSessionClientFactory;
impl SyncSessionClientFactory {
	/// Builds a client over `state`, taking its transport from `transport_factory`.
	pub fn create_client<S, F>(
		&self,
		config: OidcConfig,
		state: S,
		transport_factory: &F,
	) -> SyncSessionClient
	where
		S: 'static + SessionState,
		F: ?Sized + TransportFactory,
	{
		SyncSessionClient::new(config, Arc::new(state), transport_factory.create())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{Scripted, ScriptedTransport, test_config, test_state},
		error::ErrorKind,
		http::{AUTHORIZATION, BufferedResponse, HttpMethod},
	};

	const BASE: &str = "https://idp.example.com";

	fn client(outcome: Scripted, refresh: Option<&str>) -> (SyncSessionClient, ScriptedTransport) {
		let transport = ScriptedTransport::new(outcome);
		let shared = Arc::new(transport.clone());
		let client = SyncSessionClientFactory.create_client(
			test_config(),
			test_state(BASE, "at-1", refresh),
			&shared,
		);

		(client, transport)
	}

	#[test]
	fn authorized_request_carries_the_stored_token() {
		let body = serde_json::json!({ "items": [] });
		let (client, transport) = client(Scripted::Respond(BufferedResponse::json(200, &body)), None);
		let call = AuthorizedCall::new(
			Url::parse("https://api.example.com/items").expect("Failed to parse resource URL."),
			HttpMethod::Get,
		)
		.property("Authorization", "Basic override");
		let object = client.authorized_request(call).expect("Authorized call should succeed.");
		let seen = transport.seen();

		assert_eq!(object.get("items"), Some(&serde_json::json!([])));
		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].header(AUTHORIZATION), Some("Bearer at-1"));
	}

	#[test]
	fn refresh_persists_and_keeps_unrotated_refresh_token() {
		let body = serde_json::json!({ "access_token": "at-2", "expires_in": 3600 });
		let (client, _) =
			client(Scripted::Respond(BufferedResponse::json(200, &body)), Some("rt-1"));
		let refreshed = client.refresh_token().expect("Refresh should succeed.");
		let stored = client
			.tokens()
			.expect("Reading tokens should succeed.")
			.expect("Tokens should be stored.");

		assert_eq!(refreshed.access_token.expose(), "at-2");
		assert_eq!(stored.access_token.expose(), "at-2");
		assert_eq!(stored.refresh_token.as_ref().map(|t| t.expose()), Some("rt-1"));
	}

	#[test]
	fn failed_refresh_leaves_state_untouched() {
		let body = serde_json::json!({ "error": "invalid_grant" });
		let (client, _) =
			client(Scripted::Respond(BufferedResponse::json(400, &body)), Some("rt-1"));
		let err = client.refresh_token().expect_err("An invalid grant should fail.");
		let stored = client
			.tokens()
			.expect("Reading tokens should succeed.")
			.expect("Tokens should be stored.");

		assert_eq!(err.kind(), ErrorKind::OAuth);
		assert_eq!(stored.access_token.expose(), "at-1");
	}

	#[test]
	fn clear_signs_the_session_out() {
		let (client, transport) = client(Scripted::Fail(std::io::ErrorKind::Other, "unused"), None);

		assert!(client.is_authenticated().expect("Reading state should succeed."));

		client.clear().expect("Clearing should succeed.");

		assert!(!client.is_authenticated().expect("Reading state should succeed."));

		let err = client.user_profile().expect_err("A signed-out profile call should fail.");

		assert_eq!(err.kind(), ErrorKind::General);
		assert!(transport.seen().is_empty());
	}
}
