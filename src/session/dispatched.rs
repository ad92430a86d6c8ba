//! Session client that runs network work through a [`RequestDispatcher`].

// self
use crate::{
	_prelude::*,
	auth::TokenResponse,
	config::OidcConfig,
	dispatch::{RequestCallback, RequestDispatcher},
	error::{AuthorizationError, DispatchError},
	http::{JsonObject, Transport},
	request::IntrospectInfo,
	session::{AuthorizedCall, SessionRequests},
	store::SessionState,
};

/// Session client whose network calls execute in the background.
///
/// Each call builds and executes its request on the dispatcher's background context and
/// delivers the outcome to `callback` on the result-delivery context. Failures while building
/// the request (no tokens, missing endpoint) are delivered the same way. A call only returns an
/// error when the dispatcher refuses the work.
#[derive(Clone)]
pub struct SessionClient {
	requests: SessionRequests,
	transport: Arc<dyn Transport>,
	dispatcher: RequestDispatcher,
}
impl SessionClient {
	/// Binds configuration, state, transport, and dispatcher.
	pub fn new(
		config: OidcConfig,
		state: Arc<dyn SessionState>,
		transport: Arc<dyn Transport>,
		dispatcher: RequestDispatcher,
	) -> Self {
		Self { requests: SessionRequests::new(config, state), transport, dispatcher }
	}

	/// Dispatcher the client submits to.
	pub fn dispatcher(&self) -> &RequestDispatcher {
		&self.dispatcher
	}

	/// Request builders shared with the blocking client.
	pub fn requests(&self) -> &SessionRequests {
		&self.requests
	}

	/// Issues an arbitrary bearer-authorized call.
	pub fn authorized_request<C>(&self, call: AuthorizedCall, callback: C) -> Result<(), DispatchError>
	where
		C: RequestCallback<JsonObject>,
	{
		let (requests, transport) = self.parts();

		self.dispatcher
			.dispatch(move || requests.execute_authorized(call, transport.as_ref()), callback)
	}

	/// Fetches the userinfo document.
	pub fn user_profile<C>(&self, callback: C) -> Result<(), DispatchError>
	where
		C: RequestCallback<JsonObject>,
	{
		let (requests, transport) = self.parts();

		self.dispatcher.dispatch(move || requests.execute_user_profile(transport.as_ref()), callback)
	}

	/// Introspects `token`.
	pub fn introspect_token<C>(
		&self,
		token: impl Into<String>,
		token_type_hint: Option<String>,
		callback: C,
	) -> Result<(), DispatchError>
	where
		C: RequestCallback<IntrospectInfo>,
	{
		let (requests, transport) = self.parts();
		let token = token.into();

		self.dispatcher.dispatch(
			move || {
				requests.execute_introspect(&token, token_type_hint.as_deref(), transport.as_ref())
			},
			callback,
		)
	}

	/// Revokes `token`.
	pub fn revoke_token<C>(&self, token: impl Into<String>, callback: C) -> Result<(), DispatchError>
	where
		C: RequestCallback<bool>,
	{
		let (requests, transport) = self.parts();
		let token = token.into();

		self.dispatcher.dispatch(move || requests.execute_revoke(&token, transport.as_ref()), callback)
	}

	/// Refreshes the stored tokens; the result is persisted before `callback` runs.
	pub fn refresh_token<C>(&self, callback: C) -> Result<(), DispatchError>
	where
		C: RequestCallback<TokenResponse>,
	{
		let (requests, transport) = self.parts();

		self.dispatcher.dispatch(move || requests.refresh_and_persist(transport.as_ref()), callback)
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

	fn parts(&self) -> (SessionRequests, Arc<dyn Transport>) {
		(self.requests.clone(), self.transport.clone())
	}
}
impl Debug for SessionClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("requests", &self.requests)
			.field("dispatcher", &self.dispatcher)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use tokio::sync::oneshot;
	// self
	use super::*;
	use crate::{
		_preludet::{Scripted, ScriptedTransport, test_config, test_state},
		dispatch::{ExecutionContext, Job, ResultQueue},
		error::ErrorKind,
		http::BufferedResponse,
		store::MemoryState,
	};

	struct Inline;
	impl ExecutionContext for Inline {
		fn execute(&self, job: Job) -> Result<(), DispatchError> {
			job();

			Ok(())
		}
	}

	#[test]
	fn build_failures_are_delivered_through_the_callback() {
		let (queue, mut results) = ResultQueue::new();
		let client = SessionClient::new(
			test_config(),
			Arc::new(MemoryState::default()),
			Arc::new(ScriptedTransport::new(Scripted::Panic("must not be opened"))),
			RequestDispatcher::new(Inline, queue),
		);
		let (tx, mut rx) = oneshot::channel();

		client.user_profile(tx).expect("Dispatch should be accepted.");
		results.run_pending();

		let err = rx
			.try_recv()
			.expect("Result should be delivered.")
			.expect_err("A profile call without state should fail.");

		assert_eq!(err.kind(), ErrorKind::General);
	}

	#[test]
	fn refresh_is_persisted_before_delivery() {
		let body = serde_json::json!({ "access_token": "at-2", "refresh_token": "rt-2" });
		let state = test_state("https://idp.example.com", "at-1", Some("rt-1"));
		let (queue, mut results) = ResultQueue::new();
		let client = SessionClient::new(
			test_config(),
			Arc::new(state.clone()),
			Arc::new(ScriptedTransport::new(Scripted::Respond(BufferedResponse::json(200, &body)))),
			RequestDispatcher::new(Inline, queue),
		);
		let (tx, mut rx) = oneshot::channel();

		client.refresh_token(tx).expect("Dispatch should be accepted.");

		let stored = state
			.tokens()
			.expect("Reading tokens should succeed.")
			.expect("Tokens should be stored.");

		assert_eq!(stored.access_token.expose(), "at-2");
		assert!(rx.try_recv().is_err());

		results.run_pending();

		let refreshed = rx
			.try_recv()
			.expect("Result should be delivered.")
			.expect("Refresh should succeed.");

		assert_eq!(refreshed.refresh_token.as_ref().map(|t| t.expose()), Some("rt-2"));
	}
}
