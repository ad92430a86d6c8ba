// std
use std::{
	io,
	sync::{Arc, mpsc as std_mpsc},
	thread,
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
use tokio::sync::oneshot;
// self
use oidc_request::{
	auth::TokenResponse,
	config::{OidcConfig, ProviderConfiguration},
	dispatch::{RequestDispatcher, ResultLoop, callback_fn},
	error::{AuthorizationError, DispatchError, ErrorKind, TransportError},
	http::{BufferedResponse, ConnectionParameters, HttpMethod, JsonObject, Response, Transport},
	request::{AuthorizedRequest, Request},
	session::{SessionClient, SyncSessionClient, SyncSessionClientFactory},
	store::MemoryState,
	url::Url,
};

const BASE: &str = "https://idp.example.com";

enum Behavior {
	Respond(BufferedResponse),
	Refuse,
}

struct FakeTransport {
	behavior: Behavior,
}
impl FakeTransport {
	fn new(behavior: Behavior) -> Self {
		Self { behavior }
	}
}
impl Transport for FakeTransport {
	fn open(&self, _: &ConnectionParameters) -> Result<Box<dyn Response>, TransportError> {
		match &self.behavior {
			Behavior::Respond(response) => Ok(Box::new(response.clone())),
			Behavior::Refuse =>
				Err(io::Error::new(io::ErrorKind::ConnectionRefused, "Connection refused").into()),
		}
	}
}

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse test URL.")
}

fn config() -> OidcConfig {
	OidcConfig::builder()
		.client_id("session-client")
		.redirect_uri(url("com.example.app:/callback"))
		.scopes(["openid", "profile"])
		.discovery_uri(url(&format!("{BASE}/.well-known/openid-configuration")))
		.build()
		.expect("Client configuration should build.")
}

fn state() -> MemoryState {
	let provider = ProviderConfiguration::builder(url(BASE))
		.token_endpoint(url(&format!("{BASE}/token")))
		.userinfo_endpoint(url(&format!("{BASE}/userinfo")))
		.build()
		.expect("Provider configuration should build.");

	MemoryState::with_configuration(provider).with_tokens(TokenResponse::new("access-1"))
}

fn clients(transport: FakeTransport) -> (SyncSessionClient, SessionClient, ResultLoop) {
	let state = Arc::new(state());
	let shared = Arc::new(transport);
	let sync = SyncSessionClientFactory.create_client(config(), state.clone(), &shared);
	let (dispatcher, results) =
		RequestDispatcher::with_worker_pool().expect("Dispatcher should start.");
	let dispatched = SessionClient::new(config(), state, shared, dispatcher);

	(sync, dispatched, results)
}

fn profile_both_ways(
	transport: FakeTransport,
) -> (Result<JsonObject, AuthorizationError>, Result<JsonObject, AuthorizationError>) {
	let (sync, dispatched, mut results) = clients(transport);
	let from_sync = sync.user_profile();
	let (tx, mut rx) = oneshot::channel();

	dispatched.user_profile(tx).expect("Dispatch should be accepted.");

	assert!(results.run_next_blocking());

	let from_async = rx.try_recv().expect("Callback should have delivered a result.");

	dispatched.dispatcher().shutdown();

	(from_sync, from_async)
}

#[test]
fn json_body_reaches_both_paths() {
	let recorded = BufferedResponse::new(200, r#"{"sub":"abc123"}"#);
	let (from_sync, from_async) =
		profile_both_ways(FakeTransport::new(Behavior::Respond(recorded.clone())));
	let object = from_sync.expect("Sync profile call should succeed.");

	assert_eq!(object.get("sub"), Some(&serde_json::json!("abc123")));
	assert_eq!(from_async, Ok(object));
	assert_eq!(recorded.disconnect_count(), 2);
}

#[test]
fn connection_refused_is_a_network_error_on_both_paths() {
	let (from_sync, from_async) = profile_both_ways(FakeTransport::new(Behavior::Refuse));
	let err = from_sync.expect_err("A refused connection should fail.");

	assert_eq!(err.kind(), ErrorKind::Network);
	assert_eq!(err.message(), "Connection refused");
	assert!(err.cause().is_some());
	assert_eq!(from_async, Err(err));
}

#[test]
fn malformed_body_is_a_json_error_on_both_paths() {
	let recorded = BufferedResponse::new(200, "not-json");
	let (from_sync, from_async) =
		profile_both_ways(FakeTransport::new(Behavior::Respond(recorded.clone())));
	let err = from_sync.expect_err("A non-JSON body should fail.");

	assert_eq!(err.kind(), ErrorKind::JsonDeserialization);
	assert_eq!(err.code(), ErrorKind::JsonDeserialization.code());
	assert!(err.cause().is_some());
	assert_eq!(from_async, Err(err));
	assert_eq!(recorded.disconnect_count(), 2);
}

#[test]
fn resource_errors_keep_status_and_detail_on_both_paths() {
	let recorded = BufferedResponse::json(
		401,
		&serde_json::json!({ "error": "invalid_token", "error_description": "Expired." }),
	);
	let (from_sync, from_async) = profile_both_ways(FakeTransport::new(Behavior::Respond(recorded)));
	let err = from_sync.expect_err("A 401 should fail.");

	assert_eq!(err.kind(), ErrorKind::ResourceServer);
	assert_eq!(err.http_status(), Some(401));
	assert_eq!(from_async, Err(err));
}

/// Transport whose `/slow` calls wait for the test to open a gate.
struct GatedTransport {
	gate: Mutex<Option<std_mpsc::Receiver<()>>>,
	events: Arc<Mutex<Vec<String>>>,
}
impl Transport for GatedTransport {
	fn open(&self, parameters: &ConnectionParameters) -> Result<Box<dyn Response>, TransportError> {
		let path = parameters.url().path().to_owned();

		if path == "/slow" {
			let gate = self.gate.lock().take();

			if let Some(gate) = gate {
				gate.recv().map_err(TransportError::network)?;
			}
		}

		self.events.lock().push(format!("executed {path}"));

		Ok(Box::new(BufferedResponse::json(200, &serde_json::json!({ "path": path }))))
	}
}

fn gated() -> (Arc<GatedTransport>, std_mpsc::Sender<()>, Arc<Mutex<Vec<String>>>) {
	let (open_gate, gate) = std_mpsc::channel();
	let events = Arc::new(Mutex::new(Vec::new()));
	let transport =
		Arc::new(GatedTransport { gate: Mutex::new(Some(gate)), events: events.clone() });

	(transport, open_gate, events)
}

fn dispatch_path(
	dispatcher: &RequestDispatcher,
	transport: Arc<GatedTransport>,
	path: &'static str,
	events: Arc<Mutex<Vec<String>>>,
) -> Result<(), DispatchError> {
	let request = AuthorizedRequest::builder(url(&format!("https://api.example.com{path}")))
		.method(HttpMethod::Get)
		.access_token("access-1")
		.build()
		.expect("Authorized request should build.");
	let caller = thread::current().id();
	let failures = events.clone();

	request.dispatch_request(
		dispatcher,
		transport,
		callback_fn(
			move |_: JsonObject| {
				assert_eq!(thread::current().id(), caller);

				events.lock().push(format!("delivered {path}"));
			},
			move |_, e| failures.lock().push(format!("failed {path}: {e}")),
		),
	)
}

#[test]
fn each_callback_follows_its_own_execution() {
	let (transport, open_gate, events) = gated();
	let (dispatcher, mut results) =
		RequestDispatcher::with_worker_pool().expect("Dispatcher should start.");

	dispatch_path(&dispatcher, transport.clone(), "/slow", events.clone())
		.expect("Dispatch should be accepted.");
	dispatch_path(&dispatcher, transport, "/fast", events.clone())
		.expect("Dispatch should be accepted.");

	assert!(results.run_next_blocking());

	open_gate.send(()).expect("Slow request should be waiting on the gate.");

	assert!(results.run_next_blocking());
	assert_eq!(
		*events.lock(),
		vec!["executed /fast", "delivered /fast", "executed /slow", "delivered /slow"]
	);

	dispatcher.shutdown();
}

#[test]
fn results_finishing_after_shutdown_are_dropped() {
	let (transport, open_gate, events) = gated();
	let (dispatcher, mut results) =
		RequestDispatcher::with_worker_pool().expect("Dispatcher should start.");

	dispatch_path(&dispatcher, transport.clone(), "/slow", events.clone())
		.expect("Dispatch should be accepted.");
	wait_until(|| transport.gate.lock().is_none());
	dispatcher.shutdown();
	open_gate.send(()).expect("Slow request should be waiting on the gate.");
	wait_until(|| !events.lock().is_empty());

	assert_eq!(*events.lock(), vec!["executed /slow"]);
	assert!(!results.run_next_blocking());
	assert_eq!(results.run_pending(), 0);

	let refused = dispatch_path(&dispatcher, transport, "/fast", events.clone());

	assert_eq!(refused, Err(DispatchError::Shutdown));
}

fn wait_until(condition: impl Fn() -> bool) {
	for _ in 0..250 {
		if condition() {
			return;
		}

		thread::sleep(Duration::from_millis(20));
	}

	panic!("Condition was not reached within the timeout.");
}
