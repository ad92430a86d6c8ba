//! Typed requests: connection parameters plus response parsing and error mapping.
//!
//! Every request variant funnels through one execution core that opens the connection,
//! keeps the [`Response`] inside a scoped guard, and normalizes every failure into exactly one
//! [`AuthorizationError`]. A request value is built for a single attempt; callers build a new
//! one per retry.

pub mod authorized;
pub mod introspect;
pub mod refresh;
pub mod revoke;

pub use authorized::*;
pub use introspect::*;
pub use refresh::*;
pub use revoke::*;

// std
use std::panic::{self, AssertUnwindSafe};
// self
use crate::{
	_prelude::*,
	dispatch::{RequestCallback, RequestDispatcher},
	error::{
		AuthorizationError, DispatchError, ErrorKind, ExecutionPanic, ResponseError, TransportError,
	},
	http::{ConnectionGuard, ConnectionParameters, JsonObject, Response, Transport},
	obs::{self, RequestOutcome, RequestSpan},
};

/// Request type tag carried by [`ConnectionParameters`].
///
/// The core never interprets the tag beyond error classification; it exists so callers can
/// apply policy per request kind (for example, refreshing on a 401 from a profile call but
/// not from a refresh call).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
	/// Discovery document fetch.
	Configuration,
	/// Authorization code exchange.
	TokenExchange,
	/// Arbitrary bearer-authorized call.
	Authorized,
	/// Userinfo call.
	Profile,
	/// Token revocation.
	RevokeToken,
	/// Refresh-token grant.
	RefreshToken,
	/// Token introspection.
	Introspect,
}
impl RequestType {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestType::Configuration => "configuration",
			RequestType::TokenExchange => "token_exchange",
			RequestType::Authorized => "authorized",
			RequestType::Profile => "profile",
			RequestType::RevokeToken => "revoke_token",
			RequestType::RefreshToken => "refresh_token",
			RequestType::Introspect => "introspect",
		}
	}

	/// Returns `true` when the request targets the authorization server rather than a
	/// protected resource.
	pub const fn targets_authorization_server(self) -> bool {
		!matches!(self, RequestType::Authorized | RequestType::Profile)
	}
}
impl Display for RequestType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// A request that can execute against a [`Transport`] once.
pub trait Request
where
	Self: 'static + Send,
{
	/// Value produced by a successful execution.
	type Output: 'static + Send;

	/// Connection parameters this request issues.
	fn parameters(&self) -> &ConnectionParameters;

	/// Request type tag.
	fn request_type(&self) -> RequestType {
		self.parameters().request_type()
	}

	/// Executes the request on the calling thread.
	///
	/// Returns either the parsed output or the typed error, never both. The opened response
	/// is disconnected before this returns on every path.
	fn execute_request(
		&self,
		transport: &dyn Transport,
	) -> Result<Self::Output, AuthorizationError>;

	/// Executes the request on the dispatcher's background context and delivers the outcome to
	/// `callback` on its result-delivery context.
	fn dispatch_request<C>(
		self,
		dispatcher: &RequestDispatcher,
		transport: Arc<dyn Transport>,
		callback: C,
	) -> Result<(), DispatchError>
	where
		Self: Sized,
		C: RequestCallback<Self::Output>,
	{
		dispatcher.dispatch(move || self.execute_request(transport.as_ref()), callback)
	}
}

/// Opens `parameters` through `transport`, hands the guarded response to `parse`, and maps
/// every failure into an [`AuthorizationError`].
pub(crate) fn execute_with<T, F>(
	transport: &dyn Transport,
	parameters: &ConnectionParameters,
	parse: F,
) -> Result<T, AuthorizationError>
where
	F: FnOnce(&mut dyn Response) -> Result<T, ResponseError>,
{
	let request_type = parameters.request_type();
	let _span = RequestSpan::new(request_type, "execute_request").entered();

	obs::record_request_outcome(request_type, RequestOutcome::Attempt);

	let attempt = AssertUnwindSafe(|| execute_guarded(transport, parameters, parse));
	let result = match panic::catch_unwind(attempt) {
		Ok(result) => result,
		Err(payload) => {
			let cause = ExecutionPanic::from_payload(payload);

			Err(AuthorizationError::from_template(ErrorKind::Network, cause))
		},
	};

	match &result {
		Ok(_) => obs::record_request_outcome(request_type, RequestOutcome::Success),
		Err(_) => obs::record_request_outcome(request_type, RequestOutcome::Failure),
	}

	result
}

fn execute_guarded<T, F>(
	transport: &dyn Transport,
	parameters: &ConnectionParameters,
	parse: F,
) -> Result<T, AuthorizationError>
where
	F: FnOnce(&mut dyn Response) -> Result<T, ResponseError>,
{
	let response = transport.open(parameters).map_err(map_transport_error)?;
	let mut connection = ConnectionGuard::new(response);
	let result = parse(&mut *connection);

	drop(connection);

	result.map_err(|e| map_response_error(parameters.request_type(), e))
}

fn map_transport_error(e: TransportError) -> AuthorizationError {
	let message = e.to_string();

	AuthorizationError::new(
		ErrorKind::Network,
		ErrorKind::Network.code(),
		ErrorKind::Network.label(),
		message,
	)
	.with_cause(e)
}

fn map_response_error(request_type: RequestType, e: ResponseError) -> AuthorizationError {
	match e {
		ResponseError::Io(io) => map_transport_error(TransportError::Io(io)),
		ResponseError::Status { status, body } => map_status_error(request_type, status, &body),
		ResponseError::Json(source) =>
			AuthorizationError::from_template(ErrorKind::JsonDeserialization, source),
		ResponseError::TrailingData(source) =>
			AuthorizationError::from_template(ErrorKind::JsonDeserialization, source),
		e @ ResponseError::TokenResponse { .. } =>
			AuthorizationError::from_template(ErrorKind::TokenResponseConstruction, e),
	}
}

/// Classifies a non-success response.
///
/// An OAuth error document (`{"error": ...}`) becomes [`ErrorKind::OAuth`] when the
/// authorization server sent it and [`ErrorKind::ResourceServer`] when a protected resource
/// did. Anything else is a [`ErrorKind::Network`] failure. The status and any JSON body are
/// attached either way.
fn map_status_error(request_type: RequestType, status: u16, body: &[u8]) -> AuthorizationError {
	let detail = serde_json::from_slice::<JsonObject>(body).ok();
	let oauth_error = detail
		.as_ref()
		.and_then(|detail| detail.get("error"))
		.and_then(|value| value.as_str())
		.map(ToOwned::to_owned);
	let err = match oauth_error {
		Some(label) => {
			let kind = if request_type.targets_authorization_server() {
				ErrorKind::OAuth
			} else {
				ErrorKind::ResourceServer
			};
			let message = detail
				.as_ref()
				.and_then(|detail| detail.get("error_description"))
				.and_then(|value| value.as_str())
				.map(ToOwned::to_owned)
				.unwrap_or_else(|| format!("Invalid status code {status}."));

			AuthorizationError::new(kind, kind.code(), label, message)
		},
		None => AuthorizationError::new(
			ErrorKind::Network,
			ErrorKind::Network.code(),
			ErrorKind::Network.label(),
			format!("Invalid status code {status}."),
		),
	}
	.with_http_status(status);

	match detail {
		Some(detail) => err.with_detail(detail),
		None => err,
	}
}
