//! Error taxonomy shared by requests, transports, the dispatcher, and session clients.
//!
//! [`AuthorizationError`] is the typed failure every request execution resolves to. Its
//! [`ErrorKind`] is a closed set so upper layers (refresh policy, session management) can
//! branch on it exhaustively. The remaining enums describe failures of the collaborators the
//! core talks to and are attached to an [`AuthorizationError`] as its cause.

// std
use std::{any::Any, io};
// self
use crate::{_prelude::*, http::JsonObject, store::StoreError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;
type SharedCause = Arc<dyn StdError + Send + Sync>;

/// Aggregate error for callers that mix request execution with configuration and dispatch.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Typed request failure.
	#[error(transparent)]
	Authorization(#[from] AuthorizationError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Dispatcher refused or lost a unit of work.
	#[error(transparent)]
	Dispatch(#[from] DispatchError),
	/// Persisted-state failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
}

/// Closed set of failure categories surfaced by [`AuthorizationError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// Failure that fits no narrower category (missing session state, bad configuration).
	General,
	/// Connection, I/O, or unexpected HTTP status failure.
	Network,
	/// Response body could not be parsed as the expected JSON document.
	JsonDeserialization,
	/// Authorization server answered with an OAuth error document.
	#[serde(rename = "oauth")]
	OAuth,
	/// Protected resource answered with an OAuth error document.
	ResourceServer,
	/// Token endpoint answered with JSON that does not describe a usable token.
	TokenResponseConstruction,
}
impl ErrorKind {
	/// Every kind, in code order.
	pub const ALL: [ErrorKind; 6] = [
		ErrorKind::General,
		ErrorKind::Network,
		ErrorKind::JsonDeserialization,
		ErrorKind::OAuth,
		ErrorKind::ResourceServer,
		ErrorKind::TokenResponseConstruction,
	];

	/// Stable numeric code stamped by [`AuthorizationError::from_template`].
	pub const fn code(self) -> u16 {
		match self {
			ErrorKind::General => 0,
			ErrorKind::Network => 1,
			ErrorKind::JsonDeserialization => 2,
			ErrorKind::OAuth => 3,
			ErrorKind::ResourceServer => 4,
			ErrorKind::TokenResponseConstruction => 5,
		}
	}

	/// Stable short label stamped by [`AuthorizationError::from_template`].
	pub const fn label(self) -> &'static str {
		match self {
			ErrorKind::General => "general_error",
			ErrorKind::Network => "network_error",
			ErrorKind::JsonDeserialization => "json_deserialization_error",
			ErrorKind::OAuth => "oauth_error",
			ErrorKind::ResourceServer => "resource_server_error",
			ErrorKind::TokenResponseConstruction => "token_response_construction_error",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.label())
	}
}

/// Typed, immutable failure produced by every request execution.
///
/// Values are assembled once through [`AuthorizationError::new`] or
/// [`AuthorizationError::from_template`] plus the `with_*` helpers and expose read-only
/// accessors afterwards. The cause is reference counted so the error can be cloned across the
/// dispatcher's context hop without losing any field.
#[derive(Clone)]
pub struct AuthorizationError {
	kind: ErrorKind,
	code: u16,
	label: String,
	message: String,
	http_status: Option<u16>,
	detail: Option<JsonObject>,
	cause: Option<SharedCause>,
}
impl AuthorizationError {
	/// Builds an error with an explicit code and label.
	pub fn new(
		kind: ErrorKind,
		code: u16,
		label: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		Self {
			kind,
			code,
			label: label.into(),
			message: message.into(),
			http_status: None,
			detail: None,
			cause: None,
		}
	}

	/// Stamps the fixed code and label of `kind` onto a live cause.
	///
	/// The message is taken from the cause's `Display` output.
	pub fn from_template(kind: ErrorKind, cause: impl 'static + Send + Sync + StdError) -> Self {
		let message = cause.to_string();

		Self::new(kind, kind.code(), kind.label(), message).with_cause(cause)
	}

	/// Convenience constructor for [`ErrorKind::General`] failures without a cause.
	pub fn general(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::General, ErrorKind::General.code(), ErrorKind::General.label(), message)
	}

	/// Attaches the underlying cause.
	pub fn with_cause(mut self, cause: impl 'static + Send + Sync + StdError) -> Self {
		self.cause = Some(Arc::new(cause));

		self
	}

	/// Attaches the HTTP status returned by the server.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Attaches the JSON document returned alongside the failure.
	pub fn with_detail(mut self, detail: JsonObject) -> Self {
		self.detail = Some(detail);

		self
	}

	/// Failure category.
	pub fn kind(&self) -> ErrorKind {
		self.kind
	}

	/// Numeric error code.
	pub fn code(&self) -> u16 {
		self.code
	}

	/// Short error label (an OAuth `error` value for server-reported failures).
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Human-readable description.
	pub fn message(&self) -> &str {
		&self.message
	}

	/// HTTP status of the response that triggered the failure, if one was received.
	pub fn http_status(&self) -> Option<u16> {
		self.http_status
	}

	/// Additional JSON detail returned by the server.
	pub fn detail(&self) -> Option<&JsonObject> {
		self.detail.as_ref()
	}

	/// Underlying cause, if any.
	pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
		self.cause.as_deref()
	}
}
impl Debug for AuthorizationError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationError")
			.field("kind", &self.kind)
			.field("code", &self.code)
			.field("label", &self.label)
			.field("message", &self.message)
			.field("http_status", &self.http_status)
			.field("detail", &self.detail)
			.field("cause", &self.cause.as_ref().map(ToString::to_string))
			.finish()
	}
}
impl Display for AuthorizationError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}: {}", self.label, self.message)
	}
}
impl StdError for AuthorizationError {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		self.cause.as_deref().map(|cause| cause as &(dyn StdError + 'static))
	}
}
impl PartialEq for AuthorizationError {
	fn eq(&self, other: &Self) -> bool {
		self.kind == other.kind
			&& self.code == other.code
			&& self.label == other.label
			&& self.message == other.message
			&& self.http_status == other.http_status
			&& self.detail == other.detail
			&& self.cause.as_ref().map(ToString::to_string)
				== other.cause.as_ref().map(ToString::to_string)
	}
}
impl From<ConfigError> for AuthorizationError {
	fn from(e: ConfigError) -> Self {
		Self::from_template(ErrorKind::General, e)
	}
}
impl From<StoreError> for AuthorizationError {
	fn from(e: StoreError) -> Self {
		Self::from_template(ErrorKind::General, e)
	}
}

/// Configuration and validation failures raised while assembling requests or clients.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Background worker pool could not be started.
	#[error("Background worker pool could not be started.")]
	WorkerPoolBuild {
		/// Underlying runtime builder failure.
		#[source]
		source: io::Error,
	},
	/// Connection parameters were created without a request method.
	#[error("Request method must be set before creating connection parameters.")]
	MissingRequestMethod,
	/// Authorized request was built without an access token.
	#[error("An access token is required to build an authorized request.")]
	MissingAccessToken,
	/// Client configuration omitted the client identifier.
	#[error("Client configuration is missing a client id.")]
	MissingClientId,
	/// Client configuration omitted the redirect URI.
	#[error("Client configuration is missing a redirect URI.")]
	MissingRedirectUri,
	/// Client configuration requested no scopes.
	#[error("Client configuration must request at least one scope.")]
	MissingScopes,
	/// Provider configuration does not expose the required endpoint.
	#[error("Provider configuration does not expose a {endpoint} endpoint.")]
	MissingEndpoint {
		/// Endpoint name.
		endpoint: &'static str,
	},
	/// A configured URL could not be parsed.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Configuration field holding the URL.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Discovery document could not be decoded.
	#[error("Discovery document is invalid at `{path}`: {reason}.")]
	InvalidDiscoveryDocument {
		/// Path of the member that failed to decode (`.` for the document root).
		path: String,
		/// Decoder failure description.
		reason: String,
	},
	/// Endpoint must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised by a [`Transport`](crate::http::Transport) while opening a connection.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("{source}")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying I/O failure surfaced during transport.
	#[error(transparent)]
	Io(#[from] io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures raised while reading or decoding an opened [`Response`](crate::http::Response).
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Body could not be read from the connection.
	#[error(transparent)]
	Io(#[from] io::Error),
	/// Server answered with a non-success status.
	#[error("Invalid status code {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: Vec<u8>,
	},
	/// Body is not the expected JSON document.
	#[error(transparent)]
	Json(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Body holds a JSON document followed by extra data.
	#[error("Response body has trailing data after the JSON document.")]
	TrailingData(#[source] serde_json::Error),
	/// Token endpoint answered with a document missing required token fields.
	#[error("Token response is invalid: {reason}.")]
	TokenResponse {
		/// What made the document unusable.
		reason: &'static str,
	},
}

/// Failures raised by the [`RequestDispatcher`](crate::dispatch::RequestDispatcher).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DispatchError {
	/// Dispatcher has been shut down and accepts no more work.
	#[error("Request dispatcher has been shut down.")]
	Shutdown,
	/// Execution context can no longer run jobs.
	#[error("The {context} execution context is closed.")]
	ContextClosed {
		/// Context label.
		context: &'static str,
	},
}

/// Cause recorded when request execution panics inside a transport or parser.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Request execution panicked: {message}.")]
pub struct ExecutionPanic {
	/// Panic payload rendered as text.
	pub message: String,
}
impl ExecutionPanic {
	pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Self {
		let message = if let Some(message) = payload.downcast_ref::<&str>() {
			(*message).to_owned()
		} else if let Some(message) = payload.downcast_ref::<String>() {
			message.clone()
		} else {
			"non-string panic payload".into()
		};

		Self { message }
	}
}
