//! Transport primitives for authenticated requests.
//!
//! The module exposes [`Transport`] alongside [`Response`] and [`ConnectionParameters`] so
//! downstream crates can plug in any HTTP stack. A transport only has to turn a
//! [`ConnectionParameters`] value into an open [`Response`]; status handling, JSON decoding,
//! and error normalization stay inside the request layer. [`ReqwestTransport`] is the
//! default implementation.

pub mod connection;
pub mod response;

pub use connection::*;
pub use response::*;

// std
#[cfg(feature = "reqwest")] use std::io;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::{Method, blocking::Response as ReqwestResponse, redirect};
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// JSON object returned by JSON endpoints.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// `Authorization` header name.
pub const AUTHORIZATION: &str = "Authorization";
/// `Accept` header name.
pub const ACCEPT: &str = "Accept";
/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";
/// JSON media type.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Form media type used for POST parameters.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Abstraction over blocking HTTP stacks capable of issuing one described call.
///
/// The trait is the core's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so one instance can be shared by the dispatcher's worker threads
/// and the synchronous session client at once. Every call to [`Transport::open`] must produce
/// an independent [`Response`]; the caller owns it exclusively and always calls
/// [`Response::disconnect`] before it is dropped.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Opens a connection described by `parameters` and returns the response head.
	///
	/// Connection, TLS, and request-writing failures are reported as [`TransportError`].
	/// Non-success HTTP statuses are not errors at this level.
	fn open(&self, parameters: &ConnectionParameters) -> Result<Box<dyn Response>, TransportError>;
}
impl<T> Transport for Arc<T>
where
	T: ?Sized + Transport,
{
	fn open(&self, parameters: &ConnectionParameters) -> Result<Box<dyn Response>, TransportError> {
		(**self).open(parameters)
	}
}

/// Blocking reqwest transport.
///
/// Redirects are never followed: OIDC endpoints answer directly and a redirect would
/// forward the bearer token to a host the caller did not choose. Configure any custom
/// [`ReqwestClient`] passed to [`ReqwestTransport::with_client`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// User agent sent by the default client.
	pub const USER_AGENT: &'static str = concat!("oidc-request/", env!("CARGO_PKG_VERSION"));

	/// Builds a transport with redirects disabled and the crate's user agent.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(redirect::Policy::none())
			.user_agent(Self::USER_AGENT)
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing blocking reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn open(&self, parameters: &ConnectionParameters) -> Result<Box<dyn Response>, TransportError> {
		let method = match parameters.method() {
			HttpMethod::Get => Method::GET,
			HttpMethod::Post => Method::POST,
			HttpMethod::Put => Method::PUT,
			HttpMethod::Delete => Method::DELETE,
		};
		let mut request = self.0.request(method, parameters.url().clone());

		for (name, value) in parameters.headers() {
			request = request.header(name.as_str(), value.as_str());
		}
		if let Some(body) = parameters.encoded_body() {
			request = request.body(body);
		}

		let response = request.send()?;
		let status = response.status().as_u16();
		let headers = response
			.headers()
			.iter()
			.filter_map(|(name, value)| {
				value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
			})
			.collect();

		Ok(Box::new(ReqwestConnection { status, headers, inner: Some(response) }))
	}
}

/// Open reqwest response; dropping the inner handle releases the connection.
#[cfg(feature = "reqwest")]
struct ReqwestConnection {
	status: u16,
	headers: BTreeMap<String, String>,
	inner: Option<ReqwestResponse>,
}
#[cfg(feature = "reqwest")]
impl Response for ReqwestConnection {
	fn status(&self) -> u16 {
		self.status
	}

	fn headers(&self) -> &BTreeMap<String, String> {
		&self.headers
	}

	fn read_body(&mut self) -> io::Result<Vec<u8>> {
		let response = self.inner.take().ok_or_else(|| {
			io::Error::new(io::ErrorKind::NotConnected, "Response body was already consumed.")
		})?;

		response.bytes().map(|bytes| bytes.to_vec()).map_err(io::Error::other)
	}

	fn disconnect(&mut self) {
		self.inner = None;
	}
}
