//! Response contract, an in-memory implementation, and the scoped connection guard.

// std
use std::{
	io,
	ops::{Deref, DerefMut},
	sync::atomic::{AtomicUsize, Ordering},
};
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::ResponseError, http::JsonObject};

/// Open response produced by a [`Transport`](crate::http::Transport).
///
/// A response is owned by exactly one request execution. The execution always calls
/// [`disconnect`](Response::disconnect) before returning, so implementations should release
/// sockets or pooled connections there. `disconnect` must be idempotent and must never panic.
pub trait Response
where
	Self: Send,
{
	/// HTTP status code.
	fn status(&self) -> u16;

	/// Response headers, keyed by lower- or mixed-case name as received.
	fn headers(&self) -> &BTreeMap<String, String>;

	/// Reads the whole body.
	fn read_body(&mut self) -> io::Result<Vec<u8>>;

	/// Releases the underlying connection.
	fn disconnect(&mut self);

	/// Returns `true` for 2xx statuses.
	fn is_success(&self) -> bool {
		(200..300).contains(&self.status())
	}

	/// Reads the body and parses it as a JSON object.
	///
	/// Non-success statuses yield [`ResponseError::Status`] carrying the raw body so callers
	/// can inspect any error document the server sent.
	fn as_json(&mut self) -> Result<JsonObject, ResponseError> {
		let body = self.read_body()?;

		if !self.is_success() {
			return Err(ResponseError::Status { status: self.status(), body });
		}

		parse_json(&body)
	}
}

/// Parses `body` as one JSON document of type `T`, reporting the failing path.
pub fn parse_json<T>(body: &[u8]) -> Result<T, ResponseError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let value = serde_path_to_error::deserialize(&mut deserializer)?;

	deserializer.end().map_err(ResponseError::TrailingData)?;

	Ok(value)
}

/// Fully buffered [`Response`] for transports that read eagerly, and for tests.
///
/// Clones share one disconnect counter, so a clone kept by the caller observes how often the
/// copy handed to a request was disconnected.
#[derive(Clone, Debug)]
pub struct BufferedResponse {
	status: u16,
	headers: BTreeMap<String, String>,
	body: Vec<u8>,
	disconnected: bool,
	disconnects: Arc<AtomicUsize>,
}
impl BufferedResponse {
	/// Creates a response with the given status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self {
			status,
			headers: BTreeMap::new(),
			body: body.into(),
			disconnected: false,
			disconnects: Default::default(),
		}
	}

	/// Creates a JSON response.
	pub fn json(status: u16, body: &serde_json::Value) -> Self {
		Self::new(status, body.to_string()).with_header("content-type", "application/json")
	}

	/// Adds a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Number of `disconnect` calls observed across every clone.
	pub fn disconnect_count(&self) -> usize {
		self.disconnects.load(Ordering::SeqCst)
	}
}
impl Response for BufferedResponse {
	fn status(&self) -> u16 {
		self.status
	}

	fn headers(&self) -> &BTreeMap<String, String> {
		&self.headers
	}

	fn read_body(&mut self) -> io::Result<Vec<u8>> {
		if self.disconnected {
			return Err(io::Error::new(io::ErrorKind::NotConnected, "Response was disconnected."));
		}

		Ok(std::mem::take(&mut self.body))
	}

	fn disconnect(&mut self) {
		self.disconnected = true;
		self.disconnects.fetch_add(1, Ordering::SeqCst);
	}
}

/// Scoped owner of an open [`Response`]; disconnects exactly once when dropped.
///
/// Dropping covers every exit path of an execution, including unwinding out of a panicking
/// parser.
pub(crate) struct ConnectionGuard(Box<dyn Response>);
impl ConnectionGuard {
	pub(crate) fn new(response: Box<dyn Response>) -> Self {
		Self(response)
	}
}
impl Deref for ConnectionGuard {
	type Target = dyn Response;

	fn deref(&self) -> &Self::Target {
		self.0.as_ref()
	}
}
impl DerefMut for ConnectionGuard {
	fn deref_mut(&mut self) -> &mut Self::Target {
		self.0.as_mut()
	}
}
impl Drop for ConnectionGuard {
	fn drop(&mut self) {
		self.0.disconnect();
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn as_json_parses_objects() {
		let mut response = BufferedResponse::new(200, r#"{"sub":"abc123"}"#);
		let object = response.as_json().expect("A JSON object body should parse.");

		assert_eq!(object.get("sub").and_then(|value| value.as_str()), Some("abc123"));
	}

	#[test]
	fn as_json_rejects_non_objects_and_trailing_data() {
		let err = BufferedResponse::new(200, "not-json")
			.as_json()
			.expect_err("Plain text should not parse.");

		assert!(matches!(err, ResponseError::Json(_)));

		let err = BufferedResponse::new(200, "[1,2]")
			.as_json()
			.expect_err("Arrays are not JSON objects.");

		assert!(matches!(err, ResponseError::Json(_)));

		let err = BufferedResponse::new(200, "{} {}")
			.as_json()
			.expect_err("Trailing data should be rejected.");

		assert!(matches!(err, ResponseError::TrailingData(_)));
	}

	#[test]
	fn as_json_reports_status_with_body() {
		let err = BufferedResponse::new(401, r#"{"error":"invalid_token"}"#)
			.as_json()
			.expect_err("A 401 should not parse as success.");

		match err {
			ResponseError::Status { status, body } => {
				assert_eq!(status, 401);
				assert_eq!(body, br#"{"error":"invalid_token"}"#.to_vec());
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn disconnect_is_idempotent() {
		let recorded = BufferedResponse::new(200, "{}");
		let mut response = recorded.clone();

		response.disconnect();
		response.disconnect();

		assert_eq!(recorded.disconnect_count(), 2);
		assert!(response.read_body().is_err());
	}

	#[test]
	fn guard_disconnects_once_on_drop() {
		let recorded = BufferedResponse::new(200, "{}");

		{
			let mut guard = ConnectionGuard::new(Box::new(recorded.clone()));

			assert_eq!(guard.status(), 200);
			assert!(guard.read_body().is_ok());
		}

		assert_eq!(recorded.disconnect_count(), 1);
	}
}
