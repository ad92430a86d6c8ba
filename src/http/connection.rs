//! Immutable description of one HTTP call and its single-use builder.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{AUTHORIZATION, CONTENT_TYPE, FORM_CONTENT_TYPE},
	request::RequestType,
};

/// HTTP methods the core issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `DELETE`.
	Delete,
}
impl HttpMethod {
	/// Returns the method token as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Delete => "DELETE",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Request body carried by [`ConnectionParameters`].
#[derive(Clone, PartialEq, Eq)]
pub enum RequestBody {
	/// POST parameters, form-encoded on the wire.
	Form(BTreeMap<String, String>),
	/// Raw bytes sent as-is.
	Raw {
		/// Media type of `bytes`, if known.
		content_type: Option<String>,
		/// Payload.
		bytes: Vec<u8>,
	},
}
impl RequestBody {
	/// Media type implied by the body.
	pub fn content_type(&self) -> Option<&str> {
		match self {
			RequestBody::Form(_) => Some(FORM_CONTENT_TYPE),
			RequestBody::Raw { content_type, .. } => content_type.as_deref(),
		}
	}

	/// Encodes the body for the wire.
	pub fn encode(&self) -> Vec<u8> {
		match self {
			RequestBody::Form(params) => form_urlencoded::Serializer::new(String::new())
				.extend_pairs(params.iter())
				.finish()
				.into_bytes(),
			RequestBody::Raw { bytes, .. } => bytes.clone(),
		}
	}
}
impl Debug for RequestBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			// Form values carry tokens; only the keys are safe to print.
			RequestBody::Form(params) => f.debug_tuple("Form").field(&params.keys()).finish(),
			RequestBody::Raw { content_type, bytes } => f
				.debug_struct("Raw")
				.field("content_type", content_type)
				.field("len", &bytes.len())
				.finish(),
		}
	}
}

/// Immutable description of one HTTP call.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
	method: HttpMethod,
	url: Url,
	headers: BTreeMap<String, String>,
	body: Option<RequestBody>,
	request_type: RequestType,
}
impl ConnectionParameters {
	/// Returns a single-use builder targeting `url`.
	pub fn builder(url: Url) -> ConnectionParametersBuilder {
		ConnectionParametersBuilder::new(url)
	}

	/// Request method.
	pub fn method(&self) -> HttpMethod {
		self.method
	}

	/// Target URL.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Request headers, keyed by case-sensitive name.
	pub fn headers(&self) -> &BTreeMap<String, String> {
		&self.headers
	}

	/// Looks up one header by exact name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).map(String::as_str)
	}

	/// Request body, if any.
	pub fn body(&self) -> Option<&RequestBody> {
		self.body.as_ref()
	}

	/// Wire encoding of the body, if any.
	pub fn encoded_body(&self) -> Option<Vec<u8>> {
		self.body.as_ref().map(RequestBody::encode)
	}

	/// Request type tag consumed by dispatch-layer policy.
	pub fn request_type(&self) -> RequestType {
		self.request_type
	}
}
impl Debug for ConnectionParameters {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				let value = if name.eq_ignore_ascii_case(AUTHORIZATION) {
					"<redacted>"
				} else {
					value.as_str()
				};

				(name.as_str(), value)
			})
			.collect::<BTreeMap<_, _>>();

		f.debug_struct("ConnectionParameters")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body", &self.body)
			.field("request_type", &self.request_type)
			.finish()
	}
}

/// Builder for [`ConnectionParameters`].
///
/// [`create`](Self::create) consumes the builder, so its mutable state can never leak into a
/// second, logically independent request.
#[derive(Debug)]
pub struct ConnectionParametersBuilder {
	url: Url,
	method: Option<HttpMethod>,
	headers: BTreeMap<String, String>,
	body: Option<RequestBody>,
	request_type: RequestType,
}
impl ConnectionParametersBuilder {
	fn new(url: Url) -> Self {
		Self {
			url,
			method: None,
			headers: BTreeMap::new(),
			body: None,
			request_type: RequestType::Authorized,
		}
	}

	/// Sets the request method.
	pub fn request_method(mut self, method: HttpMethod) -> Self {
		self.method = Some(method);

		self
	}

	/// Sets POST parameters, replacing any previously configured body.
	pub fn post_parameters<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let params = params.into_iter().map(|(key, value)| (key.into(), value.into())).collect();

		self.body = Some(RequestBody::Form(params));

		self
	}

	/// Sets a raw body, replacing any previously configured body.
	pub fn raw_body(mut self, content_type: Option<String>, bytes: impl Into<Vec<u8>>) -> Self {
		self.body = Some(RequestBody::Raw { content_type, bytes: bytes.into() });

		self
	}

	/// Merges `properties` into the headers; same-named entries are overwritten.
	pub fn request_properties<I, K, V>(mut self, properties: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		for (name, value) in properties {
			self.headers.insert(name.into(), value.into());
		}

		self
	}

	/// Sets or overrides one header.
	pub fn request_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Tags the request with its type.
	pub fn request_type(mut self, request_type: RequestType) -> Self {
		self.request_type = request_type;

		self
	}

	/// Consumes the builder and validates the resulting parameters.
	pub fn create(self) -> Result<ConnectionParameters, ConfigError> {
		let method = self.method.ok_or(ConfigError::MissingRequestMethod)?;
		let mut headers = self.headers;

		if let Some(content_type) = self.body.as_ref().and_then(RequestBody::content_type) {
			let has_content_type = headers.keys().any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE));

			if !has_content_type {
				headers.insert(CONTENT_TYPE.into(), content_type.into());
			}
		}

		Ok(ConnectionParameters {
			method,
			url: self.url,
			headers,
			body: self.body,
			request_type: self.request_type,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::http::JSON_CONTENT_TYPE;

	fn url() -> Url {
		Url::parse("https://idp.example.com/userinfo").expect("Failed to parse test URL.")
	}

	#[test]
	fn create_requires_a_method() {
		let err = ConnectionParameters::builder(url())
			.request_property("X-Trace", "1")
			.create()
			.expect_err("Creating parameters without a method should fail.");

		assert!(matches!(err, ConfigError::MissingRequestMethod));
	}

	#[test]
	fn single_header_overrides_bulk_merge() {
		let parameters = ConnectionParameters::builder(url())
			.request_method(HttpMethod::Get)
			.request_properties([("X-Tenant", "a"), ("X-Trace", "1")])
			.request_property("X-Tenant", "b")
			.create()
			.expect("Parameters with a method should build.");

		assert_eq!(parameters.header("X-Tenant"), Some("b"));
		assert_eq!(parameters.header("X-Trace"), Some("1"));
		assert_eq!(parameters.header("x-tenant"), None);
	}

	#[test]
	fn post_parameters_imply_form_content_type() {
		let parameters = ConnectionParameters::builder(url())
			.request_method(HttpMethod::Post)
			.post_parameters([("token", "a b&c"), ("client_id", "app")])
			.request_type(RequestType::RevokeToken)
			.create()
			.expect("Form parameters should build.");

		assert_eq!(parameters.header(CONTENT_TYPE), Some(FORM_CONTENT_TYPE));
		assert_eq!(parameters.request_type(), RequestType::RevokeToken);
		assert_eq!(
			parameters.encoded_body().expect("Form body should encode."),
			b"client_id=app&token=a+b%26c".to_vec()
		);
	}

	#[test]
	fn explicit_content_type_is_kept() {
		let parameters = ConnectionParameters::builder(url())
			.request_method(HttpMethod::Put)
			.request_property("content-type", "application/jwt")
			.raw_body(Some(JSON_CONTENT_TYPE.into()), b"{}".to_vec())
			.create()
			.expect("Raw body parameters should build.");

		assert_eq!(parameters.header("content-type"), Some("application/jwt"));
		assert_eq!(parameters.header(CONTENT_TYPE), None);
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let parameters = ConnectionParameters::builder(url())
			.request_method(HttpMethod::Post)
			.request_property(AUTHORIZATION, "Bearer secret-token")
			.post_parameters([("refresh_token", "secret-refresh")])
			.create()
			.expect("Parameters should build.");
		let rendered = format!("{parameters:?}");

		assert!(!rendered.contains("secret-token"));
		assert!(!rendered.contains("secret-refresh"));
		assert!(rendered.contains("refresh_token"));
	}
}
