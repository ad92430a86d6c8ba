//! Bearer-authorized JSON requests.
//!
//! [`AuthorizedRequest`] injects `Authorization: Bearer <access_token>` and
//! `Accept: application/json` at construction time. Caller-supplied headers are merged first
//! and any caller entry whose name matches either header (ignoring ASCII case) is dropped, so
//! the injected values always win and never travel next to a second, conflicting copy.

// self
use crate::{
	_prelude::*,
	auth::{TokenResponse, TokenSecret},
	error::{AuthorizationError, ConfigError},
	http::{
		ACCEPT, AUTHORIZATION, ConnectionParameters, HttpMethod, JSON_CONTENT_TYPE, JsonObject,
		Transport,
	},
	request::{self, Request, RequestType},
};

/// Bearer-authorized request returning a JSON object.
#[derive(Clone, Debug)]
pub struct AuthorizedRequest {
	parameters: ConnectionParameters,
}
impl AuthorizedRequest {
	/// Returns a builder targeting `url`.
	pub fn builder(url: Url) -> AuthorizedRequestBuilder {
		AuthorizedRequestBuilder::new(url)
	}
}
impl Request for AuthorizedRequest {
	type Output = JsonObject;

	fn parameters(&self) -> &ConnectionParameters {
		&self.parameters
	}

	fn execute_request(&self, transport: &dyn Transport) -> Result<JsonObject, AuthorizationError> {
		request::execute_with(transport, &self.parameters, |response| response.as_json())
	}
}

/// Builder for [`AuthorizedRequest`].
#[derive(Debug)]
pub struct AuthorizedRequestBuilder {
	url: Url,
	method: Option<HttpMethod>,
	access_token: Option<TokenSecret>,
	properties: BTreeMap<String, String>,
	post_parameters: Option<BTreeMap<String, String>>,
	request_type: RequestType,
}
impl AuthorizedRequestBuilder {
	fn new(url: Url) -> Self {
		Self {
			url,
			method: None,
			access_token: None,
			properties: BTreeMap::new(),
			post_parameters: None,
			request_type: RequestType::Authorized,
		}
	}

	/// Sets the request method.
	pub fn method(mut self, method: HttpMethod) -> Self {
		self.method = Some(method);

		self
	}

	/// Uses the access token carried by `tokens`.
	pub fn token(mut self, tokens: &TokenResponse) -> Self {
		self.access_token = Some(tokens.access_token.clone());

		self
	}

	/// Uses an explicit access token.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Merges extra request headers.
	pub fn properties<I, K, V>(mut self, properties: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.properties.extend(properties.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Sets POST parameters sent as a form body.
	pub fn post_parameters<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.post_parameters =
			Some(params.into_iter().map(|(k, v)| (k.into(), v.into())).collect());

		self
	}

	/// Overrides the request type tag (defaults to [`RequestType::Authorized`]).
	pub fn request_type(mut self, request_type: RequestType) -> Self {
		self.request_type = request_type;

		self
	}

	/// Consumes the builder and produces the request.
	pub fn build(self) -> Result<AuthorizedRequest, ConfigError> {
		let token = self.access_token.ok_or(ConfigError::MissingAccessToken)?;
		let properties = self.properties.into_iter().filter(|(name, _)| !is_injected(name));
		let mut builder = ConnectionParameters::builder(self.url)
			.request_type(self.request_type)
			.request_properties(properties);

		if let Some(params) = self.post_parameters {
			builder = builder.post_parameters(params);
		}
		if let Some(method) = self.method {
			builder = builder.request_method(method);
		}

		let parameters = builder
			.request_property(AUTHORIZATION, format!("Bearer {}", token.expose()))
			.request_property(ACCEPT, JSON_CONTENT_TYPE)
			.create()?;

		Ok(AuthorizedRequest { parameters })
	}
}

fn is_injected(name: &str) -> bool {
	name.eq_ignore_ascii_case(AUTHORIZATION) || name.eq_ignore_ascii_case(ACCEPT)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{Scripted, ScriptedTransport},
		http::BufferedResponse,
	};

	fn url() -> Url {
		Url::parse("https://api.example.com/me").expect("Failed to parse resource URL.")
	}

	#[test]
	fn injected_headers_beat_caller_headers() {
		let request = AuthorizedRequest::builder(url())
			.method(HttpMethod::Get)
			.access_token("token-1")
			.properties([
				("Authorization", "Basic Zm9vOmJhcg=="),
				("accept", "text/html"),
				("ACCEPT", "text/plain"),
				("X-Device", "phone"),
			])
			.build()
			.expect("Authorized request should build.");
		let headers = request.parameters().headers();

		assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer token-1"));
		assert_eq!(headers.get("Accept").map(String::as_str), Some("application/json"));
		assert_eq!(headers.get("X-Device").map(String::as_str), Some("phone"));
		assert_eq!(headers.len(), 3);
	}

	#[test]
	fn token_and_method_are_required() {
		let err = AuthorizedRequest::builder(url())
			.method(HttpMethod::Get)
			.build()
			.expect_err("A request without a token should not build.");

		assert!(matches!(err, ConfigError::MissingAccessToken));

		let err = AuthorizedRequest::builder(url())
			.access_token("token-1")
			.build()
			.expect_err("A request without a method should not build.");

		assert!(matches!(err, ConfigError::MissingRequestMethod));
	}

	#[test]
	fn token_response_supplies_the_bearer() {
		let tokens = TokenResponse::new("from-response");
		let request = AuthorizedRequest::builder(url())
			.method(HttpMethod::Post)
			.token(&tokens)
			.post_parameters([("locale", "en")])
			.request_type(RequestType::Profile)
			.build()
			.expect("Authorized request should build.");

		assert_eq!(request.parameters().header(AUTHORIZATION), Some("Bearer from-response"));
		assert_eq!(request.request_type(), RequestType::Profile);
	}

	#[test]
	fn execute_returns_the_json_object() {
		let response = BufferedResponse::json(200, &serde_json::json!({ "sub": "abc123" }));
		let transport = ScriptedTransport::new(Scripted::Respond(response.clone()));
		let request = AuthorizedRequest::builder(url())
			.method(HttpMethod::Get)
			.access_token("token-1")
			.build()
			.expect("Authorized request should build.");
		let object = request.execute_request(&transport).expect("Execution should succeed.");

		assert_eq!(object.get("sub"), Some(&serde_json::json!("abc123")));
		assert_eq!(response.disconnect_count(), 1);
		assert_eq!(transport.seen(), vec![request.parameters().clone()]);
	}
}
