//! Token introspection request.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{AuthorizationError, ConfigError, ResponseError},
	http::{
		ACCEPT, ConnectionParameters, HttpMethod, JSON_CONTENT_TYPE, JsonObject, Transport,
		parse_json,
	},
	request::{self, Request, RequestType},
};

/// Introspection result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntrospectInfo {
	/// Whether the token is currently active.
	pub active: bool,
	/// Space-delimited scopes.
	#[serde(default)]
	pub scope: Option<String>,
	/// Client the token was issued to.
	#[serde(default)]
	pub client_id: Option<String>,
	/// Human-readable resource owner identifier.
	#[serde(default)]
	pub username: Option<String>,
	/// Token type.
	#[serde(default)]
	pub token_type: Option<String>,
	/// Expiry as a Unix timestamp.
	#[serde(default)]
	pub exp: Option<i64>,
	/// Issue time as a Unix timestamp.
	#[serde(default)]
	pub iat: Option<i64>,
	/// Not-before time as a Unix timestamp.
	#[serde(default)]
	pub nbf: Option<i64>,
	/// Subject.
	#[serde(default)]
	pub sub: Option<String>,
	/// Audience (a string or an array of strings).
	#[serde(default)]
	pub aud: Option<serde_json::Value>,
	/// Issuer.
	#[serde(default)]
	pub iss: Option<String>,
	/// Token identifier.
	#[serde(default)]
	pub jti: Option<String>,
	/// Provider-specific members.
	#[serde(flatten)]
	pub extra: JsonObject,
}

/// Introspects a token at the introspection endpoint.
#[derive(Clone, Debug)]
pub struct IntrospectRequest {
	parameters: ConnectionParameters,
}
impl IntrospectRequest {
	/// Builds the introspection call for `token` with an optional `token_type_hint`.
	pub fn new(
		introspection_endpoint: Url,
		client_id: &str,
		token: &TokenSecret,
		token_type_hint: Option<&str>,
	) -> Result<Self, ConfigError> {
		let mut form = BTreeMap::new();

		form.insert("client_id".to_owned(), client_id.to_owned());
		form.insert("token".to_owned(), token.expose().to_owned());

		if let Some(hint) = token_type_hint {
			form.insert("token_type_hint".to_owned(), hint.to_owned());
		}

		let parameters = ConnectionParameters::builder(introspection_endpoint)
			.request_method(HttpMethod::Post)
			.request_type(RequestType::Introspect)
			.request_property(ACCEPT, JSON_CONTENT_TYPE)
			.post_parameters(form)
			.create()?;

		Ok(Self { parameters })
	}
}
impl Request for IntrospectRequest {
	type Output = IntrospectInfo;

	fn parameters(&self) -> &ConnectionParameters {
		&self.parameters
	}

	fn execute_request(
		&self,
		transport: &dyn Transport,
	) -> Result<IntrospectInfo, AuthorizationError> {
		request::execute_with(transport, &self.parameters, |response| {
			let body = response.read_body()?;

			if !response.is_success() {
				return Err(ResponseError::Status { status: response.status(), body });
			}

			parse_json(&body)
		})
	}
}
