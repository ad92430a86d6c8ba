//! Refresh-token grant request.

// self
use crate::{
	_prelude::*,
	auth::{TokenResponse, TokenSecret},
	error::{AuthorizationError, ConfigError},
	http::{ACCEPT, ConnectionParameters, HttpMethod, JSON_CONTENT_TYPE, Transport},
	request::{self, Request, RequestType},
};

/// `grant_type=refresh_token` call against the token endpoint.
///
/// The request only executes the grant. Deciding when to refresh and persisting the result
/// belong to the caller (see [`SyncSessionClient::refresh_token`](crate::session::SyncSessionClient::refresh_token)).
#[derive(Clone, Debug)]
pub struct RefreshTokenRequest {
	parameters: ConnectionParameters,
}
impl RefreshTokenRequest {
	/// Builds the grant for `refresh_token`, optionally narrowing to `scope`.
	pub fn new(
		token_endpoint: Url,
		client_id: &str,
		refresh_token: &TokenSecret,
		scope: Option<&str>,
	) -> Result<Self, ConfigError> {
		let mut form = BTreeMap::new();

		form.insert("client_id".to_owned(), client_id.to_owned());
		form.insert("grant_type".to_owned(), "refresh_token".to_owned());
		form.insert("refresh_token".to_owned(), refresh_token.expose().to_owned());

		if let Some(scope) = scope {
			form.insert("scope".to_owned(), scope.to_owned());
		}

		let parameters = ConnectionParameters::builder(token_endpoint)
			.request_method(HttpMethod::Post)
			.request_type(RequestType::RefreshToken)
			.request_property(ACCEPT, JSON_CONTENT_TYPE)
			.post_parameters(form)
			.create()?;

		Ok(Self { parameters })
	}
}
impl Request for RefreshTokenRequest {
	type Output = TokenResponse;

	fn parameters(&self) -> &ConnectionParameters {
		&self.parameters
	}

	fn execute_request(
		&self,
		transport: &dyn Transport,
	) -> Result<TokenResponse, AuthorizationError> {
		request::execute_with(transport, &self.parameters, |response| {
			TokenResponse::from_json(response.as_json()?)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{Scripted, ScriptedTransport},
		error::ErrorKind,
		http::{BufferedResponse, RequestBody},
	};

	fn request() -> RefreshTokenRequest {
		RefreshTokenRequest::new(
			Url::parse("https://idp.example.com/token").expect("Failed to parse token URL."),
			"app",
			&TokenSecret::new("rt-1"),
			Some("openid"),
		)
		.expect("Refresh request should build.")
	}

	#[test]
	fn form_carries_the_grant() {
		let request = request();
		let Some(RequestBody::Form(form)) = request.parameters().body() else {
			panic!("Refresh requests must carry a form body.");
		};

		assert_eq!(form.get("grant_type").map(String::as_str), Some("refresh_token"));
		assert_eq!(form.get("refresh_token").map(String::as_str), Some("rt-1"));
		assert_eq!(form.get("scope").map(String::as_str), Some("openid"));
		assert_eq!(request.request_type(), RequestType::RefreshToken);
	}

	#[test]
	fn invalid_grant_is_an_oauth_error() {
		let body = serde_json::json!({ "error": "invalid_grant" });
		let transport =
			ScriptedTransport::new(Scripted::Respond(BufferedResponse::json(400, &body)));
		let err = request().execute_request(&transport).expect_err("A 400 should fail.");

		assert_eq!(err.kind(), ErrorKind::OAuth);
		assert_eq!(err.label(), "invalid_grant");
		assert_eq!(err.http_status(), Some(400));
	}

	#[test]
	fn tokenless_document_is_a_construction_error() {
		let body = serde_json::json!({ "token_type": "Bearer" });
		let transport =
			ScriptedTransport::new(Scripted::Respond(BufferedResponse::json(200, &body)));
		let err = request().execute_request(&transport).expect_err("A tokenless 200 should fail.");

		assert_eq!(err.kind(), ErrorKind::TokenResponseConstruction);
		assert_eq!(err.label(), "token_response_construction_error");
	}
}
