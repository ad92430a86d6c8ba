//! Token revocation request.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{AuthorizationError, ConfigError, ResponseError},
	http::{ConnectionParameters, HttpMethod, Transport},
	request::{self, Request, RequestType},
};

/// Revokes an access or refresh token at the revocation endpoint.
///
/// Succeeds with `true` on any 2xx status; the body is ignored.
#[derive(Clone, Debug)]
pub struct RevokeTokenRequest {
	parameters: ConnectionParameters,
}
impl RevokeTokenRequest {
	/// Builds the revocation call for `token`.
	pub fn new(
		revocation_endpoint: Url,
		client_id: &str,
		token: &TokenSecret,
	) -> Result<Self, ConfigError> {
		let parameters = ConnectionParameters::builder(revocation_endpoint)
			.request_method(HttpMethod::Post)
			.request_type(RequestType::RevokeToken)
			.post_parameters([("client_id", client_id), ("token", token.expose())])
			.create()?;

		Ok(Self { parameters })
	}
}
impl Request for RevokeTokenRequest {
	type Output = bool;

	fn parameters(&self) -> &ConnectionParameters {
		&self.parameters
	}

	fn execute_request(&self, transport: &dyn Transport) -> Result<bool, AuthorizationError> {
		request::execute_with(transport, &self.parameters, |response| {
			if response.is_success() {
				return Ok(true);
			}

			let body = response.read_body()?;

			Err(ResponseError::Status { status: response.status(), body })
		})
	}
}
