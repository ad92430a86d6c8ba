//! Token endpoint response model.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ResponseError, http::JsonObject};

/// Tokens issued by the authorization server.
///
/// Secrets are wrapped in [`TokenSecret`], so `Debug` output never contains them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Access token presented as the bearer credential.
	pub access_token: TokenSecret,
	/// Token type; always `Bearer` for the requests this crate issues.
	#[serde(default = "default_token_type")]
	pub token_type: String,
	/// Lifetime of the access token in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<i64>,
	/// Space-delimited scopes granted.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Refresh token, if the server issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// OpenID Connect ID token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<TokenSecret>,
	/// Instant the response was received.
	#[serde(default, with = "time::serde::timestamp::option")]
	pub issued_at: Option<OffsetDateTime>,
}
impl TokenResponse {
	/// Creates a response holding only an access token, stamped with the current clock.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			token_type: default_token_type(),
			expires_in: None,
			scope: None,
			refresh_token: None,
			id_token: None,
			issued_at: Some(OffsetDateTime::now_utc()),
		}
	}

	/// Builds a response from a token endpoint JSON document.
	///
	/// The document must carry a non-empty string `access_token`; a missing `issued_at` is
	/// stamped with the current clock.
	pub fn from_json(object: JsonObject) -> Result<Self, ResponseError> {
		match object.get("access_token").and_then(|value| value.as_str()) {
			Some(token) if !token.is_empty() => {},
			_ => return Err(ResponseError::TokenResponse { reason: "missing access_token" }),
		}

		let mut response: Self =
			serde_path_to_error::deserialize(serde_json::Value::Object(object))?;

		if response.issued_at.is_none() {
			response.issued_at = Some(OffsetDateTime::now_utc());
		}

		Ok(response)
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the access token lifetime in seconds.
	pub fn with_expires_in(mut self, seconds: i64) -> Self {
		self.expires_in = Some(seconds);

		self
	}

	/// Sets the granted scopes.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Overrides the issued-at instant.
	pub fn with_issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Instant the access token expires, when both the lifetime and issue time are known.
	///
	/// Returns `None` when the lifetime does not fit the calendar range.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.issued_at?.checked_add(Duration::seconds(self.expires_in?))
	}

	/// Returns `true` if the access token is expired at `instant`.
	///
	/// Tokens without a known expiry are never reported as expired.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|expires_at| instant >= expires_at)
	}
}

fn default_token_type() -> String {
	"Bearer".into()
}
