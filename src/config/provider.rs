//! Provider metadata drawn from an OIDC discovery document.

// self
use crate::{_prelude::*, config, error::ConfigError};

/// Endpoints published by the provider.
///
/// Deserializes from a discovery document, ignoring members this crate does not use. Call
/// [`validate`](Self::validate) on deserialized values; the builder validates on its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfiguration {
	/// Issuer identifier.
	pub issuer: Url,
	/// Token endpoint used for refreshes.
	pub token_endpoint: Url,
	/// Userinfo endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub userinfo_endpoint: Option<Url>,
	/// Revocation endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub revocation_endpoint: Option<Url>,
	/// Introspection endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub introspection_endpoint: Option<Url>,
	/// End-session endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub end_session_endpoint: Option<Url>,
}
impl ProviderConfiguration {
	/// Returns a builder for the provider identified by `issuer`.
	pub fn builder(issuer: Url) -> ProviderConfigurationBuilder {
		ProviderConfigurationBuilder::new(issuer)
	}

	/// Parses and validates a discovery document.
	pub fn from_discovery_json(body: &[u8]) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);
		let configuration: Self = serde_path_to_error::deserialize(&mut deserializer).map_err(
			|e| ConfigError::InvalidDiscoveryDocument {
				path: e.path().to_string(),
				reason: e.inner().to_string(),
			},
		)?;

		deserializer.end().map_err(|e| ConfigError::InvalidDiscoveryDocument {
			path: ".".into(),
			reason: e.to_string(),
		})?;

		configuration.validate()?;

		Ok(configuration)
	}

	/// Checks that every endpoint is secure.
	pub fn validate(&self) -> Result<(), ConfigError> {
		config::validate_endpoint("token", &self.token_endpoint)?;

		for (name, endpoint) in [
			("userinfo", &self.userinfo_endpoint),
			("revocation", &self.revocation_endpoint),
			("introspection", &self.introspection_endpoint),
			("end_session", &self.end_session_endpoint),
		] {
			if let Some(endpoint) = endpoint {
				config::validate_endpoint(name, endpoint)?;
			}
		}

		Ok(())
	}

	/// Userinfo endpoint, or an error naming it when the provider does not publish one.
	pub fn require_userinfo(&self) -> Result<&Url, ConfigError> {
		self.userinfo_endpoint.as_ref().ok_or(ConfigError::MissingEndpoint { endpoint: "userinfo" })
	}

	/// Revocation endpoint, or an error naming it when the provider does not publish one.
	pub fn require_revocation(&self) -> Result<&Url, ConfigError> {
		self.revocation_endpoint
			.as_ref()
			.ok_or(ConfigError::MissingEndpoint { endpoint: "revocation" })
	}

	/// Introspection endpoint, or an error naming it when the provider does not publish one.
	pub fn require_introspection(&self) -> Result<&Url, ConfigError> {
		self.introspection_endpoint
			.as_ref()
			.ok_or(ConfigError::MissingEndpoint { endpoint: "introspection" })
	}
}

/// Builder for [`ProviderConfiguration`].
#[derive(Debug)]
pub struct ProviderConfigurationBuilder {
	issuer: Url,
	token_endpoint: Option<Url>,
	userinfo_endpoint: Option<Url>,
	revocation_endpoint: Option<Url>,
	introspection_endpoint: Option<Url>,
	end_session_endpoint: Option<Url>,
}
impl ProviderConfigurationBuilder {
	fn new(issuer: Url) -> Self {
		Self {
			issuer,
			token_endpoint: None,
			userinfo_endpoint: None,
			revocation_endpoint: None,
			introspection_endpoint: None,
			end_session_endpoint: None,
		}
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the userinfo endpoint.
	pub fn userinfo_endpoint(mut self, url: Url) -> Self {
		self.userinfo_endpoint = Some(url);

		self
	}

	/// Sets the revocation endpoint.
	pub fn revocation_endpoint(mut self, url: Url) -> Self {
		self.revocation_endpoint = Some(url);

		self
	}

	/// Sets the introspection endpoint.
	pub fn introspection_endpoint(mut self, url: Url) -> Self {
		self.introspection_endpoint = Some(url);

		self
	}

	/// Sets the end-session endpoint.
	pub fn end_session_endpoint(mut self, url: Url) -> Self {
		self.end_session_endpoint = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ProviderConfiguration, ConfigError> {
		let token_endpoint =
			self.token_endpoint.ok_or(ConfigError::MissingEndpoint { endpoint: "token" })?;
		let configuration = ProviderConfiguration {
			issuer: self.issuer,
			token_endpoint,
			userinfo_endpoint: self.userinfo_endpoint,
			revocation_endpoint: self.revocation_endpoint,
			introspection_endpoint: self.introspection_endpoint,
			end_session_endpoint: self.end_session_endpoint,
		};

		configuration.validate()?;

		Ok(configuration)
	}
}
