//! Client configuration and provider metadata.
//!
//! Loading either value (from files, discovery, or platform storage) happens outside this crate;
//! both are consumed read-only when requests are built.

pub mod provider;

pub use provider::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// OIDC client registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcConfig {
	client_id: String,
	redirect_uri: Url,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	end_session_redirect_uri: Option<Url>,
	scopes: Vec<String>,
	discovery_uri: Url,
}
impl OidcConfig {
	/// Returns an empty builder.
	pub fn builder() -> OidcConfigBuilder {
		OidcConfigBuilder::default()
	}

	/// Registered client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Redirect URI registered for the authorization code flow.
	pub fn redirect_uri(&self) -> &Url {
		&self.redirect_uri
	}

	/// Redirect URI used after the end-session call, if any.
	pub fn end_session_redirect_uri(&self) -> Option<&Url> {
		self.end_session_redirect_uri.as_ref()
	}

	/// Requested scopes.
	pub fn scopes(&self) -> &[String] {
		&self.scopes
	}

	/// Requested scopes joined with spaces, as sent on the wire.
	pub fn scope_string(&self) -> String {
		self.scopes.join(" ")
	}

	/// Discovery document location.
	pub fn discovery_uri(&self) -> &Url {
		&self.discovery_uri
	}
}

/// Builder for [`OidcConfig`].
#[derive(Debug, Default)]
pub struct OidcConfigBuilder {
	client_id: Option<String>,
	redirect_uri: Option<Url>,
	end_session_redirect_uri: Option<Url>,
	scopes: Vec<String>,
	discovery_uri: Option<Url>,
}
impl OidcConfigBuilder {
	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, uri: Url) -> Self {
		self.redirect_uri = Some(uri);

		self
	}

	/// Sets the post-logout redirect URI.
	pub fn end_session_redirect_uri(mut self, uri: Url) -> Self {
		self.end_session_redirect_uri = Some(uri);

		self
	}

	/// Replaces the requested scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the discovery document location.
	pub fn discovery_uri(mut self, uri: Url) -> Self {
		self.discovery_uri = Some(uri);

		self
	}

	/// Parses and sets the discovery document location.
	pub fn discovery_uri_str(self, uri: &str) -> Result<Self, ConfigError> {
		let uri = Url::parse(uri)
			.map_err(|source| ConfigError::InvalidUrl { field: "discovery_uri", source })?;

		Ok(self.discovery_uri(uri))
	}

	/// Consumes the builder and validates the configuration.
	pub fn build(self) -> Result<OidcConfig, ConfigError> {
		let client_id = self
			.client_id
			.filter(|id| !id.trim().is_empty())
			.ok_or(ConfigError::MissingClientId)?;
		let redirect_uri = self.redirect_uri.ok_or(ConfigError::MissingRedirectUri)?;
		let scopes = self
			.scopes
			.into_iter()
			.filter(|scope| !scope.trim().is_empty())
			.collect::<Vec<_>>();

		if scopes.is_empty() {
			return Err(ConfigError::MissingScopes);
		}

		let discovery_uri =
			self.discovery_uri.ok_or(ConfigError::MissingEndpoint { endpoint: "discovery" })?;

		validate_endpoint("discovery", &discovery_uri)?;

		Ok(OidcConfig {
			client_id,
			redirect_uri,
			end_session_redirect_uri: self.end_session_redirect_uri,
			scopes,
			discovery_uri,
		})
	}
}

/// Requires HTTPS, allowing plain HTTP only for loopback hosts.
pub(crate) fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	let loopback = match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	};

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}
