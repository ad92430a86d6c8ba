//! Authenticated-request execution core for OIDC clients: bearer injection, pluggable
//! transports, background dispatch with caller-side result delivery, and a closed error
//! taxonomy every failure is normalized into.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod obs;
pub mod request;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::io;
	// self
	use crate::{
		auth::TokenResponse,
		config::{OidcConfig, ProviderConfiguration},
		error::TransportError,
		http::{BufferedResponse, ConnectionParameters, Response, Transport},
		store::MemoryState,
	};

	/// Scripted outcome returned by [`ScriptedTransport`].
	#[derive(Clone, Debug)]
	pub enum Scripted {
		/// Return this response.
		Respond(BufferedResponse),
		/// Fail to connect with this I/O error kind and message.
		Fail(io::ErrorKind, &'static str),
		/// Panic while opening the connection.
		Panic(&'static str),
	}

	/// Transport that replays one scripted outcome and records every request it sees.
	#[derive(Clone, Debug)]
	pub struct ScriptedTransport {
		outcome: Scripted,
		seen: Arc<Mutex<Vec<ConnectionParameters>>>,
	}
	impl ScriptedTransport {
		/// Creates a transport that always produces `outcome`.
		pub fn new(outcome: Scripted) -> Self {
			Self { outcome, seen: Default::default() }
		}

		/// Returns every request opened so far.
		pub fn seen(&self) -> Vec<ConnectionParameters> {
			self.seen.lock().clone()
		}
	}
	impl Transport for ScriptedTransport {
		fn open(
			&self,
			parameters: &ConnectionParameters,
		) -> Result<Box<dyn Response>, TransportError> {
			self.seen.lock().push(parameters.clone());

			match &self.outcome {
				Scripted::Respond(response) => Ok(Box::new(response.clone())),
				Scripted::Fail(kind, message) => Err(io::Error::new(*kind, *message).into()),
				Scripted::Panic(message) => panic!("{message}"),
			}
		}
	}

	/// Provider configuration pointing at `base`.
	pub fn test_provider_configuration(base: &str) -> ProviderConfiguration {
		ProviderConfiguration::builder(
			Url::parse(base).expect("Failed to parse test issuer URL."),
		)
		.token_endpoint(Url::parse(&format!("{base}/token")).expect("Failed to parse token URL."))
		.userinfo_endpoint(
			Url::parse(&format!("{base}/userinfo")).expect("Failed to parse userinfo URL."),
		)
		.revocation_endpoint(
			Url::parse(&format!("{base}/revoke")).expect("Failed to parse revocation URL."),
		)
		.introspection_endpoint(
			Url::parse(&format!("{base}/introspect")).expect("Failed to parse introspection URL."),
		)
		.build()
		.expect("Failed to build test provider configuration.")
	}

	/// Client configuration used across tests.
	pub fn test_config() -> OidcConfig {
		OidcConfig::builder()
			.client_id("test-client")
			.redirect_uri(
				Url::parse("com.example.app:/callback").expect("Failed to parse redirect URI."),
			)
			.scopes(["openid", "profile", "offline_access"])
			.discovery_uri(
				Url::parse("https://idp.example.com/.well-known/openid-configuration")
					.expect("Failed to parse discovery URI."),
			)
			.build()
			.expect("Failed to build test client configuration.")
	}

	/// In-memory state seeded with provider configuration and tokens.
	pub fn test_state(base: &str, access_token: &str, refresh_token: Option<&str>) -> MemoryState {
		let mut tokens = TokenResponse::new(access_token).with_expires_in(3_600);

		if let Some(refresh) = refresh_token {
			tokens = tokens.with_refresh_token(refresh);
		}

		MemoryState::with_configuration(test_provider_configuration(base)).with_tokens(tokens)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Error as ReqwestError, blocking::Client as ReqwestClient};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::Result;
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
