//! Persisted session state consumed by the session clients.

pub mod memory;

pub use memory::MemoryState;

// self
use crate::{_prelude::*, auth::TokenResponse, config::ProviderConfiguration};

/// Session state contract: provider metadata plus the current tokens.
///
/// Implementations are shared between the caller and background workers, so every method takes
/// `&self` and must be safe to call concurrently.
pub trait SessionState
where
	Self: Send + Sync,
{
	/// Provider metadata, if it has been loaded.
	fn provider_configuration(&self) -> Result<Option<ProviderConfiguration>, StoreError>;

	/// Current tokens, if the session is authenticated.
	fn tokens(&self) -> Result<Option<TokenResponse>, StoreError>;

	/// Replaces the current tokens.
	fn save_tokens(&self, tokens: TokenResponse) -> Result<(), StoreError>;

	/// Replaces the current tokens only if the stored refresh token still equals
	/// `expected_refresh`.
	fn compare_and_swap_tokens(
		&self,
		expected_refresh: Option<&str>,
		replacement: TokenResponse,
	) -> Result<CompareAndSwapOutcome, StoreError>;

	/// Drops the current tokens. Provider metadata is kept.
	fn clear(&self) -> Result<(), StoreError>;
}
impl<T> SessionState for Arc<T>
where
	T: ?Sized + SessionState,
{
	fn provider_configuration(&self) -> Result<Option<ProviderConfiguration>, StoreError> {
		(**self).provider_configuration()
	}

	fn tokens(&self) -> Result<Option<TokenResponse>, StoreError> {
		(**self).tokens()
	}

	fn save_tokens(&self, tokens: TokenResponse) -> Result<(), StoreError> {
		(**self).save_tokens(tokens)
	}

	fn compare_and_swap_tokens(
		&self,
		expected_refresh: Option<&str>,
		replacement: TokenResponse,
	) -> Result<CompareAndSwapOutcome, StoreError> {
		(**self).compare_and_swap_tokens(expected_refresh, replacement)
	}

	fn clear(&self) -> Result<(), StoreError> {
		(**self).clear()
	}
}

/// Result of a refresh-token compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The refresh token matched and the tokens were replaced.
	Updated,
	/// Tokens exist but carry a different refresh token.
	RefreshMismatch,
	/// No tokens are stored.
	Missing,
}

/// Error type produced by [`SessionState`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{AuthorizationError, Error, ErrorKind};

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "keystore locked".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("keystore locked"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn store_error_becomes_a_general_authorization_error() {
		let err = AuthorizationError::from(StoreError::Serialization { message: "bad".into() });

		assert_eq!(err.kind(), ErrorKind::General);
		assert_eq!(err.message(), "Serialization error: bad.");
	}
}
