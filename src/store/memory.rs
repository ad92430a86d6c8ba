//! Thread-safe in-memory [`SessionState`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{TokenResponse, TokenSecret},
	config::ProviderConfiguration,
	store::{CompareAndSwapOutcome, SessionState, StoreError},
};

#[derive(Debug, Default)]
struct Slots {
	configuration: Option<ProviderConfiguration>,
	tokens: Option<TokenResponse>,
}

/// Session state kept in-process; clones share the same slots.
#[derive(Clone, Debug, Default)]
pub struct MemoryState(Arc<RwLock<Slots>>);
impl MemoryState {
	/// Creates state seeded with provider metadata.
	pub fn with_configuration(configuration: ProviderConfiguration) -> Self {
		let state = Self::default();

		state.set_provider_configuration(configuration);

		state
	}

	/// Seeds the current tokens.
	pub fn with_tokens(self, tokens: TokenResponse) -> Self {
		self.0.write().tokens = Some(tokens);

		self
	}

	/// Replaces the provider metadata.
	pub fn set_provider_configuration(&self, configuration: ProviderConfiguration) {
		self.0.write().configuration = Some(configuration);
	}

	fn refresh_matches(current: Option<&TokenSecret>, expected: Option<&str>) -> bool {
		match (current.map(TokenSecret::expose), expected) {
			(None, None) => true,
			(Some(current), Some(expected)) => current == expected,
			_ => false,
		}
	}
}
impl SessionState for MemoryState {
	fn provider_configuration(&self) -> Result<Option<ProviderConfiguration>, StoreError> {
		Ok(self.0.read().configuration.clone())
	}

	fn tokens(&self) -> Result<Option<TokenResponse>, StoreError> {
		Ok(self.0.read().tokens.clone())
	}

	fn save_tokens(&self, tokens: TokenResponse) -> Result<(), StoreError> {
		self.0.write().tokens = Some(tokens);

		Ok(())
	}

	fn compare_and_swap_tokens(
		&self,
		expected_refresh: Option<&str>,
		replacement: TokenResponse,
	) -> Result<CompareAndSwapOutcome, StoreError> {
		let mut slots = self.0.write();
		let outcome = match slots.tokens.as_ref() {
			Some(current)
				if Self::refresh_matches(current.refresh_token.as_ref(), expected_refresh) =>
				CompareAndSwapOutcome::Updated,
			Some(_) => CompareAndSwapOutcome::RefreshMismatch,
			None => CompareAndSwapOutcome::Missing,
		};

		if outcome == CompareAndSwapOutcome::Updated {
			slots.tokens = Some(replacement);
		}

		Ok(outcome)
	}

	fn clear(&self) -> Result<(), StoreError> {
		self.0.write().tokens = None;

		Ok(())
	}
}
