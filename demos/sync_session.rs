//! Demonstrates the blocking session client and the dispatched client side by side against a
//! local mock provider, using the default reqwest transport and in-memory session state.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use tokio::sync::oneshot;
use url::Url;
// self
use oidc_request::{
	auth::TokenResponse,
	config::{OidcConfig, ProviderConfiguration},
	dispatch::{RequestDispatcher, callback_fn},
	http::ReqwestTransport,
	session::{SessionClient, SyncSessionClientFactory},
	store::MemoryState,
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start();
	let userinfo_mock = server.mock(|when, then| {
		when.method(GET).path("/userinfo").header("authorization", "Bearer demo-access");
		then.status(200)
			.header("content-type", "application/json")
			.body("{\"sub\":\"abc123\",\"name\":\"Demo User\"}");
	});
	let revoke_mock = server.mock(|when, then| {
		when.method(POST).path("/revoke");
		then.status(200);
	});
	let config = OidcConfig::builder()
		.client_id("demo-client")
		.redirect_uri(Url::parse("com.example.demo:/callback")?)
		.scopes(["openid", "profile"])
		.discovery_uri(Url::parse("https://idp.example.com/.well-known/openid-configuration")?)
		.build()?;
	let provider = ProviderConfiguration::builder(Url::parse(&server.base_url())?)
		.token_endpoint(Url::parse(&server.url("/token"))?)
		.userinfo_endpoint(Url::parse(&server.url("/userinfo"))?)
		.revocation_endpoint(Url::parse(&server.url("/revoke"))?)
		.build()?;
	let state = Arc::new(
		MemoryState::with_configuration(provider).with_tokens(TokenResponse::new("demo-access")),
	);
	let transport = Arc::new(ReqwestTransport::new()?);
	let sync = SyncSessionClientFactory.create_client(config.clone(), state.clone(), &transport);
	let profile = sync.user_profile()?;

	println!("Profile fetched on the calling thread: {profile:?}.");

	let (dispatcher, mut results) = RequestDispatcher::with_worker_pool()?;
	let client = SessionClient::new(config, state, transport, dispatcher);
	let (tx, rx) = oneshot::channel();

	client.revoke_token(
		"demo-access",
		callback_fn(
			move |revoked: bool| {
				if tx.send(revoked).is_err() {
					eprintln!("Revocation result arrived after the receiver was dropped.");
				}
			},
			|kind, e| eprintln!("Revocation failed ({kind}): {e}."),
		),
	)?;
	results.run_next_blocking();

	println!("Token revoked in the background: {}.", rx.blocking_recv()?);

	client.clear()?;
	client.dispatcher().shutdown();
	userinfo_mock.assert();
	revoke_mock.assert();

	Ok(())
}
