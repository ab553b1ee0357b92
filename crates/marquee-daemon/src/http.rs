use std::time::Duration;

use anyhow::Context;
use marquee_proto::error::Error;
use reqwest::Client;

/// Shared client for the token, status and image endpoints. TLS sessions and
/// pooled connections are reused across cycles.
pub fn build_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(concat!("marquee/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}

pub fn network(e: reqwest::Error) -> Error {
    if e.is_decode() {
        Error::Decode(e.to_string())
    } else {
        Error::Network(e.to_string())
    }
}
