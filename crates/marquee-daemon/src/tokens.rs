//! Persisted credential pair and the refresh-grant protocol.
//!
//! The token file is the only durable state. A refresh is all-or-nothing: the
//! new pair is written to a sibling temp file and renamed over the original,
//! so a failed request, a bad response or a crash mid-write leaves the
//! previous file untouched.

use std::path::{Path, PathBuf};

use marquee_proto::error::{Error, Result};
use marquee_proto::protocol::{TokenPair, TokenResponse};
use reqwest::Client;
use tracing::{debug, info};

use crate::http::network;

/// Source of access tokens for the status endpoint.
pub trait Credentials {
    fn load(&self) -> Result<TokenPair>;
    async fn refresh(&self, current: &TokenPair) -> Result<TokenPair>;
}

pub struct TokenStore {
    path: PathBuf,
    token_url: String,
    client_id: String,
    client_secret: String,
    http: Client,
}

impl TokenStore {
    pub fn new(
        path: PathBuf,
        token_url: String,
        client_id: String,
        client_secret: String,
        http: Client,
    ) -> Self {
        Self {
            path,
            token_url,
            client_id,
            client_secret,
            http,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, pair: &TokenPair) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_vec(pair)?;
        tokio::fs::write(&tmp, content).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!("token pair persisted to {:?}", self.path);
        Ok(())
    }
}

impl Credentials for TokenStore {
    fn load(&self) -> Result<TokenPair> {
        let content = match std::fs::read(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::TokenMissing(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let pair: TokenPair = serde_json::from_slice(&content)
            .map_err(|e| Error::TokenCorrupt(e.to_string()))?;
        if !pair.is_valid() {
            return Err(Error::TokenCorrupt("empty token field".to_string()));
        }
        Ok(pair)
    }

    async fn refresh(&self, current: &TokenPair) -> Result<TokenPair> {
        info!("refreshing access token");
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", current.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AuthRejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(network)?;
        let grant: TokenResponse = serde_json::from_slice(&body)?;
        if grant.access_token.is_empty() {
            return Err(Error::Decode("empty access_token in grant".to_string()));
        }

        let next = current.refreshed(grant);
        self.persist(&next).await?;
        Ok(next)
    }
}

/// For feeds that need no authorisation: an empty pair that never expires.
pub struct Anonymous;

impl Credentials for Anonymous {
    fn load(&self) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: String::new(),
            refresh_token: String::new(),
        })
    }

    async fn refresh(&self, current: &TokenPair) -> Result<TokenPair> {
        Ok(current.clone())
    }
}
