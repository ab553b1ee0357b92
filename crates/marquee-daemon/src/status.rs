use marquee_proto::error::{Error, Result};
use marquee_proto::protocol::{parse_status, PlaybackStatus};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::http::network;

/// Remote "what is showing now" endpoint.
pub trait StatusSource {
    async fn poll(&self, access_token: &str) -> Result<PlaybackStatus>;
}

pub struct StatusPoller {
    http: Client,
    url: String,
    image_size: u32,
}

impl StatusPoller {
    pub fn new(http: Client, url: String, image_size: u32) -> Self {
        Self {
            http,
            url,
            image_size,
        }
    }
}

impl StatusSource for StatusPoller {
    async fn poll(&self, access_token: &str) -> Result<PlaybackStatus> {
        let response = self
            .http
            .get(&self.url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(network)?;

        match response.status() {
            StatusCode::NO_CONTENT => {
                debug!("status endpoint: no content");
                Ok(PlaybackStatus::inactive())
            }
            StatusCode::OK => {
                let body = response.bytes().await.map_err(network)?;
                parse_status(&body, self.image_size)
            }
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
            other => Err(Error::UnexpectedStatus(other.as_u16())),
        }
    }
}
