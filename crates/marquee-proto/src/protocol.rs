use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ── Credentials ───────────────────────────────────────────────────────────────

/// The persisted credential pair. Both fields are non-empty when valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }

    /// Apply a refresh-grant response. A response without a refresh token
    /// keeps the current one.
    pub fn refreshed(&self, response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| self.refresh_token.clone()),
        }
    }
}

/// Body returned by the credential endpoint for a refresh grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// ── Status ────────────────────────────────────────────────────────────────────

/// Normalised "now showing" record.
///
/// When `active` is false every optional field is `None` and
/// `secondary_texts` is empty; when it is true `primary_text` is `Some`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackStatus {
    pub active: bool,
    pub primary_text: Option<String>,
    pub secondary_texts: Vec<String>,
    pub group_text: Option<String>,
    pub thumbnail_url: Option<String>,
    /// The source flagged a service alert for what is shown.
    pub alert: bool,
}

impl PlaybackStatus {
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Secondary texts as shown on the bottom line.
    pub fn secondary_joined(&self) -> String {
        self.secondary_texts.join(", ")
    }
}

/// Currently-playing payload, as much of it as the display needs.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: Option<bool>,
    #[serde(default)]
    pub item: Option<Item>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub album: Option<Album>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageVariant {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl CurrentlyPlaying {
    /// Validate the payload into a [`PlaybackStatus`], picking the image
    /// variant that is exactly `image_size` square.
    pub fn into_status(self, image_size: u32) -> Result<PlaybackStatus> {
        let active = self.is_playing.ok_or(Error::FieldMissing("is_playing"))?;
        if !active {
            return Ok(PlaybackStatus::inactive());
        }

        let item = self.item.ok_or(Error::FieldMissing("item"))?;
        let primary = item.name.ok_or(Error::FieldMissing("item.name"))?;

        let secondary_texts = item
            .artists
            .into_iter()
            .map(|a| a.name.ok_or(Error::FieldMissing("item.artists.name")))
            .collect::<Result<Vec<_>>>()?;

        let (group_text, thumbnail_url) = match item.album {
            Some(album) => {
                let url = album
                    .images
                    .into_iter()
                    .find(|i| i.width == Some(image_size) && i.height == Some(image_size))
                    .map(|i| i.url);
                (album.name, url)
            }
            None => (None, None),
        };

        Ok(PlaybackStatus {
            active: true,
            primary_text: Some(primary),
            secondary_texts,
            group_text,
            thumbnail_url,
            alert: false,
        })
    }
}

/// Decode a 200 response body from the status endpoint.
pub fn parse_status(body: &[u8], image_size: u32) -> Result<PlaybackStatus> {
    let payload: CurrentlyPlaying = serde_json::from_slice(body)?;
    payload.into_status(image_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_keeps_old_refresh_token() {
        let pair = TokenPair {
            access_token: "old-access".into(),
            refresh_token: "keep-me".into(),
        };
        let next = pair.refreshed(TokenResponse {
            access_token: "new-access".into(),
            refresh_token: None,
        });
        assert_eq!(next.access_token, "new-access");
        assert_eq!(next.refresh_token, "keep-me");
    }

    #[test]
    fn test_refresh_rotates_refresh_token() {
        let pair = TokenPair {
            access_token: "a".into(),
            refresh_token: "r1".into(),
        };
        let next = pair.refreshed(TokenResponse {
            access_token: "b".into(),
            refresh_token: Some("r2".into()),
        });
        assert_eq!(next.refresh_token, "r2");
        assert!(next.is_valid());
    }

    #[test]
    fn test_paused_payload_is_inactive() {
        let status = parse_status(br#"{"is_playing": false, "item": null}"#, 64).unwrap();
        assert_eq!(status, PlaybackStatus::inactive());
    }

    #[test]
    fn test_missing_is_playing_is_typed() {
        let err = parse_status(br#"{"item": null}"#, 64).unwrap_err();
        assert!(matches!(err, Error::FieldMissing("is_playing")));
    }

    #[test]
    fn test_secondary_joined() {
        let status = PlaybackStatus {
            active: true,
            primary_text: Some("Song".into()),
            secondary_texts: vec!["A".into(), "B".into(), "C".into()],
            ..Default::default()
        };
        assert_eq!(status.secondary_joined(), "A, B, C");
    }
}
