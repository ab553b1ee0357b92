//! Departure-board status source.
//!
//! Polls a stop's upcoming departures and its route's alert list. Outside
//! the configured hours the board reports nothing showing without touching
//! the network, so the panel idles on the retry cadence.

use chrono::{DateTime, Timelike, Utc};
use marquee_proto::config::TransitConfig;
use marquee_proto::error::{Error, Result};
use marquee_proto::protocol::PlaybackStatus;
use marquee_proto::transit::{is_quiet_hour, RouteResponse, StopResponse};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::http::network;
use crate::status::StatusSource;

pub struct TransitPoller {
    http: Client,
    stop_url: String,
    route_url: String,
    directions: Vec<String>,
    on_hour: u32,
    off_hour: u32,
    clock: fn() -> DateTime<Utc>,
}

impl TransitPoller {
    pub fn new(http: Client, config: &TransitConfig) -> Self {
        Self {
            http,
            stop_url: config.stop_url.clone(),
            route_url: config.route_url.clone(),
            directions: config.directions.clone(),
            on_hour: config.on_hour,
            off_hour: config.off_hour,
            clock: Utc::now,
        }
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.http.get(url).send().await.map_err(network)?;
        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await.map_err(network)?;
                Ok(serde_json::from_slice(&body)?)
            }
            other => Err(Error::UnexpectedStatus(other.as_u16())),
        }
    }

    async fn poll_at(&self, now: DateTime<Utc>) -> Result<PlaybackStatus> {
        if is_quiet_hour(now.hour(), self.on_hour, self.off_hour) {
            debug!("transit: quiet hour {}", now.hour());
            return Ok(PlaybackStatus::inactive());
        }

        let stop: StopResponse = self.get_json(&self.stop_url).await?;
        let departures = stop.departures(&self.directions, now.timestamp())?;
        let route: RouteResponse = self.get_json(&self.route_url).await?;
        debug!(
            "transit: {} to {} in {:?}",
            departures.route, departures.destination, departures.minutes
        );
        Ok(departures.into_status(route.has_alert()))
    }
}

impl StatusSource for TransitPoller {
    async fn poll(&self, _access_token: &str) -> Result<PlaybackStatus> {
        self.poll_at((self.clock)()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::serve;
    use axum::http::StatusCode as AxumStatus;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn evening() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap()
    }

    fn morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap()
    }

    fn stop_body() -> String {
        let at = |mins: i64| evening().timestamp() + mins * 60;
        format!(
            r#"{{ "stopTimes": [
                {{ "headsign": "Downtown", "trip": {{ "route": {{ "id": "Q" }} }},
                   "destination": {{ "name": "Coney Island" }}, "departure": {{ "time": "{}" }} }},
                {{ "headsign": "Uptown", "trip": {{ "route": {{ "id": "Q" }} }},
                   "destination": {{ "name": "96 St" }}, "departure": {{ "time": "{}" }} }},
                {{ "headsign": "Downtown", "trip": {{ "route": {{ "id": "Q" }} }},
                   "destination": {{ "name": "Coney Island" }}, "departure": {{ "time": "{}" }} }}
            ] }}"#,
            at(2),
            at(3),
            at(9)
        )
    }

    fn config(base: &str, alerts: bool) -> TransitConfig {
        TransitConfig {
            stop_url: format!("{}/stops/Q04", base),
            route_url: format!(
                "{}/routes/{}",
                base,
                if alerts { "alerted" } else { "Q" }
            ),
            directions: vec!["downtown".into()],
            on_hour: 12,
            off_hour: 3,
        }
    }

    async fn board(hits: Arc<AtomicUsize>) -> String {
        let stop = stop_body();
        let app = Router::new()
            .route(
                "/stops/Q04",
                get(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let stop = stop.clone();
                    async move { ([("content-type", "application/json")], stop) }
                }),
            )
            .route("/routes/Q", get(|| async { r#"{ "id": "Q", "alerts": [] }"# }))
            .route(
                "/routes/alerted",
                get(|| async { r#"{ "id": "Q", "alerts": [{ "id": "a1" }] }"# }),
            )
            .route(
                "/stops/down",
                get(|| async { AxumStatus::SERVICE_UNAVAILABLE.into_response() }),
            );
        serve(app).await
    }

    #[tokio::test]
    async fn test_departures_become_status() {
        let base = board(Arc::default()).await;
        let poller = TransitPoller::new(Client::new(), &config(&base, false));

        let status = poller.poll_at(evening()).await.unwrap();
        assert!(status.active);
        assert!(!status.alert);
        assert_eq!(status.primary_text.as_deref(), Some("Coney Island"));
        assert_eq!(status.secondary_texts, vec!["2,9"]);
        assert_eq!(status.group_text.as_deref(), Some("Q"));
        assert_eq!(status.thumbnail_url, None);
    }

    #[tokio::test]
    async fn test_route_alert_sets_flag() {
        let base = board(Arc::default()).await;
        let poller = TransitPoller::new(Client::new(), &config(&base, true));

        let status = poller.poll_at(evening()).await.unwrap();
        assert!(status.alert);
    }

    #[tokio::test]
    async fn test_quiet_hours_skip_the_network() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = board(hits.clone()).await;
        let poller =
            TransitPoller::new(Client::new(), &config(&base, false)).with_clock(morning);

        let status = poller.poll("").await.unwrap();
        assert_eq!(status, PlaybackStatus::inactive());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_error_is_not_unauthorized() {
        let base = board(Arc::default()).await;
        let mut cfg = config(&base, false);
        cfg.stop_url = format!("{}/stops/down", base);
        let poller = TransitPoller::new(Client::new(), &cfg);

        let err = poller.poll_at(evening()).await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus(503)));
        assert!(!err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_no_matching_direction_is_decode_error() {
        let base = board(Arc::default()).await;
        let mut cfg = config(&base, false);
        cfg.directions = vec!["manhattan".into()];
        let poller = TransitPoller::new(Client::new(), &cfg);

        let err = poller.poll_at(evening()).await.unwrap_err();
        assert!(matches!(err, Error::FieldMissing("stopTimes")));
    }
}
