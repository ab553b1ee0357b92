//! Departure-board feed.
//!
//! A stop lists upcoming stop times; the panel shows the destination of the
//! next matching departure on the top line and the minutes until the next
//! few on the bottom line. The route's alert list only matters as "any or
//! none".

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::protocol::PlaybackStatus;

/// Departures shown on the bottom line.
pub const MAX_DEPARTURES: usize = 3;

/// Bottom-line width above which one departure is dropped.
pub const MAX_TIMES_WIDTH: usize = 6;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    #[serde(default)]
    pub stop_times: Vec<StopTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopTime {
    #[serde(default)]
    pub headsign: Option<String>,
    #[serde(default)]
    pub trip: Option<Trip>,
    #[serde(default)]
    pub destination: Option<Named>,
    #[serde(default)]
    pub departure: Option<Departure>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Trip {
    pub route: RouteRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Departure {
    pub time: Timestamp,
}

/// Unix seconds, sent either as a number or as a decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Seconds(i64),
    Text(String),
}

impl Timestamp {
    pub fn seconds(&self) -> Option<i64> {
        match self {
            Self::Seconds(s) => Some(*s),
            Self::Text(t) => t.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteResponse {
    #[serde(default)]
    pub alerts: Vec<serde_json::Value>,
}

impl RouteResponse {
    pub fn has_alert(&self) -> bool {
        !self.alerts.is_empty()
    }
}

/// Next departures at a stop, normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departures {
    pub route: String,
    pub destination: String,
    /// Whole minutes until each departure, never negative.
    pub minutes: Vec<i64>,
}

impl StopResponse {
    /// Keep the first [`MAX_DEPARTURES`] stop times whose headsign is in
    /// `directions`, relative to `now` (unix seconds).
    pub fn departures(&self, directions: &[String], now: i64) -> Result<Departures> {
        let wanted = |headsign: &str| {
            directions
                .iter()
                .any(|d| d.eq_ignore_ascii_case(headsign))
        };

        let mut matching = self
            .stop_times
            .iter()
            .filter(|t| t.headsign.as_deref().is_some_and(|h| wanted(h)))
            .take(MAX_DEPARTURES)
            .peekable();

        let first = matching.peek().ok_or(Error::FieldMissing("stopTimes"))?;
        let route = first
            .trip
            .as_ref()
            .map(|t| t.route.id.clone())
            .ok_or(Error::FieldMissing("stopTimes.trip.route.id"))?;
        let destination = first
            .destination
            .as_ref()
            .map(|d| d.name.clone())
            .ok_or(Error::FieldMissing("stopTimes.destination.name"))?;

        let minutes = matching
            .map(|t| {
                t.departure
                    .as_ref()
                    .and_then(|d| d.time.seconds())
                    .map(|at| ((at - now) / 60).max(0))
                    .ok_or(Error::FieldMissing("stopTimes.departure.time"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Departures {
            route,
            destination,
            minutes,
        })
    }
}

impl Departures {
    /// Minutes as `a,b,c`, falling back to two entries when three don't fit.
    pub fn times_text(&self) -> String {
        let join = |n: usize| {
            self.minutes
                .iter()
                .take(n)
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        let all = join(MAX_DEPARTURES);
        if all.chars().count() > MAX_TIMES_WIDTH {
            join(MAX_DEPARTURES - 1)
        } else {
            all
        }
    }

    pub fn into_status(self, alert: bool) -> PlaybackStatus {
        let times = self.times_text();
        PlaybackStatus {
            active: true,
            primary_text: Some(self.destination),
            secondary_texts: vec![times],
            group_text: Some(self.route),
            thumbnail_url: None,
            alert,
        }
    }
}

/// Whether `hour` (UTC) falls outside the `on_hour..off_hour` window. The
/// window may wrap past midnight.
pub fn is_quiet_hour(hour: u32, on_hour: u32, off_hour: u32) -> bool {
    if on_hour < off_hour {
        hour < on_hour || off_hour <= hour
    } else {
        off_hour <= hour && hour < on_hour
    }
}
