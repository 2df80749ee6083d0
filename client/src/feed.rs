use chrono::{DateTime, Utc};
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use voltmap_shared::{Station, StationFeedEvent};

pub const FEED_URL: &str = "/api/stations";
pub const FEED_REFRESH_MS: u32 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Connecting,
    Live,
    /// A refresh failed; the last good list keeps rendering.
    Stale,
}

impl FeedStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Live => "live",
            Self::Stale => "offline",
        }
    }
}

pub async fn fetch_stations() -> Result<(Vec<Station>, DateTime<Utc>), String> {
    let resp = gloo_net::http::Request::get(FEED_URL)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    let event = resp
        .json::<StationFeedEvent>()
        .await
        .map_err(|e| format!("parse error: {e}"))?;
    let StationFeedEvent::Snapshot {
        stations,
        timestamp,
    } = event;
    Ok((stations, timestamp))
}

/// Fetch the station snapshot now and keep refreshing on a fixed cadence.
/// Failures are swallowed into the status signal plus a console warning;
/// the station list is only replaced on success.
pub fn connect(
    stations: RwSignal<Vec<Station>>,
    last_updated: RwSignal<Option<DateTime<Utc>>>,
    status: RwSignal<FeedStatus>,
) {
    spawn_local(async move {
        loop {
            match fetch_stations().await {
                Ok((list, timestamp)) => {
                    stations.set(list);
                    last_updated.set(Some(timestamp));
                    status.set(FeedStatus::Live);
                }
                Err(e) => {
                    status.set(FeedStatus::Stale);
                    crate::log::warn(&format!("Station feed refresh failed: {e}"));
                }
            }
            gloo_timers::future::TimeoutFuture::new(FEED_REFRESH_MS).await;
        }
    });
}
