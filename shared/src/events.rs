use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::station::Station;

/// Feed payloads. The feed is snapshot-only: each fetch replaces the whole
/// station list, so there is no incremental change form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StationFeedEvent {
    Snapshot {
        stations: Vec<Station>,
        timestamp: DateTime<Utc>,
    },
}

/// Events emitted for the host page. Broadcast as a DOM CustomEvent
/// (`voltmap:event`) with this enum serialized into `detail`, and delivered
/// to the in-process sink callback with the same payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MapEvent {
    /// The map widget finished construction; markers can be observed from
    /// here on. Carries no handle; JS objects do not serialize.
    MapReady,
    /// An individual marker, or a single-member group, was clicked.
    StationClicked { station: Station },
    /// A multi-member cluster marker was clicked.
    ClusterClicked { stations: Vec<Station> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::StationStatus;

    #[test]
    fn feed_snapshot_parses_from_wire_json() {
        let event: StationFeedEvent = serde_json::from_str(
            r#"{
                "type": "Snapshot",
                "timestamp": "2026-08-07T09:30:00Z",
                "stations": [
                    {
                        "id": "st-001",
                        "name": "Riverside 1",
                        "lat": 37.50,
                        "lng": 127.00,
                        "status": "available",
                        "available_slots": 4
                    }
                ]
            }"#,
        )
        .expect("snapshot should parse");

        let StationFeedEvent::Snapshot { stations, .. } = event;
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].status, StationStatus::Available);
    }

    #[test]
    fn map_event_tags_carry_variant_names() {
        let json = serde_json::to_string(&MapEvent::MapReady).expect("serialize");
        assert!(json.contains(r#""type":"MapReady""#));
    }
}
