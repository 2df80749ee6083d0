use serde::{Deserialize, Serialize};

/// A charging station as delivered by the feed. The engine never mutates
/// stations; each render pass works from the list as supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Stable across renders. Duplicate ids are a feed error; the engine
    /// does not validate and will render a degenerate (but non-crashing)
    /// result for malformed input.
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub status: StationStatus,
    #[serde(default)]
    pub available_slots: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationStatus {
    Available,
    Partial,
    Occupied,
}

impl StationStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Partial => "Filling up",
            Self::Occupied => "Occupied",
        }
    }
}

/// Derive the status category for a group of stations.
///
/// Evaluated top to bottom, first match wins:
/// 1. no available members → occupied
/// 2. at most 2 available, or less than 30% available → partial
/// 3. otherwise → available
pub fn classify_cluster(available_count: usize, total_count: usize) -> StationStatus {
    if available_count == 0 {
        StationStatus::Occupied
    } else if available_count <= 2 || (available_count as f64 / total_count as f64) < 0.3 {
        StationStatus::Partial
    } else {
        StationStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_cluster_no_availability_is_occupied() {
        assert_eq!(classify_cluster(0, 5), StationStatus::Occupied);
        assert_eq!(classify_cluster(0, 1), StationStatus::Occupied);
    }

    #[test]
    fn classify_cluster_low_ratio_is_partial() {
        assert_eq!(classify_cluster(1, 10), StationStatus::Partial);
        assert_eq!(classify_cluster(2, 10), StationStatus::Partial);
    }

    #[test]
    fn classify_cluster_small_count_wins_over_ratio() {
        // 2 of 3 is a healthy ratio, but two free slots is still tight.
        assert_eq!(classify_cluster(2, 3), StationStatus::Partial);
        assert_eq!(classify_cluster(2, 2), StationStatus::Partial);
    }

    #[test]
    fn classify_cluster_healthy_is_available() {
        assert_eq!(classify_cluster(8, 10), StationStatus::Available);
        assert_eq!(classify_cluster(3, 10), StationStatus::Available);
        assert_eq!(classify_cluster(3, 3), StationStatus::Available);
    }

    #[test]
    fn status_parses_lowercase_wire_form() {
        let station: Station = serde_json::from_str(
            r#"{
                "id": "st-042",
                "name": "City Hall 3",
                "lat": 37.5665,
                "lng": 126.978,
                "status": "partial"
            }"#,
        )
        .expect("station should parse");
        assert_eq!(station.status, StationStatus::Partial);
        assert_eq!(station.available_slots, 0);
    }
}
