use voltmap_shared::{Station, StationStatus};

/// A zoom-dependent grouping of nearby stations, rendered as one aggregate
/// marker. Recomputed from scratch every clustering pass; clusters carry no
/// identity across passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub centroid_lat: f64,
    pub centroid_lng: f64,
    /// Insertion order = discovery order during clustering. Never empty.
    pub members: Vec<Station>,
}

impl Cluster {
    pub fn available_count(&self) -> usize {
        self.members
            .iter()
            .filter(|s| s.status != StationStatus::Occupied)
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.members.len()
    }
}

/// Grouping radius in degrees. Shrinks as zoom increases, so tighter
/// proximity is required the closer the view gets; negative above zoom 16,
/// which merges nothing.
pub fn distance_threshold(zoom: f64) -> f64 {
    (15.0 - zoom) * 0.006 + 0.006
}

/// Partition `stations` into clusters for the given zoom.
///
/// Greedy single-linkage in one pass: each unprocessed station seeds a
/// cluster, then claims every remaining unprocessed station within
/// `distance_threshold(zoom)` of the seed's original coordinates. Distance
/// is always measured from the seed, not the evolving centroid, and ties go
/// to the earlier seed (first-found-first-claimed). Order-dependent and not
/// globally distance-optimal; O(n²), which is fine at the station counts
/// this map carries.
pub fn cluster(stations: &[Station], zoom: f64) -> Vec<Cluster> {
    let threshold = distance_threshold(zoom);
    let mut processed = vec![false; stations.len()];
    let mut clusters = Vec::new();

    for i in 0..stations.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;

        let seed_lat = stations[i].lat;
        let seed_lng = stations[i].lng;
        let mut members = vec![stations[i].clone()];
        let mut centroid_lat = seed_lat;
        let mut centroid_lng = seed_lng;

        for j in (i + 1)..stations.len() {
            if processed[j] {
                continue;
            }
            let candidate = &stations[j];
            let d_lat = candidate.lat - seed_lat;
            let d_lng = candidate.lng - seed_lng;
            let distance = (d_lat * d_lat + d_lng * d_lng).sqrt();
            if distance <= threshold {
                processed[j] = true;
                members.push(candidate.clone());
                // Incremental running mean, per axis.
                let n = members.len() as f64;
                centroid_lat = (centroid_lat * (n - 1.0) + candidate.lat) / n;
                centroid_lng = (centroid_lng * (n - 1.0) + candidate.lng) / n;
            }
        }

        clusters.push(Cluster {
            centroid_lat,
            centroid_lng,
            members,
        });
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, lat: f64, lng: f64, status: StationStatus) -> Station {
        Station {
            id: id.to_string(),
            name: format!("Station {id}"),
            lat,
            lng,
            status,
            available_slots: match status {
                StationStatus::Occupied => 0,
                _ => 3,
            },
        }
    }

    fn seoul_spread() -> Vec<Station> {
        vec![
            station("a", 37.500, 127.000, StationStatus::Available),
            station("b", 37.5005, 127.0005, StationStatus::Partial),
            station("c", 37.560, 127.060, StationStatus::Available),
            station("d", 37.5602, 127.0601, StationStatus::Occupied),
            station("e", 37.700, 126.800, StationStatus::Available),
        ]
    }

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-9,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    #[test]
    fn threshold_formula_matches_documented_values() {
        assert_close(distance_threshold(10.0), 0.036);
        assert_close(distance_threshold(14.0), 0.012);
        assert_close(distance_threshold(15.0), 0.006);
        assert_close(distance_threshold(17.0), -0.006);
    }

    #[test]
    fn empty_input_produces_no_clusters() {
        assert!(cluster(&[], 10.0).is_empty());
    }

    #[test]
    fn single_station_forms_singleton_cluster() {
        let stations = vec![station("a", 37.5, 127.0, StationStatus::Available)];
        let clusters = cluster(&stations, 12.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 1);
        assert_close(clusters[0].centroid_lat, 37.5);
        assert_close(clusters[0].centroid_lng, 127.0);
    }

    #[test]
    fn clustering_is_a_partition() {
        let stations = seoul_spread();
        for zoom in [8.0, 10.0, 12.0, 13.9] {
            let clusters = cluster(&stations, zoom);
            let total: usize = clusters.iter().map(|c| c.members.len()).sum();
            assert_eq!(total, stations.len(), "zoom {zoom}");

            let mut seen: Vec<&str> = clusters
                .iter()
                .flat_map(|c| c.members.iter().map(|s| s.id.as_str()))
                .collect();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), stations.len(), "zoom {zoom}");
        }
    }

    #[test]
    fn nearby_pair_merges_at_low_zoom() {
        // threshold(10) = 0.036; the pair is ~0.0007 degrees apart.
        let stations = vec![
            station("a", 37.50, 127.00, StationStatus::Available),
            station("b", 37.5005, 127.0005, StationStatus::Available),
        ];
        let clusters = cluster(&stations, 10.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 2);
    }

    #[test]
    fn negative_threshold_never_merges() {
        // threshold(17) = -0.006: even coincident stations stay apart.
        let stations = vec![
            station("a", 37.50, 127.00, StationStatus::Available),
            station("b", 37.50, 127.00, StationStatus::Available),
        ];
        let clusters = cluster(&stations, 17.0);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn coincident_stations_collapse_to_one_cluster() {
        let stations = vec![
            station("a", 37.5, 127.0, StationStatus::Available),
            station("b", 37.5, 127.0, StationStatus::Occupied),
            station("c", 37.5, 127.0, StationStatus::Partial),
        ];
        let clusters = cluster(&stations, 12.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 3);
        assert_eq!(clusters[0].available_count(), 2);
    }

    #[test]
    fn lower_zoom_groups_at_least_as_coarsely() {
        let stations = seoul_spread();
        let coarse = cluster(&stations, 10.0).len();
        let fine = cluster(&stations, 14.0).len();
        assert!(coarse <= fine);
    }

    #[test]
    fn membership_is_idempotent_across_passes() {
        let stations = seoul_spread();
        let first_clusters = cluster(&stations, 11.0);
        let first: Vec<Vec<&str>> = first_clusters
            .iter()
            .map(|c| c.members.iter().map(|s| s.id.as_str()).collect())
            .collect();
        let second_clusters = cluster(&stations, 11.0);
        let second: Vec<Vec<&str>> = second_clusters
            .iter()
            .map(|c| c.members.iter().map(|s| s.id.as_str()).collect())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn earlier_seed_claims_contested_station() {
        // "b" sits within threshold of both "a" and "c", but "a" is
        // processed first and claims it, even though "c" is nearer.
        let threshold = distance_threshold(13.0); // 0.018
        let stations = vec![
            station("a", 37.500, 127.000, StationStatus::Available),
            station("b", 37.500, 127.000 + threshold * 0.9, StationStatus::Available),
            station("c", 37.500, 127.000 + threshold * 1.1, StationStatus::Available),
        ];
        let clusters = cluster(&stations, 13.0);
        assert_eq!(clusters.len(), 2);
        let first: Vec<&str> = clusters[0].members.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(first, vec!["a", "b"]);
    }

    #[test]
    fn centroid_is_running_mean_of_members() {
        let stations = vec![
            station("a", 37.50, 127.00, StationStatus::Available),
            station("b", 37.51, 127.01, StationStatus::Available),
            station("c", 37.52, 127.02, StationStatus::Available),
        ];
        let clusters = cluster(&stations, 8.0);
        assert_eq!(clusters.len(), 1);
        assert_close(clusters[0].centroid_lat, 37.51);
        assert_close(clusters[0].centroid_lng, 127.01);
    }

    #[test]
    fn distant_station_seeds_its_own_cluster() {
        let stations = seoul_spread();
        let clusters = cluster(&stations, 13.0);
        let lone = clusters
            .iter()
            .find(|c| c.members.iter().any(|s| s.id == "e"))
            .expect("station e should be clustered");
        assert_eq!(lone.members.len(), 1);
    }
}
