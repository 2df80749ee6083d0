use voltmap_shared::{Station, classify_cluster};

use crate::colors::{LOCATION_PALETTE, StatusPalette, status_palette};
use crate::zoom::ClusterSize;

pub const INDIVIDUAL_SIZE_PX: f64 = 36.0;
pub const HOVER_SCALE: f64 = 1.2;
pub const CURRENT_LOCATION_SIZE_PX: f64 = 22.0;
pub const CLUSTER_GLYPH: char = '\u{26A1}';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    Station,
    Cluster,
    CurrentLocation,
}

/// Everything the rendering adapter needs to draw one marker. Pure data:
/// no markup, no map-widget types. Compared against the last applied
/// descriptor to skip redundant icon updates.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualDescriptor {
    pub kind: MarkerKind,
    pub size_px: f64,
    /// Emphasis factor applied by the adapter (1.0 = none). Hover only.
    pub scale: f64,
    /// Pixel offset aligning the shape to its geocoordinate. Depends on
    /// `size_px`, so it is recomputed whenever the size tier changes.
    pub anchor: (f64, f64),
    pub palette: StatusPalette,
    pub label: String,
    pub glyph: Option<char>,
}

fn centered_anchor(size_px: f64) -> (f64, f64) {
    (size_px / 2.0, size_px / 2.0)
}

/// Marker content for a single station. Hover scales the badge up without
/// touching size tier or anchor.
pub fn individual_content(station: &Station, is_hovered: bool) -> VisualDescriptor {
    VisualDescriptor {
        kind: MarkerKind::Station,
        size_px: INDIVIDUAL_SIZE_PX,
        scale: if is_hovered { HOVER_SCALE } else { 1.0 },
        anchor: centered_anchor(INDIVIDUAL_SIZE_PX),
        palette: status_palette(station.status),
        label: station.available_slots.to_string(),
        glyph: None,
    }
}

/// Marker content for a cluster badge: size tier from zoom, color from the
/// group classification, count of available members as the label.
pub fn cluster_content(available_count: usize, total_count: usize, zoom: f64) -> VisualDescriptor {
    let size_px = ClusterSize::for_zoom(zoom).px();
    VisualDescriptor {
        kind: MarkerKind::Cluster,
        size_px,
        scale: 1.0,
        anchor: centered_anchor(size_px),
        palette: status_palette(classify_cluster(available_count, total_count)),
        label: available_count.to_string(),
        glyph: Some(CLUSTER_GLYPH),
    }
}

/// Dual-ring current-location indicator. Independent of zoom and status.
pub fn current_location_content(size_px: f64) -> VisualDescriptor {
    VisualDescriptor {
        kind: MarkerKind::CurrentLocation,
        size_px,
        scale: 1.0,
        anchor: centered_anchor(size_px),
        palette: LOCATION_PALETTE,
        label: String::new(),
        glyph: None,
    }
}
