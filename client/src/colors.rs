use voltmap_shared::StationStatus;

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// Fixed color set for one status category: fill, border, label text, and
/// the translucent glow behind the badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusPalette {
    pub fill: (u8, u8, u8),
    pub border: (u8, u8, u8),
    pub label: (u8, u8, u8),
    pub glow: (u8, u8, u8),
}

/// Application palette table. Not derived from anything; chosen to read at
/// a glance against map tiles.
pub fn status_palette(status: StationStatus) -> StatusPalette {
    match status {
        StationStatus::Available => StatusPalette {
            fill: (46, 204, 113),
            border: (32, 156, 84),
            label: (255, 255, 255),
            glow: (46, 204, 113),
        },
        StationStatus::Partial => StatusPalette {
            fill: (245, 197, 66),
            border: (212, 160, 48),
            label: (26, 29, 42),
            glow: (245, 197, 66),
        },
        StationStatus::Occupied => StatusPalette {
            fill: (235, 87, 87),
            border: (186, 56, 56),
            label: (255, 255, 255),
            glow: (235, 87, 87),
        },
    }
}

/// Current-location indicator colors, independent of station status.
pub const LOCATION_PALETTE: StatusPalette = StatusPalette {
    fill: (66, 133, 244),
    border: (255, 255, 255),
    label: (255, 255, 255),
    glow: (66, 133, 244),
};
