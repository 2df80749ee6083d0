pub mod events;
pub mod station;

pub use events::{MapEvent, StationFeedEvent};
pub use station::{Station, StationStatus, classify_cluster};
