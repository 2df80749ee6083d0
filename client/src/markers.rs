use std::rc::Rc;

use voltmap_shared::{MapEvent, Station};

use crate::cluster::{Cluster, cluster};
use crate::content::{VisualDescriptor, cluster_content, individual_content};
use crate::widget::{MapWidget, MarkerCallbacks, MarkerHandle};
use crate::zoom;

/// One entry of the computed render plan for a zoom + station-set snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEntry {
    Station(Station),
    Cluster(Cluster),
}

/// Compute what should be on the map: one entry per station in individual
/// mode, otherwise one entry per cluster with at least one available
/// member (fully-occupied groups produce no marker at all).
pub fn build_render_plan(stations: &[Station], zoom_level: f64) -> Vec<PlanEntry> {
    if zoom::individual_mode(zoom_level) {
        stations.iter().cloned().map(PlanEntry::Station).collect()
    } else {
        cluster(stations, zoom_level)
            .into_iter()
            .filter(|c| c.available_count() > 0)
            .map(PlanEntry::Cluster)
            .collect()
    }
}

/// Receives every emitted `MapEvent` (in-process side of the broadcast).
pub type EventSink = Rc<dyn Fn(MapEvent)>;

/// Receives hover transitions from pointer handlers. The app routes these
/// through the hover signal and back into `set_hovered`, keeping a single
/// writer pathway.
pub type HoverSink = Rc<dyn Fn(Option<String>)>;

struct RenderedMarker<W: MapWidget> {
    /// Station id in individual mode; clusters have no stable key and are
    /// recreated every pass.
    station_id: Option<String>,
    handle: W::Marker,
    visual: VisualDescriptor,
}

/// Owns every native marker handle on the map. Reconciliation is full
/// teardown and rebuild: clusters carry no identity across passes, so on
/// any zoom or data change all previous markers are removed and a fresh
/// set is created from the render plan. Hover is the one exception: a
/// content-only icon update in place. Not reentrant; entry points run to
/// completion on the single UI thread before the next trigger is handled.
pub struct MarkerEngine<W: MapWidget> {
    widget: W,
    markers: Vec<RenderedMarker<W>>,
    stations: Vec<Station>,
    zoom: f64,
    hovered: Option<String>,
    events: EventSink,
    hover: HoverSink,
}

impl<W: MapWidget> MarkerEngine<W> {
    pub fn new(widget: W, events: EventSink, hover: HoverSink) -> Self {
        let zoom = widget.zoom();
        Self {
            widget,
            markers: Vec::new(),
            stations: Vec::new(),
            zoom,
            hovered: None,
            events,
            hover,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Replace the station list and re-render.
    pub fn set_stations(&mut self, stations: Vec<Station>) {
        self.stations = stations;
        self.render();
    }

    /// Apply a zoom change and re-render.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
        self.render();
    }

    /// Hover transition: rebuilds only the affected individual markers'
    /// icons in place. Never creates or destroys a marker.
    pub fn set_hovered(&mut self, hovered: Option<String>) {
        if self.hovered == hovered {
            return;
        }
        let mut affected = Vec::with_capacity(2);
        if let Some(old) = &self.hovered {
            affected.push(old.clone());
        }
        if let Some(new) = &hovered {
            affected.push(new.clone());
        }
        self.hovered = hovered;
        for id in affected {
            self.refresh_station_icon(&id);
        }
    }

    fn refresh_station_icon(&mut self, id: &str) {
        let is_hovered = self.hovered.as_deref() == Some(id);
        let Some(station) = self.stations.iter().find(|s| s.id == id) else {
            return;
        };
        let visual = individual_content(station, is_hovered);
        let Some(marker) = self
            .markers
            .iter_mut()
            .find(|m| m.station_id.as_deref() == Some(id))
        else {
            return;
        };
        if marker.visual != visual {
            marker.handle.set_icon(&visual);
            marker.visual = visual;
        }
    }

    fn render(&mut self) {
        // Teardown first: every previous handle is released before any new
        // marker attaches.
        for marker in self.markers.drain(..) {
            marker.handle.remove();
        }

        for entry in build_render_plan(&self.stations, self.zoom) {
            match entry {
                PlanEntry::Station(station) => self.attach_station(station),
                PlanEntry::Cluster(group) => self.attach_cluster(group),
            }
        }
    }

    fn attach_station(&mut self, station: Station) {
        let is_hovered = self.hovered.as_deref() == Some(station.id.as_str());
        let visual = individual_content(&station, is_hovered);

        let click_event = MapEvent::StationClicked {
            station: station.clone(),
        };
        let events = Rc::clone(&self.events);
        let enter_hover = Rc::clone(&self.hover);
        let leave_hover = Rc::clone(&self.hover);
        let enter_id = station.id.clone();
        let callbacks = MarkerCallbacks {
            on_click: Some(Box::new(move || events(click_event.clone()))),
            on_enter: Some(Box::new(move || enter_hover(Some(enter_id.clone())))),
            on_leave: Some(Box::new(move || leave_hover(None))),
        };

        let handle = self
            .widget
            .add_marker(station.lat, station.lng, &visual, callbacks);
        self.markers.push(RenderedMarker {
            station_id: Some(station.id),
            handle,
            visual,
        });
    }

    fn attach_cluster(&mut self, group: Cluster) {
        let visual = cluster_content(group.available_count(), group.total_count(), self.zoom);

        // A singleton cluster is just an unclustered station; clicks carry
        // the station itself rather than a one-element list.
        let click_event = if group.members.len() == 1 {
            MapEvent::StationClicked {
                station: group.members[0].clone(),
            }
        } else {
            MapEvent::ClusterClicked {
                stations: group.members.clone(),
            }
        };
        let events = Rc::clone(&self.events);
        let callbacks = MarkerCallbacks {
            on_click: Some(Box::new(move || events(click_event.clone()))),
            ..Default::default()
        };

        let handle =
            self.widget
                .add_marker(group.centroid_lat, group.centroid_lng, &visual, callbacks);
        self.markers.push(RenderedMarker {
            station_id: None,
            handle,
            visual,
        });
    }
}
