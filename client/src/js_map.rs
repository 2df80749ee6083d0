//! Binding to the external Leaflet-style map library (global `L`),
//! plus the adapter that turns `VisualDescriptor` values into div-icon
//! markup. Only this module knows the widget's markup and API shape.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Array;
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use crate::colors::rgba_css;
use crate::content::{MarkerKind, VisualDescriptor};
use crate::widget::{CircleHandle, MapWidget, MarkerCallbacks, MarkerHandle};

pub const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

#[wasm_bindgen]
extern "C" {
    pub type LeafletMap;

    #[wasm_bindgen(js_namespace = L, js_name = map)]
    fn l_map(container: &str, options: &JsValue) -> LeafletMap;

    #[wasm_bindgen(method, js_name = getZoom)]
    fn get_zoom(this: &LeafletMap) -> f64;

    #[wasm_bindgen(method, js_name = on)]
    fn on_map(this: &LeafletMap, event: &str, handler: &js_sys::Function);

    pub type LeafletTileLayer;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn l_tile_layer(url: &str, options: &JsValue) -> LeafletTileLayer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_tile_layer_to(this: &LeafletTileLayer, map: &LeafletMap);

    pub type LeafletMarker;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn l_marker(latlng: &Array, options: &JsValue) -> LeafletMarker;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_marker_to(this: &LeafletMarker, map: &LeafletMap);

    #[wasm_bindgen(method, js_name = setIcon)]
    fn set_marker_icon(this: &LeafletMarker, icon: &JsValue);

    #[wasm_bindgen(method, js_name = setLatLng)]
    fn set_marker_lat_lng(this: &LeafletMarker, latlng: &Array);

    #[wasm_bindgen(method, js_name = remove)]
    fn remove_marker(this: &LeafletMarker);

    #[wasm_bindgen(method, js_name = on)]
    fn on_marker(this: &LeafletMarker, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(js_namespace = L, js_name = divIcon)]
    fn l_div_icon(options: &JsValue) -> JsValue;

    pub type LeafletCircle;

    #[wasm_bindgen(js_namespace = L, js_name = circle)]
    fn l_circle(latlng: &Array, options: &JsValue) -> LeafletCircle;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_circle_to(this: &LeafletCircle, map: &LeafletMap);

    #[wasm_bindgen(method, js_name = setLatLng)]
    fn set_circle_lat_lng(this: &LeafletCircle, latlng: &Array);

    #[wasm_bindgen(method, js_name = setRadius)]
    fn set_circle_radius(this: &LeafletCircle, radius: f64);

    #[wasm_bindgen(method, js_name = remove)]
    fn remove_circle(this: &LeafletCircle);
}

// This wasm-bindgen version no longer auto-derives `Clone` for imported
// handle types; duplicate the underlying JS handle, matching the behavior
// the `#[derive(Clone)]` on `JsMapWidget` and `self.map.clone()` rely on.
impl Clone for LeafletMap {
    fn clone(&self) -> Self {
        let value: &JsValue = self.as_ref();
        value.clone().unchecked_into()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapOptions {
    center: [f64; 2],
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TileOptions {
    attribution: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DivIconOptions {
    html: String,
    class_name: &'static str,
    icon_size: [f64; 2],
    icon_anchor: [f64; 2],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CircleOptions {
    radius: f64,
    color: String,
    weight: f64,
    fill_color: String,
    fill_opacity: f64,
}

fn lat_lng(lat: f64, lng: f64) -> Array {
    Array::of2(&lat.into(), &lng.into())
}

/// Render a descriptor as inline-styled markup for a div icon. Status
/// markers are a glowing badge with the count; the current-location
/// indicator is a dot inside a translucent ring.
pub fn descriptor_html(content: &VisualDescriptor) -> String {
    let size = content.size_px;
    let palette = content.palette;
    let (fr, fg, fb) = palette.fill;
    let (br, bg, bb) = palette.border;
    let (lr, lg, lb) = palette.label;
    let (gr, gg, gb) = palette.glow;

    if content.kind == MarkerKind::CurrentLocation {
        let dot = (size * 0.45).round();
        return format!(
            "<div style=\"width:{size}px;height:{size}px;border-radius:50%;background:{ring};display:flex;align-items:center;justify-content:center;\">\
             <div style=\"width:{dot}px;height:{dot}px;border-radius:50%;background:{fill};border:2px solid {border};\"></div>\
             </div>",
            ring = rgba_css(gr, gg, gb, 0.25),
            fill = rgba_css(fr, fg, fb, 1.0),
            border = rgba_css(br, bg, bb, 1.0),
        );
    }

    let scale = if content.scale != 1.0 {
        format!("transform:scale({});", content.scale)
    } else {
        String::new()
    };
    let glyph = content
        .glyph
        .map(|g| format!("<span style=\"font-size:{}px;line-height:1;\">{g}</span>", (size * 0.28).round()))
        .unwrap_or_default();
    format!(
        "<div style=\"width:{size}px;height:{size}px;border-radius:50%;background:{fill};border:2px solid {border};box-shadow:0 0 10px {glow};display:flex;flex-direction:column;align-items:center;justify-content:center;transition:transform 0.15s;{scale}\">\
         {glyph}<span style=\"color:{label};font-size:{font}px;font-weight:700;line-height:1;\">{text}</span>\
         </div>",
        fill = rgba_css(fr, fg, fb, 0.95),
        border = rgba_css(br, bg, bb, 1.0),
        glow = rgba_css(gr, gg, gb, 0.45),
        label = rgba_css(lr, lg, lb, 1.0),
        font = (size * 0.36).round(),
        text = content.label,
    )
}

fn div_icon(content: &VisualDescriptor) -> JsValue {
    let options = DivIconOptions {
        html: descriptor_html(content),
        class_name: "voltmap-marker",
        icon_size: [content.size_px, content.size_px],
        icon_anchor: [content.anchor.0, content.anchor.1],
    };
    serde_wasm_bindgen::to_value(&options)
        .map(|value| l_div_icon(&value))
        .unwrap_or(JsValue::NULL)
}

thread_local! {
    static ZOOM_BINDING: RefCell<Option<Closure<dyn Fn()>>> = const { RefCell::new(None) };
}

/// The engine's view of the external map. Cheap to clone; all fields are
/// handles into the same JS objects.
#[derive(Clone)]
pub struct JsMapWidget {
    map: LeafletMap,
}

impl JsMapWidget {
    /// Construct the map in `container` and attach the tile layer. The
    /// container element must already be in the DOM.
    pub fn create(container: &str, center: (f64, f64), zoom: f64, zoom_bounds: (f64, f64)) -> Self {
        let options = MapOptions {
            center: [center.0, center.1],
            zoom,
            min_zoom: zoom_bounds.0,
            max_zoom: zoom_bounds.1,
        };
        let map = l_map(
            container,
            &serde_wasm_bindgen::to_value(&options).unwrap_or(JsValue::NULL),
        );
        let tiles = l_tile_layer(
            TILE_URL,
            &serde_wasm_bindgen::to_value(&TileOptions {
                attribution: TILE_ATTRIBUTION,
            })
            .unwrap_or(JsValue::NULL),
        );
        tiles.add_tile_layer_to(&map);
        Self { map }
    }
}

pub struct JsMarkerHandle {
    marker: LeafletMarker,
    /// Event closures stay alive exactly as long as the handle.
    _listeners: Rc<Vec<Closure<dyn Fn()>>>,
}

impl MarkerHandle for JsMarkerHandle {
    fn set_icon(&self, content: &VisualDescriptor) {
        self.marker.set_marker_icon(&div_icon(content));
    }

    fn set_position(&self, lat: f64, lng: f64) {
        self.marker.set_marker_lat_lng(&lat_lng(lat, lng));
    }

    fn remove(&self) {
        self.marker.remove_marker();
    }
}

pub struct JsCircleHandle {
    circle: LeafletCircle,
}

impl CircleHandle for JsCircleHandle {
    fn set_center(&self, lat: f64, lng: f64) {
        self.circle.set_circle_lat_lng(&lat_lng(lat, lng));
    }

    fn set_radius(&self, meters: f64) {
        self.circle.set_circle_radius(meters);
    }

    fn remove(&self) {
        self.circle.remove_circle();
    }
}

impl MapWidget for JsMapWidget {
    type Marker = JsMarkerHandle;
    type Circle = JsCircleHandle;

    fn zoom(&self) -> f64 {
        self.map.get_zoom()
    }

    fn on_zoom_changed(&self, callback: Box<dyn Fn(f64)>) {
        let map = self.map.clone();
        let handler = Closure::<dyn Fn()>::new(move || callback(map.get_zoom()));
        self.map.on_map("zoomend", handler.as_ref().unchecked_ref());
        // Replace any previous listener binding; the app wires exactly one.
        ZOOM_BINDING.with(|slot| *slot.borrow_mut() = Some(handler));
    }

    fn add_marker(
        &self,
        lat: f64,
        lng: f64,
        content: &VisualDescriptor,
        callbacks: MarkerCallbacks,
    ) -> JsMarkerHandle {
        let options = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&options, &"icon".into(), &div_icon(content));
        let marker = l_marker(&lat_lng(lat, lng), &options);
        marker.add_marker_to(&self.map);

        let mut listeners = Vec::new();
        let mut wire = |event: &str, hook: Option<Box<dyn Fn()>>| {
            if let Some(hook) = hook {
                let closure = Closure::<dyn Fn()>::new(move || hook());
                marker.on_marker(event, closure.as_ref().unchecked_ref());
                listeners.push(closure);
            }
        };
        wire("click", callbacks.on_click);
        wire("mouseover", callbacks.on_enter);
        wire("mouseout", callbacks.on_leave);

        JsMarkerHandle {
            marker,
            _listeners: Rc::new(listeners),
        }
    }

    fn add_circle(&self, lat: f64, lng: f64, radius_meters: f64) -> JsCircleHandle {
        let palette = crate::colors::LOCATION_PALETTE;
        let (r, g, b) = palette.fill;
        let options = CircleOptions {
            radius: radius_meters,
            color: rgba_css(r, g, b, 0.5),
            weight: 1.0,
            fill_color: rgba_css(r, g, b, 1.0),
            fill_opacity: 0.12,
        };
        let circle = l_circle(
            &lat_lng(lat, lng),
            &serde_wasm_bindgen::to_value(&options).unwrap_or(JsValue::NULL),
        );
        circle.add_circle_to(&self.map);
        JsCircleHandle { circle }
    }
}
