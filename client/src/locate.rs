use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::content::{CURRENT_LOCATION_SIZE_PX, current_location_content};
use crate::widget::{CircleHandle, MapWidget, MarkerCallbacks, MarkerHandle};

/// Fixes older than this are not acceptable as "current".
pub const FIX_MAX_AGE_MS: u32 = 5_000;
/// A fix must arrive within this window or the attempt counts as failed.
pub const FIX_TIMEOUT_MS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub lat: f64,
    pub lng: f64,
    /// Radius in meters, when the device reports one.
    pub accuracy: Option<f64>,
}

/// Continuous position capability. The browser Geolocation API in
/// production; a hand-driven fake in tests.
pub trait LocationSource {
    type Watch;

    fn watch(
        &self,
        on_fix: Box<dyn Fn(PositionFix)>,
        on_error: Box<dyn Fn(String)>,
    ) -> Result<Self::Watch, String>;

    fn clear(&self, watch: Self::Watch);
}

struct TrackerState<W: MapWidget> {
    marker: Option<W::Marker>,
    circle: Option<W::Circle>,
    /// Set by `stop()`; a fix delivered after stop must be discarded.
    stopped: bool,
}

/// Maintains the single current-location marker and its accuracy circle,
/// both updated in place per fix rather than recreated. Lifecycle is
/// independent of the station markers; callers start and stop it
/// explicitly. Every failure mode degrades to "no location marker".
pub struct PositionTracker<W: MapWidget + Clone + 'static, S: LocationSource> {
    widget: W,
    source: S,
    watch: Option<S::Watch>,
    state: Rc<RefCell<TrackerState<W>>>,
}

impl<W: MapWidget + Clone + 'static, S: LocationSource> PositionTracker<W, S> {
    pub fn new(widget: W, source: S) -> Self {
        Self {
            widget,
            source,
            watch: None,
            state: Rc::new(RefCell::new(TrackerState {
                marker: None,
                circle: None,
                stopped: false,
            })),
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_running(&self) -> bool {
        self.watch.is_some()
    }

    pub fn start(&mut self) {
        if self.watch.is_some() {
            return;
        }
        self.state.borrow_mut().stopped = false;

        let state = Rc::clone(&self.state);
        let widget = self.widget.clone();
        let on_fix = Box::new(move |fix: PositionFix| {
            let mut state = state.borrow_mut();
            if state.stopped {
                return;
            }
            apply_fix(&widget, &mut state, &fix);
        });
        let on_error = Box::new(|err: String| {
            crate::log::warn(&format!("Location unavailable: {err}"));
        });

        match self.source.watch(on_fix, on_error) {
            Ok(watch) => self.watch = Some(watch),
            Err(err) => {
                crate::log::warn(&format!("Location subscription failed: {err}"));
            }
        }
    }

    /// Synchronously cancel the subscription and remove both artifacts.
    pub fn stop(&mut self) {
        if let Some(watch) = self.watch.take() {
            self.source.clear(watch);
        }
        let mut state = self.state.borrow_mut();
        state.stopped = true;
        if let Some(marker) = state.marker.take() {
            marker.remove();
        }
        if let Some(circle) = state.circle.take() {
            circle.remove();
        }
    }
}

fn apply_fix<W: MapWidget>(widget: &W, state: &mut TrackerState<W>, fix: &PositionFix) {
    match &state.marker {
        Some(marker) => marker.set_position(fix.lat, fix.lng),
        None => {
            let content = current_location_content(CURRENT_LOCATION_SIZE_PX);
            state.marker =
                Some(widget.add_marker(fix.lat, fix.lng, &content, MarkerCallbacks::default()));
        }
    }
    if let Some(radius) = fix.accuracy {
        match &state.circle {
            Some(circle) => {
                circle.set_center(fix.lat, fix.lng);
                circle.set_radius(radius);
            }
            None => state.circle = Some(widget.add_circle(fix.lat, fix.lng, radius)),
        }
    }
}

/// Browser Geolocation behind the `LocationSource` seam. High accuracy is
/// requested; denial or absence surfaces only through `on_error`.
pub struct GeolocationSource;

pub struct GeolocationWatch {
    id: i32,
    _on_fix: Closure<dyn Fn(web_sys::Position)>,
    _on_error: Closure<dyn Fn(web_sys::PositionError)>,
}

impl LocationSource for GeolocationSource {
    type Watch = GeolocationWatch;

    fn watch(
        &self,
        on_fix: Box<dyn Fn(PositionFix)>,
        on_error: Box<dyn Fn(String)>,
    ) -> Result<GeolocationWatch, String> {
        let window = web_sys::window().ok_or("no window")?;
        let geolocation = window
            .navigator()
            .geolocation()
            .map_err(|_| "geolocation unavailable".to_string())?;

        let success = Closure::<dyn Fn(web_sys::Position)>::new(move |pos: web_sys::Position| {
            let coords = pos.coords();
            let accuracy = coords.accuracy();
            on_fix(PositionFix {
                lat: coords.latitude(),
                lng: coords.longitude(),
                accuracy: (accuracy.is_finite() && accuracy > 0.0).then_some(accuracy),
            });
        });
        let error =
            Closure::<dyn Fn(web_sys::PositionError)>::new(move |err: web_sys::PositionError| {
                on_error(err.message());
            });

        let options = web_sys::PositionOptions::new();
        options.set_enable_high_accuracy(true);
        options.set_maximum_age(FIX_MAX_AGE_MS);
        options.set_timeout(FIX_TIMEOUT_MS);

        let id = geolocation
            .watch_position_with_error_callback_and_options(
                success.as_ref().unchecked_ref(),
                Some(error.as_ref().unchecked_ref()),
                &options,
            )
            .map_err(|_| "watchPosition rejected".to_string())?;

        Ok(GeolocationWatch {
            id,
            _on_fix: success,
            _on_error: error,
        })
    }

    fn clear(&self, watch: GeolocationWatch) {
        if let Some(window) = web_sys::window()
            && let Ok(geolocation) = window.navigator().geolocation()
        {
            geolocation.clear_watch(watch.id);
        }
    }
}
