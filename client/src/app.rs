use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use gloo_storage::Storage;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use voltmap_shared::{MapEvent, Station};

use crate::boot::{self, BootState};
use crate::colors::rgba_css;
use crate::events;
use crate::feed::{self, FeedStatus};
use crate::js_map::JsMapWidget;
use crate::locate::{GeolocationSource, PositionTracker};
use crate::markers::MarkerEngine;
use crate::widget::MapWidget;

pub(crate) const MAP_CONTAINER_ID: &str = "voltmap-map";
pub(crate) const DEFAULT_CENTER: (f64, f64) = (37.5665, 126.9780);
pub(crate) const DEFAULT_ZOOM: f64 = 13.0;
pub(crate) const ZOOM_BOUNDS: (f64, f64) = (7.0, 19.0);

/// Newtype wrappers so same-shaped signals stay distinct in Leptos context.
#[derive(Clone, Copy)]
pub(crate) struct Hovered(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct Selected(pub RwSignal<Option<Station>>);
#[derive(Clone, Copy)]
pub(crate) struct TrackLocation(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct LastUpdated(pub RwSignal<Option<DateTime<Utc>>>);

type Engine = MarkerEngine<JsMapWidget>;
type Tracker = PositionTracker<JsMapWidget, GeolocationSource>;

thread_local! {
    static ENGINE: RefCell<Option<Engine>> = const { RefCell::new(None) };
    static TRACKER: RefCell<Option<Tracker>> = const { RefCell::new(None) };
}

fn with_engine(f: impl FnOnce(&mut Engine)) {
    ENGINE.with(|slot| {
        if let Some(engine) = slot.borrow_mut().as_mut() {
            f(engine);
        }
    });
}

fn with_tracker(f: impl FnOnce(&mut Tracker)) {
    TRACKER.with(|slot| {
        if let Some(tracker) = slot.borrow_mut().as_mut() {
            f(tracker);
        }
    });
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct Settings {
    track_location: bool,
    last_zoom: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            track_location: false,
            last_zoom: DEFAULT_ZOOM,
        }
    }
}

/// Root application component. Provides global reactive signals via
/// context, boots the map widget, and keeps the marker engine fed.
#[component]
pub fn App() -> impl IntoView {
    let saved: Settings = gloo_storage::LocalStorage::get("voltmap_settings").unwrap_or_default();

    let stations: RwSignal<Vec<Station>> = RwSignal::new(Vec::new());
    let zoom: RwSignal<f64> = RwSignal::new(saved.last_zoom);
    let hovered: RwSignal<Option<String>> = RwSignal::new(None);
    let selected: RwSignal<Option<Station>> = RwSignal::new(None);
    let track_location: RwSignal<bool> = RwSignal::new(saved.track_location);
    let feed_status: RwSignal<FeedStatus> = RwSignal::new(FeedStatus::Connecting);
    let last_updated: RwSignal<Option<DateTime<Utc>>> = RwSignal::new(None);
    let boot_state: RwSignal<BootState> = RwSignal::new(BootState::new());

    provide_context(stations);
    provide_context(zoom);
    provide_context(feed_status);
    provide_context(boot_state);
    provide_context(Hovered(hovered));
    provide_context(Selected(selected));
    provide_context(TrackLocation(track_location));
    provide_context(LastUpdated(last_updated));

    // Persist settings to localStorage on any change.
    Effect::new(move || {
        let settings = Settings {
            track_location: track_location.get(),
            last_zoom: zoom.get(),
        };
        let _ = gloo_storage::LocalStorage::set("voltmap_settings", &settings);
    });

    // Boot: wait for the map library, construct the widget, stand up the
    // engine and tracker, then start the feed.
    Effect::new(move || {
        spawn_local(async move {
            if !boot::wait_for_map_library().await {
                boot_state.set(BootState::Failed);
                return;
            }

            let widget = JsMapWidget::create(
                MAP_CONTAINER_ID,
                DEFAULT_CENTER,
                zoom.get_untracked(),
                ZOOM_BOUNDS,
            );
            widget.on_zoom_changed(Box::new(move |level| zoom.set(level)));

            let sink = Rc::new(move |event: MapEvent| {
                if let MapEvent::StationClicked { station } = &event {
                    selected.set(Some(station.clone()));
                }
                events::broadcast(&event);
            });
            let hover_sink = Rc::new(move |id: Option<String>| hovered.set(id));

            let engine = MarkerEngine::new(widget.clone(), sink, hover_sink);
            ENGINE.with(|slot| *slot.borrow_mut() = Some(engine));
            TRACKER.with(|slot| {
                *slot.borrow_mut() = Some(PositionTracker::new(widget, GeolocationSource))
            });

            boot_state.set(BootState::Ready);
            events::broadcast(&MapEvent::MapReady);
            crate::log::info("Map ready; marker engine attached.");
            feed::connect(stations, last_updated, feed_status);
        });
    });

    // Re-render whenever the station list changes (and once on Ready).
    Effect::new(move || {
        if boot_state.get() != BootState::Ready {
            return;
        }
        let list = stations.get();
        with_engine(|engine| engine.set_stations(list));
    });

    // Zoom changes invalidate the render plan.
    Effect::new(move || {
        if boot_state.get() != BootState::Ready {
            return;
        }
        let level = zoom.get();
        with_engine(|engine| engine.set_zoom(level));
    });

    // Hover transitions are content-only; the engine touches icons in place.
    Effect::new(move || {
        if boot_state.get() != BootState::Ready {
            return;
        }
        let id = hovered.get();
        with_engine(|engine| engine.set_hovered(id));
    });

    // Location tracking follows the toggle.
    Effect::new(move || {
        if boot_state.get() != BootState::Ready {
            return;
        }
        let tracking = track_location.get();
        with_tracker(|tracker| {
            if tracking {
                tracker.start();
            } else {
                tracker.stop();
            }
        });
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative; overflow: hidden;">
            <div
                id=MAP_CONTAINER_ID
                style="width: 100%; height: 100%; background: #dde3e8;"
            ></div>
            <StatusBar />
            <StationCard />
            {move || {
                (boot_state.get() == BootState::Failed).then(|| view! {
                    <div style="position: absolute; inset: 0; z-index: 20; display: flex; align-items: center; justify-content: center; background: rgba(20,22,30,0.7); color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif; font-size: 0.9rem;">
                        "Map failed to load. Check the map library script and reload."
                    </div>
                })
            }}
        </div>
    }
}

/// Feed status, last refresh time, and the locate toggle.
#[component]
fn StatusBar() -> impl IntoView {
    let feed_status: RwSignal<FeedStatus> = expect_context();
    let LastUpdated(last_updated) = expect_context();
    let TrackLocation(track_location) = expect_context();

    let dot_color = move || match feed_status.get() {
        FeedStatus::Connecting => "#f5c542",
        FeedStatus::Live => "#2ecc71",
        FeedStatus::Stale => "#eb5757",
    };
    let updated_text = move || {
        last_updated
            .get()
            .map(|ts| format!("updated {}", ts.format("%H:%M:%S")))
            .unwrap_or_else(|| "waiting for data".to_string())
    };

    view! {
        <div style="position: absolute; top: 12px; left: 12px; z-index: 10; display: flex; align-items: center; gap: 8px; background: #161921; border: 1px solid #282c3e; border-radius: 6px; padding: 6px 10px; font-family: 'JetBrains Mono', monospace; font-size: 0.68rem; color: #9f9a95;">
            <span style=move || format!("width: 7px; height: 7px; border-radius: 50%; background: {};", dot_color())></span>
            <span>{move || feed_status.get().label()}</span>
            <span style="color: #5f5d65;">{updated_text}</span>
            <button
                style=move || format!(
                    "border: 1px solid {}; background: #1a1d2a; color: {}; border-radius: 4px; padding: 2px 8px; cursor: pointer; font-family: inherit; font-size: inherit;",
                    if track_location.get() { "rgba(66,133,244,0.5)" } else { "#282c3e" },
                    if track_location.get() { "#4285f4" } else { "#9f9a95" },
                )
                on:click=move |_| track_location.update(|v| *v = !*v)
            >"locate"</button>
        </div>
    }
}

/// Detail card for the hovered (or last clicked) station.
#[component]
fn StationCard() -> impl IntoView {
    let stations: RwSignal<Vec<Station>> = expect_context();
    let Hovered(hovered) = expect_context();
    let Selected(selected) = expect_context();

    let card_station = Memo::new(move |_| {
        if let Some(id) = hovered.get() {
            let list = stations.get();
            if let Some(station) = list.iter().find(|s| s.id == id) {
                return Some(station.clone());
            }
        }
        selected.get()
    });

    view! {
        {move || {
            card_station.get().map(|station| {
                let palette = crate::colors::status_palette(station.status);
                let (r, g, b) = palette.fill;
                view! {
                    <div style="position: absolute; bottom: 16px; left: 12px; z-index: 10; background: #161921; border: 1px solid #282c3e; border-radius: 6px; overflow: hidden; display: flex; max-width: 260px;">
                        <div style=format!("width: 3px; flex-shrink: 0; background: {};", rgba_css(r, g, b, 0.9))></div>
                        <div style="padding: 8px 12px;">
                            <div style="font-family: 'Inter', system-ui, sans-serif; font-size: 0.8rem; font-weight: 600; color: #e2e0d8;">
                                {station.name.clone()}
                            </div>
                            <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.65rem; color: #9f9a95; margin-top: 3px;">
                                {station.status.label()}
                                " \u{00B7} "
                                {station.available_slots}
                                " slots free"
                            </div>
                        </div>
                    </div>
                }
            })
        }}
    }
}
