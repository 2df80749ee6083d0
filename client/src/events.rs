use voltmap_shared::MapEvent;

/// DOM event name the host page listens on for engine notifications.
pub const EVENT_NAME: &str = "voltmap:event";

/// Broadcast an engine event to host-page listeners as a CustomEvent with
/// the serialized payload in `detail`. Serialization or dispatch failures
/// drop the event; the in-process sink has already seen it.
pub fn broadcast(event: &MapEvent) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(detail) = serde_wasm_bindgen::to_value(event) else {
        return;
    };
    let init = web_sys::CustomEventInit::new();
    init.set_detail(&detail);
    let Ok(custom) = web_sys::CustomEvent::new_with_event_init_dict(EVENT_NAME, &init) else {
        return;
    };
    let _ = window.dispatch_event(&custom);
}
