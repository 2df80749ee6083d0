use crate::content::VisualDescriptor;

/// Interaction hooks wired onto a marker at creation time. Each closure
/// captures its payload up front; none of them may hold an engine borrow.
#[derive(Default)]
pub struct MarkerCallbacks {
    pub on_click: Option<Box<dyn Fn()>>,
    pub on_enter: Option<Box<dyn Fn()>>,
    pub on_leave: Option<Box<dyn Fn()>>,
}

pub trait MarkerHandle {
    /// Replace the marker's rendered content in place.
    fn set_icon(&self, content: &VisualDescriptor);
    fn set_position(&self, lat: f64, lng: f64);
    /// Detach from the map and release the native object.
    fn remove(&self);
}

pub trait CircleHandle {
    fn set_center(&self, lat: f64, lng: f64);
    fn set_radius(&self, meters: f64);
    fn remove(&self);
}

/// The opaque map surface. Pan, zoom, tiles, and projection are the
/// widget's business; the engine only needs the current zoom, a zoom-change
/// hook, and marker/circle lifecycle primitives.
pub trait MapWidget {
    type Marker: MarkerHandle;
    type Circle: CircleHandle;

    fn zoom(&self) -> f64;
    fn on_zoom_changed(&self, callback: Box<dyn Fn(f64)>);
    fn add_marker(
        &self,
        lat: f64,
        lng: f64,
        content: &VisualDescriptor,
        callbacks: MarkerCallbacks,
    ) -> Self::Marker;
    fn add_circle(&self, lat: f64, lng: f64, radius_meters: f64) -> Self::Circle;
}

/// Recording fake used by the engine and tracker tests. Every widget
/// mutation lands in a shared op log so tests can assert exact lifecycle
/// sequences; stored callbacks let tests fire interactions by hand.
#[cfg(test)]
pub(crate) mod mock {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::{CircleHandle, MapWidget, MarkerCallbacks, MarkerHandle};
    use crate::content::VisualDescriptor;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        AddMarker(u32),
        SetIcon(u32),
        SetPosition(u32),
        RemoveMarker(u32),
        AddCircle(u32),
        SetCenter(u32),
        SetRadius(u32),
        RemoveCircle(u32),
    }

    #[derive(Default)]
    pub struct Log {
        pub ops: Vec<Op>,
        pub next_id: u32,
        pub live_markers: Vec<u32>,
        pub live_circles: Vec<u32>,
        pub callbacks: HashMap<u32, Rc<MarkerCallbacks>>,
    }

    #[derive(Clone)]
    pub struct MockWidget {
        pub log: Rc<RefCell<Log>>,
        pub zoom: f64,
    }

    impl MockWidget {
        pub fn new(zoom: f64) -> Self {
            Self {
                log: Rc::new(RefCell::new(Log::default())),
                zoom,
            }
        }

        pub fn ops(&self) -> Vec<Op> {
            self.log.borrow().ops.clone()
        }

        pub fn live_marker_ids(&self) -> Vec<u32> {
            self.log.borrow().live_markers.clone()
        }

        fn callbacks_for(&self, marker_id: u32) -> Rc<MarkerCallbacks> {
            // Clone out of the log so a handler can mutate the widget
            // without hitting a nested borrow.
            self.log
                .borrow()
                .callbacks
                .get(&marker_id)
                .cloned()
                .expect("marker should exist")
        }

        pub fn click(&self, marker_id: u32) {
            if let Some(on_click) = &self.callbacks_for(marker_id).on_click {
                on_click();
            }
        }

        pub fn pointer_enter(&self, marker_id: u32) {
            if let Some(on_enter) = &self.callbacks_for(marker_id).on_enter {
                on_enter();
            }
        }

        pub fn pointer_leave(&self, marker_id: u32) {
            if let Some(on_leave) = &self.callbacks_for(marker_id).on_leave {
                on_leave();
            }
        }

        pub fn has_hover_callbacks(&self, marker_id: u32) -> bool {
            let log = self.log.borrow();
            log.callbacks
                .get(&marker_id)
                .map(|c| c.on_enter.is_some() && c.on_leave.is_some())
                .unwrap_or(false)
        }
    }

    pub struct MockMarker {
        pub id: u32,
        log: Rc<RefCell<Log>>,
    }

    impl MarkerHandle for MockMarker {
        fn set_icon(&self, _content: &VisualDescriptor) {
            self.log.borrow_mut().ops.push(Op::SetIcon(self.id));
        }

        fn set_position(&self, _lat: f64, _lng: f64) {
            self.log.borrow_mut().ops.push(Op::SetPosition(self.id));
        }

        fn remove(&self) {
            let mut log = self.log.borrow_mut();
            log.ops.push(Op::RemoveMarker(self.id));
            log.live_markers.retain(|&id| id != self.id);
        }
    }

    pub struct MockCircle {
        pub id: u32,
        log: Rc<RefCell<Log>>,
    }

    impl CircleHandle for MockCircle {
        fn set_center(&self, _lat: f64, _lng: f64) {
            self.log.borrow_mut().ops.push(Op::SetCenter(self.id));
        }

        fn set_radius(&self, _meters: f64) {
            self.log.borrow_mut().ops.push(Op::SetRadius(self.id));
        }

        fn remove(&self) {
            let mut log = self.log.borrow_mut();
            log.ops.push(Op::RemoveCircle(self.id));
            log.live_circles.retain(|&id| id != self.id);
        }
    }

    impl MapWidget for MockWidget {
        type Marker = MockMarker;
        type Circle = MockCircle;

        fn zoom(&self) -> f64 {
            self.zoom
        }

        fn on_zoom_changed(&self, _callback: Box<dyn Fn(f64)>) {
            // Tests drive zoom through the engine directly.
        }

        fn add_marker(
            &self,
            _lat: f64,
            _lng: f64,
            _content: &VisualDescriptor,
            callbacks: MarkerCallbacks,
        ) -> MockMarker {
            let mut log = self.log.borrow_mut();
            let id = log.next_id;
            log.next_id += 1;
            log.ops.push(Op::AddMarker(id));
            log.live_markers.push(id);
            log.callbacks.insert(id, Rc::new(callbacks));
            MockMarker {
                id,
                log: Rc::clone(&self.log),
            }
        }

        fn add_circle(&self, _lat: f64, _lng: f64, _radius_meters: f64) -> MockCircle {
            let mut log = self.log.borrow_mut();
            let id = log.next_id;
            log.next_id += 1;
            log.ops.push(Op::AddCircle(id));
            log.live_circles.push(id);
            MockCircle {
                id,
                log: Rc::clone(&self.log),
            }
        }
    }
}
