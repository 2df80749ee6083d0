use wasm_bindgen::JsValue;

pub const BOOT_POLL_INTERVAL_MS: u32 = 200;
pub const MAX_BOOT_ATTEMPTS: u32 = 50;

/// Startup wait for the external map library, which arrives via a script
/// tag and may not be present when the app mounts. `Failed` is terminal:
/// the map stays uninitialized and nothing renders, but the app keeps
/// running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootState {
    Waiting { attempts: u32 },
    Ready,
    Failed,
}

impl BootState {
    pub const fn new() -> Self {
        Self::Waiting { attempts: 0 }
    }

    /// Advance by one poll tick. Terminal states absorb further ticks.
    pub fn step(self, library_present: bool) -> Self {
        match self {
            Self::Waiting { attempts } => {
                if library_present {
                    Self::Ready
                } else if attempts + 1 >= MAX_BOOT_ATTEMPTS {
                    Self::Failed
                } else {
                    Self::Waiting {
                        attempts: attempts + 1,
                    }
                }
            }
            done => done,
        }
    }
}

impl Default for BootState {
    fn default() -> Self {
        Self::new()
    }
}

/// Probe for the global `L` namespace the map library installs.
pub fn library_present() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    js_sys::Reflect::get(window.as_ref(), &JsValue::from_str("L"))
        .map(|value| value.is_object())
        .unwrap_or(false)
}

/// Poll until the map library is available or the attempt cap is hit.
/// Returns `true` on Ready; logs and returns `false` on Failed.
pub async fn wait_for_map_library() -> bool {
    let mut state = BootState::new();
    loop {
        state = state.step(library_present());
        match state {
            BootState::Ready => return true,
            BootState::Failed => {
                crate::log::warn("Map library did not load; leaving the map uninitialized.");
                return false;
            }
            BootState::Waiting { .. } => {
                gloo_timers::future::TimeoutFuture::new(BOOT_POLL_INTERVAL_MS).await;
            }
        }
    }
}
