mod util;

mod api;
mod app;
mod components;
mod documents;
mod editor;
mod events;
mod keyboard;
mod models;
mod navigation;
mod platform;
mod render;
mod settings;
mod storage;

pub use app::PageNavPlugin;
pub use platform::HostBridge;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
}
