use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    /// The host plugin instance, handed over by the JS loader.
    ///
    /// Only the handful of members the add-on needs are bound here.
    #[derive(Clone, Debug)]
    pub type HostBridge;

    #[wasm_bindgen(method, getter)]
    pub(crate) fn i18n(this: &HostBridge) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = loadData)]
    pub(crate) async fn load_data(this: &HostBridge, storage_name: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = saveData)]
    pub(crate) async fn save_data(
        this: &HostBridge,
        storage_name: &str,
        data: JsValue,
    ) -> Result<JsValue, JsValue>;

    /// Desktop tab opening (`openTab({ app, doc: { id } })` on the JS side).
    #[wasm_bindgen(method, js_name = openTab)]
    pub(crate) fn open_tab(this: &HostBridge, doc_id: &str);
}

const OPEN_BY_URI_BRIDGE: &str = "openFileByURL";

pub(crate) fn block_uri(doc_id: &str) -> String {
    format!("siyuan://blocks/{doc_id}")
}

/// Host capabilities the navigation depends on.
pub(crate) trait Platform {
    fn is_mobile(&self) -> bool;

    fn has_open_by_uri_bridge(&self) -> bool;

    fn open_tab(&self, doc_id: &str);

    /// Dispatch a `siyuan://` URI through the mobile bridge. `false` when the bridge refused it.
    fn open_by_uri(&self, uri: &str) -> bool;
}

pub(crate) struct WebPlatform {
    bridge: HostBridge,
}

impl WebPlatform {
    pub fn new(bridge: HostBridge) -> Self {
        Self { bridge }
    }

    fn open_by_uri_fn() -> Option<js_sys::Function> {
        let window = web_sys::window()?;
        js_sys::Reflect::get(&window, &OPEN_BY_URI_BRIDGE.into())
            .ok()?
            .dyn_into::<js_sys::Function>()
            .ok()
    }
}

impl Platform for WebPlatform {
    fn is_mobile(&self) -> bool {
        // Only the mobile frontend has a `#sidebar` element.
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("sidebar"))
            .is_some()
    }

    fn has_open_by_uri_bridge(&self) -> bool {
        Self::open_by_uri_fn().is_some()
    }

    fn open_tab(&self, doc_id: &str) {
        self.bridge.open_tab(doc_id);
    }

    fn open_by_uri(&self, uri: &str) -> bool {
        let Some(open) = Self::open_by_uri_fn() else {
            return false;
        };
        match open.call1(&JsValue::NULL, &JsValue::from_str(uri)) {
            // Older hosts return nothing; only an explicit `false` is a refusal.
            Ok(ret) => ret.as_bool() != Some(false),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Platform;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    pub(crate) struct FakePlatform {
        pub mobile: Cell<bool>,
        pub bridge_present: Cell<bool>,
        pub bridge_accepts: Cell<bool>,
        pub opened_tabs: RefCell<Vec<String>>,
        pub opened_uris: RefCell<Vec<String>>,
    }

    impl FakePlatform {
        pub fn desktop() -> Self {
            Self::default()
        }

        pub fn mobile(bridge_present: bool, bridge_accepts: bool) -> Self {
            let p = Self::default();
            p.mobile.set(true);
            p.bridge_present.set(bridge_present);
            p.bridge_accepts.set(bridge_accepts);
            p
        }

        pub fn open_count(&self) -> usize {
            self.opened_tabs.borrow().len() + self.opened_uris.borrow().len()
        }
    }

    impl Platform for FakePlatform {
        fn is_mobile(&self) -> bool {
            self.mobile.get()
        }

        fn has_open_by_uri_bridge(&self) -> bool {
            self.bridge_present.get()
        }

        fn open_tab(&self, doc_id: &str) {
            self.opened_tabs.borrow_mut().push(doc_id.to_string());
        }

        fn open_by_uri(&self, uri: &str) -> bool {
            self.opened_uris.borrow_mut().push(uri.to_string());
            self.bridge_accepts.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_uri() {
        assert_eq!(
            block_uri("20240101120000-abcdefg"),
            "siyuan://blocks/20240101120000-abcdefg"
        );
    }
}
