use crate::api::ApiClient;
use crate::platform::HostBridge;
use crate::settings::{language_pack_path, parse_language_pack, PluginSettings, SETTINGS_FILE};
use leptos::logging::{error, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsValue;

/// Where settings and language packs come from.
pub(crate) trait SettingsBackend {
    async fn load_settings(&self) -> PluginSettings;

    async fn save_settings(&self, settings: &PluginSettings);

    /// `None` when the pack cannot be loaded or is empty.
    async fn load_language_pack(&self, lang: &str) -> Option<HashMap<String, String>>;
}

/// [`SettingsBackend`] over the host data store and the plugin's bundled files.
pub(crate) struct HostStorage {
    bridge: HostBridge,
    api: Rc<ApiClient>,
}

impl HostStorage {
    pub fn new(bridge: HostBridge, api: Rc<ApiClient>) -> Self {
        Self { bridge, api }
    }
}

impl SettingsBackend for HostStorage {
    async fn load_settings(&self) -> PluginSettings {
        load_settings(&self.bridge).await
    }

    async fn save_settings(&self, settings: &PluginSettings) {
        save_settings(&self.bridge, settings).await
    }

    async fn load_language_pack(&self, lang: &str) -> Option<HashMap<String, String>> {
        load_language_pack(&self.api, lang).await
    }
}

/// Settings from whatever the host data store handed back.
///
/// The store returns parsed JSON for `.json` files but older hosts hand back the raw text.
pub(crate) fn decode_stored_settings(stored: &Value) -> PluginSettings {
    match stored {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed) => PluginSettings::merge_stored(&parsed),
            Err(_) => PluginSettings::default(),
        },
        other => PluginSettings::merge_stored(other),
    }
}

/// Flat string table out of the host's i18n object. Nested or non-string entries are skipped.
pub(crate) fn host_strings(value: &Value) -> HashMap<String, String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn js_to_json(value: JsValue) -> Value {
    if value.is_null() || value.is_undefined() {
        return Value::Null;
    }
    serde_wasm_bindgen::from_value(value).unwrap_or(Value::Null)
}

pub(crate) fn load_host_i18n(bridge: &HostBridge) -> HashMap<String, String> {
    host_strings(&js_to_json(bridge.i18n()))
}

async fn load_settings(bridge: &HostBridge) -> PluginSettings {
    match bridge.load_data(SETTINGS_FILE).await {
        Ok(value) => decode_stored_settings(&js_to_json(value)),
        Err(e) => {
            warn!("[SettingService] Failed to load settings, using defaults: {e:?}");
            PluginSettings::default()
        }
    }
}

async fn save_settings(bridge: &HostBridge, settings: &PluginSettings) {
    let value = match serde_wasm_bindgen::to_value(settings) {
        Ok(v) => v,
        Err(e) => {
            error!("[SettingService] Failed to encode settings: {e}");
            return;
        }
    };
    if let Err(e) = bridge.save_data(SETTINGS_FILE, value).await {
        error!("[SettingService] Failed to save settings: {e:?}");
    }
}

async fn load_language_pack(
    api: &ApiClient,
    lang: &str,
) -> Option<HashMap<String, String>> {
    match api.fetch_text(&language_pack_path(lang)).await {
        Ok(text) => {
            let pack = parse_language_pack(&text);
            if pack.is_empty() {
                warn!("[SettingService] Language pack {lang} is empty");
                None
            } else {
                Some(pack)
            }
        }
        Err(e) => {
            warn!("[SettingService] Failed to load language pack {lang}: {e}");
            None
        }
    }
}
