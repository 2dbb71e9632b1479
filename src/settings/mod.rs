pub(crate) mod dialog;

use crate::render::{NavLabels, Spacing};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;

pub(crate) const PLUGIN_NAME: &str = "page-nav";
pub(crate) const SETTINGS_FILE: &str = "settings.json";
pub(crate) const LANGUAGE_AUTO: &str = "auto";

/// Where the navigation is attached relative to the document content.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum LayoutMode {
    #[default]
    Bottom,
    Side,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PluginSettings {
    /// Pixels, kept as typed by the user.
    pub margin_top: String,
    pub margin_bottom: String,
    /// `auto` follows the host language; anything else names a bundled language pack.
    pub language: String,
    pub layout_mode: LayoutMode,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            margin_top: "0".to_string(),
            margin_bottom: "0".to_string(),
            language: LANGUAGE_AUTO.to_string(),
            layout_mode: LayoutMode::Bottom,
        }
    }
}

fn margin_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl PluginSettings {
    /// Overlay whatever subset of keys was stored onto the defaults.
    ///
    /// A key with an unusable value keeps its default instead of discarding the whole blob.
    pub fn merge_stored(stored: &Value) -> Self {
        let mut settings = Self::default();
        let Some(map) = stored.as_object() else {
            return settings;
        };

        if let Some(v) = map.get("marginTop").and_then(margin_value) {
            settings.margin_top = v;
        }
        if let Some(v) = map.get("marginBottom").and_then(margin_value) {
            settings.margin_bottom = v;
        }
        if let Some(v) = map
            .get("language")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            settings.language = v.to_string();
        }
        if let Some(mode) = map
            .get("layoutMode")
            .and_then(|v| serde_json::from_value::<LayoutMode>(v.clone()).ok())
        {
            settings.layout_mode = mode;
        }

        settings
    }

    pub fn spacing(&self) -> Spacing {
        Spacing {
            margin_top: self.margin_top.clone(),
            margin_bottom: self.margin_bottom.clone(),
        }
    }

    pub fn uses_language_pack(&self) -> bool {
        self.language != LANGUAGE_AUTO
    }
}

/// Path of a bundled language pack, relative to the kernel origin.
pub(crate) fn language_pack_path(lang: &str) -> String {
    format!(
        "/plugins/{PLUGIN_NAME}/i18n/{}.yaml",
        urlencoding::encode(lang)
    )
}

/// Parse a flat `key: value` language pack. Values may themselves contain `:`.
pub(crate) fn parse_language_pack(text: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        out.insert(key.to_string(), value.to_string());
    }
    out
}

#[derive(Clone, Debug, Default)]
pub(crate) struct I18n {
    host: HashMap<String, String>,
    manual: Option<HashMap<String, String>>,
}

impl I18n {
    pub fn new(host: HashMap<String, String>) -> Self {
        Self { host, manual: None }
    }

    /// Manual pack first, then the host strings, then the key itself.
    pub fn t(&self, key: &str) -> String {
        self.manual
            .as_ref()
            .and_then(|m| m.get(key))
            .or_else(|| self.host.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Live settings plus translations, shared by the renderer and the settings dialog.
#[derive(Debug, Default)]
pub(crate) struct SettingsStore {
    settings: RefCell<PluginSettings>,
    i18n: RefCell<I18n>,
}

impl SettingsStore {
    pub fn new(settings: PluginSettings, i18n: I18n) -> Self {
        Self {
            settings: RefCell::new(settings),
            i18n: RefCell::new(i18n),
        }
    }

    pub fn settings(&self) -> PluginSettings {
        self.settings.borrow().clone()
    }

    pub fn replace(&self, settings: PluginSettings) {
        *self.settings.borrow_mut() = settings;
    }

    pub fn update(&self, f: impl FnOnce(&mut PluginSettings)) {
        f(&mut self.settings.borrow_mut());
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.settings.borrow().layout_mode
    }

    pub fn spacing(&self) -> Spacing {
        self.settings.borrow().spacing()
    }

    pub fn set_language_pack(&self, pack: Option<HashMap<String, String>>) {
        self.i18n.borrow_mut().manual = pack;
    }

    pub fn t(&self, key: &str) -> String {
        self.i18n.borrow().t(key)
    }

    pub fn labels(&self) -> NavLabels {
        NavLabels {
            prev: self.t("prevPage"),
            next: self.t("nextPage"),
        }
    }
}
