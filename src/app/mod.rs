use crate::api::{ApiClient, DocTreeSource};
use crate::documents::DocumentService;
use crate::editor::{EditorDom, WebEditorDom};
use crate::events::should_refresh;
use crate::keyboard::{KeyboardMonitor, KeyboardWatcher};
use crate::platform::{HostBridge, Platform, WebPlatform};
use crate::render::RenderManager;
use crate::settings::dialog::{build_action_element, DialogHandlers, SettingKey};
use crate::settings::{I18n, PluginSettings, SettingsStore};
use crate::storage::{self, HostStorage, SettingsBackend};
use crate::util::debug_log;
use js_sys::Promise;
use leptos::logging::{log, warn};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use strum::IntoEnumIterator;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::HtmlElement;

type WebPlugin = PluginInner<HostStorage, KeyboardWatcher, ApiClient, WebEditorDom, WebPlatform>;

/// One row of the host settings dialog.
#[derive(Serialize)]
struct SettingItem {
    key: String,
    title: String,
    description: String,
}

struct PluginInner<S, K, A, D: EditorDom, P> {
    storage: S,
    platform: Rc<P>,
    settings: Rc<SettingsStore>,
    renderer: Rc<RenderManager<A, D, P>>,
    keyboard: K,
    dialog: DialogHandlers,
    /// Set once by `unload`. Work that resumes afterwards stops at its next check.
    unloaded: Cell<bool>,
}

impl<S, K, A, D, P> PluginInner<S, K, A, D, P>
where
    S: SettingsBackend,
    K: KeyboardMonitor,
    A: DocTreeSource + 'static,
    D: EditorDom + 'static,
    P: Platform + 'static,
{
    fn new(
        storage: S,
        keyboard: K,
        documents: Rc<DocumentService<A>>,
        dom: Rc<D>,
        platform: Rc<P>,
        settings: Rc<SettingsStore>,
    ) -> Self {
        let renderer = Rc::new(RenderManager::new(
            documents,
            dom,
            platform.clone(),
            settings.clone(),
        ));
        Self {
            storage,
            platform,
            settings,
            renderer,
            keyboard,
            dialog: DialogHandlers::new(),
            unloaded: Cell::new(false),
        }
    }

    fn is_unloaded(&self) -> bool {
        self.unloaded.get()
    }

    async fn load(&self) {
        if self.is_unloaded() {
            return;
        }
        let stored = self.storage.load_settings().await;
        if self.is_unloaded() {
            debug_log!("Plugin", "Unloaded while reading settings");
            return;
        }
        self.settings.replace(stored);

        self.reload_language_pack().await;
        if self.is_unloaded() {
            debug_log!("Plugin", "Unloaded while reading language pack");
            return;
        }

        self.refresh(false).await;
        if self.is_unloaded() {
            return;
        }

        if self.platform.is_mobile() {
            let renderer = Rc::downgrade(&self.renderer);
            self.keyboard.start(move |keyboard_visible| {
                if let Some(renderer) = renderer.upgrade() {
                    renderer.set_visible(!keyboard_visible);
                }
            });
        }

        log!("[PageNav] Plugin loaded successfully");
    }

    fn unload(&self) {
        self.unloaded.set(true);
        self.keyboard.stop();
        self.renderer.teardown();
        log!("[PageNav] Plugin unloaded successfully");
    }

    async fn refresh(&self, force: bool) {
        if self.is_unloaded() {
            return;
        }
        self.renderer.refresh(force).await;
    }

    async fn reload_language_pack(&self) {
        let settings = self.settings.settings();
        let pack = if settings.uses_language_pack() {
            self.storage.load_language_pack(&settings.language).await
        } else {
            None
        };
        self.settings.set_language_pack(pack);
    }

    async fn confirm_settings(&self) {
        if self.is_unloaded() {
            return;
        }
        self.reload_language_pack().await;
        if self.is_unloaded() {
            return;
        }
        self.storage.save_settings(&self.settings.settings()).await;
        self.refresh(true).await;
    }

    fn setting_items(&self) -> Vec<SettingItem> {
        SettingKey::iter()
            .map(|key| SettingItem {
                key: key.as_ref().to_string(),
                title: self.settings.t(key.title_key()),
                description: self.settings.t(key.description_key()),
            })
            .collect()
    }
}

/// Entry point handed to the JS plugin shell.
///
/// The shell forwards its lifecycle hooks and event bus notifications here.
#[wasm_bindgen]
pub struct PageNavPlugin {
    inner: Rc<WebPlugin>,
}

#[wasm_bindgen]
impl PageNavPlugin {
    #[wasm_bindgen(constructor)]
    pub fn new(bridge: HostBridge) -> Self {
        let api = Rc::new(ApiClient::from_env());
        let platform = Rc::new(WebPlatform::new(bridge.clone()));
        let settings = Rc::new(SettingsStore::new(
            PluginSettings::default(),
            I18n::new(storage::load_host_i18n(&bridge)),
        ));
        let documents = Rc::new(DocumentService::new(api.clone()));

        Self {
            inner: Rc::new(PluginInner::new(
                HostStorage::new(bridge, api),
                KeyboardWatcher::new(),
                documents,
                Rc::new(WebEditorDom),
                platform,
                settings,
            )),
        }
    }

    pub fn onload(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner.load().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn onunload(&self) {
        self.inner.unload();
    }

    /// `switch-protyle` and `loaded-protyle-static`.
    #[wasm_bindgen(js_name = onSwitchProtyle)]
    pub fn on_switch_protyle(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner.refresh(false).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = onWsMain)]
    pub fn on_ws_main(&self, detail: JsValue) -> Promise {
        let detail: serde_json::Value = serde_wasm_bindgen::from_value(detail).unwrap_or_default();
        let inner = self.inner.clone();
        future_to_promise(async move {
            if should_refresh(&detail) {
                inner.refresh(false).await;
            }
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = settingItems)]
    pub fn setting_items(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.setting_items()).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = createActionElement)]
    pub fn create_action_element(&self, key: &str) -> Option<HtmlElement> {
        let Some(key) = SettingKey::parse(key) else {
            warn!("[PageNav] Unknown setting key: {key}");
            return None;
        };
        build_action_element(&self.inner.settings, &self.inner.dialog, key)
    }

    #[wasm_bindgen(js_name = confirmSettings)]
    pub fn confirm_settings(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner.confirm_settings().await;
            Ok(JsValue::UNDEFINED)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::testing::FakeKernel;
    use crate::editor::testing::{FakeDom, ViewEvent};
    use crate::keyboard::testing::FakeKeyboard;
    use crate::models::NavigationState;
    use crate::platform::testing::FakePlatform;
    use crate::render::Spacing;
    use crate::settings::LayoutMode;
    use crate::storage::testing::{FakeStorage, StorageCall};
    use futures::executor::block_on;
    use futures::poll;
    use std::collections::HashMap;
    use std::pin::pin;

    type TestPlugin = PluginInner<FakeStorage, FakeKeyboard, FakeKernel, FakeDom, FakePlatform>;

    struct Fixture {
        dom: Rc<FakeDom>,
        plugin: TestPlugin,
    }

    fn fixture(platform: FakePlatform, storage: FakeStorage) -> Fixture {
        let kernel = Rc::new(FakeKernel::flat("nb", &["A", "B", "C"]));
        let dom = Rc::new(FakeDom::showing(1, "B"));
        let mut host = HashMap::new();
        host.insert("prevPage".to_string(), "Prev".to_string());
        host.insert("nextPage".to_string(), "Next".to_string());
        let settings = Rc::new(SettingsStore::new(PluginSettings::default(), I18n::new(host)));
        let plugin = PluginInner::new(
            storage,
            FakeKeyboard::default(),
            Rc::new(DocumentService::new(kernel)),
            dom.clone(),
            Rc::new(platform),
            settings,
        );
        Fixture { dom, plugin }
    }

    fn mounted(view: u32, layout: LayoutMode) -> ViewEvent {
        ViewEvent::Mounted {
            view,
            surface: 1,
            layout,
            state: NavigationState::new(2, 3),
        }
    }

    fn default_spacing(view: u32) -> ViewEvent {
        ViewEvent::Spacing {
            view,
            spacing: Spacing {
                margin_top: "0".to_string(),
                margin_bottom: "0".to_string(),
            },
        }
    }

    #[test]
    fn test_setting_item_serializes_as_plain_fields() {
        let item = SettingItem {
            key: SettingKey::MarginTop.as_ref().to_string(),
            title: "Top".to_string(),
            description: "Space above".to_string(),
        };
        let v = serde_json::to_value(&item).expect("should serialize");
        assert_eq!(v["key"], "marginTop");
        assert_eq!(v["title"], "Top");
        assert_eq!(v["description"], "Space above");
    }

    #[test]
    fn test_load_applies_stored_settings_before_first_render() {
        let stored = PluginSettings {
            layout_mode: LayoutMode::Side,
            ..PluginSettings::default()
        };
        let f = fixture(FakePlatform::desktop(), FakeStorage::with_settings(stored));
        block_on(f.plugin.load());

        assert_eq!(f.plugin.storage.calls(), vec![StorageCall::Load]);
        assert_eq!(f.dom.events(), vec![mounted(1, LayoutMode::Side)]);
    }

    #[test]
    fn test_load_fetches_language_pack_for_explicit_language() {
        let stored = PluginSettings {
            language: "en_US".to_string(),
            ..PluginSettings::default()
        };
        let storage = FakeStorage::with_settings(stored);
        storage.add_pack("en_US", &[("prevPage", "Previous")]);
        let f = fixture(FakePlatform::desktop(), storage);
        block_on(f.plugin.load());

        assert_eq!(
            f.plugin.storage.calls(),
            vec![StorageCall::Load, StorageCall::LanguagePack("en_US".to_string())]
        );
        assert_eq!(f.plugin.settings.t("prevPage"), "Previous");
        assert_eq!(f.plugin.settings.t("nextPage"), "Next");
    }

    #[test]
    fn test_keyboard_watcher_starts_only_on_mobile() {
        let desktop = fixture(FakePlatform::desktop(), FakeStorage::default());
        block_on(desktop.plugin.load());
        assert_eq!(desktop.plugin.keyboard.starts.get(), 0);

        let mobile = fixture(FakePlatform::mobile(true, true), FakeStorage::default());
        block_on(mobile.plugin.load());
        assert_eq!(mobile.plugin.keyboard.starts.get(), 1);

        mobile.plugin.keyboard.report(true);
        assert_eq!(
            mobile.dom.events().last(),
            Some(&ViewEvent::Visibility {
                view: 1,
                visible: false
            })
        );
        mobile.plugin.keyboard.report(false);
        assert_eq!(
            mobile.dom.events().last(),
            Some(&ViewEvent::Visibility {
                view: 1,
                visible: true
            })
        );
    }

    #[test]
    fn test_unload_while_reading_settings_leaves_nothing_behind() {
        let storage = FakeStorage::default();
        let release = storage.gate_load();
        let f = fixture(FakePlatform::mobile(true, true), storage);

        block_on(async {
            let mut load = pin!(f.plugin.load());
            assert!(poll!(load.as_mut()).is_pending());

            f.plugin.unload();
            let _ = release.send(());
            load.await;
        });

        assert!(f.dom.events().is_empty());
        assert!(!f.plugin.renderer.is_mounted());
        assert_eq!(f.plugin.keyboard.starts.get(), 0);
        assert!(!f.plugin.keyboard.is_running());
    }

    #[test]
    fn test_unload_stops_keyboard_and_ignores_later_events() {
        let f = fixture(FakePlatform::mobile(true, true), FakeStorage::default());
        block_on(f.plugin.load());
        assert!(f.plugin.keyboard.is_running());

        f.plugin.unload();
        assert!(!f.plugin.keyboard.is_running());
        assert_eq!(f.dom.live_views(), 0);
        f.dom.clear_events();

        block_on(f.plugin.refresh(false));
        block_on(f.plugin.confirm_settings());
        assert!(f.dom.events().is_empty());
        assert_eq!(f.plugin.storage.calls(), vec![StorageCall::Load]);
    }

    #[test]
    fn test_confirm_settings_reloads_pack_then_saves_then_redraws() {
        let storage = FakeStorage::default();
        storage.add_pack("en_US", &[("prevPage", "Previous")]);
        let f = fixture(FakePlatform::desktop(), storage);
        block_on(f.plugin.load());
        f.dom.clear_events();
        f.plugin.storage.calls.borrow_mut().clear();

        f.plugin.settings.update(|s| s.language = "en_US".to_string());
        let release = f.plugin.storage.gate_save();
        block_on(async {
            let mut confirm = pin!(f.plugin.confirm_settings());
            assert!(poll!(confirm.as_mut()).is_pending());

            // Pack applied and save issued; the redraw waits for the save.
            assert_eq!(
                f.plugin.storage.calls(),
                vec![
                    StorageCall::LanguagePack("en_US".to_string()),
                    StorageCall::Save(f.plugin.settings.settings()),
                ]
            );
            assert_eq!(f.plugin.settings.t("prevPage"), "Previous");
            assert!(f.dom.events().is_empty());

            let _ = release.send(());
            confirm.await;
        });

        assert_eq!(
            f.dom.events(),
            vec![
                ViewEvent::Destroyed { view: 1 },
                mounted(2, LayoutMode::Bottom),
                default_spacing(2),
            ]
        );
        assert_eq!(f.plugin.storage.stored.borrow().language, "en_US");
    }

    #[test]
    fn test_confirm_settings_with_auto_language_clears_pack() {
        let f = fixture(FakePlatform::desktop(), FakeStorage::default());
        block_on(f.plugin.load());
        f.plugin.storage.calls.borrow_mut().clear();

        let mut pack = HashMap::new();
        pack.insert("prevPage".to_string(), "Previous".to_string());
        f.plugin.settings.set_language_pack(Some(pack));

        block_on(f.plugin.confirm_settings());
        assert_eq!(
            f.plugin.storage.calls(),
            vec![StorageCall::Save(PluginSettings::default())]
        );
        assert_eq!(f.plugin.settings.t("prevPage"), "Prev");
    }

    #[test]
    fn test_unload_during_save_skips_redraw() {
        let f = fixture(FakePlatform::desktop(), FakeStorage::default());
        block_on(f.plugin.load());
        let release = f.plugin.storage.gate_save();

        block_on(async {
            let mut confirm = pin!(f.plugin.confirm_settings());
            assert!(poll!(confirm.as_mut()).is_pending());

            f.plugin.unload();
            f.dom.clear_events();
            let _ = release.send(());
            confirm.await;
        });

        assert!(f.dom.events().is_empty());
        assert!(!f.plugin.renderer.is_mounted());
    }

    #[test]
    fn test_setting_items_cover_every_key() {
        let f = fixture(FakePlatform::desktop(), FakeStorage::default());
        let keys: Vec<String> = f.plugin.setting_items().into_iter().map(|i| i.key).collect();
        assert_eq!(keys, vec!["language", "layoutMode", "marginTop", "marginBottom"]);
    }
}
