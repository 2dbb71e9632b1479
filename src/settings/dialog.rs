//! Controls for the host settings dialog.
//!
//! The host owns the dialog and asks for one action element per item each time it opens.
//! Controls write straight into the live [`SettingsStore`]; nothing is persisted until the
//! dialog is confirmed.

use super::{LayoutMode, SettingsStore, LANGUAGE_AUTO};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;
use strum::IntoEnumIterator;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::EnumIter)]
#[strum(serialize_all = "camelCase")]
pub(crate) enum SettingKey {
    Language,
    LayoutMode,
    MarginTop,
    MarginBottom,
}

impl SettingKey {
    pub fn title_key(&self) -> &'static str {
        match self {
            Self::Language => "languageTitle",
            Self::LayoutMode => "layoutModeTitle",
            Self::MarginTop => "marginTopTitle",
            Self::MarginBottom => "marginBottomTitle",
        }
    }

    pub fn description_key(&self) -> &'static str {
        match self {
            Self::Language => "languageDesc",
            Self::LayoutMode => "layoutModeDesc",
            Self::MarginTop => "marginTopDesc",
            Self::MarginBottom => "marginBottomDesc",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::from_str(key).ok()
    }
}

/// Languages offered in the dialog, with the i18n key of their label.
pub(crate) const LANGUAGE_OPTIONS: [(&str, &str); 3] = [
    (LANGUAGE_AUTO, "languageAuto"),
    ("zh_CN", "languageZH"),
    ("en_US", "languageEN"),
];

fn layout_label_key(mode: LayoutMode) -> &'static str {
    match mode {
        LayoutMode::Bottom => "layoutModeBottom",
        LayoutMode::Side => "layoutModeSide",
    }
}

/// Change handlers of the controls in the open dialog, one slot per setting.
///
/// Reopening the dialog replaces the previous handler for each key, which also releases the
/// closed dialog's captures.
#[derive(Default)]
pub(crate) struct DialogHandlers {
    slots: RefCell<HashMap<SettingKey, Closure<dyn FnMut()>>>,
}

impl DialogHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    fn install(&self, key: SettingKey, handler: Closure<dyn FnMut()>) {
        self.slots.borrow_mut().insert(key, handler);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }
}

pub(crate) fn build_action_element(
    store: &Rc<SettingsStore>,
    handlers: &DialogHandlers,
    key: SettingKey,
) -> Option<HtmlElement> {
    let document = web_sys::window()?.document()?;
    let current = store.settings();

    match key {
        SettingKey::Language => {
            let options: Vec<(String, String)> = LANGUAGE_OPTIONS
                .iter()
                .map(|(value, label)| (value.to_string(), store.t(label)))
                .collect();
            let store = store.clone();
            build_select(&document, handlers, key, &options, &current.language, move |value| {
                store.update(|s| s.language = value);
            })
        }
        SettingKey::LayoutMode => {
            let options: Vec<(String, String)> = LayoutMode::iter()
                .map(|mode| (mode.to_string(), store.t(layout_label_key(mode))))
                .collect();
            let store = store.clone();
            build_select(
                &document,
                handlers,
                key,
                &options,
                current.layout_mode.as_ref(),
                move |value| {
                    if let Ok(mode) = LayoutMode::from_str(&value) {
                        store.update(|s| s.layout_mode = mode);
                    }
                },
            )
        }
        SettingKey::MarginTop => {
            let store = store.clone();
            build_margin_input(&document, handlers, key, &current.margin_top, move |value| {
                store.update(|s| s.margin_top = value);
            })
        }
        SettingKey::MarginBottom => {
            let store = store.clone();
            build_margin_input(&document, handlers, key, &current.margin_bottom, move |value| {
                store.update(|s| s.margin_bottom = value);
            })
        }
    }
}

fn build_select(
    document: &Document,
    handlers: &DialogHandlers,
    key: SettingKey,
    options: &[(String, String)],
    selected: &str,
    on_change: impl Fn(String) + 'static,
) -> Option<HtmlElement> {
    let select: HtmlSelectElement = document.create_element("select").ok()?.dyn_into().ok()?;
    select.set_class_name("b3-select fn__size-200");

    for (value, text) in options {
        let option: HtmlOptionElement = document.create_element("option").ok()?.dyn_into().ok()?;
        option.set_value(value);
        option.set_text(text);
        option.set_selected(value == selected);
        select.append_child(&option).ok()?;
    }

    let target = select.clone();
    let cb = Closure::<dyn FnMut()>::new(move || on_change(target.value()));
    select.set_onchange(Some(cb.as_ref().unchecked_ref()));
    handlers.install(key, cb);

    Some(select.unchecked_into())
}

fn build_margin_input(
    document: &Document,
    handlers: &DialogHandlers,
    key: SettingKey,
    value: &str,
    on_input: impl Fn(String) + 'static,
) -> Option<HtmlElement> {
    let container: HtmlElement = document.create_element("div").ok()?.dyn_into().ok()?;
    container.set_class_name("fn__flex fn__flex-center");

    let input: HtmlInputElement = document.create_element("input").ok()?.dyn_into().ok()?;
    input.set_class_name("b3-text-field fn__size-60");
    input.set_type("number");
    let style = input.style();
    let _ = style.set_property("height", "28px");
    let _ = style.set_property("padding", "4px 8px");
    let _ = style.set_property("text-align", "right");
    input.set_value(if value.is_empty() { "0" } else { value });

    let target = input.clone();
    let cb = Closure::<dyn FnMut()>::new(move || on_input(target.value()));
    input.set_oninput(Some(cb.as_ref().unchecked_ref()));
    handlers.install(key, cb);

    let label: HtmlElement = document.create_element("span").ok()?.dyn_into().ok()?;
    label.set_inner_text("px");
    label.set_class_name("fn__space-left");
    let _ = label.style().set_property("white-space", "nowrap");

    container.append_child(&input).ok()?;
    container.append_child(&label).ok()?;
    Some(container)
}


// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::settings::{I18n, PluginSettings};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn store() -> Rc<SettingsStore> {
        Rc::new(SettingsStore::new(
            PluginSettings::default(),
            I18n::new(Default::default()),
        ))
    }

    #[wasm_bindgen_test]
    fn test_reopening_dialog_replaces_handlers() {
        let store = store();
        let handlers = DialogHandlers::new();
        for _ in 0..3 {
            for key in SettingKey::iter() {
                assert!(build_action_element(&store, &handlers, key).is_some());
            }
        }
        assert_eq!(handlers.len(), 4);
        assert_eq!(Rc::strong_count(&store), 5);
    }

    #[wasm_bindgen_test]
    fn test_margin_input_writes_into_store() {
        let store = store();
        let handlers = DialogHandlers::new();
        let container = build_action_element(&store, &handlers, SettingKey::MarginTop)
            .expect("margin control");
        let input: HtmlInputElement = container
            .query_selector("input")
            .expect("query")
            .expect("input")
            .unchecked_into();
        input.set_value("24");
        let event = web_sys::Event::new("input").expect("event");
        input.dispatch_event(&event).expect("dispatch");
        assert_eq!(store.settings().margin_top, "24");
    }
}
