use crate::components::{mount_navigation, WebNavView};
use crate::render::{NavProps, NavView};
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

/// A visible editor. Hidden tabs keep their `.protyle` but gain `fn__none`.
pub(crate) const VISIBLE_PROTYLE: &str = ".protyle:not(.fn__none)";
pub(crate) const ACTIVE_WINDOW_PROTYLE: &str = ".layout__wnd--active .protyle:not(.fn__none)";
const TITLE_WITH_ID: &str = ".protyle-title[data-node-id]";
const CONTENT_WITH_ID: &str = ".protyle-wysiwyg[data-node-id]";
const NODE_ID_ATTR: &str = "data-node-id";

/// The two parts of an editor that carry the document id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Region {
    Title,
    Content,
}

/// Access to the host's editor DOM.
///
/// Surfaces are compared by identity: the host rebuilds editors on document switch, so
/// two surfaces showing the same document are still different mount targets.
pub(crate) trait EditorDom {
    type Surface: Clone + PartialEq;
    type View: NavView;

    /// Editor containing the current selection anchor.
    fn selection_surface(&self) -> Option<Self::Surface>;

    /// Editor inside the focused window region.
    fn active_window_surface(&self) -> Option<Self::Surface>;

    /// Any editor that is visible at all.
    fn any_visible_surface(&self) -> Option<Self::Surface>;

    fn region_doc_id(&self, surface: &Self::Surface, region: Region) -> Option<String>;

    fn mount(&self, surface: &Self::Surface, props: NavProps) -> Self::View;
}

pub(crate) fn active_editor_surface<D: EditorDom>(dom: &D) -> Option<D::Surface> {
    dom.selection_surface()
        .or_else(|| dom.active_window_surface())
        .or_else(|| dom.any_visible_surface())
}

pub(crate) fn document_id<D: EditorDom>(dom: &D, surface: &D::Surface) -> Option<String> {
    dom.region_doc_id(surface, Region::Title)
        .or_else(|| dom.region_doc_id(surface, Region::Content))
}

pub(crate) fn current_document_id<D: EditorDom>(dom: &D) -> Option<String> {
    let surface = active_editor_surface(dom)?;
    document_id(dom, &surface)
}

/// Surface and document the navigation should attach to.
///
/// Falls back to `remembered` when the active lookup yields nothing, e.g. while a modal
/// dialog holds focus but the editor underneath is still the current one.
pub(crate) fn resolve_target<D: EditorDom>(
    dom: &D,
    remembered: Option<&D::Surface>,
) -> Option<(D::Surface, String)> {
    if let Some(surface) = active_editor_surface(dom) {
        if let Some(id) = document_id(dom, &surface) {
            return Some((surface, id));
        }
    }

    let surface = remembered?;
    document_id(dom, surface).map(|id| (surface.clone(), id))
}

/// [`EditorDom`] over the live browser document.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct WebEditorDom;

impl WebEditorDom {
    fn query(selector: &str) -> Option<HtmlElement> {
        web_sys::window()?
            .document()?
            .query_selector(selector)
            .ok()
            .flatten()?
            .dyn_into::<HtmlElement>()
            .ok()
    }
}

impl EditorDom for WebEditorDom {
    type Surface = HtmlElement;
    type View = WebNavView;

    fn selection_surface(&self) -> Option<HtmlElement> {
        let selection = web_sys::window()?.get_selection().ok().flatten()?;
        if selection.range_count() == 0 {
            return None;
        }
        let range = selection.get_range_at(0).ok()?;
        range
            .start_container()
            .ok()?
            .parent_element()?
            .closest(VISIBLE_PROTYLE)
            .ok()
            .flatten()?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    fn active_window_surface(&self) -> Option<HtmlElement> {
        Self::query(ACTIVE_WINDOW_PROTYLE)
    }

    fn any_visible_surface(&self) -> Option<HtmlElement> {
        Self::query(VISIBLE_PROTYLE)
    }

    fn region_doc_id(&self, surface: &HtmlElement, region: Region) -> Option<String> {
        let selector = match region {
            Region::Title => TITLE_WITH_ID,
            Region::Content => CONTENT_WITH_ID,
        };
        surface
            .query_selector(selector)
            .ok()
            .flatten()?
            .get_attribute(NODE_ID_ATTR)
            .filter(|id| !id.trim().is_empty())
    }

    fn mount(&self, surface: &HtmlElement, props: NavProps) -> WebNavView {
        mount_navigation(surface, props)
    }
}
