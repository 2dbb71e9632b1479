use crate::api::DocTreeSource;
use crate::documents::{position_of, DocumentService};
use crate::editor::{resolve_target, EditorDom};
use crate::models::NavigationState;
use crate::navigation::Navigator;
use crate::platform::Platform;
use crate::settings::{LayoutMode, SettingsStore};
use crate::util::{debug_log, now_ms};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Callback bound to the navigation buttons. The view decides how to drive the future.
pub(crate) type NavigateFn = Rc<dyn Fn(i32) -> LocalBoxFuture<'static, ()>>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct NavLabels {
    pub prev: String,
    pub next: String,
}

/// Bottom-layout spacing, as entered in the settings (pixels).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Spacing {
    pub margin_top: String,
    pub margin_bottom: String,
}

fn px(value: &str) -> String {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => format!("{v}px"),
        _ => "0px".to_string(),
    }
}

impl Spacing {
    pub fn top_css(&self) -> String {
        px(&self.margin_top)
    }

    pub fn bottom_css(&self) -> String {
        px(&self.margin_bottom)
    }
}

pub(crate) struct NavProps {
    pub state: NavigationState,
    pub layout: LayoutMode,
    pub labels: NavLabels,
    pub visible: bool,
    pub on_navigate: NavigateFn,
}

/// A mounted navigation fragment.
///
/// `update` must change values in place; event bindings made at mount time stay as they are.
pub(crate) trait NavView {
    fn update(&self, state: NavigationState);

    fn set_visible(&self, visible: bool);

    fn apply_spacing(&self, spacing: &Spacing);

    /// `false` once the host has rebuilt the surface's children and dropped the fragment.
    fn is_attached(&self) -> bool;

    fn destroy(self);
}

struct Mounted<S, V> {
    surface: S,
    layout: LayoutMode,
    view: V,
}

/// Owns the navigation fragment and keeps it in step with the open document.
pub(crate) struct RenderManager<A, D: EditorDom, P> {
    documents: Rc<DocumentService<A>>,
    dom: Rc<D>,
    settings: Rc<SettingsStore>,
    navigator: Rc<Navigator<A, D, P>>,
    /// Bumped by every refresh and by teardown; a refresh whose number is stale stops.
    generation: Cell<u64>,
    mounted: RefCell<Option<Mounted<D::Surface, D::View>>>,
    /// Survives a forced redraw so focus loss (settings dialog) does not lose the editor.
    remembered: RefCell<Option<D::Surface>>,
    visible: Cell<bool>,
}

impl<A, D, P> RenderManager<A, D, P>
where
    A: DocTreeSource + 'static,
    D: EditorDom + 'static,
    P: Platform + 'static,
{
    pub fn new(
        documents: Rc<DocumentService<A>>,
        dom: Rc<D>,
        platform: Rc<P>,
        settings: Rc<SettingsStore>,
    ) -> Self {
        let navigator = Rc::new(Navigator::new(documents.clone(), dom.clone(), platform));
        Self {
            documents,
            dom,
            settings,
            navigator,
            generation: Cell::new(0),
            mounted: RefCell::new(None),
            remembered: RefCell::new(None),
            visible: Cell::new(true),
        }
    }

    #[cfg(test)]
    pub fn is_mounted(&self) -> bool {
        self.mounted.borrow().is_some()
    }

    fn begin(&self) -> u64 {
        let next = self.generation.get().wrapping_add(1);
        self.generation.set(next);
        next
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    fn navigate_fn(&self) -> NavigateFn {
        let navigator = self.navigator.clone();
        Rc::new(move |offset| {
            let navigator = navigator.clone();
            async move { navigator.navigate(offset).await }.boxed_local()
        })
    }

    /// Re-resolve the current document and create, update or remove the fragment.
    ///
    /// `force` drops the current presentation first so it is rebuilt with fresh labels.
    pub async fn refresh(&self, force: bool) {
        let started = now_ms();
        let generation = self.begin();
        debug_log!("UIRender", "=== Render Start (force: {force}) ===");

        if force {
            self.destroy_view();
        }

        let remembered = self.remembered.borrow().clone();
        let Some((surface, doc_id)) = resolve_target(&*self.dom, remembered.as_ref()) else {
            debug_log!("UIRender", "No current document");
            self.unmount();
            return;
        };

        let notebook_id = self.documents.get_notebook_id(&doc_id).await;
        if !self.is_current(generation) {
            debug_log!("UIRender", "Render superseded after block lookup");
            return;
        }
        let Some(notebook_id) = notebook_id else {
            self.unmount();
            return;
        };

        let open = self.documents.is_notebook_open(&notebook_id).await;
        if !self.is_current(generation) {
            debug_log!("UIRender", "Render superseded after notebook lookup");
            return;
        }
        if !open {
            debug_log!("UIRender", "Notebook {notebook_id} is closed");
            self.unmount();
            return;
        }

        let ids = self.documents.list_document_ids(&notebook_id).await;
        if !self.is_current(generation) {
            debug_log!("UIRender", "Render superseded after tree walk");
            return;
        }

        let state = NavigationState::new(position_of(&ids, &doc_id), ids.len());
        if state.is_sentinel() {
            self.unmount();
            return;
        }

        self.present(surface, state);
        debug_log!(
            "UIRender",
            "=== Render Complete ({:.0}ms) ===",
            now_ms() - started
        );
    }

    fn present(&self, surface: D::Surface, state: NavigationState) {
        let layout = self.settings.layout_mode();
        let mut mounted = self.mounted.borrow_mut();

        let reusable = matches!(
            mounted.as_ref(),
            Some(m) if m.surface == surface && m.layout == layout && m.view.is_attached()
        );

        if reusable {
            if let Some(m) = mounted.as_ref() {
                m.view.update(state);
                debug_log!("UIRender", "Navigation props updated");
            }
        } else {
            if let Some(old) = mounted.take() {
                old.view.destroy();
            }
            let view = self.dom.mount(
                &surface,
                NavProps {
                    state,
                    layout,
                    labels: self.settings.labels(),
                    visible: self.visible.get(),
                    on_navigate: self.navigate_fn(),
                },
            );
            debug_log!("UIRender", "Navigation mounted ({layout})");
            *mounted = Some(Mounted {
                surface: surface.clone(),
                layout,
                view,
            });
        }

        if layout == LayoutMode::Bottom {
            if let Some(m) = mounted.as_ref() {
                m.view.apply_spacing(&self.settings.spacing());
            }
        }

        *self.remembered.borrow_mut() = Some(surface);
    }

    fn destroy_view(&self) {
        let old = self.mounted.borrow_mut().take();
        if let Some(old) = old {
            old.view.destroy();
        }
    }

    fn unmount(&self) {
        self.destroy_view();
        *self.remembered.borrow_mut() = None;
    }

    /// Show or hide the fragment without touching its lifecycle.
    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
        if let Some(m) = self.mounted.borrow().as_ref() {
            m.view.set_visible(visible);
        }
    }

    /// Cancel any in-flight refresh and remove everything. Safe to call repeatedly.
    pub fn teardown(&self) {
        self.begin();
        self.unmount();
    }
}
