use crate::api::DocTreeSource;
use crate::documents::DocumentService;
use crate::editor::{current_document_id, EditorDom};
use crate::platform::{block_uri, Platform};
use crate::util::debug_log;
use leptos::logging::{error, warn};
use std::cell::Cell;
use std::rc::Rc;

pub(crate) const NAVIGATE_PREV: i32 = -1;
pub(crate) const NAVIGATE_NEXT: i32 = 1;

/// Releases the in-flight flag on every exit path, including a dropped future.
struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Opens the neighbour of the current document.
pub(crate) struct Navigator<A, D, P> {
    documents: Rc<DocumentService<A>>,
    dom: Rc<D>,
    platform: Rc<P>,
    in_flight: Cell<bool>,
}

impl<A: DocTreeSource, D: EditorDom, P: Platform> Navigator<A, D, P> {
    pub fn new(documents: Rc<DocumentService<A>>, dom: Rc<D>, platform: Rc<P>) -> Self {
        Self {
            documents,
            dom,
            platform,
            in_flight: Cell::new(false),
        }
    }

    #[cfg(test)]
    pub fn is_navigating(&self) -> bool {
        self.in_flight.get()
    }

    /// Move `offset` documents away from the current one.
    ///
    /// A call made while another navigation is still resolving is dropped, not queued.
    pub async fn navigate(&self, offset: i32) {
        if self.in_flight.replace(true) {
            debug_log!("Navigation", "Navigation already in flight, dropping offset {offset}");
            return;
        }
        let _guard = InFlight(&self.in_flight);

        let Some(current) = current_document_id(&*self.dom) else {
            debug_log!("Navigation", "No current document");
            return;
        };
        let Some(notebook_id) = self.documents.get_notebook_id(&current).await else {
            return;
        };

        let position = self.documents.get_position(&current).await;
        if position == 0 {
            debug_log!("Navigation", "{current} is not in notebook {notebook_id}");
            return;
        }

        let target_position = position as i64 + i64::from(offset);
        let Some(target) = self
            .documents
            .get_doc_id_at_position(&notebook_id, target_position)
            .await
        else {
            return;
        };

        // Clamping at either end of the notebook lands back on the current document.
        if target == current {
            debug_log!("Navigation", "Already at boundary position {position}");
            return;
        }

        self.open(&target);
    }

    fn open(&self, doc_id: &str) {
        if !self.platform.is_mobile() {
            self.platform.open_tab(doc_id);
            return;
        }

        if !self.platform.has_open_by_uri_bridge() {
            error!("[Navigation] window.openFileByURL not available");
            return;
        }
        if !self.platform.open_by_uri(&block_uri(doc_id)) {
            warn!("[Navigation] Host refused to open {doc_id}");
        }
    }
}
