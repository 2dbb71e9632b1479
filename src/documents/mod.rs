use crate::api::DocTreeSource;
use crate::models::FileTreeNode;
use crate::util::{debug_log, now_ms};
use futures::future::{self, Either};
use leptos::logging::{error, warn};
use std::pin::pin;
use std::rc::Rc;

pub(crate) const MAX_RECURSION_DEPTH: usize = 50;
pub(crate) const FETCH_TIMEOUT_MS: u32 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WalkOptions {
    /// Levels below the root that may be listed. Deeper branches are skipped.
    pub max_depth: usize,
    /// Budget for one full walk of a notebook.
    pub timeout_ms: u32,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_RECURSION_DEPTH,
            timeout_ms: FETCH_TIMEOUT_MS,
        }
    }
}

/// 1-based position of `doc_id` in `ids`, or 0 when absent.
pub(crate) fn position_of(ids: &[String], doc_id: &str) -> usize {
    ids.iter()
        .position(|id| id == doc_id)
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Document at a 1-based `position`, clamped into `[1, len]`. `None` only for an empty list.
pub(crate) fn doc_at_position(ids: &[String], position: i64) -> Option<&String> {
    if ids.is_empty() {
        return None;
    }
    let last = ids.len() as i64;
    let index = position.clamp(1, last) - 1;
    ids.get(index as usize)
}

/// Resolves documents to notebook positions.
///
/// Nothing is cached: every call re-reads the live tree, so a document added, removed or
/// moved in the host is reflected by the very next query.
pub(crate) struct DocumentService<A> {
    api: Rc<A>,
    options: WalkOptions,
}

impl<A: DocTreeSource> DocumentService<A> {
    pub fn new(api: Rc<A>) -> Self {
        Self {
            api,
            options: WalkOptions::default(),
        }
    }

    #[cfg(test)]
    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn get_notebook_id(&self, doc_id: &str) -> Option<String> {
        debug_log!("DocumentService", "Getting notebook ID for doc: {doc_id}");
        match self.api.get_block_info(doc_id).await {
            Ok(info) if !info.box_id.trim().is_empty() => Some(info.box_id),
            Ok(_) => {
                debug_log!("DocumentService", "No notebook ID found for {doc_id}");
                None
            }
            Err(e) => {
                error!("[DocumentService] Failed to get notebook ID for {doc_id}: {e}");
                None
            }
        }
    }

    /// Whether the notebook is currently open. A failed listing counts as open: the
    /// caller already resolved the notebook from a live block.
    pub async fn is_notebook_open(&self, notebook_id: &str) -> bool {
        match self.api.list_notebooks().await {
            Ok(notebooks) => notebooks
                .iter()
                .any(|nb| nb.id == notebook_id && !nb.closed),
            Err(e) => {
                warn!("[DocumentService] Failed to list notebooks: {e}");
                true
            }
        }
    }

    pub async fn get_position(&self, doc_id: &str) -> usize {
        let Some(notebook_id) = self.get_notebook_id(doc_id).await else {
            return 0;
        };
        let ids = self.list_document_ids(&notebook_id).await;
        position_of(&ids, doc_id)
    }

    pub async fn get_doc_id_at_position(&self, notebook_id: &str, position: i64) -> Option<String> {
        let ids = self.list_document_ids(notebook_id).await;
        doc_at_position(&ids, position).cloned()
    }

    /// Ordered document ids of a notebook, in file tree order.
    ///
    /// Returns an empty list when the walk exceeds its time budget.
    pub async fn list_document_ids(&self, notebook_id: &str) -> Vec<String> {
        let started = now_ms();
        debug_log!("DocumentService", "Loading document ID list for notebook: {notebook_id}");

        let walk = pin!(self.walk(notebook_id));
        let timeout = pin!(self.api.sleep(self.options.timeout_ms));

        match future::select(walk, timeout).await {
            Either::Left((ids, _)) => {
                debug_log!(
                    "DocumentService",
                    "Loaded {} document IDs in {:.0}ms",
                    ids.len(),
                    now_ms() - started
                );
                ids
            }
            Either::Right(_) => {
                warn!(
                    "[DocumentService] Listing notebook {notebook_id} timed out after {}ms",
                    self.options.timeout_ms
                );
                Vec::new()
            }
        }
    }

    async fn walk(&self, notebook_id: &str) -> Vec<String> {
        let mut ids = Vec::new();
        // Each frame is one directory level: remaining siblings plus that level's depth.
        let mut stack = vec![(self.fetch_level(notebook_id, "/").await.into_iter(), 0usize)];

        while let Some((level, depth)) = stack.last_mut() {
            let depth = *depth;
            let Some(node) = level.next() else {
                stack.pop();
                continue;
            };
            if node.id.is_empty() {
                continue;
            }

            ids.push(node.id);

            if node.sub_file_count == 0 {
                continue;
            }
            let child_depth = depth + 1;
            if child_depth >= self.options.max_depth {
                debug_log!("DocumentService", "Max recursion depth reached at: {}", node.path);
                continue;
            }
            let children = self.fetch_level(notebook_id, &node.path).await;
            stack.push((children.into_iter(), child_depth));
        }

        ids
    }

    async fn fetch_level(&self, notebook_id: &str, path: &str) -> Vec<FileTreeNode> {
        match self.api.list_docs_by_path(notebook_id, path).await {
            Ok(files) => files,
            Err(e) => {
                error!("[DocumentService] Failed to load path {path}: {e}");
                Vec::new()
            }
        }
    }
}
