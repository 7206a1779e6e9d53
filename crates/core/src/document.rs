//! Document state model and reducer
//!
//! The document is an ordered page collection plus selection, active-page
//! and view bookkeeping. All mutation flows through `reduce`, a total pure
//! function over a tagged action union: unknown ids and malformed indices
//! are no-ops or clamped, never errors. The invariants listed on
//! `DocumentState` hold after every transition.

use crate::page::{normalize_rotation, Page, PageId, RasterImage};

/// View over the page collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Flat grid of all pages in document order
    #[default]
    Desk,

    /// Pages clustered by originating file
    Grouped,

    /// Single page at a time, driven by `book_index`
    Book,
}

/// Aggregate document editing state
///
/// Invariants, enforced by every `reduce` transition:
/// 1. `active_page` is `None` iff `pages` is empty, otherwise it names an
///    existing page.
/// 2. `selected` never contains an id absent from `pages`.
/// 3. Every page rotation is one of {0, 90, 180, 270}.
/// 4. A duplicate is inserted immediately after its source; duplicates in
///    the same batch stack in source order.
/// 5. `book_index` is a valid index into `pages`, or 0 when empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentState {
    /// Ordered page collection; order determines display and export order
    pub pages: Vec<Page>,

    /// Working file name for export
    pub file_name: String,

    /// Selected page ids, insertion-ordered, always a subset of `pages`
    pub selected: Vec<PageId>,

    /// Page shown in the main view
    pub active_page: Option<PageId>,

    /// Current view over the collection
    pub view_mode: ViewMode,

    /// Cursor for the book view
    pub book_index: usize,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            file_name: "Untitled".to_string(),
            selected: Vec::new(),
            active_page: None,
            view_mode: ViewMode::default(),
            book_index: 0,
        }
    }
}

impl DocumentState {
    /// Look up a page by id
    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    /// Position of a page in the collection
    pub fn index_of(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    fn contains(&self, id: PageId) -> bool {
        self.pages.iter().any(|p| p.id == id)
    }
}

/// One document mutation
///
/// Every action is total: applying it to any state yields a defined result.
#[derive(Debug, Clone)]
pub enum DocumentAction {
    /// Replace the entire page set, resetting selection and cursors
    LoadPages(Vec<Page>),

    /// Splice a batch of pages at an index (`None` = append)
    AddPages {
        pages: Vec<Page>,
        insert_at: Option<usize>,
    },

    /// Remove all pages matching the given ids
    DeletePages(Vec<PageId>),

    /// Move the page at `from` to position `to` in one atomic step
    ReorderPages { from: usize, to: usize },

    /// Rotate one page by a ±90 degree delta
    RotatePage { id: PageId, delta: i32 },

    /// Insert a deep copy after each page matching the given ids
    DuplicatePages(Vec<PageId>),

    /// Replace one page's annotation snapshot
    SetAnnotations {
        id: PageId,
        annotations: Option<String>,
    },

    /// Cache-fill: store a full-resolution raster for one page
    SetPreview { id: PageId, image: RasterImage },

    /// Cache-fill: store a low-resolution raster for one page
    SetThumbnail { id: PageId, image: RasterImage },

    /// Change the active page
    SetActivePage(Option<PageId>),

    /// Replace the selection
    SetSelection(Vec<PageId>),

    /// Add or remove one page from the selection
    ToggleSelection(PageId),

    /// Rename the working document
    SetFileName(String),

    /// Switch the view over the collection
    SetViewMode(ViewMode),

    /// Move the book view cursor
    SetBookIndex(usize),

    /// Restore a captured snapshot verbatim (undo/redo only)
    Replace(DocumentState),
}

impl DocumentAction {
    /// Whether this action records an undo entry when dispatched through
    /// the document store
    ///
    /// Selection, view and cache-fill actions are derived state, not
    /// user-authored document edits, and are excluded.
    pub fn is_undoable(&self) -> bool {
        matches!(
            self,
            DocumentAction::AddPages { .. }
                | DocumentAction::DeletePages(_)
                | DocumentAction::ReorderPages { .. }
                | DocumentAction::RotatePage { .. }
                | DocumentAction::DuplicatePages(_)
                | DocumentAction::SetAnnotations { .. }
        )
    }
}

/// Apply one action to the document state
///
/// Pure and total: never fails, never mutates the input.
pub fn reduce(state: DocumentState, action: DocumentAction) -> DocumentState {
    match action {
        DocumentAction::LoadPages(pages) => {
            let active_page = pages.first().map(|p| p.id);
            DocumentState {
                pages,
                selected: Vec::new(),
                active_page,
                book_index: 0,
                ..state
            }
        }

        DocumentAction::AddPages { pages, insert_at } => {
            if pages.is_empty() {
                return state;
            }
            let mut next = state;
            let at = insert_at.unwrap_or(next.pages.len()).min(next.pages.len());
            let first_added = pages.first().map(|p| p.id);
            next.pages.splice(at..at, pages);
            if next.active_page.is_none() {
                next.active_page = first_added;
            }
            next
        }

        DocumentAction::DeletePages(ids) => {
            let mut next = state;
            let old_active_index = next.active_page.and_then(|id| next.index_of(id));
            next.pages.retain(|p| !ids.contains(&p.id));
            next.selected.retain(|id| next.pages.iter().any(|p| p.id == *id));

            // Removing the active page selects its former positional
            // neighbor, falling back to the new last page.
            let active_still_present = next
                .active_page
                .map(|id| next.contains(id))
                .unwrap_or(false);
            if !active_still_present {
                next.active_page = old_active_index.and_then(|idx| {
                    let clamped = idx.min(next.pages.len().saturating_sub(1));
                    next.pages.get(clamped).map(|p| p.id)
                });
            }
            if next.pages.is_empty() {
                next.active_page = None;
            }
            next.book_index = next.book_index.min(next.pages.len().saturating_sub(1));
            next
        }

        DocumentAction::ReorderPages { from, to } => {
            if state.pages.is_empty() {
                return state;
            }
            let last = state.pages.len() - 1;
            let from = from.min(last);
            let to = to.min(last);
            if from == to {
                return state;
            }
            let mut next = state;
            let moved = next.pages.remove(from);
            next.pages.insert(to, moved);
            next
        }

        DocumentAction::RotatePage { id, delta } => {
            let mut next = state;
            if let Some(page) = next.pages.iter_mut().find(|p| p.id == id) {
                // Cached rasters stay untouched: rotation is a presentation
                // transform applied at display and export time.
                page.rotation = normalize_rotation(page.rotation, delta);
            }
            next
        }

        DocumentAction::DuplicatePages(ids) => {
            let mut next = state;
            let mut pages = Vec::with_capacity(next.pages.len());
            for page in next.pages.drain(..) {
                let wants_copy = ids.contains(&page.id);
                let copy = wants_copy.then(|| page.duplicate());
                pages.push(page);
                if let Some(copy) = copy {
                    pages.push(copy);
                }
            }
            next.pages = pages;
            next
        }

        DocumentAction::SetAnnotations { id, annotations } => {
            let mut next = state;
            if let Some(page) = next.pages.iter_mut().find(|p| p.id == id) {
                page.annotations = annotations;
            }
            next
        }

        DocumentAction::SetPreview { id, image } => {
            let mut next = state;
            // No-op when the page is gone: a late rasterization completion
            // for a deleted page is simply discarded.
            if let Some(page) = next.pages.iter_mut().find(|p| p.id == id) {
                page.preview = Some(image);
            } else {
                tracing::debug!(page = %id, "discarding preview for removed page");
            }
            next
        }

        DocumentAction::SetThumbnail { id, image } => {
            let mut next = state;
            if let Some(page) = next.pages.iter_mut().find(|p| p.id == id) {
                page.thumbnail = Some(image);
            } else {
                tracing::debug!(page = %id, "discarding thumbnail for removed page");
            }
            next
        }

        DocumentAction::SetActivePage(id) => {
            let mut next = state;
            match id {
                Some(id) if next.contains(id) => next.active_page = Some(id),
                None if next.pages.is_empty() => next.active_page = None,
                // Unknown id, or clearing while pages exist: keep invariant 1.
                _ => {}
            }
            next
        }

        DocumentAction::SetSelection(ids) => {
            let mut next = state;
            let mut selected = Vec::with_capacity(ids.len());
            for id in ids {
                if next.contains(id) && !selected.contains(&id) {
                    selected.push(id);
                }
            }
            next.selected = selected;
            next
        }

        DocumentAction::ToggleSelection(id) => {
            let mut next = state;
            if !next.contains(id) {
                return next;
            }
            if let Some(pos) = next.selected.iter().position(|s| *s == id) {
                next.selected.remove(pos);
            } else {
                next.selected.push(id);
            }
            next
        }

        DocumentAction::SetFileName(name) => DocumentState {
            file_name: name,
            ..state
        },

        DocumentAction::SetViewMode(mode) => DocumentState {
            view_mode: mode,
            book_index: 0,
            ..state
        },

        DocumentAction::SetBookIndex(index) => {
            let mut next = state;
            next.book_index = index.min(next.pages.len().saturating_sub(1));
            next
        }

        DocumentAction::Replace(snapshot) => snapshot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageSource, SourceGroupId};

    fn test_page(label: &str) -> Page {
        Page::new(
            PageSource::Pdf,
            label,
            SourceGroupId::new_v4(),
            vec![0u8; 4],
            612.0,
            792.0,
        )
    }

    fn three_page_state() -> DocumentState {
        reduce(
            DocumentState::default(),
            DocumentAction::LoadPages(vec![test_page("a"), test_page("b"), test_page("c")]),
        )
    }

    fn assert_invariants(state: &DocumentState) {
        assert_eq!(state.active_page.is_none(), state.pages.is_empty());
        if let Some(active) = state.active_page {
            assert!(state.pages.iter().any(|p| p.id == active));
        }
        for id in &state.selected {
            assert!(state.pages.iter().any(|p| p.id == *id));
        }
        for page in &state.pages {
            assert!([0, 90, 180, 270].contains(&page.rotation));
        }
        if state.pages.is_empty() {
            assert_eq!(state.book_index, 0);
        } else {
            assert!(state.book_index < state.pages.len());
        }
    }

    #[test]
    fn test_load_pages_activates_first() {
        let state = three_page_state();
        assert_eq!(state.active_page, Some(state.pages[0].id));
        assert!(state.selected.is_empty());
        assert_eq!(state.book_index, 0);
    }

    #[test]
    fn test_load_empty_clears_active() {
        let state = reduce(three_page_state(), DocumentAction::LoadPages(Vec::new()));
        assert!(state.pages.is_empty());
        assert!(state.active_page.is_none());
    }

    #[test]
    fn test_add_pages_appends_by_default() {
        let state = three_page_state();
        let extra = test_page("d");
        let extra_id = extra.id;
        let state = reduce(
            state,
            DocumentAction::AddPages {
                pages: vec![extra],
                insert_at: None,
            },
        );
        assert_eq!(state.pages.len(), 4);
        assert_eq!(state.pages[3].id, extra_id);
    }

    #[test]
    fn test_add_pages_activates_first_when_none_active() {
        let page = test_page("a");
        let id = page.id;
        let state = reduce(
            DocumentState::default(),
            DocumentAction::AddPages {
                pages: vec![page],
                insert_at: None,
            },
        );
        assert_eq!(state.active_page, Some(id));
    }

    #[test]
    fn test_add_pages_clamps_insert_index() {
        let state = three_page_state();
        let extra = test_page("d");
        let extra_id = extra.id;
        let state = reduce(
            state,
            DocumentAction::AddPages {
                pages: vec![extra],
                insert_at: Some(99),
            },
        );
        assert_eq!(state.pages[3].id, extra_id);
    }

    #[test]
    fn test_delete_active_selects_former_neighbor() {
        let state = three_page_state();
        let (a, b, c) = (state.pages[0].id, state.pages[1].id, state.pages[2].id);
        let state = reduce(state, DocumentAction::SetActivePage(Some(b)));
        let state = reduce(state, DocumentAction::DeletePages(vec![b]));
        // The page now occupying b's former index is c.
        assert_eq!(state.active_page, Some(c));
        assert_eq!(state.pages[0].id, a);
        assert_invariants(&state);
    }

    #[test]
    fn test_delete_last_active_selects_new_last() {
        let state = three_page_state();
        let (b, c) = (state.pages[1].id, state.pages[2].id);
        let state = reduce(state, DocumentAction::SetActivePage(Some(c)));
        let state = reduce(state, DocumentAction::DeletePages(vec![c]));
        assert_eq!(state.active_page, Some(b));
    }

    #[test]
    fn test_delete_prunes_selection_and_book_index() {
        let state = three_page_state();
        let ids: Vec<_> = state.pages.iter().map(|p| p.id).collect();
        let state = reduce(state, DocumentAction::SetSelection(ids.clone()));
        let state = reduce(state, DocumentAction::SetBookIndex(2));
        let state = reduce(state, DocumentAction::DeletePages(vec![ids[1], ids[2]]));
        assert_eq!(state.selected, vec![ids[0]]);
        assert_eq!(state.book_index, 0);
        assert_invariants(&state);
    }

    #[test]
    fn test_delete_everything() {
        let state = three_page_state();
        let ids: Vec<_> = state.pages.iter().map(|p| p.id).collect();
        let state = reduce(state, DocumentAction::DeletePages(ids));
        assert!(state.pages.is_empty());
        assert!(state.active_page.is_none());
        assert_eq!(state.book_index, 0);
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let state = three_page_state();
        let before = state.clone();
        let state = reduce(state, DocumentAction::DeletePages(vec![PageId::new_v4()]));
        assert_eq!(state, before);
    }

    #[test]
    fn test_reorder_moves_page() {
        let state = three_page_state();
        let (a, b, c) = (state.pages[0].id, state.pages[1].id, state.pages[2].id);
        let state = reduce(state, DocumentAction::ReorderPages { from: 0, to: 2 });
        let order: Vec<_> = state.pages.iter().map(|p| p.id).collect();
        assert_eq!(order, vec![b, c, a]);
    }

    #[test]
    fn test_reorder_same_index_is_noop() {
        let state = three_page_state();
        let before = state.clone();
        let state = reduce(state, DocumentAction::ReorderPages { from: 1, to: 1 });
        assert_eq!(state, before);
    }

    #[test]
    fn test_reorder_clamps_out_of_range() {
        let state = three_page_state();
        let first = state.pages[0].id;
        let state = reduce(state, DocumentAction::ReorderPages { from: 0, to: 99 });
        assert_eq!(state.pages[2].id, first);
    }

    #[test]
    fn test_rotate_normalizes_and_keeps_rasters() {
        let mut state = three_page_state();
        state.pages[0].preview = Some(RasterImage::new(1, 1, vec![0, 0, 0, 255]));
        let id = state.pages[0].id;
        let state = reduce(state, DocumentAction::RotatePage { id, delta: -90 });
        assert_eq!(state.pages[0].rotation, 270);
        assert!(state.pages[0].preview.is_some());
    }

    #[test]
    fn test_duplicate_inserts_after_source_without_annotations() {
        let mut state = three_page_state();
        state.pages[1].annotations = Some("{\"shapes\":[]}".to_string());
        let b = state.pages[1].id;
        let state = reduce(state, DocumentAction::DuplicatePages(vec![b]));
        assert_eq!(state.pages.len(), 4);
        assert_eq!(state.pages[1].id, b);
        let copy = &state.pages[2];
        assert_ne!(copy.id, b);
        assert!(copy.annotations.is_none());
        assert_invariants(&state);
    }

    #[test]
    fn test_duplicate_batch_stacks_in_source_order() {
        let state = three_page_state();
        let (a, b, c) = (state.pages[0].id, state.pages[1].id, state.pages[2].id);
        let state = reduce(state, DocumentAction::DuplicatePages(vec![a, c]));
        let order: Vec<_> = state.pages.iter().map(|p| p.id).collect();
        assert_eq!(order.len(), 5);
        assert_eq!(order[0], a);
        assert_eq!(order[2], b);
        assert_eq!(order[3], c);
        assert_eq!(state.pages[1].source_label, "a");
        assert_eq!(state.pages[4].source_label, "c");
    }

    #[test]
    fn test_set_annotations_touches_one_page() {
        let state = three_page_state();
        let id = state.pages[0].id;
        let state = reduce(
            state,
            DocumentAction::SetAnnotations {
                id,
                annotations: Some("snapshot".to_string()),
            },
        );
        assert_eq!(state.pages[0].annotations.as_deref(), Some("snapshot"));
        assert!(state.pages[1].annotations.is_none());
    }

    #[test]
    fn test_cache_fill_for_removed_page_is_noop() {
        let state = three_page_state();
        let before = state.clone();
        let state = reduce(
            state,
            DocumentAction::SetPreview {
                id: PageId::new_v4(),
                image: RasterImage::new(1, 1, vec![255, 255, 255, 255]),
            },
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_set_active_page_validates_id() {
        let state = three_page_state();
        let first = state.pages[0].id;
        let state = reduce(state, DocumentAction::SetActivePage(Some(PageId::new_v4())));
        assert_eq!(state.active_page, Some(first));
        let state = reduce(state, DocumentAction::SetActivePage(None));
        assert_eq!(state.active_page, Some(first));
    }

    #[test]
    fn test_toggle_selection() {
        let state = three_page_state();
        let id = state.pages[1].id;
        let state = reduce(state, DocumentAction::ToggleSelection(id));
        assert_eq!(state.selected, vec![id]);
        let state = reduce(state, DocumentAction::ToggleSelection(id));
        assert!(state.selected.is_empty());
        let before = state.clone();
        let state = reduce(state, DocumentAction::ToggleSelection(PageId::new_v4()));
        assert_eq!(state, before);
    }

    #[test]
    fn test_set_selection_drops_unknown_and_duplicate_ids() {
        let state = three_page_state();
        let id = state.pages[0].id;
        let state = reduce(
            state,
            DocumentAction::SetSelection(vec![id, PageId::new_v4(), id]),
        );
        assert_eq!(state.selected, vec![id]);
    }

    #[test]
    fn test_view_mode_resets_book_index() {
        let state = three_page_state();
        let state = reduce(state, DocumentAction::SetBookIndex(2));
        assert_eq!(state.book_index, 2);
        let state = reduce(state, DocumentAction::SetViewMode(ViewMode::Book));
        assert_eq!(state.book_index, 0);
    }

    #[test]
    fn test_book_index_clamps() {
        let state = three_page_state();
        let state = reduce(state, DocumentAction::SetBookIndex(99));
        assert_eq!(state.book_index, 2);
        let state = reduce(DocumentState::default(), DocumentAction::SetBookIndex(5));
        assert_eq!(state.book_index, 0);
    }

    #[test]
    fn test_random_action_sequences_hold_invariants() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut state = DocumentState::default();
            for _ in 0..60 {
                let known_id = if state.pages.is_empty() {
                    PageId::new_v4()
                } else {
                    state.pages[rng.gen_range(0..state.pages.len())].id
                };
                let action = match rng.gen_range(0..10u8) {
                    0 => DocumentAction::AddPages {
                        pages: vec![test_page("r")],
                        insert_at: Some(rng.gen_range(0..8)),
                    },
                    1 => DocumentAction::DeletePages(vec![known_id]),
                    2 => DocumentAction::ReorderPages {
                        from: rng.gen_range(0..8),
                        to: rng.gen_range(0..8),
                    },
                    3 => DocumentAction::RotatePage {
                        id: known_id,
                        delta: if rng.gen_bool(0.5) { 90 } else { -90 },
                    },
                    4 => DocumentAction::DuplicatePages(vec![known_id]),
                    5 => DocumentAction::SetActivePage(Some(known_id)),
                    6 => DocumentAction::SetSelection(vec![known_id]),
                    7 => DocumentAction::ToggleSelection(known_id),
                    8 => DocumentAction::SetBookIndex(rng.gen_range(0..8)),
                    _ => DocumentAction::LoadPages(vec![test_page("l"), test_page("l")]),
                };
                state = reduce(state, action);
                assert_invariants(&state);
            }
        }
    }
}
