use tracing::debug;

use super::*;
use crate::view::{reduce, ViewPage, ViewQuery};

impl<S: KeyValueStore, C: Clock> App<S, C> {
    pub fn query(&self) -> ViewQuery {
        ViewQuery {
            search: self.search.clone(),
            sort: self.sort,
            page: self.current_page,
            page_size: self.page_size,
        }
    }

    /// The currently visible page.
    pub fn view(&self) -> ViewPage<'_> {
        reduce(&self.records, &self.query())
    }

    pub fn total_pages(&self) -> usize {
        self.view().total_pages
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> SortDirective {
        self.sort
    }

    /// Record a keystroke in the search box. The term is applied by
    /// [`App::poll`] once input has been quiet for the search window.
    pub fn set_search_input(&mut self, term: impl Into<String>) {
        self.pending_search = Some(term.into());
        let now = self.factory.clock().now();
        self.search_debounce.trigger(now);
    }

    pub fn apply_search_now(&mut self, term: impl Into<String>) {
        self.search_debounce.cancel();
        self.pending_search = None;
        self.search = term.into();
        self.current_page = 1;
        debug!(search = %self.search, "Search applied");
    }

    pub(super) fn apply_pending_search(&mut self) -> bool {
        match self.pending_search.take() {
            Some(term) => {
                self.apply_search_now(term);
                true
            }
            None => false,
        }
    }

    pub fn set_sort(&mut self, sort: SortDirective) {
        self.sort = sort;
        self.current_page = 1;
    }

    /// Move one page forward (`1`) or back (`-1`). Moves past either end are ignored.
    pub fn paginate(&mut self, direction: isize) -> bool {
        let target = self.current_page as isize + direction;
        if target < 1 {
            debug!(page = target, "Ignoring page before first");
            return false;
        }
        self.go_to_page(target as usize)
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        let total_pages = self.total_pages();
        if page < 1 || page > total_pages {
            debug!(page, total_pages, "Ignoring out-of-range page");
            return false;
        }
        self.current_page = page;
        true
    }
}
