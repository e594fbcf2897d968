// Keytouch Candidates - Window
// The candidate list currently on screen and the pager behind it

use crate::action::PageDirection;
use crate::candidates::CandidatePager;

/// A candidate list as delivered by the composition engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CandidateList {
    pub items: Vec<String>,
    /// Total reported by the engine; negative before the first list
    pub total: i32,
    /// Engine-side page of this list, -1 when unknown
    pub current_page: i32,
}

impl CandidateList {
    pub fn new(items: Vec<String>, total: i32, current_page: i32) -> Self {
        Self {
            items,
            total,
            current_page,
        }
    }
}

/// Displayed candidates plus enough state to map a tap back to an engine index.
#[derive(Debug, Clone)]
pub struct CandidateWindow {
    items: Vec<String>,
    total: i32,
    /// Engine index of the first displayed item
    offset: usize,
    pager: CandidatePager,
}

impl Default for CandidateWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateWindow {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            total: -1,
            offset: 0,
            pager: CandidatePager::new(),
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// True while the engine reports any candidates
    pub fn is_showing(&self) -> bool {
        self.total > 0
    }

    pub fn pager(&self) -> &CandidatePager {
        &self.pager
    }

    pub fn pager_mut(&mut self) -> &mut CandidatePager {
        &mut self.pager
    }

    /// Replace the displayed list.
    ///
    /// A list without a page direction is a fresh list: paging starts over
    /// at the list's own page. A paged list keeps the pager and is shown at
    /// the offset that was requested for it.
    pub fn update(&mut self, list: CandidateList, page: Option<PageDirection>) {
        self.total = list.total;
        self.items = list.items;
        match page {
            None => {
                let fresh = if list.current_page < 0 || list.total < 0 {
                    0
                } else {
                    list.current_page as usize * list.total as usize
                };
                self.offset = fresh;
                self.pager.reset(fresh);
            }
            Some(_) => self.offset = self.pager.offset(),
        }
    }

    /// The host laid out `count` items of the current page
    pub fn on_laid_out(&mut self, count: usize) {
        self.pager.record_page_boundary(count);
    }

    /// Engine index of the displayed item at `position`
    pub fn candidate_index(&self, position: usize) -> Option<usize> {
        (position < self.items.len()).then(|| self.offset + position)
    }
}
