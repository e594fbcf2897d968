// Keytouch Candidates - Pager
// Offsets of fetched candidate pages, independent of rendering

/// Remembers where each fetched page of a candidate list begins.
///
/// Page 0 starts at the offset given to the last [`CandidatePager::reset`].
/// Boundaries are learned as pages are laid out, so navigation forward past
/// the last known page can only make a best-effort request.
#[derive(Debug, Clone, Default)]
pub struct CandidatePager {
    /// Start offset of each recorded page, non-decreasing
    offsets: Vec<usize>,
    current: usize,
    offset: usize,
    /// Bumped on every reset so in-flight page fetches can be recognized as stale
    generation: u64,
}

impl CandidatePager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page currently displayed, 0-based
    pub fn current_page(&self) -> usize {
        self.current
    }

    /// Offset of the last requested page
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn recorded_pages(&self) -> usize {
        self.offsets.len()
    }

    /// Start a fresh list whose first page begins at `offset`
    pub fn reset(&mut self, offset: usize) {
        self.offsets.clear();
        self.current = 0;
        self.offset = offset;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Record that the current page shows `count` items.
    ///
    /// Establishes where the next page begins. Pages whose successor is
    /// already known are left untouched.
    pub fn record_page_boundary(&mut self, count: usize) {
        if self.offsets.is_empty() {
            self.offsets.push(self.offset);
            self.offsets.push(self.offset + count);
            self.current = 0;
            return;
        }
        if self.offsets.len() == self.current + 1 {
            let start = self.offsets[self.current];
            self.offsets.push(start + count);
        }
    }

    /// Move to the next page and return the offset to request
    pub fn advance(&mut self) -> usize {
        self.current += 1;
        self.offset = self
            .offsets
            .get(self.current)
            .or_else(|| self.offsets.last())
            .copied()
            .unwrap_or(self.offset);
        self.offset
    }

    /// Move to the previous page; `None` leaves the view unchanged
    pub fn retreat(&mut self) -> Option<usize> {
        if self.offsets.is_empty() || self.current == 0 {
            return None;
        }
        self.current -= 1;
        self.offset = self.offsets.get(self.current).copied().unwrap_or(0);
        Some(self.offset)
    }

    /// Undo the page change of an [`Self::advance`] whose fetch came back empty
    pub fn retreat_one_step(&mut self) {
        self.current = self.current.saturating_sub(1);
    }
}
