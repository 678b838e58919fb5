//! "Load more" bookkeeping.
//!
//! Each request widens the neighbor search by `delta` on top of the base
//! count. The total never exceeds [`MAX_TOTAL_COUNT`].

use crate::params::DEFAULT_COUNT;

/// Upper bound on the neighbor count of a widened search.
pub const MAX_TOTAL_COUNT: u32 = 500;

/// Step used by a single "load more" action.
pub const LOAD_MORE_STEP: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationController {
    base_count: u32,
    extra_requested: u32,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(DEFAULT_COUNT)
    }
}

impl PaginationController {
    pub fn new(base_count: u32) -> Self {
        Self {
            base_count,
            extra_requested: 0,
        }
    }

    pub fn base_count(&self) -> u32 {
        self.base_count
    }

    pub fn extra_requested(&self) -> u32 {
        self.extra_requested
    }

    /// Neighbor count the next widened search asks for.
    pub fn effective_count(&self) -> u32 {
        self.base_count.saturating_add(self.extra_requested)
    }

    /// Whether `request_more(delta)` would be accepted.
    pub fn can_request_more(&self, delta: u32) -> bool {
        delta > 0
            && self
                .effective_count()
                .checked_add(delta)
                .is_some_and(|total| total <= MAX_TOTAL_COUNT)
    }

    /// Record a request for `delta` more results.
    ///
    /// Returns the new effective count, or `None` (state untouched) when the
    /// request would go past the cap.
    pub fn request_more(&mut self, delta: u32) -> Option<u32> {
        if !self.can_request_more(delta) {
            return None;
        }
        self.extra_requested += delta;
        Some(self.effective_count())
    }

    /// Start over for a new search.
    pub fn reset(&mut self, base_count: u32) {
        *self = Self::new(base_count);
    }
}
