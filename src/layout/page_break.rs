//! # Page Break Decisions
//!
//! Blocks are unbreakable: a block either fits in the space left on the
//! current page or the whole block moves to the next one. A block taller than
//! an entire page can never fit; it moves at most once and is then placed at
//! the top of a fresh page, running past the bottom margin.

/// Slack for float noise when a block fills the remaining space exactly.
const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// The block fits where the cursor is.
    Place,
    /// Start a new page and place the block at its top.
    MoveToNextPage,
    /// The block does not fit even on a fresh page. Place it anyway.
    Overflow,
}

/// Decide where a block of height `needed` goes.
///
/// `remaining` is the space between the cursor and the bottom margin;
/// `at_page_top` is true when nothing has been placed on the page yet, so
/// breaking again would only produce an empty page.
pub fn decide_break(remaining: f64, needed: f64, at_page_top: bool) -> BreakDecision {
    if needed <= remaining + EPSILON {
        BreakDecision::Place
    } else if at_page_top {
        BreakDecision::Overflow
    } else {
        BreakDecision::MoveToNextPage
    }
}
