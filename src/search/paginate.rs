//! Pagination continuation.
//!
//! The text engine reports no trustworthy total-hit count, so the only
//! continuation signal available on both branches is the shape of the page
//! itself: a short page means nothing further exists. This is a heuristic —
//! a corpus whose size is an exact multiple of the page size costs the
//! client one extra empty request — and is documented as such in the API.

use crate::search::types::LAST_PAGE;

/// Resolve the page number reported to the client.
///
/// A page shorter than `page_size` becomes the [`LAST_PAGE`] sentinel
/// regardless of the requested number; otherwise the requested page is
/// echoed back.
pub fn resolve_page(requested: u32, returned: usize, page_size: usize) -> i64 {
    if returned < page_size {
        LAST_PAGE
    } else {
        i64::from(requested)
    }
}
