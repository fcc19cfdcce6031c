//! The query translation and result-highlighting engine.
//!
//! One search request flows through this module in a fixed order:
//!
//! 1. [`command`] extracts embedded directives (`mindate:`/`maxdate:`) from
//!    the raw query text.
//! 2. [`filter`] compiles the merged filter map into dual-encoded
//!    [`FilterSpec`](filter::FilterSpec)s, one encoding per backend.
//! 3. [`executor`] routes to the structured store (no free text) or the
//!    text engine (free text), invoking the normalizer only on the text
//!    branch.
//! 4. [`postprocess`] escapes, truncates, and highlights the raw records.
//! 5. [`paginate`] decides whether a further page exists.
//!
//! [`service`] composes the steps into the public [`SearchService`](service::SearchService).

pub mod command;
pub mod executor;
pub mod filter;
pub mod paginate;
pub mod postprocess;
pub mod service;
pub mod types;

pub use service::SearchService;
pub use types::{Alert, AlertKind, RawQuery, SearchResponse};
