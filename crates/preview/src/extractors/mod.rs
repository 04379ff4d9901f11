// ABOUTME: Type-specific field extractors used by the pipeline's per-content-type branches.
// ABOUTME: Shared meta/selector helpers live in `fields`; each content type has its own module.

//! Field extraction.
//!
//! Every extractor reads structured data first and falls back to DOM
//! selectors, returning `None` for anything it cannot find.

pub mod duration;
pub mod fields;
pub mod product;
pub mod social;
pub mod video;
