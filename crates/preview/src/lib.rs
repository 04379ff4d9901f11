// ABOUTME: Library entry point for the link preview pipeline.
// ABOUTME: Re-exports Pipeline, PipelineBuilder, Options, PreviewRecord, ContentType and the error types.

//! Link previews from arbitrary web pages.
//!
//! Raw HTML is parsed, its structured data collected, the page classified
//! (article, product, video, social, gallery or default) and a compact
//! [`PreviewRecord`] assembled. Extraction never fails: problems surface as
//! error-typed records carrying a short user-facing message.
//!
//! # Example
//!
//! ```no_run
//! use digests_preview::Pipeline;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = Pipeline::builder().max_images(3).build();
//!     let fetcher = pipeline.http_fetcher().expect("http client");
//!     let record = pipeline.preview(&fetcher, "https://example.com/article").await;
//!     println!("{}", serde_json::to_string_pretty(&record).unwrap());
//! }
//! ```

pub mod cache;
pub mod classify;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod images;
pub mod options;
pub mod pipeline;
pub mod preview;
pub mod readability;
pub mod resource;
pub mod schema;
pub mod summarize;

pub use crate::cache::PreviewCache;
pub use crate::classify::classify;
pub use crate::dom::ParsedDocument;
pub use crate::error::{ErrorCode, FailureCategory, PreviewError};
pub use crate::images::{extract_gallery_images, extract_important_images};
pub use crate::options::{Options, PipelineBuilder};
pub use crate::pipeline::{Pipeline, Stage};
pub use crate::preview::{
    ArticleDetails, ContentType, ErrorDetails, GalleryDetails, ImageCandidate, Interactions,
    PreviewDetails, PreviewRecord, ProductDetails, SocialDetails, VideoDetails,
};
pub use crate::readability::{parse_article, ArticleExtract};
pub use crate::resource::{Fetcher, HttpFetcher};
pub use crate::schema::{extract_schema, SchemaRecord, SchemaSet};
pub use crate::summarize::summarize;
