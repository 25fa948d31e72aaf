//! Structural extraction from cached Montreal Gazette pages.
//!
//! Both extractors follow the same two-layer pattern:
//!
//! 1. A generic walk over any [`query::Query`] node (`trending_links`,
//!    `article_record`) that only knows the page layout
//! 2. A `&str` entry point that parses markup with `scraper` and runs the walk
//!
//! # Pages
//!
//! | Page | Module | Produces |
//! |------|--------|----------|
//! | Homepage (`/category/news/`) | [`trending`] | ordered trending links |
//! | Article | [`article`] | one [`ArticleRecord`](crate::models::ArticleRecord) |

pub mod article;
pub mod query;
pub mod trending;

pub use article::extract_article;
pub use trending::extract_trending_links;
