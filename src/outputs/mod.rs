//! Output generation.
//!
//! - [`json`]: writes the collected [`ArticleRecord`](crate::models::ArticleRecord)s
//!   as a single JSON array, once, after collection finishes

pub mod json;
