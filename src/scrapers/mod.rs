//! Site-agnostic extraction driven by [`crate::rules::SiteProfile`] data.
//!
//! | Stage | Module | Input | Output |
//! |-------|--------|-------|--------|
//! | Listing scan | [`listing`] | listing page + rule | `Vec<ArticleSummary>` |
//! | Uniqueness gate | [`dedup`] | titles | accept / reject |
//! | Body extraction | [`article`] | detail page + body rule | `ArticleBody` |
//! | Section discovery | [`categories`] | any page | `Vec<CategoryLink>` |
//!
//! Nothing here performs I/O. Fetching and summarizing live in
//! [`crate::fetch`] and [`crate::api`]; [`crate::session`] wires them together.

pub mod article;
pub mod categories;
pub mod dedup;
pub mod listing;
