//! Search layer facade.
//!
//! - **[`query`]**: composable primary-key queries rendered to SQLite compound selects.
//! - **[`categories`]**: built-in search categories and their join paths.
//! - **[`registry`]**: per-domain category dispatch tables.
//! - **[`compiler`]**: term tree → query.
//! - **[`stats`]**: type and phylum histograms over a result set.
//! - **[`available`]**: value completion for search categories.
//! - **[`engine`]**: the orchestrator behind `search`, `export` and `available`.

pub mod available;
pub mod categories;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod query;
pub mod registry;
pub mod stats;

pub use engine::SearchEngine;
pub use error::SearchError;
