//! Normalized entity structs.

pub mod catalog;
pub mod types;
