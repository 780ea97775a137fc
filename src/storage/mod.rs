//! Catalog storage: schema management and row loading.

pub mod rows;
pub mod sqlite;
