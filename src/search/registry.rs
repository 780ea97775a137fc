//! Name-keyed dispatch tables for category handlers.
//!
//! Each search domain owns one table mapping a category name to a
//! [`CategoryHandler`]. Tables are filled once from the static handler lists
//! in [`super::categories`] and are read-only afterwards; the process-wide
//! instance is [`QueryRegistry::builtin`].

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::categories::{CLUSTER_CATEGORIES, DOMAIN_CATEGORIES, GENE_CATEGORIES, SHARED_CATEGORIES};
use super::query::EntityQuery;
use crate::model::types::SearchDomain;

/// Keyed table of `Copy` handlers.
///
/// Keys are matched case-insensitively; registering an existing key
/// replaces the previous entry.
#[derive(Debug, Clone)]
pub struct Registry<H> {
    entries: HashMap<String, H>,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H: Copy> Registry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, handler: H) -> Option<H> {
        self.entries.insert(name.to_ascii_lowercase(), handler)
    }

    pub fn resolve(&self, name: &str) -> Option<H> {
        self.entries.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the filtered query of one category for a given domain and value.
pub type CategoryFn = fn(SearchDomain, &str) -> EntityQuery;

/// A searchable category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryHandler {
    /// Category name as it appears in search terms (e.g. "genus").
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    pub build: CategoryFn,
}

/// Per-domain category tables.
#[derive(Debug, Clone, Default)]
pub struct QueryRegistry {
    cluster: Registry<CategoryHandler>,
    gene: Registry<CategoryHandler>,
    domain: Registry<CategoryHandler>,
}

static BUILTIN: Lazy<QueryRegistry> = Lazy::new(QueryRegistry::with_builtin_categories);

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry holding every built-in category.
    pub fn builtin() -> &'static QueryRegistry {
        &BUILTIN
    }

    pub fn with_builtin_categories() -> Self {
        let mut registry = Self::new();
        for domain in SearchDomain::ALL {
            for handler in SHARED_CATEGORIES {
                registry.register_handler(domain, *handler);
            }
        }
        for handler in CLUSTER_CATEGORIES {
            registry.register_handler(SearchDomain::Cluster, *handler);
        }
        for handler in GENE_CATEGORIES {
            registry.register_handler(SearchDomain::Gene, *handler);
        }
        for handler in DOMAIN_CATEGORIES {
            registry.register_handler(SearchDomain::Domain, *handler);
        }
        registry
    }

    fn table(&self, domain: SearchDomain) -> &Registry<CategoryHandler> {
        match domain {
            SearchDomain::Cluster => &self.cluster,
            SearchDomain::Gene => &self.gene,
            SearchDomain::Domain => &self.domain,
        }
    }

    fn table_mut(&mut self, domain: SearchDomain) -> &mut Registry<CategoryHandler> {
        match domain {
            SearchDomain::Cluster => &mut self.cluster,
            SearchDomain::Gene => &mut self.gene,
            SearchDomain::Domain => &mut self.domain,
        }
    }

    /// Register `handler` under its own name for `domain`, replacing any
    /// earlier handler of that name.
    pub fn register_handler(&mut self, domain: SearchDomain, handler: CategoryHandler) {
        self.table_mut(domain).register(handler.name, handler);
    }

    pub fn resolve(&self, domain: SearchDomain, category: &str) -> Option<CategoryHandler> {
        self.table(domain).resolve(category)
    }

    pub fn categories(&self, domain: SearchDomain) -> Vec<&str> {
        self.table(domain).names()
    }
}
