//! Search orchestration: domain resolution, compilation, counting,
//! statistics, paging and rendering.

use std::time::Instant;

use rusqlite::Connection;
use tracing::{debug, info};

use super::available;
use super::compiler::compile;
use super::error::SearchError;
use super::query::EntityQuery;
use super::registry::QueryRegistry;
use super::stats;
use crate::config::SearchConfig;
use crate::model::types::{OutputRecord, SearchDomain, SearchRequest, SearchResponse, Term};
use crate::render::FormatRegistry;
use crate::storage::rows::{Page, fetch_rows};

/// Format used when a request does not name one.
pub const DEFAULT_FORMAT: &str = "json";

/// Stateless search front end over a borrowed catalog connection.
pub struct SearchEngine<'a> {
    conn: &'a Connection,
    config: &'a SearchConfig,
    queries: &'a QueryRegistry,
    formats: &'a FormatRegistry,
}

impl<'a> SearchEngine<'a> {
    /// Engine using the built-in categories and formats.
    pub fn new(conn: &'a Connection, config: &'a SearchConfig) -> Self {
        Self::with_registries(
            conn,
            config,
            QueryRegistry::builtin(),
            FormatRegistry::builtin(),
        )
    }

    pub fn with_registries(
        conn: &'a Connection,
        config: &'a SearchConfig,
        queries: &'a QueryRegistry,
        formats: &'a FormatRegistry,
    ) -> Self {
        Self {
            conn,
            config,
            queries,
            formats,
        }
    }

    /// Compile `terms` for the domain named by `tag`.
    pub fn compile(&self, tag: &str, terms: &Term) -> Result<EntityQuery, SearchError> {
        let domain: SearchDomain = tag.parse()?;
        Ok(compile(self.queries, domain, terms))
    }

    /// Run one paged search.
    ///
    /// The total and the statistics always describe the full result set; the
    /// page window only limits which rows are loaded and rendered. A window
    /// starting at or past the end yields no rows.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let start = Instant::now();
        let query = self.compile(&request.domain, &request.terms)?;
        let domain = query.domain();
        let format = request.format.as_deref().unwrap_or(DEFAULT_FORMAT);
        let offset = request.offset.unwrap_or(0);
        let paginate = request.limit.unwrap_or(self.config.page_size);

        let total = query.count(self.conn)?;
        let stats = stats::aggregate(self.conn, &query, total)?;

        let results = if offset >= total || paginate == 0 {
            debug!(total, offset, paginate, "page window is empty");
            Vec::new()
        } else {
            self.render_page(&query, format, Page::new(offset, paginate))?
        };

        info!(
            domain = %domain,
            format,
            leaves = request.terms.leaf_count(),
            total,
            offset,
            paginate,
            returned = results.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "search_complete"
        );

        Ok(SearchResponse {
            total,
            offset,
            paginate,
            results,
            stats,
        })
    }

    /// Render the full result set as tab-separated lines, header first.
    pub fn export(&self, tag: &str, terms: &Term) -> Result<Vec<String>, SearchError> {
        let query = self.compile(tag, terms)?;
        let records = self.render_page(&query, "csv", Page::all())?;
        info!(domain = %query.domain(), lines = records.len(), "export_complete");
        Ok(records
            .into_iter()
            .filter_map(|record| match record {
                OutputRecord::Text(line) => Some(line),
                OutputRecord::Structured(_) => None,
            })
            .collect())
    }

    /// Every region on the sequence `acc`, as structured rows.
    pub fn genome(&self, acc: &str) -> Result<Vec<OutputRecord>, SearchError> {
        let query = compile(
            self.queries,
            SearchDomain::Cluster,
            &Term::expr("acc", acc),
        );
        self.render_page(&query, DEFAULT_FORMAT, Page::all())
    }

    /// Known values of `category` starting with `partial`, capped by the
    /// configured limit.
    pub fn available_terms(&self, category: &str, partial: &str) -> Result<Vec<String>, SearchError> {
        Ok(available::available_terms(
            self.conn,
            category,
            partial,
            self.config.available_limit,
        )?)
    }

    fn render_page(
        &self,
        query: &EntityQuery,
        format: &str,
        page: Page,
    ) -> Result<Vec<OutputRecord>, SearchError> {
        let domain = query.domain();
        if !self.formats.supports(domain, format) {
            debug!(
                domain = %domain,
                format,
                known = ?self.formats.formats(domain),
                "unknown output format"
            );
            return Ok(Vec::new());
        }
        let with_sequence = self.formats.needs_sequence(domain, format);
        let rows = fetch_rows(self.conn, query, page, with_sequence)?;
        Ok(self
            .formats
            .render(domain, format, &rows, &self.config.render_options()))
    }
}
