//! Output formats.
//!
//! Each domain has its own table of named [`Formatter`]s. A formatter turns an
//! ordered slice of rows into output records and declares whether it needs the
//! nucleotide slice of each row, which lets the row loader skip the sequence
//! column otherwise.

pub mod fasta;
pub mod formats;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::model::types::{ClusterRow, DomainRow, GeneRow, OutputRecord, ResultRows, SearchDomain};
use crate::search::registry::Registry;
use formats::{CLUSTER_FORMATS, DOMAIN_FORMATS, GENE_FORMATS};

pub const DEFAULT_RESULTS_URL: &str = "https://antismash-db.secondarymetabolites.org/output";

/// Settings shared by every formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Residues per FASTA body line.
    pub line_width: usize,
    /// Base of the per-record results page links.
    pub results_url: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            line_width: fasta::DEFAULT_LINE_WIDTH,
            results_url: DEFAULT_RESULTS_URL.to_string(),
        }
    }
}

pub type RenderFn<R> = fn(&RenderOptions, &[R]) -> Vec<OutputRecord>;

/// A named output format for rows of type `R`.
#[derive(Debug)]
pub struct Formatter<R> {
    pub name: &'static str,
    /// Extra names the format answers to.
    pub aliases: &'static [&'static str],
    pub needs_sequence: bool,
    pub render: RenderFn<R>,
}

impl<R> Clone for Formatter<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Formatter<R> {}

/// Per-domain format tables.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    cluster: Registry<Formatter<ClusterRow>>,
    gene: Registry<Formatter<GeneRow>>,
    domain: Registry<Formatter<DomainRow>>,
}

static BUILTIN: Lazy<FormatRegistry> = Lazy::new(FormatRegistry::with_builtin_formats);

fn register_all<R>(registry: &mut Registry<Formatter<R>>, formatters: &[Formatter<R>]) {
    for formatter in formatters {
        registry.register(formatter.name, *formatter);
        for alias in formatter.aliases {
            registry.register(alias, *formatter);
        }
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> &'static FormatRegistry {
        &BUILTIN
    }

    pub fn with_builtin_formats() -> Self {
        let mut registry = Self::new();
        register_all(&mut registry.cluster, CLUSTER_FORMATS);
        register_all(&mut registry.gene, GENE_FORMATS);
        register_all(&mut registry.domain, DOMAIN_FORMATS);
        registry
    }

    /// Whether `format` exists for `domain`.
    pub fn supports(&self, domain: SearchDomain, format: &str) -> bool {
        match domain {
            SearchDomain::Cluster => self.cluster.contains(format),
            SearchDomain::Gene => self.gene.contains(format),
            SearchDomain::Domain => self.domain.contains(format),
        }
    }

    /// Whether rendering `format` requires the nucleotide slice. Unknown
    /// formats need nothing.
    pub fn needs_sequence(&self, domain: SearchDomain, format: &str) -> bool {
        match domain {
            SearchDomain::Cluster => self.cluster.resolve(format).map(|f| f.needs_sequence),
            SearchDomain::Gene => self.gene.resolve(format).map(|f| f.needs_sequence),
            SearchDomain::Domain => self.domain.resolve(format).map(|f| f.needs_sequence),
        }
        .unwrap_or(false)
    }

    /// Format names (aliases included) for `domain`, sorted.
    pub fn formats(&self, domain: SearchDomain) -> Vec<&str> {
        match domain {
            SearchDomain::Cluster => self.cluster.names(),
            SearchDomain::Gene => self.gene.names(),
            SearchDomain::Domain => self.domain.names(),
        }
    }

    /// Render `rows` with the named format of `domain`.
    ///
    /// An unknown format, or rows that belong to another domain, produce no
    /// records.
    pub fn render(
        &self,
        domain: SearchDomain,
        format: &str,
        rows: &ResultRows,
        opts: &RenderOptions,
    ) -> Vec<OutputRecord> {
        let rendered = match (domain, rows) {
            (SearchDomain::Cluster, ResultRows::Clusters(rows)) => {
                self.cluster.resolve(format).map(|f| (f.render)(opts, rows))
            }
            (SearchDomain::Gene, ResultRows::Genes(rows)) => {
                self.gene.resolve(format).map(|f| (f.render)(opts, rows))
            }
            (SearchDomain::Domain, ResultRows::Domains(rows)) => {
                self.domain.resolve(format).map(|f| (f.render)(opts, rows))
            }
            _ => None,
        };
        rendered.unwrap_or_else(|| {
            debug!(
                domain = %domain,
                format,
                rows_domain = %rows.domain(),
                "no formatter for request; rendering nothing"
            );
            Vec::new()
        })
    }
}
