//! Request, term and row structs shared by the search and render layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity kinds a search can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDomain {
    Cluster,
    Gene,
    Domain,
}

impl SearchDomain {
    pub const ALL: [SearchDomain; 3] = [Self::Cluster, Self::Gene, Self::Domain];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Gene => "gene",
            Self::Domain => "domain",
        }
    }
}

impl fmt::Display for SearchDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a domain tag that names none of the searchable entity kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDomainTag(pub String);

impl FromStr for SearchDomain {
    type Err = UnknownDomainTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cluster" => Ok(Self::Cluster),
            "gene" => Ok(Self::Gene),
            "domain" => Ok(Self::Domain),
            _ => Err(UnknownDomainTag(s.to_string())),
        }
    }
}

/// Binary combinators of a term tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
    Or,
    Except,
}

/// Parsed boolean search expression.
///
/// Produced by the query-string parser and consumed read-only by the
/// compiler. Serialized with a `kind` tag:
///
/// ```json
/// {"kind": "operation", "operator": "and",
///  "left": {"kind": "expression", "category": "genus", "value": "streptomyces"},
///  "right": {"kind": "expression", "category": "type", "value": "nrps"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Term {
    Expression {
        category: String,
        value: String,
    },
    Operation {
        operator: Operator,
        left: Box<Term>,
        right: Box<Term>,
    },
}

impl Term {
    pub fn expr(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Expression {
            category: category.into(),
            value: value.into(),
        }
    }

    pub fn op(operator: Operator, left: Term, right: Term) -> Self {
        Self::Operation {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(self, right: Term) -> Self {
        Self::op(Operator::And, self, right)
    }

    pub fn or(self, right: Term) -> Self {
        Self::op(Operator::Or, self, right)
    }

    pub fn except(self, right: Term) -> Self {
        Self::op(Operator::Except, self, right)
    }

    /// Number of expression leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Expression { .. } => 1,
            Self::Operation { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

/// A search as handed over by the transport layer.
///
/// `domain` stays a raw tag here; resolving it is the orchestrator's job so
/// that an unsupported tag surfaces as a request error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub domain: String,
    pub terms: Term,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub format: Option<String>,
}

impl SearchRequest {
    pub fn new(domain: impl Into<String>, terms: Term) -> Self {
        Self {
            domain: domain.into(),
            terms,
            offset: None,
            limit: None,
            format: None,
        }
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Best KnownClusterBlast hit attached to a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownClusterHit {
    pub acc: String,
    pub description: String,
    pub similarity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRow {
    pub region_id: i64,
    pub region_number: i64,
    pub acc: String,
    pub version: i64,
    pub start: i64,
    pub end: i64,
    pub contig_edge: bool,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub strain: Option<String>,
    /// BGC type terms, sorted.
    pub types: Vec<String>,
    pub type_descriptions: Vec<String>,
    pub best_known_cluster: Option<KnownClusterHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nucleotides: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneRow {
    pub gene_id: i64,
    pub locus_tag: String,
    pub start: i64,
    pub end: i64,
    pub strand: i64,
    pub acc: String,
    pub version: i64,
    pub translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nucleotides: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRow {
    pub as_domain_id: i64,
    pub name: String,
    pub locus_tag: String,
    pub start: i64,
    pub end: i64,
    pub strand: i64,
    pub acc: String,
    pub version: i64,
    pub translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nucleotides: Option<String>,
}

/// Materialized rows of one domain, in primary-key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultRows {
    Clusters(Vec<ClusterRow>),
    Genes(Vec<GeneRow>),
    Domains(Vec<DomainRow>),
}

impl ResultRows {
    pub fn empty(domain: SearchDomain) -> Self {
        match domain {
            SearchDomain::Cluster => Self::Clusters(Vec::new()),
            SearchDomain::Gene => Self::Genes(Vec::new()),
            SearchDomain::Domain => Self::Domains(Vec::new()),
        }
    }

    pub fn domain(&self) -> SearchDomain {
        match self {
            Self::Clusters(_) => SearchDomain::Cluster,
            Self::Genes(_) => SearchDomain::Gene,
            Self::Domains(_) => SearchDomain::Domain,
        }
    }
}

/// One rendered output item: a structured row or a text record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Structured(serde_json::Value),
    Text(String),
}

impl OutputRecord {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Structured(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

impl Histogram {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, u64)>) -> Self {
        let (labels, data) = pairs.into_iter().unzip();
        Self { labels, data }
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|idx| self.data[idx])
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Categorical breakdowns over a result set.
///
/// Both histograms are absent for an empty result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub clusters_by_type: Option<Histogram>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub clusters_by_phylum: Option<Histogram>,
}

impl Statistics {
    pub fn is_empty(&self) -> bool {
        self.clusters_by_type.is_none() && self.clusters_by_phylum.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub total: usize,
    pub offset: usize,
    pub paginate: usize,
    pub results: Vec<OutputRecord>,
    pub stats: Statistics,
}
