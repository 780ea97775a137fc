//! Catalog records as loaded into storage.

use serde::{Deserialize, Serialize};

/// Coordinates on a parent sequence: 0-based start, exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub start: i64,
    pub end: i64,
    pub strand: i64,
}

impl Location {
    pub fn forward(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            strand: 1,
        }
    }

    pub fn reverse(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            strand: -1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxon {
    pub tax_id: i64,
    pub superkingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub strain: Option<String>,
}

/// Per-type region count for the database summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub name: String,
    pub description: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonCount {
    pub tax_id: i64,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub count: i64,
}

/// Overview of catalog contents.
///
/// `top_secmet_*` describe the taxon with the most regions per sequence,
/// counting only sequences that carry at least one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseSummary {
    pub num_clusters: i64,
    pub num_genomes: i64,
    pub num_sequences: i64,
    pub top_seq_taxon: Option<TaxonCount>,
    pub top_secmet_taxon: Option<i64>,
    pub top_secmet_species: Option<String>,
    pub top_secmet_taxon_count: Option<f64>,
    pub clusters: Vec<TypeCount>,
}

/// One node of the BGC type tree: a type root (`parent == "#"`) or a
/// region listed under its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeTreeNode {
    pub id: String,
    pub parent: String,
    pub text: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<NodeState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeState {
    pub disabled: bool,
}

impl TypeTreeNode {
    /// Parent id of the type roots.
    pub const ROOT: &'static str = "#";
}
