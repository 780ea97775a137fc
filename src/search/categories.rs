//! Built-in search categories.
//!
//! Every handler starts from its domain's base table and walks one of a few
//! join paths (to the taxonomy, to the owning regions, to genes, to domain
//! hits). The paths are spelled out per domain here so that handlers only
//! choose a path and a predicate.

use super::query::{EntityQuery, Predicate};
use super::registry::CategoryHandler;
use crate::model::types::SearchDomain;

/// Rank columns of the `taxa` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonRank {
    Superkingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    Strain,
}

impl TaxonRank {
    pub const ALL: [TaxonRank; 8] = [
        Self::Superkingdom,
        Self::Phylum,
        Self::Class,
        Self::Order,
        Self::Family,
        Self::Genus,
        Self::Species,
        Self::Strain,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Superkingdom => "superkingdom",
            Self::Phylum => "phylum",
            Self::Class => "class",
            Self::Order => "order",
            Self::Family => "family",
            Self::Genus => "genus",
            Self::Species => "species",
            Self::Strain => "strain",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Superkingdom => "t.superkingdom",
            Self::Phylum => "t.phylum",
            Self::Class => "t.taxclass",
            Self::Order => "t.taxorder",
            Self::Family => "t.family",
            Self::Genus => "t.genus",
            Self::Species => "t.species",
            Self::Strain => "t.strain",
        }
    }
}

// Every domain row sits on a locus, so the path to the sequence and the
// taxonomy only differs in the base alias.

fn sequence_path(domain: SearchDomain) -> &'static [&'static str] {
    match domain {
        SearchDomain::Cluster => &[
            "JOIN loci l ON l.locus_id = r.locus_id",
            "JOIN dna_sequences s ON s.sequence_id = l.sequence_id",
        ],
        SearchDomain::Gene => &[
            "JOIN loci l ON l.locus_id = g.locus_id",
            "JOIN dna_sequences s ON s.sequence_id = l.sequence_id",
        ],
        SearchDomain::Domain => &[
            "JOIN loci l ON l.locus_id = d.locus_id",
            "JOIN dna_sequences s ON s.sequence_id = l.sequence_id",
        ],
    }
}

fn taxon_path(domain: SearchDomain) -> Vec<&'static str> {
    let mut joins = sequence_path(domain).to_vec();
    joins.push("JOIN genomes ge ON ge.genome_id = s.genome_id");
    joins.push("JOIN taxa t ON t.tax_id = ge.tax_id");
    joins
}

/// Joins reaching the regions a row belongs to, followed by one join keyed
/// on the region id. `direct` is used when the base row is the region
/// itself, `mapped` when the region id comes from the CDS map alias `m`.
fn region_path(
    domain: SearchDomain,
    direct: &'static str,
    mapped: &'static str,
) -> Vec<&'static str> {
    match domain {
        SearchDomain::Cluster => vec![direct],
        SearchDomain::Gene => vec!["JOIN cds_region_map m ON m.gene_id = g.gene_id", mapped],
        SearchDomain::Domain => vec!["JOIN cds_region_map m ON m.gene_id = d.gene_id", mapped],
    }
}

/// Joins reaching the genes of a row; the gene alias is always `g`.
fn gene_path(domain: SearchDomain) -> &'static [&'static str] {
    match domain {
        SearchDomain::Cluster => &[
            "JOIN cds_region_map m ON m.region_id = r.region_id",
            "JOIN genes g ON g.gene_id = m.gene_id",
        ],
        SearchDomain::Gene => &[],
        SearchDomain::Domain => &["JOIN genes g ON g.gene_id = d.gene_id"],
    }
}

/// Joins reaching the domain hits of a row; the hit alias is always `d`.
fn domain_path(domain: SearchDomain) -> Vec<&'static str> {
    match domain {
        SearchDomain::Domain => Vec::new(),
        other => {
            let mut joins = gene_path(other).to_vec();
            joins.push("JOIN as_domains d ON d.gene_id = g.gene_id");
            joins
        }
    }
}

/// Shared taxonomy query: one join chain, filtered on the given rank.
pub fn taxon_query(domain: SearchDomain, rank: TaxonRank, value: &str) -> EntityQuery {
    EntityQuery::select(domain, &taxon_path(domain), Predicate::like(rank.column(), value))
}

fn query_superkingdom(domain: SearchDomain, value: &str) -> EntityQuery {
    taxon_query(domain, TaxonRank::Superkingdom, value)
}

fn query_phylum(domain: SearchDomain, value: &str) -> EntityQuery {
    taxon_query(domain, TaxonRank::Phylum, value)
}

fn query_class(domain: SearchDomain, value: &str) -> EntityQuery {
    taxon_query(domain, TaxonRank::Class, value)
}

fn query_order(domain: SearchDomain, value: &str) -> EntityQuery {
    taxon_query(domain, TaxonRank::Order, value)
}

fn query_family(domain: SearchDomain, value: &str) -> EntityQuery {
    taxon_query(domain, TaxonRank::Family, value)
}

fn query_genus(domain: SearchDomain, value: &str) -> EntityQuery {
    taxon_query(domain, TaxonRank::Genus, value)
}

fn query_species(domain: SearchDomain, value: &str) -> EntityQuery {
    taxon_query(domain, TaxonRank::Species, value)
}

fn query_strain(domain: SearchDomain, value: &str) -> EntityQuery {
    taxon_query(domain, TaxonRank::Strain, value)
}

fn query_taxid(domain: SearchDomain, value: &str) -> EntityQuery {
    match value.trim().parse::<i64>() {
        Ok(tax_id) => EntityQuery::select(domain, &taxon_path(domain), Predicate::eq("t.tax_id", tax_id)),
        Err(_) => EntityQuery::empty(domain),
    }
}

fn query_acc(domain: SearchDomain, value: &str) -> EntityQuery {
    EntityQuery::select(domain, sequence_path(domain), Predicate::like("s.acc", value))
}

fn query_type(domain: SearchDomain, value: &str) -> EntityQuery {
    let mut joins = region_path(
        domain,
        "JOIN rel_regions_types rt ON rt.region_id = r.region_id",
        "JOIN rel_regions_types rt ON rt.region_id = m.region_id",
    );
    joins.push("JOIN bgc_types bt ON bt.bgc_type_id = rt.bgc_type_id");
    EntityQuery::select(
        domain,
        &joins,
        Predicate::contains("bt.term", value).or(Predicate::contains("bt.description", value)),
    )
}

fn query_monomer(domain: SearchDomain, value: &str) -> EntityQuery {
    let mut joins = domain_path(domain);
    joins.push("JOIN rel_as_domains_monomers dm ON dm.as_domain_id = d.as_domain_id");
    joins.push("JOIN monomers mo ON mo.monomer_id = dm.monomer_id");
    EntityQuery::select(domain, &joins, Predicate::like("mo.name", value))
}

fn query_asdomain(domain: SearchDomain, value: &str) -> EntityQuery {
    EntityQuery::select(domain, &domain_path(domain), Predicate::like("d.name", value))
}

fn query_profile(domain: SearchDomain, value: &str) -> EntityQuery {
    let mut joins = gene_path(domain).to_vec();
    joins.push("JOIN profile_hits ph ON ph.gene_id = g.gene_id");
    joins.push("JOIN profiles p ON p.profile_id = ph.profile_id");
    EntityQuery::select(domain, &joins, Predicate::like("p.name", value))
}

fn compound_joins(domain: SearchDomain) -> Option<Vec<&'static str>> {
    match domain {
        SearchDomain::Cluster => Some(vec!["JOIN compounds c ON c.region_id = r.region_id"]),
        SearchDomain::Gene => Some(vec!["JOIN compounds c ON c.locus_tag = g.locus_tag"]),
        SearchDomain::Domain => None,
    }
}

fn query_compoundseq(domain: SearchDomain, value: &str) -> EntityQuery {
    match compound_joins(domain) {
        Some(joins) => EntityQuery::select(domain, &joins, Predicate::like("c.peptide_sequence", value)),
        None => EntityQuery::empty(domain),
    }
}

fn query_compoundclass(domain: SearchDomain, value: &str) -> EntityQuery {
    match compound_joins(domain) {
        Some(joins) => EntityQuery::select(domain, &joins, Predicate::like("c.class", value)),
        None => EntityQuery::empty(domain),
    }
}

/// Shared ClusterBlast-family query, filtered on the algorithm name.
fn clusterblast_query(domain: SearchDomain, algorithm: &str, value: &str) -> EntityQuery {
    let mut joins = region_path(
        domain,
        "JOIN clusterblast_hits cb ON cb.region_id = r.region_id",
        "JOIN clusterblast_hits cb ON cb.region_id = m.region_id",
    );
    joins.push("JOIN clusterblast_algorithms ca ON ca.algorithm_id = cb.algorithm_id");
    EntityQuery::select(
        domain,
        &joins,
        Predicate::eq("ca.name", algorithm.to_string()).and(Predicate::like("cb.acc", value)),
    )
}

fn query_clusterblast(domain: SearchDomain, value: &str) -> EntityQuery {
    clusterblast_query(domain, "clusterblast", value)
}

fn query_knowncluster(domain: SearchDomain, value: &str) -> EntityQuery {
    clusterblast_query(domain, "knownclusterblast", value)
}

fn query_subcluster(domain: SearchDomain, value: &str) -> EntityQuery {
    clusterblast_query(domain, "subclusterblast", value)
}

fn query_contigedge(domain: SearchDomain, value: &str) -> EntityQuery {
    let flag = match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => true,
        "false" | "no" | "0" => false,
        _ => return EntityQuery::empty(domain),
    };
    if domain != SearchDomain::Cluster {
        return EntityQuery::empty(domain);
    }
    EntityQuery::select(domain, &[], Predicate::eq("r.contig_edge", flag))
}

/// Categories available in every domain.
pub static SHARED_CATEGORIES: &[CategoryHandler] = &[
    CategoryHandler {
        name: "superkingdom",
        description: "Taxonomic superkingdom",
        build: query_superkingdom,
    },
    CategoryHandler {
        name: "phylum",
        description: "Taxonomic phylum",
        build: query_phylum,
    },
    CategoryHandler {
        name: "class",
        description: "Taxonomic class",
        build: query_class,
    },
    CategoryHandler {
        name: "order",
        description: "Taxonomic order",
        build: query_order,
    },
    CategoryHandler {
        name: "family",
        description: "Taxonomic family",
        build: query_family,
    },
    CategoryHandler {
        name: "genus",
        description: "Taxonomic genus",
        build: query_genus,
    },
    CategoryHandler {
        name: "species",
        description: "Taxonomic species",
        build: query_species,
    },
    CategoryHandler {
        name: "strain",
        description: "Strain name",
        build: query_strain,
    },
    CategoryHandler {
        name: "taxid",
        description: "NCBI taxonomy id",
        build: query_taxid,
    },
    CategoryHandler {
        name: "acc",
        description: "NCBI accession of the parent sequence",
        build: query_acc,
    },
    CategoryHandler {
        name: "type",
        description: "BGC type term or description (substring)",
        build: query_type,
    },
    CategoryHandler {
        name: "monomer",
        description: "Predicted adenylation/acyltransferase monomer",
        build: query_monomer,
    },
    CategoryHandler {
        name: "asdomain",
        description: "antiSMASH domain name",
        build: query_asdomain,
    },
    CategoryHandler {
        name: "clusterblast",
        description: "ClusterBlast hit accession",
        build: query_clusterblast,
    },
    CategoryHandler {
        name: "knowncluster",
        description: "KnownClusterBlast hit accession",
        build: query_knowncluster,
    },
    CategoryHandler {
        name: "subcluster",
        description: "SubClusterBlast hit accession",
        build: query_subcluster,
    },
];

pub static CLUSTER_CATEGORIES: &[CategoryHandler] = &[
    CategoryHandler {
        name: "compoundseq",
        description: "Predicted compound peptide sequence",
        build: query_compoundseq,
    },
    CategoryHandler {
        name: "compoundclass",
        description: "Predicted compound class",
        build: query_compoundclass,
    },
    CategoryHandler {
        name: "profile",
        description: "Detection profile hit on a member gene",
        build: query_profile,
    },
    CategoryHandler {
        name: "contigedge",
        description: "Region touches the edge of its contig (true/false)",
        build: query_contigedge,
    },
];

pub static GENE_CATEGORIES: &[CategoryHandler] = &[
    CategoryHandler {
        name: "compoundseq",
        description: "Predicted compound peptide sequence",
        build: query_compoundseq,
    },
    CategoryHandler {
        name: "compoundclass",
        description: "Predicted compound class",
        build: query_compoundclass,
    },
    CategoryHandler {
        name: "profile",
        description: "Detection profile hit",
        build: query_profile,
    },
];

pub static DOMAIN_CATEGORIES: &[CategoryHandler] = &[];
