//! Built-in output formats for each search domain.

use tracing::warn;

use super::fasta;
use super::{Formatter, RenderOptions};
use crate::model::types::{ClusterRow, DomainRow, GeneRow, OutputRecord};

// Tabular coordinates are the stored 0-based start and exclusive end; only
// FASTA headers shift the start to 1-based.

pub const GENE_CSV_HEADER: &str = "#Locus tag\tAccession\tStart\tEnd\tStrand";
pub const CLUSTER_CSV_HEADER: &str = "#Species\tNCBI accession\tCluster number\tBGC type\tFrom\tTo\tMost similar known cluster\tSimilarity in %\tMIBiG BGC-ID\tResults URL";
pub const DOMAIN_CSV_HEADER: &str = "#Domain\tLocus tag\tAccession\tStart\tEnd\tStrand";

fn json_rows<R: serde::Serialize>(rows: &[R]) -> Vec<OutputRecord> {
    rows.iter()
        .filter_map(|row| match serde_json::to_value(row) {
            Ok(value) => Some(OutputRecord::Structured(value)),
            Err(err) => {
                warn!(error = %err, "failed to serialize result row");
                None
            }
        })
        .collect()
}

fn csv_lines(header: &str, body: impl Iterator<Item = String>) -> Vec<OutputRecord> {
    std::iter::once(header.to_string())
        .chain(body)
        .map(OutputRecord::Text)
        .collect()
}

/// FASTA records from `(header, body)` pairs; rows without a body (no
/// stored translation, or no loaded sequence) are skipped.
fn fasta_records<'a>(
    opts: &RenderOptions,
    rows: impl Iterator<Item = (String, Option<&'a str>)>,
) -> Vec<OutputRecord> {
    rows.filter_map(|(header, body)| body.map(|b| (header, b)))
        .map(|(header, body)| OutputRecord::Text(fasta::record(header, body, opts.line_width)))
        .collect()
}

// Genes

fn gene_header(row: &GeneRow) -> String {
    fasta::header(&row.locus_tag, &row.acc, row.version, row.start, row.end, row.strand)
}

fn gene_json(_opts: &RenderOptions, rows: &[GeneRow]) -> Vec<OutputRecord> {
    json_rows(rows)
}

fn gene_csv(_opts: &RenderOptions, rows: &[GeneRow]) -> Vec<OutputRecord> {
    csv_lines(
        GENE_CSV_HEADER,
        rows.iter().map(|g| {
            format!(
                "{}\t{}.{}\t{}\t{}\t{}",
                g.locus_tag,
                g.acc,
                g.version,
                g.start,
                g.end,
                g.strand
            )
        }),
    )
}

fn gene_fasta_nucleotide(opts: &RenderOptions, rows: &[GeneRow]) -> Vec<OutputRecord> {
    let oriented: Vec<(String, Option<String>)> = rows
        .iter()
        .map(|g| {
            (
                gene_header(g),
                g.nucleotides.as_deref().map(|s| fasta::oriented(s, g.strand)),
            )
        })
        .collect();
    fasta_records(
        opts,
        oriented.iter().map(|(h, s)| (h.clone(), s.as_deref())),
    )
}

fn gene_fasta_protein(opts: &RenderOptions, rows: &[GeneRow]) -> Vec<OutputRecord> {
    fasta_records(
        opts,
        rows.iter()
            .map(|g| (gene_header(g), g.translation.as_deref())),
    )
}

// Domain hits

fn domain_header(row: &DomainRow) -> String {
    let label = format!("{}_{}", row.locus_tag, row.name);
    fasta::header(&label, &row.acc, row.version, row.start, row.end, row.strand)
}

fn domain_json(_opts: &RenderOptions, rows: &[DomainRow]) -> Vec<OutputRecord> {
    json_rows(rows)
}

fn domain_csv(_opts: &RenderOptions, rows: &[DomainRow]) -> Vec<OutputRecord> {
    csv_lines(
        DOMAIN_CSV_HEADER,
        rows.iter().map(|d| {
            format!(
                "{}\t{}\t{}.{}\t{}\t{}\t{}",
                d.name,
                d.locus_tag,
                d.acc,
                d.version,
                d.start,
                d.end,
                d.strand
            )
        }),
    )
}

fn domain_fasta_nucleotide(opts: &RenderOptions, rows: &[DomainRow]) -> Vec<OutputRecord> {
    let oriented: Vec<(String, Option<String>)> = rows
        .iter()
        .map(|d| {
            (
                domain_header(d),
                d.nucleotides.as_deref().map(|s| fasta::oriented(s, d.strand)),
            )
        })
        .collect();
    fasta_records(
        opts,
        oriented.iter().map(|(h, s)| (h.clone(), s.as_deref())),
    )
}

fn domain_fasta_protein(opts: &RenderOptions, rows: &[DomainRow]) -> Vec<OutputRecord> {
    fasta_records(
        opts,
        rows.iter()
            .map(|d| (domain_header(d), d.translation.as_deref())),
    )
}

// Clusters

/// Link to the antiSMASH result page of a region.
pub fn results_url(base: &str, row: &ClusterRow) -> String {
    format!(
        "{}/{}.{}/index.html#r1c{}",
        base.trim_end_matches('/'),
        row.acc,
        row.version,
        row.region_number
    )
}

fn cluster_json(_opts: &RenderOptions, rows: &[ClusterRow]) -> Vec<OutputRecord> {
    json_rows(rows)
}

fn cluster_csv(opts: &RenderOptions, rows: &[ClusterRow]) -> Vec<OutputRecord> {
    csv_lines(
        CLUSTER_CSV_HEADER,
        rows.iter().map(|c| {
            let species = c
                .species
                .as_deref()
                .or(c.genus.as_deref())
                .unwrap_or_default();
            let (known, similarity, bgc_id) = match &c.best_known_cluster {
                Some(hit) => (
                    hit.description.as_str(),
                    hit.similarity.map(|s| s.to_string()).unwrap_or_default(),
                    hit.acc.as_str(),
                ),
                None => ("", String::new(), ""),
            };
            format!(
                "{species}\t{}.{}\t{}\t{}\t{}\t{}\t{known}\t{similarity}\t{bgc_id}\t{}",
                c.acc,
                c.version,
                c.region_number,
                c.types.join(","),
                c.start,
                c.end,
                results_url(&opts.results_url, c)
            )
        }),
    )
}

fn cluster_fasta_nucleotide(opts: &RenderOptions, rows: &[ClusterRow]) -> Vec<OutputRecord> {
    fasta_records(
        opts,
        rows.iter().map(|c| {
            let label = format!("{}.{}_region{}", c.acc, c.version, c.region_number);
            (
                fasta::header(&label, &c.acc, c.version, c.start, c.end, 1),
                c.nucleotides.as_deref(),
            )
        }),
    )
}

pub static CLUSTER_FORMATS: &[Formatter<ClusterRow>] = &[
    Formatter {
        name: "json",
        aliases: &[],
        needs_sequence: false,
        render: cluster_json,
    },
    Formatter {
        name: "csv",
        aliases: &[],
        needs_sequence: false,
        render: cluster_csv,
    },
    Formatter {
        name: "fasta-nucleotide",
        aliases: &["fasta"],
        needs_sequence: true,
        render: cluster_fasta_nucleotide,
    },
];

pub static GENE_FORMATS: &[Formatter<GeneRow>] = &[
    Formatter {
        name: "json",
        aliases: &[],
        needs_sequence: false,
        render: gene_json,
    },
    Formatter {
        name: "csv",
        aliases: &[],
        needs_sequence: false,
        render: gene_csv,
    },
    Formatter {
        name: "fasta-nucleotide",
        aliases: &["fasta"],
        needs_sequence: true,
        render: gene_fasta_nucleotide,
    },
    Formatter {
        name: "fasta-protein",
        aliases: &["fastaa"],
        needs_sequence: false,
        render: gene_fasta_protein,
    },
];

pub static DOMAIN_FORMATS: &[Formatter<DomainRow>] = &[
    Formatter {
        name: "json",
        aliases: &[],
        needs_sequence: false,
        render: domain_json,
    },
    Formatter {
        name: "csv",
        aliases: &[],
        needs_sequence: false,
        render: domain_csv,
    },
    Formatter {
        name: "fasta-nucleotide",
        aliases: &["fasta"],
        needs_sequence: true,
        render: domain_fasta_nucleotide,
    },
    Formatter {
        name: "fasta-protein",
        aliases: &["fastaa"],
        needs_sequence: false,
        render: domain_fasta_protein,
    },
];
