//! Categorical breakdowns over a result set.
//!
//! Statistics are computed over the distinct regions underlying the matched
//! rows: the regions themselves for cluster searches, the regions a gene is
//! mapped to for gene searches, and the regions of the owning gene for domain
//! hits. Rows without a type or phylum assignment are simply absent from the
//! corresponding histogram.

use rusqlite::Connection;
use rusqlite::types::Value;
use tracing::debug;

use super::query::EntityQuery;
use crate::model::types::{Histogram, SearchDomain, Statistics};

/// Select statement yielding the region ids underlying `query`'s rows.
fn region_ids_sql(query: &EntityQuery) -> (String, Vec<Value>) {
    let (inner, params) = query.to_sql();
    let sql = match query.domain() {
        SearchDomain::Cluster => format!("SELECT id FROM ({inner})"),
        SearchDomain::Gene => format!(
            "SELECT m.region_id FROM cds_region_map m WHERE m.gene_id IN (SELECT id FROM ({inner}))"
        ),
        SearchDomain::Domain => format!(
            "SELECT m.region_id FROM as_domains d \
             JOIN cds_region_map m ON m.gene_id = d.gene_id \
             WHERE d.as_domain_id IN (SELECT id FROM ({inner}))"
        ),
    };
    (sql, params)
}

fn histogram(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<Histogram> {
    let mut stmt = conn.prepare(sql)?;
    let pairs = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Histogram::from_pairs(pairs))
}

/// Compute type and phylum histograms for the rows matched by `query`.
///
/// `total` is the caller's row count for `query`. A zero total yields empty
/// statistics without running any SQL, not zero-filled histograms.
pub fn aggregate(
    conn: &Connection,
    query: &EntityQuery,
    total: usize,
) -> rusqlite::Result<Statistics> {
    if total == 0 {
        return Ok(Statistics::default());
    }

    let (regions, params) = region_ids_sql(query);

    let by_type = histogram(
        conn,
        &format!(
            "SELECT bt.term, COUNT(DISTINCT rt.region_id) \
             FROM bgc_types bt \
             JOIN rel_regions_types rt ON rt.bgc_type_id = bt.bgc_type_id \
             WHERE rt.region_id IN ({regions}) \
             GROUP BY bt.term \
             ORDER BY bt.term"
        ),
        &params,
    )?;

    let by_phylum = histogram(
        conn,
        &format!(
            "SELECT t.phylum, COUNT(DISTINCT r.region_id) \
             FROM regions r \
             JOIN loci l ON l.locus_id = r.locus_id \
             JOIN dna_sequences s ON s.sequence_id = l.sequence_id \
             JOIN genomes ge ON ge.genome_id = s.genome_id \
             JOIN taxa t ON t.tax_id = ge.tax_id \
             WHERE r.region_id IN ({regions}) AND t.phylum IS NOT NULL \
             GROUP BY t.phylum"
        ),
        &params,
    )?;

    debug!(
        domain = %query.domain(),
        types = by_type.labels.len(),
        phyla = by_phylum.labels.len(),
        "aggregated result statistics"
    );

    Ok(Statistics {
        clusters_by_type: Some(by_type),
        clusters_by_phylum: Some(by_phylum),
    })
}
