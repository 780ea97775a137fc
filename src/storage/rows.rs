//! Page loaders turning a compiled [`EntityQuery`] into domain rows.
//!
//! Every loader restricts its base table to the query's key set, orders by
//! primary key and applies the page window in SQL. The nucleotide slice of the
//! parent sequence is only selected when the caller asks for it.

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

use crate::model::types::{
    ClusterRow, DomainRow, GeneRow, KnownClusterHit, ResultRows, SearchDomain,
};
use crate::search::query::{EntityQuery, EntityTable};

/// Window over a primary-key ordered result set. `limit: None` means "to the end".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    /// The whole result set.
    pub fn all() -> Self {
        Self::default()
    }

    fn sql_limit(&self) -> i64 {
        self.limit.map_or(-1, |n| n as i64)
    }
}

const SEQUENCE_SLICE: &str = "substr(s.dna, l.start_pos + 1, l.end_pos - l.start_pos)";

fn sequence_column(with_sequence: bool) -> &'static str {
    if with_sequence { SEQUENCE_SLICE } else { "NULL" }
}

/// Bind the compiled query's parameters followed by the page window.
fn page_params(mut params: Vec<Value>, page: Page) -> Vec<Value> {
    params.push(Value::Integer(page.sql_limit()));
    params.push(Value::Integer(page.offset as i64));
    params
}

fn restriction(query: &EntityQuery) -> (String, Vec<Value>) {
    let table = EntityTable::of(query.domain());
    let (inner, params) = query.to_sql();
    (
        format!(
            "{key} IN (SELECT id FROM ({inner})) ORDER BY {key} LIMIT ? OFFSET ?",
            key = table.key_column()
        ),
        params,
    )
}

/// Load one page of rows matched by `query`.
pub fn fetch_rows(
    conn: &Connection,
    query: &EntityQuery,
    page: Page,
    with_sequence: bool,
) -> rusqlite::Result<ResultRows> {
    if query.is_trivially_empty() || page.limit == Some(0) {
        return Ok(ResultRows::empty(query.domain()));
    }
    Ok(match query.domain() {
        SearchDomain::Cluster => {
            ResultRows::Clusters(fetch_cluster_rows(conn, query, page, with_sequence)?)
        }
        SearchDomain::Gene => {
            ResultRows::Genes(fetch_gene_rows(conn, query, page, with_sequence)?)
        }
        SearchDomain::Domain => {
            ResultRows::Domains(fetch_domain_rows(conn, query, page, with_sequence)?)
        }
    })
}

pub fn fetch_gene_rows(
    conn: &Connection,
    query: &EntityQuery,
    page: Page,
    with_sequence: bool,
) -> rusqlite::Result<Vec<GeneRow>> {
    let (filter, params) = restriction(query);
    let sql = format!(
        "SELECT g.gene_id, g.locus_tag, l.start_pos, l.end_pos, l.strand, s.acc, s.version,
                g.translation, {seq}
         FROM genes g
         JOIN loci l ON l.locus_id = g.locus_id
         JOIN dna_sequences s ON s.sequence_id = l.sequence_id
         WHERE {filter}",
        seq = sequence_column(with_sequence)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(page_params(params, page)), |row| {
        Ok(GeneRow {
            gene_id: row.get(0)?,
            locus_tag: row.get(1)?,
            start: row.get(2)?,
            end: row.get(3)?,
            strand: row.get(4)?,
            acc: row.get(5)?,
            version: row.get(6)?,
            translation: row.get(7)?,
            nucleotides: row.get(8)?,
        })
    })?;
    rows.collect()
}

pub fn fetch_domain_rows(
    conn: &Connection,
    query: &EntityQuery,
    page: Page,
    with_sequence: bool,
) -> rusqlite::Result<Vec<DomainRow>> {
    let (filter, params) = restriction(query);
    let sql = format!(
        "SELECT d.as_domain_id, d.name, g.locus_tag, l.start_pos, l.end_pos, l.strand,
                s.acc, s.version, d.translation, {seq}
         FROM as_domains d
         JOIN genes g ON g.gene_id = d.gene_id
         JOIN loci l ON l.locus_id = d.locus_id
         JOIN dna_sequences s ON s.sequence_id = l.sequence_id
         WHERE {filter}",
        seq = sequence_column(with_sequence)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(page_params(params, page)), |row| {
        Ok(DomainRow {
            as_domain_id: row.get(0)?,
            name: row.get(1)?,
            locus_tag: row.get(2)?,
            start: row.get(3)?,
            end: row.get(4)?,
            strand: row.get(5)?,
            acc: row.get(6)?,
            version: row.get(7)?,
            translation: row.get(8)?,
            nucleotides: row.get(9)?,
        })
    })?;
    rows.collect()
}

pub fn fetch_cluster_rows(
    conn: &Connection,
    query: &EntityQuery,
    page: Page,
    with_sequence: bool,
) -> rusqlite::Result<Vec<ClusterRow>> {
    let (filter, params) = restriction(query);
    let sql = format!(
        "SELECT r.region_id, r.region_number, s.acc, s.version, l.start_pos, l.end_pos,
                r.contig_edge, t.genus, t.species, t.strain, {seq}
         FROM regions r
         JOIN loci l ON l.locus_id = r.locus_id
         JOIN dna_sequences s ON s.sequence_id = l.sequence_id
         LEFT JOIN genomes ge ON ge.genome_id = s.genome_id
         LEFT JOIN taxa t ON t.tax_id = ge.tax_id
         WHERE {filter}",
        seq = sequence_column(with_sequence)
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query_map(params_from_iter(page_params(params, page)), |row| {
            Ok(ClusterRow {
                region_id: row.get(0)?,
                region_number: row.get(1)?,
                acc: row.get(2)?,
                version: row.get(3)?,
                start: row.get(4)?,
                end: row.get(5)?,
                contig_edge: row.get(6)?,
                genus: row.get(7)?,
                species: row.get(8)?,
                strain: row.get(9)?,
                types: Vec::new(),
                type_descriptions: Vec::new(),
                best_known_cluster: None,
                nucleotides: row.get(10)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut types = conn.prepare_cached(
        "SELECT bt.term, COALESCE(bt.description, bt.term)
         FROM rel_regions_types rt
         JOIN bgc_types bt ON bt.bgc_type_id = rt.bgc_type_id
         WHERE rt.region_id = ?
         ORDER BY bt.term",
    )?;
    let mut best_hit = conn.prepare_cached(
        "SELECT cb.acc, COALESCE(cb.description, ''), cb.similarity
         FROM clusterblast_hits cb
         JOIN clusterblast_algorithms ca ON ca.algorithm_id = cb.algorithm_id
         WHERE cb.region_id = ? AND ca.name = 'knownclusterblast'
         ORDER BY cb.hit_rank, cb.clusterblast_hit_id
         LIMIT 1",
    )?;

    for row in &mut rows {
        let pairs = types
            .query_map(params![row.region_id], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        (row.types, row.type_descriptions) = pairs.into_iter().unzip();
        row.best_known_cluster = best_hit
            .query_row(params![row.region_id], |r| {
                Ok(KnownClusterHit {
                    acc: r.get(0)?,
                    description: r.get(1)?,
                    similarity: r.get(2)?,
                })
            })
            .optional()?;
    }
    Ok(rows)
}
