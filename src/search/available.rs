//! Completion lookups for search terms.

use rusqlite::{Connection, params};

/// `(category, table, column)` holding the distinct values of each
/// completable category.
static VALUE_SOURCES: &[(&str, &str, &str)] = &[
    ("superkingdom", "taxa", "superkingdom"),
    ("phylum", "taxa", "phylum"),
    ("class", "taxa", "taxclass"),
    ("order", "taxa", "taxorder"),
    ("family", "taxa", "family"),
    ("genus", "taxa", "genus"),
    ("species", "taxa", "species"),
    ("strain", "taxa", "strain"),
    ("acc", "dna_sequences", "acc"),
    ("type", "bgc_types", "term"),
    ("monomer", "monomers", "name"),
    ("profile", "profiles", "name"),
    ("asdomain", "as_domains", "name"),
    ("compoundclass", "compounds", "class"),
];

/// Distinct stored values of `category` starting with `partial`
/// (case-insensitive), sorted, at most `limit`. Unknown categories have no
/// values.
pub fn available_terms(
    conn: &Connection,
    category: &str,
    partial: &str,
    limit: usize,
) -> rusqlite::Result<Vec<String>> {
    let Some((_, table, column)) = VALUE_SOURCES
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(category))
    else {
        tracing::debug!(category, "no completion source for category");
        return Ok(Vec::new());
    };
    let sql = format!(
        "SELECT DISTINCT {col} FROM {table}
         WHERE {col} IS NOT NULL AND {col} LIKE ? || '%'
         ORDER BY {col} COLLATE NOCASE
         LIMIT ?",
        col = column,
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![partial, limit as i64], |row| row.get::<_, String>(0))?;
    rows.collect()
}
