//! `SQLite` backend: schema, pragmas, migrations and catalog loading.

use crate::model::catalog::{
    DatabaseSummary, Location, NodeState, Taxon, TaxonCount, TypeCount, TypeTreeNode,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

// -------------------------------------------------------------------------
// Lazy SQLite Connection
// -------------------------------------------------------------------------
// Defers opening the catalog until a command actually needs it, so
// `version`, `completions` and `man` never touch the filesystem.

/// Error from lazy database initialization.
#[derive(Debug, Error)]
pub enum LazyDbError {
    #[error("Database not found at {0}")]
    NotFound(PathBuf),
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: rusqlite::Error,
    },
}

/// A lazily-opened, read-only catalog handle.
pub struct LazyDb {
    path: PathBuf,
    storage: parking_lot::Mutex<Option<SqliteStorage>>,
}

/// RAII guard that dereferences to the opened storage.
pub struct LazyDbGuard<'a>(parking_lot::MutexGuard<'a, Option<SqliteStorage>>);

impl std::fmt::Debug for LazyDbGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LazyDbGuard")
            .field(&self.0.is_some())
            .finish()
    }
}

impl std::ops::Deref for LazyDbGuard<'_> {
    type Target = SqliteStorage;
    fn deref(&self) -> &SqliteStorage {
        self.0
            .as_ref()
            .expect("LazyDb storage must be initialized before access")
    }
}

impl LazyDb {
    /// Create a lazy handle pointing at `path`. No I/O is performed.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            storage: parking_lot::Mutex::new(None),
        }
    }

    /// Get the storage, opening the database on first access.
    ///
    /// `reason` is logged alongside the open duration.
    pub fn get(&self, reason: &str) -> std::result::Result<LazyDbGuard<'_>, LazyDbError> {
        let mut guard = self.storage.lock();
        if guard.is_none() {
            if !self.path.exists() {
                return Err(LazyDbError::NotFound(self.path.clone()));
            }
            let start = Instant::now();
            let conn = Connection::open_with_flags(
                &self.path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| LazyDbError::OpenFailed {
                path: self.path.clone(),
                source: e,
            })?;
            conn.busy_timeout(Duration::from_secs(5))
                .map_err(|e| LazyDbError::OpenFailed {
                    path: self.path.clone(),
                    source: e,
                })?;
            info!(
                path = %self.path.display(),
                elapsed_ms = start.elapsed().as_millis(),
                reason = reason,
                "lazily opened catalog database"
            );
            *guard = Some(SqliteStorage { conn });
        }
        Ok(LazyDbGuard(guard))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Public schema version constant for external checks.
pub const CURRENT_SCHEMA_VERSION: i64 = SCHEMA_VERSION;

const SCHEMA_VERSION: i64 = 1;

/// Names seeded into `clusterblast_algorithms`.
pub const CLUSTERBLAST_ALGORITHMS: &[&str] = &["clusterblast", "knownclusterblast", "subclusterblast"];

const MIGRATION_V1: &str = r"
CREATE TABLE IF NOT EXISTS taxa (
    tax_id INTEGER PRIMARY KEY,
    superkingdom TEXT,
    phylum TEXT,
    taxclass TEXT,
    taxorder TEXT,
    family TEXT,
    genus TEXT,
    species TEXT,
    strain TEXT
);

CREATE TABLE IF NOT EXISTS genomes (
    genome_id INTEGER PRIMARY KEY,
    tax_id INTEGER NOT NULL REFERENCES taxa(tax_id),
    assembly_id TEXT
);

CREATE TABLE IF NOT EXISTS dna_sequences (
    sequence_id INTEGER PRIMARY KEY,
    genome_id INTEGER NOT NULL REFERENCES genomes(genome_id),
    acc TEXT NOT NULL,
    version INTEGER NOT NULL DEFAULT 1,
    dna TEXT NOT NULL DEFAULT '',
    UNIQUE(acc, version)
);

CREATE TABLE IF NOT EXISTS loci (
    locus_id INTEGER PRIMARY KEY,
    sequence_id INTEGER NOT NULL REFERENCES dna_sequences(sequence_id),
    start_pos INTEGER NOT NULL,
    end_pos INTEGER NOT NULL,
    strand INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS regions (
    region_id INTEGER PRIMARY KEY,
    locus_id INTEGER NOT NULL REFERENCES loci(locus_id),
    region_number INTEGER NOT NULL,
    contig_edge INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS bgc_types (
    bgc_type_id INTEGER PRIMARY KEY,
    term TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS rel_regions_types (
    region_id INTEGER NOT NULL REFERENCES regions(region_id) ON DELETE CASCADE,
    bgc_type_id INTEGER NOT NULL REFERENCES bgc_types(bgc_type_id),
    PRIMARY KEY (region_id, bgc_type_id)
);

CREATE TABLE IF NOT EXISTS genes (
    gene_id INTEGER PRIMARY KEY,
    locus_id INTEGER NOT NULL REFERENCES loci(locus_id),
    locus_tag TEXT NOT NULL,
    translation TEXT
);

CREATE TABLE IF NOT EXISTS cds_region_map (
    gene_id INTEGER NOT NULL REFERENCES genes(gene_id) ON DELETE CASCADE,
    region_id INTEGER NOT NULL REFERENCES regions(region_id) ON DELETE CASCADE,
    PRIMARY KEY (gene_id, region_id)
);

CREATE TABLE IF NOT EXISTS as_domains (
    as_domain_id INTEGER PRIMARY KEY,
    gene_id INTEGER NOT NULL REFERENCES genes(gene_id) ON DELETE CASCADE,
    locus_id INTEGER NOT NULL REFERENCES loci(locus_id),
    name TEXT NOT NULL,
    translation TEXT
);

CREATE TABLE IF NOT EXISTS monomers (
    monomer_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS rel_as_domains_monomers (
    as_domain_id INTEGER NOT NULL REFERENCES as_domains(as_domain_id) ON DELETE CASCADE,
    monomer_id INTEGER NOT NULL REFERENCES monomers(monomer_id),
    PRIMARY KEY (as_domain_id, monomer_id)
);

CREATE TABLE IF NOT EXISTS profiles (
    profile_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS profile_hits (
    profile_hit_id INTEGER PRIMARY KEY,
    gene_id INTEGER NOT NULL REFERENCES genes(gene_id) ON DELETE CASCADE,
    profile_id INTEGER NOT NULL REFERENCES profiles(profile_id),
    evalue REAL,
    bitscore REAL
);

CREATE TABLE IF NOT EXISTS compounds (
    compound_id INTEGER PRIMARY KEY,
    region_id INTEGER REFERENCES regions(region_id) ON DELETE CASCADE,
    locus_tag TEXT,
    peptide_sequence TEXT,
    class TEXT
);

CREATE TABLE IF NOT EXISTS clusterblast_algorithms (
    algorithm_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS clusterblast_hits (
    clusterblast_hit_id INTEGER PRIMARY KEY,
    region_id INTEGER NOT NULL REFERENCES regions(region_id) ON DELETE CASCADE,
    algorithm_id INTEGER NOT NULL REFERENCES clusterblast_algorithms(algorithm_id),
    hit_rank INTEGER NOT NULL,
    acc TEXT NOT NULL,
    description TEXT,
    similarity INTEGER
);

CREATE INDEX IF NOT EXISTS idx_dna_sequences_acc ON dna_sequences(acc);
CREATE INDEX IF NOT EXISTS idx_loci_sequence ON loci(sequence_id);
CREATE INDEX IF NOT EXISTS idx_regions_locus ON regions(locus_id);
CREATE INDEX IF NOT EXISTS idx_genes_locus ON genes(locus_id);
CREATE INDEX IF NOT EXISTS idx_genes_locus_tag ON genes(locus_tag);
CREATE INDEX IF NOT EXISTS idx_cds_region_map_region ON cds_region_map(region_id);
CREATE INDEX IF NOT EXISTS idx_as_domains_gene ON as_domains(gene_id);
CREATE INDEX IF NOT EXISTS idx_profile_hits_gene ON profile_hits(gene_id);
CREATE INDEX IF NOT EXISTS idx_compounds_region ON compounds(region_id);
CREATE INDEX IF NOT EXISTS idx_clusterblast_hits_region ON clusterblast_hits(region_id);
";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating db directory {}", parent.display()))?;
        }

        let mut conn = Connection::open(path)
            .with_context(|| format!("opening sqlite db at {}", path.display()))?;

        apply_pragmas(&mut conn)?;
        init_meta(&mut conn)?;
        migrate(&mut conn)?;

        Ok(Self { conn })
    }

    pub fn open_readonly(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("opening sqlite db readonly at {}", path.display()))?;

        apply_common_pragmas(&conn)?;

        Ok(Self { conn })
    }

    /// Fresh in-memory catalog with the full schema applied.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().context("opening in-memory sqlite db")?;
        apply_common_pragmas(&conn)?;
        init_meta(&mut conn)?;
        migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn raw(&self) -> &Connection {
        &self.conn
    }

    pub fn schema_version(&self) -> Result<i64> {
        let value: String = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .context("reading schema_version")?;
        value
            .parse()
            .with_context(|| format!("invalid schema_version value {value:?}"))
    }

    pub fn insert_taxon(&mut self, taxon: &Taxon) -> Result<()> {
        self.conn.execute(
            "INSERT INTO taxa(tax_id, superkingdom, phylum, taxclass, taxorder, family, genus, species, strain)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(tax_id) DO UPDATE SET
                 superkingdom = excluded.superkingdom,
                 phylum = excluded.phylum,
                 taxclass = excluded.taxclass,
                 taxorder = excluded.taxorder,
                 family = excluded.family,
                 genus = excluded.genus,
                 species = excluded.species,
                 strain = excluded.strain",
            params![
                taxon.tax_id,
                taxon.superkingdom,
                taxon.phylum,
                taxon.class,
                taxon.order,
                taxon.family,
                taxon.genus,
                taxon.species,
                taxon.strain
            ],
        )?;
        Ok(())
    }

    pub fn insert_genome(&mut self, tax_id: i64, assembly_id: Option<&str>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO genomes(tax_id, assembly_id) VALUES(?, ?)",
            params![tax_id, assembly_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_sequence(
        &mut self,
        genome_id: i64,
        acc: &str,
        version: i64,
        dna: &str,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO dna_sequences(genome_id, acc, version, dna) VALUES(?, ?, ?, ?)",
                params![genome_id, acc, version, dna],
            )
            .with_context(|| format!("inserting sequence {acc}.{version}"))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert or update a BGC type, returning its id.
    pub fn ensure_bgc_type(&mut self, term: &str, description: Option<&str>) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let id = ensure_bgc_type_in_tx(&tx, term, description)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn insert_region(
        &mut self,
        sequence_id: i64,
        region_number: i64,
        location: Location,
        contig_edge: bool,
        types: &[&str],
    ) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let locus_id = insert_locus(&tx, sequence_id, location)?;
        tx.execute(
            "INSERT INTO regions(locus_id, region_number, contig_edge) VALUES(?, ?, ?)",
            params![locus_id, region_number, contig_edge],
        )?;
        let region_id = tx.last_insert_rowid();
        for term in types {
            let type_id = ensure_bgc_type_in_tx(&tx, term, None)?;
            tx.execute(
                "INSERT OR IGNORE INTO rel_regions_types(region_id, bgc_type_id) VALUES(?, ?)",
                params![region_id, type_id],
            )?;
        }
        tx.commit()?;
        Ok(region_id)
    }

    /// Insert a CDS and map it onto the regions that contain it.
    pub fn insert_gene(
        &mut self,
        sequence_id: i64,
        locus_tag: &str,
        location: Location,
        translation: Option<&str>,
        regions: &[i64],
    ) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let locus_id = insert_locus(&tx, sequence_id, location)?;
        tx.execute(
            "INSERT INTO genes(locus_id, locus_tag, translation) VALUES(?, ?, ?)",
            params![locus_id, locus_tag, translation],
        )?;
        let gene_id = tx.last_insert_rowid();
        for region_id in regions {
            tx.execute(
                "INSERT OR IGNORE INTO cds_region_map(gene_id, region_id) VALUES(?, ?)",
                params![gene_id, region_id],
            )?;
        }
        tx.commit()?;
        Ok(gene_id)
    }

    /// Insert a domain hit on `gene_id`; the locus is placed on the gene's sequence.
    pub fn insert_as_domain(
        &mut self,
        gene_id: i64,
        name: &str,
        location: Location,
        translation: Option<&str>,
        monomers: &[&str],
    ) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let sequence_id: i64 = tx
            .query_row(
                "SELECT l.sequence_id FROM genes g JOIN loci l ON l.locus_id = g.locus_id
                 WHERE g.gene_id = ?",
                params![gene_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| anyhow!("gene {gene_id} not found"))?;
        let locus_id = insert_locus(&tx, sequence_id, location)?;
        tx.execute(
            "INSERT INTO as_domains(gene_id, locus_id, name, translation) VALUES(?, ?, ?, ?)",
            params![gene_id, locus_id, name, translation],
        )?;
        let domain_id = tx.last_insert_rowid();
        for monomer in monomers {
            tx.execute(
                "INSERT OR IGNORE INTO monomers(name) VALUES(?)",
                params![monomer],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO rel_as_domains_monomers(as_domain_id, monomer_id)
                 SELECT ?, monomer_id FROM monomers WHERE name = ?",
                params![domain_id, monomer],
            )?;
        }
        tx.commit()?;
        Ok(domain_id)
    }

    pub fn insert_profile_hit(
        &mut self,
        gene_id: i64,
        profile: &str,
        evalue: Option<f64>,
        bitscore: Option<f64>,
    ) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO profiles(name) VALUES(?)",
            params![profile],
        )?;
        tx.execute(
            "INSERT INTO profile_hits(gene_id, profile_id, evalue, bitscore)
             SELECT ?, profile_id, ?, ? FROM profiles WHERE name = ?",
            params![gene_id, evalue, bitscore, profile],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    pub fn insert_compound(
        &mut self,
        region_id: i64,
        locus_tag: Option<&str>,
        peptide_sequence: Option<&str>,
        class: Option<&str>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO compounds(region_id, locus_tag, peptide_sequence, class) VALUES(?, ?, ?, ?)",
            params![region_id, locus_tag, peptide_sequence, class],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_clusterblast_hit(
        &mut self,
        region_id: i64,
        algorithm: &str,
        rank: i64,
        acc: &str,
        description: Option<&str>,
        similarity: Option<i64>,
    ) -> Result<i64> {
        let algorithm_id: i64 = self
            .conn
            .query_row(
                "SELECT algorithm_id FROM clusterblast_algorithms WHERE name = ?",
                params![algorithm],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| anyhow!("unknown clusterblast algorithm {algorithm:?}"))?;
        self.conn.execute(
            "INSERT INTO clusterblast_hits(region_id, algorithm_id, hit_rank, acc, description, similarity)
             VALUES(?, ?, ?, ?, ?, ?)",
            params![region_id, algorithm_id, rank, acc, description, similarity],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Catalog-wide counts for the overview page.
    pub fn summary(&self) -> Result<DatabaseSummary> {
        let count = |sql: &str| -> Result<i64> {
            self.conn
                .query_row(sql, [], |row| row.get(0))
                .with_context(|| format!("running {sql}"))
        };
        let num_clusters = count("SELECT COUNT(*) FROM regions")?;
        let num_genomes = count("SELECT COUNT(*) FROM genomes")?;
        let num_sequences = count("SELECT COUNT(*) FROM dna_sequences")?;

        let mut stmt = self.conn.prepare(
            "SELECT bt.term, bt.description, COUNT(rt.region_id) AS cnt
             FROM bgc_types bt JOIN rel_regions_types rt ON rt.bgc_type_id = bt.bgc_type_id
             GROUP BY bt.bgc_type_id
             ORDER BY cnt DESC, bt.term",
        )?;
        let clusters = stmt
            .query_map([], |row| {
                Ok(TypeCount {
                    name: row.get(0)?,
                    description: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let top_seq_taxon = self
            .conn
            .query_row(
                "SELECT t.tax_id, t.genus, t.species, COUNT(s.sequence_id) AS seq_count
                 FROM taxa t
                 JOIN genomes ge ON ge.tax_id = t.tax_id
                 JOIN dna_sequences s ON s.genome_id = ge.genome_id
                 GROUP BY t.tax_id
                 ORDER BY seq_count DESC, t.tax_id
                 LIMIT 1",
                [],
                |row| {
                    Ok(TaxonCount {
                        tax_id: row.get(0)?,
                        genus: row.get(1)?,
                        species: row.get(2)?,
                        count: row.get(3)?,
                    })
                },
            )
            .optional()?;

        let top_secmet: Option<(i64, Option<String>, f64)> = self
            .conn
            .query_row(
                "SELECT t.tax_id, t.species,
                        CAST(COUNT(DISTINCT r.region_id) AS REAL)
                            / COUNT(DISTINCT s.sequence_id) AS per_seq
                 FROM taxa t
                 JOIN genomes ge ON ge.tax_id = t.tax_id
                 JOIN dna_sequences s ON s.genome_id = ge.genome_id
                 JOIN loci l ON l.sequence_id = s.sequence_id
                 JOIN regions r ON r.locus_id = l.locus_id
                 GROUP BY t.tax_id
                 ORDER BY per_seq DESC, t.tax_id
                 LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let (top_secmet_taxon, top_secmet_species, top_secmet_taxon_count) = match top_secmet {
            Some((tax_id, species, per_seq)) => (Some(tax_id), species, Some(per_seq)),
            None => (None, None, None),
        };

        Ok(DatabaseSummary {
            num_clusters,
            num_genomes,
            num_sequences,
            top_seq_taxon,
            top_secmet_taxon,
            top_secmet_species,
            top_secmet_taxon_count,
            clusters,
        })
    }

    /// BGC type tree: one disabled root per type that has regions, then the
    /// regions under each type ordered by genus, species, accession and
    /// region number.
    pub fn type_tree(&self) -> Result<Vec<TypeTreeNode>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT bt.term, bt.description
             FROM bgc_types bt JOIN rel_regions_types rt ON rt.bgc_type_id = bt.bgc_type_id
             ORDER BY bt.term",
        )?;
        let mut nodes = stmt
            .query_map([], |row| {
                let term: String = row.get(0)?;
                let description: Option<String> = row.get(1)?;
                Ok(TypeTreeNode {
                    text: description.unwrap_or_else(|| term.clone()),
                    id: term,
                    parent: TypeTreeNode::ROOT.to_string(),
                    kind: None,
                    state: Some(NodeState { disabled: true }),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT s.acc, r.region_number, bt.term, COALESCE(t.species, t.genus, '')
             FROM regions r
             JOIN rel_regions_types rt ON rt.region_id = r.region_id
             JOIN bgc_types bt ON bt.bgc_type_id = rt.bgc_type_id
             JOIN loci l ON l.locus_id = r.locus_id
             JOIN dna_sequences s ON s.sequence_id = l.sequence_id
             JOIN genomes ge ON ge.genome_id = s.genome_id
             JOIN taxa t ON t.tax_id = ge.tax_id
             ORDER BY t.genus, t.species, s.acc, r.region_number, bt.term",
        )?;
        let regions = stmt.query_map([], |row| {
            let acc: String = row.get(0)?;
            let number: i64 = row.get(1)?;
            let term: String = row.get(2)?;
            let species: String = row.get(3)?;
            Ok(TypeTreeNode {
                id: format!("{acc}_c{number}_{term}"),
                text: format!("{species} {acc} Cluster {number}"),
                parent: term,
                kind: Some("cluster"),
                state: None,
            })
        })?;
        for node in regions {
            nodes.push(node?);
        }
        Ok(nodes)
    }
}

fn insert_locus(tx: &Transaction<'_>, sequence_id: i64, location: Location) -> Result<i64> {
    tx.execute(
        "INSERT INTO loci(sequence_id, start_pos, end_pos, strand) VALUES(?, ?, ?, ?)",
        params![sequence_id, location.start, location.end, location.strand],
    )?;
    Ok(tx.last_insert_rowid())
}

fn ensure_bgc_type_in_tx(tx: &Transaction<'_>, term: &str, description: Option<&str>) -> Result<i64> {
    tx.execute(
        "INSERT INTO bgc_types(term, description) VALUES(?, ?)
         ON CONFLICT(term) DO UPDATE SET description = COALESCE(excluded.description, bgc_types.description)",
        params![term, description],
    )?;
    let id = tx.query_row(
        "SELECT bgc_type_id FROM bgc_types WHERE term = ?",
        params![term],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn apply_pragmas(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        ",
    )?;
    apply_common_pragmas(conn)
}

fn apply_common_pragmas(conn: &Connection) -> Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(
        r"
        PRAGMA temp_store = MEMORY;
        PRAGMA cache_size = -65536; -- 64MB
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

fn init_meta(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;

    let existing: Option<i64> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0).map(|s| s.parse().unwrap_or(0)),
        )
        .optional()?;

    if existing.is_none() {
        // Start at version 0 so migrate() applies full schema on first open.
        conn.execute(
            "INSERT INTO meta(key, value) VALUES('schema_version', '0')",
            [],
        )?;
    }

    Ok(())
}

fn migrate(conn: &mut Connection) -> Result<()> {
    let current: i64 = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0).map(|s| s.parse().unwrap_or(0)),
        )
        .optional()?
        .unwrap_or(0);

    if current == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;

    match current {
        0 => {
            tx.execute_batch(MIGRATION_V1)?;
            for name in CLUSTERBLAST_ALGORITHMS {
                tx.execute(
                    "INSERT OR IGNORE INTO clusterblast_algorithms(name) VALUES(?)",
                    params![name],
                )?;
            }
        }
        v => return Err(anyhow!("unsupported schema version {v}")),
    }

    tx.execute(
        "UPDATE meta SET value = ? WHERE key = 'schema_version'",
        params![SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()?;

    info!(version = SCHEMA_VERSION, "catalog schema migrated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_storage_has_current_schema() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
        let algorithms: i64 = storage
            .raw()
            .query_row("SELECT COUNT(*) FROM clusterblast_algorithms", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(algorithms as usize, CLUSTERBLAST_ALGORITHMS.len());
        let mut stmt = storage
            .raw()
            .prepare("SELECT name FROM clusterblast_algorithms ORDER BY algorithm_id")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(names, CLUSTERBLAST_ALGORITHMS);
    }

    #[test]
    fn reopening_file_db_keeps_data() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("catalog.db");
        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage
                .insert_taxon(&Taxon {
                    tax_id: 1,
                    genus: Some("Streptomyces".into()),
                    ..Taxon::default()
                })
                .unwrap();
        }
        let storage = SqliteStorage::open_readonly(&path).unwrap();
        let genus: String = storage
            .raw()
            .query_row("SELECT genus FROM taxa WHERE tax_id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(genus, "Streptomyces");
    }

    #[test]
    fn bgc_type_description_is_kept_on_reinsert() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let first = storage
            .ensure_bgc_type("nrps", Some("Non-ribosomal peptide synthetase"))
            .unwrap();
        let second = storage.ensure_bgc_type("nrps", None).unwrap();
        assert_eq!(first, second);
        let desc: Option<String> = storage
            .raw()
            .query_row(
                "SELECT description FROM bgc_types WHERE term = 'nrps'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(desc.as_deref(), Some("Non-ribosomal peptide synthetase"));
    }

    #[test]
    fn unknown_clusterblast_algorithm_is_rejected() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let err = storage
            .insert_clusterblast_hit(1, "deepblast", 1, "X", None, None)
            .unwrap_err();
        assert!(err.to_string().contains("deepblast"));
    }

    fn seed_taxon_with_sequences(storage: &mut SqliteStorage, tax_id: i64, regions_per_seq: &[i64]) {
        storage
            .insert_taxon(&Taxon {
                tax_id,
                genus: Some(format!("Genus{tax_id}")),
                species: Some(format!("Genus{tax_id} sp.")),
                ..Taxon::default()
            })
            .unwrap();
        let genome = storage.insert_genome(tax_id, None).unwrap();
        for (i, &n) in regions_per_seq.iter().enumerate() {
            let seq = storage
                .insert_sequence(genome, &format!("T{tax_id}_{i}"), 1, "ACGT")
                .unwrap();
            for r in 0..n {
                storage
                    .insert_region(seq, r + 1, Location::forward(0, 4), false, &["nrps"])
                    .unwrap();
            }
        }
    }

    #[test]
    fn summary_ranks_taxa_by_sequences_and_by_regions_per_sequence() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.ensure_bgc_type("nrps", None).unwrap();
        // Two sequences with one region each, and one empty sequence that
        // only counts towards the sequence ranking.
        seed_taxon_with_sequences(&mut storage, 10, &[1, 1, 0]);
        seed_taxon_with_sequences(&mut storage, 20, &[3]);

        let summary = storage.summary().unwrap();
        assert_eq!(summary.top_seq_taxon.map(|t| (t.tax_id, t.count)), Some((10, 3)));
        assert_eq!(summary.top_secmet_taxon, Some(20));
        assert_eq!(summary.top_secmet_species.as_deref(), Some("Genus20 sp."));
        assert_eq!(summary.top_secmet_taxon_count, Some(3.0));
    }

    #[test]
    fn empty_catalog_summary_has_no_top_taxa() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let summary = storage.summary().unwrap();
        assert_eq!(summary.num_clusters, 0);
        assert!(summary.top_seq_taxon.is_none());
        assert!(summary.top_secmet_taxon.is_none());
        assert!(summary.top_secmet_taxon_count.is_none());
        assert!(storage.type_tree().unwrap().is_empty());
    }

    #[test]
    fn type_tree_lists_roots_then_regions() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.ensure_bgc_type("nrps", Some("NRPS")).unwrap();
        storage.ensure_bgc_type("lasso", None).unwrap();
        seed_taxon_with_sequences(&mut storage, 10, &[2]);

        let tree = storage.type_tree().unwrap();
        let ids: Vec<&str> = tree.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["nrps", "T10_0_c1_nrps", "T10_0_c2_nrps"]);
        assert_eq!(tree[0].parent, TypeTreeNode::ROOT);
        assert_eq!(tree[0].text, "NRPS");
        assert_eq!(tree[0].state, Some(NodeState { disabled: true }));
        assert_eq!(tree[1].parent, "nrps");
        assert_eq!(tree[1].text, "Genus10 sp. T10_0 Cluster 1");
        assert_eq!(tree[1].kind, Some("cluster"));
    }

    #[test]
    fn lazy_db_reports_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let lazy = LazyDb::new(tmp.path().join("missing.db"));
        assert!(matches!(lazy.get("test"), Err(LazyDbError::NotFound(_))));
    }
}
