//! Shared fixtures for integration tests.
//!
//! [`Catalog::build`] writes a small but complete catalog to a temp dir:
//!
//! | region | sequence     | span        | type    | taxon                         |
//! |--------|--------------|-------------|---------|-------------------------------|
//! | 1      | NC_003888.3  | 0..1000     | nrps    | Streptomyces (Actinomycetota) |
//! | 2      | NC_003888.3  | 1000..2000  | t1pks   | Streptomyces (Actinomycetota) |
//! | 3      | NC_000001.1  | 0..1000     | terpene | Pseudomonas (Pseudomonadota)  |
//! | 4      | NC_000001.1  | 1000..2000  | nrps    | Pseudomonas (Pseudomonadota)  |
//! | 5      | NZ_CP000001.1| 0..1000     | nrps    | Candidatus (no phylum)        |
//!
//! Genes 1..=6 are SCO0001 (-1 strand, region 1), SCO0002 (region 1),
//! SCO0003 (region 2), PFL0001 (region 3), PFL0002 (-1 strand, region 4) and
//! CAN0001 (region 5). Domain hits 1..=4 sit on SCO0002, SCO0003, PFL0002 and
//! CAN0001.

use asdb_search::model::catalog::{Location, Taxon};
use asdb_search::storage::sqlite::SqliteStorage;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SEQ1: &str = "ACGTTGCA";
pub const SEQ2: &str = "GGGCCCAT";
pub const SEQ3: &str = "ATATCGCG";

/// dna[100..130] of NC_003888.3, i.e. SCO0001 before orientation.
#[allow(dead_code)]
pub const SCO0001_SLICE: &str = "TGCAACGTTGCAACGTTGCAACGTTGCAAC";
/// Reverse complement of [`SCO0001_SLICE`].
#[allow(dead_code)]
pub const SCO0001_MINUS: &str = "GTTGCAACGTTGCAACGTTGCAACGTTGCA";

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }
}

#[allow(dead_code)]
struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Fixture catalog on disk.
pub struct Catalog {
    #[allow(dead_code)]
    pub dir: TempDir,
    pub path: PathBuf,
}

impl Catalog {
    pub fn build() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("catalog.db");
        let mut storage = SqliteStorage::open(&path).expect("open fixture catalog");
        populate(&mut storage);
        Self { dir, path }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[allow(dead_code)]
    pub fn open(&self) -> SqliteStorage {
        SqliteStorage::open_readonly(&self.path).expect("open fixture readonly")
    }
}

fn taxon(
    tax_id: i64,
    phylum: Option<&str>,
    genus: &str,
    species: &str,
    strain: Option<&str>,
) -> Taxon {
    Taxon {
        tax_id,
        superkingdom: Some("Bacteria".into()),
        phylum: phylum.map(Into::into),
        genus: Some(genus.into()),
        species: Some(species.into()),
        strain: strain.map(Into::into),
        ..Taxon::default()
    }
}

pub fn populate(storage: &mut SqliteStorage) {
    let mut streptomyces = taxon(
        100226,
        Some("Actinomycetota"),
        "Streptomyces",
        "Streptomyces coelicolor",
        Some("A3(2)"),
    );
    streptomyces.class = Some("Actinomycetes".into());
    streptomyces.order = Some("Kitasatosporales".into());
    streptomyces.family = Some("Streptomycetaceae".into());
    let mut pseudomonas = taxon(
        294,
        Some("Pseudomonadota"),
        "Pseudomonas",
        "Pseudomonas fluorescens",
        Some("Pf-5"),
    );
    pseudomonas.class = Some("Gammaproteobacteria".into());
    pseudomonas.order = Some("Pseudomonadales".into());
    pseudomonas.family = Some("Pseudomonadaceae".into());
    let candidatus = taxon(999, None, "Candidatus", "Candidatus unknown", None);

    for t in [&streptomyces, &pseudomonas, &candidatus] {
        storage.insert_taxon(t).unwrap();
    }

    storage
        .ensure_bgc_type("nrps", Some("Non-ribosomal peptide synthetase"))
        .unwrap();
    storage
        .ensure_bgc_type("t1pks", Some("Type I PKS (Polyketide synthase)"))
        .unwrap();
    storage.ensure_bgc_type("terpene", Some("Terpene")).unwrap();

    let g1 = storage.insert_genome(100226, Some("GCF_000203835.1")).unwrap();
    let g2 = storage.insert_genome(294, None).unwrap();
    let g3 = storage.insert_genome(999, None).unwrap();

    let s1 = storage
        .insert_sequence(g1, "NC_003888", 3, &SEQ1.repeat(250))
        .unwrap();
    let s2 = storage
        .insert_sequence(g2, "NC_000001", 1, &SEQ2.repeat(250))
        .unwrap();
    let s3 = storage
        .insert_sequence(g3, "NZ_CP000001", 1, &SEQ3.repeat(250))
        .unwrap();

    let r1 = storage
        .insert_region(s1, 1, Location::forward(0, 1000), false, &["nrps"])
        .unwrap();
    let r2 = storage
        .insert_region(s1, 2, Location::forward(1000, 2000), true, &["t1pks"])
        .unwrap();
    let r3 = storage
        .insert_region(s2, 1, Location::forward(0, 1000), false, &["terpene"])
        .unwrap();
    let r4 = storage
        .insert_region(s2, 2, Location::forward(1000, 2000), false, &["nrps"])
        .unwrap();
    let r5 = storage
        .insert_region(s3, 1, Location::forward(0, 1000), true, &["nrps"])
        .unwrap();

    let sco1 = storage
        .insert_gene(s1, "SCO0001", Location::reverse(100, 130), Some("MKVL"), &[r1])
        .unwrap();
    let sco2 = storage
        .insert_gene(s1, "SCO0002", Location::forward(200, 500), Some("MSERTHR"), &[r1])
        .unwrap();
    let sco3 = storage
        .insert_gene(s1, "SCO0003", Location::forward(1100, 1400), Some("MPKS"), &[r2])
        .unwrap();
    let pfl1 = storage
        .insert_gene(s2, "PFL0001", Location::forward(100, 400), Some("MTERP"), &[r3])
        .unwrap();
    let pfl2 = storage
        .insert_gene(s2, "PFL0002", Location::reverse(1100, 1300), None, &[r4])
        .unwrap();
    let can1 = storage
        .insert_gene(s3, "CAN0001", Location::forward(10, 310), Some("MCAN"), &[r5])
        .unwrap();
    assert_eq!(
        [sco1, sco2, sco3, pfl1, pfl2, can1],
        [1, 2, 3, 4, 5, 6],
        "fixture gene ids"
    );

    storage
        .insert_as_domain(sco2, "AMP-binding", Location::forward(230, 290), Some("SER"), &["ser"])
        .unwrap();
    storage
        .insert_as_domain(sco3, "PKS_KS", Location::forward(1130, 1190), Some("KS"), &[])
        .unwrap();
    storage
        .insert_as_domain(pfl2, "AMP-binding", Location::reverse(1150, 1210), None, &["thr"])
        .unwrap();
    storage
        .insert_as_domain(can1, "Condensation", Location::forward(40, 100), None, &[])
        .unwrap();

    storage
        .insert_profile_hit(sco2, "AMP-binding", Some(1e-30), Some(120.5))
        .unwrap();
    storage
        .insert_profile_hit(sco3, "PKS_KS", Some(1e-50), Some(300.0))
        .unwrap();
    storage
        .insert_profile_hit(pfl1, "terpene", None, None)
        .unwrap();
    storage
        .insert_profile_hit(pfl2, "AMP-binding", None, None)
        .unwrap();

    storage
        .insert_compound(r1, Some("SCO0002"), Some("ser-thr"), Some("NRP"))
        .unwrap();

    storage
        .insert_clusterblast_hit(r1, "knownclusterblast", 2, "BGC0000002", Some("other"), Some(10))
        .unwrap();
    storage
        .insert_clusterblast_hit(r1, "knownclusterblast", 1, "BGC0000001", Some("coelichelin"), Some(80))
        .unwrap();
    storage
        .insert_clusterblast_hit(r4, "clusterblast", 1, "NC_999999_c1", None, Some(30))
        .unwrap();
}
