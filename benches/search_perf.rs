use asdb_search::config::SearchConfig;
use asdb_search::model::catalog::{Location, Taxon};
use asdb_search::model::types::{SearchDomain, SearchRequest, Term};
use asdb_search::search::SearchEngine;
use asdb_search::search::compiler::compile;
use asdb_search::search::registry::QueryRegistry;
use asdb_search::storage::sqlite::SqliteStorage;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const GENERA: [&str; 4] = ["Streptomyces", "Pseudomonas", "Bacillus", "Amycolatopsis"];
const TYPES: [&str; 4] = ["nrps", "t1pks", "terpene", "lanthipeptide"];

/// Catalog with `genomes` genomes, each with 10 regions of 20 genes.
fn synthetic_catalog(genomes: i64) -> SqliteStorage {
    let mut storage = SqliteStorage::open_in_memory().expect("in-memory catalog");
    for (i, genus) in GENERA.iter().enumerate() {
        storage
            .insert_taxon(&Taxon {
                tax_id: i as i64 + 1,
                superkingdom: Some("Bacteria".into()),
                genus: Some((*genus).into()),
                phylum: Some(format!("Phylum{}", i % 2)),
                ..Taxon::default()
            })
            .expect("taxon");
    }
    let dna = "ACGT".repeat(25_000);
    for g in 0..genomes {
        let genome = storage.insert_genome(g % 4 + 1, None).expect("genome");
        let seq = storage
            .insert_sequence(genome, &format!("NC_{g:06}"), 1, &dna)
            .expect("sequence");
        for r in 0..10 {
            let start = r * 10_000;
            let region = storage
                .insert_region(
                    seq,
                    r + 1,
                    Location::forward(start, start + 10_000),
                    false,
                    &[TYPES[(g + r) as usize % TYPES.len()]],
                )
                .expect("region");
            for c in 0..20 {
                let cds = start + c * 500;
                storage
                    .insert_gene(
                        seq,
                        &format!("G{g}_{r}_{c}"),
                        Location::forward(cds, cds + 450),
                        Some("MKVL"),
                        &[region],
                    )
                    .expect("gene");
            }
        }
    }
    storage
}

fn nested_term() -> Term {
    Term::expr("genus", "streptomyces")
        .or(Term::expr("genus", "bacillus"))
        .and(Term::expr("type", "nrps").or(Term::expr("type", "pks")))
        .except(Term::expr("acc", "NC_000001"))
}

fn bench_compile(c: &mut Criterion) {
    let registry = QueryRegistry::builtin();
    let term = nested_term();
    c.bench_function("compile_nested_term", |b| {
        b.iter(|| {
            let query = compile(registry, SearchDomain::Gene, black_box(&term));
            black_box(query.to_sql())
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_gene_page");
    let cfg = SearchConfig::default();
    for genomes in [10_i64, 50] {
        let storage = synthetic_catalog(genomes);
        let engine = SearchEngine::new(storage.raw(), &cfg);
        let request = SearchRequest::new("gene", nested_term()).with_page(0, 50);
        group.bench_with_input(BenchmarkId::from_parameter(genomes), &request, |b, req| {
            b.iter(|| black_box(engine.search(req).expect("search")))
        });
    }
    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let cfg = SearchConfig::default();
    let storage = synthetic_catalog(10);
    let engine = SearchEngine::new(storage.raw(), &cfg);
    let term = Term::expr("type", "nrps");
    c.bench_function("export_cluster_csv", |b| {
        b.iter(|| black_box(engine.export("cluster", &term).expect("export")))
    });
}

criterion_group!(benches, bench_compile, bench_search, bench_export);
criterion_main!(benches);
