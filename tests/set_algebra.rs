mod util;

use std::collections::BTreeSet;

use asdb_search::config::SearchConfig;
use asdb_search::model::types::{SearchDomain, Term};
use asdb_search::search::SearchEngine;
use once_cell::sync::Lazy;
use proptest::prelude::*;
use util::Catalog;

static CATALOG: Lazy<Catalog> = Lazy::new(Catalog::build);

const LEAVES: &[(&str, &str)] = &[
    ("genus", "streptomyces"),
    ("genus", "pseudomonas"),
    ("phylum", "actinomycetota"),
    ("superkingdom", "bacteria"),
    ("type", "nrps"),
    ("type", "pks"),
    ("type", "terpene"),
    ("acc", "NC_000001"),
    ("asdomain", "AMP-binding"),
    ("monomer", "ser"),
    ("knowncluster", "BGC0000001"),
    ("nonexistent", "x"),
];

fn leaf() -> impl Strategy<Value = Term> {
    prop::sample::select(LEAVES).prop_map(|(category, value)| Term::expr(category, value))
}

fn term() -> impl Strategy<Value = Term> {
    leaf().prop_recursive(3, 12, 2, |inner| {
        (inner.clone(), inner, 0..3u8).prop_map(|(l, r, op)| match op {
            0 => l.and(r),
            1 => l.or(r),
            _ => l.except(r),
        })
    })
}

fn domain() -> impl Strategy<Value = SearchDomain> {
    prop::sample::select(SearchDomain::ALL.to_vec())
}

fn keys(domain: SearchDomain, term: &Term) -> BTreeSet<i64> {
    let storage = CATALOG.open();
    let cfg = SearchConfig::default();
    let engine = SearchEngine::new(storage.raw(), &cfg);
    engine
        .compile(domain.as_str(), term)
        .unwrap()
        .keys(storage.raw())
        .unwrap()
        .into_iter()
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn and_is_intersection(d in domain(), a in term(), b in term()) {
        let (ka, kb) = (keys(d, &a), keys(d, &b));
        let both = keys(d, &a.clone().and(b.clone()));
        prop_assert_eq!(&both, &ka.intersection(&kb).copied().collect::<BTreeSet<_>>());
        prop_assert_eq!(both, keys(d, &b.and(a)));
    }

    #[test]
    fn or_is_union(d in domain(), a in term(), b in term()) {
        let (ka, kb) = (keys(d, &a), keys(d, &b));
        let either = keys(d, &a.clone().or(b.clone()));
        prop_assert_eq!(&either, &ka.union(&kb).copied().collect::<BTreeSet<_>>());
        prop_assert_eq!(either, keys(d, &b.or(a)));
    }

    #[test]
    fn except_is_difference(d in domain(), a in term(), b in term()) {
        let (ka, kb) = (keys(d, &a), keys(d, &b));
        let diff = keys(d, &a.clone().except(b));
        prop_assert_eq!(diff, ka.difference(&kb).copied().collect::<BTreeSet<_>>());
    }

    #[test]
    fn self_union_and_self_difference(d in domain(), a in term()) {
        prop_assert_eq!(keys(d, &a.clone().or(a.clone())), keys(d, &a));
        prop_assert!(keys(d, &a.clone().except(a)).is_empty());
    }
}
