use anyhow::Result;
use proptest::prelude::*;
use quarry_core::ped::{ped, ped_bounded};
use quarry_core::qgram::{Match, MatchStrategy, QgramIndex};
use quarry_core::{LineFormat, SearchConfig, SearchIndex};
use std::io::Cursor;
use std::path::PathBuf;

fn cities_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/cities.tsv")
}

fn cities() -> Result<SearchIndex> {
    let config = SearchConfig { format: LineFormat::cities(), ..SearchConfig::default() };
    Ok(SearchIndex::from_path(cities_path(), config)?)
}

fn ids(matches: &[Match]) -> Vec<u32> {
    matches.iter().map(|m| m.record_id).collect()
}

#[test]
fn single_record_exact_prefix() -> Result<()> {
    let idx = SearchIndex::build(Cursor::new("bana.\n"), SearchConfig::default())?;
    for strategy in [MatchStrategy::Indexed, MatchStrategy::Baseline] {
        let hits = idx.find_matches_with("ba", 0, 5, strategy)?;
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].record_id, hits[0].distance), (1, 0));
    }
    Ok(())
}

#[test]
fn typo_finds_city() -> Result<()> {
    let idx = cities()?;
    let hits = idx.find_matches("frieburg", 2, 3)?;
    assert_eq!(hits[0].title, "Freiburg im Breisgau");
    assert_eq!(hits[0].distance, 2);
    assert_eq!(hits[0].fields["country_code"], "DE");
    Ok(())
}

#[test]
fn exact_prefixes_come_first() -> Result<()> {
    let idx = cities()?;
    let hits = idx.find_matches("bre", 1, 10)?;
    let exact: Vec<&str> =
        hits.iter().filter(|h| h.distance == 0).map(|h| h.title.as_str()).collect();
    assert_eq!(exact, vec!["Bremen", "Bremerhaven", "Brest"]);
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    Ok(())
}

#[test]
fn auto_budget_tolerates_one_typo_in_eight() -> Result<()> {
    let idx = cities()?;
    let hits = idx.find_matches_auto("Schwerim", 5)?;
    assert_eq!(hits[0].title, "Schwerin");
    assert_eq!(hits[0].distance, 1);
    Ok(())
}

#[test]
fn indexed_equals_baseline_on_cities() -> Result<()> {
    let idx = cities()?;
    let qi = idx.qgram_index();
    let prefixes = [
        "frei", "frankfurt", "zur", "muenchen", "londn", "schwarz", "b", "", "xyzzy", "hanover",
        "stutgart",
    ];
    for prefix in prefixes {
        for delta in 0..4 {
            let indexed = qi.find_matches(prefix, delta, 100, MatchStrategy::Indexed)?;
            let baseline = qi.find_matches(prefix, delta, 100, MatchStrategy::Baseline)?;
            assert_eq!(indexed, baseline, "prefix {prefix:?}, delta {delta}");
        }
    }
    Ok(())
}

#[test]
fn repeated_fuzzy_queries_are_stable() -> Result<()> {
    let idx = cities()?;
    let first = idx.find_matches("ber", 1, 10)?;
    assert_eq!(idx.find_matches("ber", 1, 10)?, first);
    Ok(())
}

#[test]
fn ped_examples() {
    assert_eq!(ped("shwartz", "schwarzenegger"), 2);
    assert_eq!(ped("", "schwarzenegger"), 0);
}

fn title() -> impl Strategy<Value = String> {
    prop::string::string_regex("[abc]{0,10}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn indexed_equals_baseline(
        titles in prop::collection::vec(title(), 0..20),
        prefix in "[abc]{0,6}",
        delta in 0usize..4,
        q in 1usize..4,
    ) {
        let corpus = titles.join("\n");
        let config = SearchConfig { q, ..SearchConfig::default() };
        let idx = SearchIndex::build(Cursor::new(corpus), config).unwrap();
        let qi: &QgramIndex = idx.qgram_index();
        let indexed = qi.find_matches(&prefix, delta, 1000, MatchStrategy::Indexed).unwrap();
        let baseline = qi.find_matches(&prefix, delta, 1000, MatchStrategy::Baseline).unwrap();
        prop_assert_eq!(ids(&indexed), ids(&baseline));
        prop_assert_eq!(indexed, baseline);
    }

    #[test]
    fn ped_zero_iff_literal_prefix(p in "[ab]{0,5}", s in "[ab]{0,8}") {
        prop_assert_eq!(ped(&p, &s) == 0, s.starts_with(p.as_str()));
    }

    #[test]
    fn ped_bounded_agrees_with_ped(p in "[abc]{0,7}", s in "[abc]{0,10}", delta in 0usize..5) {
        let full = ped(&p, &s);
        let expected = if full <= delta { Some(full) } else { None };
        prop_assert_eq!(ped_bounded(&p, &s, delta), expected);
    }

    #[test]
    fn ped_at_most_prefix_length(p in "[abc]{0,7}", s in "[abc]{0,10}") {
        prop_assert!(ped(&p, &s) <= p.chars().count());
    }
}
