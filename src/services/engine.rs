use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::models::{Record, SampleFilters, Table, TableKind};

/// Error types for table queries
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Returns the distinct tags available under `category`, in first-seen order.
///
/// Categorized tables require a non-empty category; tag-only tables ignore it
/// and return every distinct tag.
pub fn distinct_tags<'t>(
    table: &'t Table,
    category: Option<&str>,
) -> Result<Vec<&'t str>, QueryError> {
    let tags = match table.kind() {
        TableKind::TagOnly => unique(table.records().iter().filter_map(Record::tag)),
        TableKind::Categorized => {
            let category = category
                .filter(|c| !c.is_empty())
                .ok_or(QueryError::MissingParameter("type"))?;

            unique(
                table
                    .records()
                    .iter()
                    .filter(|record| record.category() == Some(category))
                    .filter_map(Record::tag),
            )
        }
    };

    Ok(tags)
}

/// Returns every distinct non-missing category, in first-seen order
pub fn distinct_categories(table: &Table) -> Vec<&str> {
    unique(table.records().iter().filter_map(Record::category))
}

/// Picks one record uniformly at random among those matching every active
/// filter. Returns `None` when nothing matches.
pub fn sample_one<'t, R: Rng + ?Sized>(
    table: &'t Table,
    filters: &SampleFilters,
    rng: &mut R,
) -> Option<&'t Record> {
    pick(&candidates(table, filters), rng)
}

/// Records matching every active filter, in table order
pub fn candidates<'t>(table: &'t Table, filters: &SampleFilters) -> Vec<&'t Record> {
    let candidates: Vec<&Record> = table
        .records()
        .iter()
        .filter(|record| matches(record, filters))
        .collect();

    tracing::debug!(
        candidates = candidates.len(),
        category = ?filters.category,
        tag = ?filters.tag,
        min_score = filters.min_score,
        "Filtered table for sampling"
    );

    candidates
}

/// Uniform choice among already filtered candidates
pub fn pick<'t, R: Rng + ?Sized>(candidates: &[&'t Record], rng: &mut R) -> Option<&'t Record> {
    candidates.choose(rng).copied()
}

/// A missing score never satisfies the threshold
fn matches(record: &Record, filters: &SampleFilters) -> bool {
    let score_ok = record
        .score
        .is_some_and(|score| score >= filters.min_score);

    let tag_ok = match filters.tag.as_deref() {
        Some(tag) if !tag.is_empty() => record.tag() == Some(tag),
        _ => true,
    };

    let category_ok = match filters.category.as_deref() {
        Some(category) if !category.is_empty() => record.category() == Some(category),
        _ => true,
    };

    score_ok && tag_ok && category_ok
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|value| seen.insert(*value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn scenario_table() -> Table {
        Table::new(
            TableKind::Categorized,
            vec![
                Record::new(Some("A"), Some("x"), "Foo", Some(8.0)),
                Record::new(Some("A"), Some("y"), "Bar", Some(3.0)),
                Record::new(Some("B"), Some("x"), "Baz", Some(9.0)),
            ],
        )
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_distinct_tags_for_category() {
        let table = scenario_table();
        let tags: HashSet<&str> = distinct_tags(&table, Some("A")).unwrap().into_iter().collect();
        assert_eq!(tags, HashSet::from(["x", "y"]));
    }

    #[test]
    fn test_distinct_tags_requires_category() {
        let table = scenario_table();
        assert_eq!(
            distinct_tags(&table, None),
            Err(QueryError::MissingParameter("type"))
        );
        assert_eq!(
            distinct_tags(&table, Some("")),
            Err(QueryError::MissingParameter("type"))
        );
    }

    #[test]
    fn test_distinct_tags_unknown_category_is_empty_not_error() {
        let table = scenario_table();
        assert_eq!(distinct_tags(&table, Some("a")), Ok(vec![]));
    }

    #[test]
    fn test_distinct_tags_drops_missing_and_keeps_first_seen_order() {
        let table = Table::new(
            TableKind::Categorized,
            vec![
                Record::new(Some("A"), Some("y"), "One", Some(1.0)),
                Record::new(Some("A"), None, "Two", Some(1.0)),
                Record::new(Some("A"), Some("x"), "Three", Some(1.0)),
                Record::new(Some("A"), Some("y"), "Four", Some(1.0)),
            ],
        );
        assert_eq!(distinct_tags(&table, Some("A")).unwrap(), vec!["y", "x"]);
    }

    #[test]
    fn test_distinct_tags_tag_only_ignores_category() {
        let table = Table::new(
            TableKind::TagOnly,
            vec![
                Record::new(None, Some("novel"), "Book A", Some(4.0)),
                Record::new(None, Some("poetry"), "Book B", Some(5.0)),
                Record::new(None, Some("novel"), "Book C", None),
            ],
        );
        assert_eq!(distinct_tags(&table, None).unwrap(), vec!["novel", "poetry"]);
        assert_eq!(
            distinct_tags(&table, Some("ignored")).unwrap(),
            vec!["novel", "poetry"]
        );
    }

    #[test]
    fn test_distinct_categories() {
        let table = scenario_table();
        assert_eq!(distinct_categories(&table), vec!["A", "B"]);
    }

    #[test]
    fn test_sample_one_category_and_score() {
        let table = scenario_table();
        let filters = SampleFilters::default().with_category("A").with_min_score(5.0);
        let picked = sample_one(&table, &filters, &mut rng()).unwrap();
        assert_eq!(picked.label, "Foo");
    }

    #[test]
    fn test_sample_one_score_above_max_is_not_found() {
        let table = scenario_table();
        let filters = SampleFilters::default().with_tag("x").with_min_score(10.0);
        assert!(sample_one(&table, &filters, &mut rng()).is_none());
    }

    #[test]
    fn test_candidates_keep_table_order() {
        let table = scenario_table();
        let filters = SampleFilters::default().with_tag("x");
        let labels: Vec<&str> = candidates(&table, &filters)
            .into_iter()
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Foo", "Baz"]);
        assert!(pick(&[], &mut rng()).is_none());
    }

    #[test]
    fn test_sample_one_excludes_missing_scores() {
        let table = Table::new(
            TableKind::Categorized,
            vec![
                Record::new(Some("A"), Some("x"), "Unscored", None),
                Record::new(Some("A"), Some("x"), "Scored", Some(0.0)),
            ],
        );
        for _ in 0..20 {
            let picked = sample_one(&table, &SampleFilters::default(), &mut rand::thread_rng());
            assert_eq!(picked.unwrap().label, "Scored");
        }
    }

    #[test]
    fn test_sample_one_on_empty_table() {
        let table = Table::empty(TableKind::Categorized);
        assert!(sample_one(&table, &SampleFilters::default(), &mut rng()).is_none());
    }

    #[test]
    fn test_unparseable_min_score_behaves_like_zero() {
        let table = scenario_table();
        let bad = SampleFilters::from_params(Some("A".into()), None, Some("lots"));
        let zero = SampleFilters::default().with_category("A");
        assert_eq!(bad, zero);

        let from_bad = sample_one(&table, &bad, &mut rng());
        let from_zero = sample_one(&table, &zero, &mut rng());
        assert_eq!(from_bad, from_zero);
    }

    #[test]
    fn test_sample_one_is_uniform() {
        let table = Table::new(
            TableKind::Categorized,
            (0..4)
                .map(|i| Record::new(Some("A"), Some("x"), format!("item-{i}"), Some(5.0)))
                .collect(),
        );
        let filters = SampleFilters::default().with_category("A");
        let mut rng = rng();
        let draws = 40_000;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..draws {
            let picked = sample_one(&table, &filters, &mut rng).unwrap();
            *counts.entry(picked.label.clone()).or_default() += 1;
        }

        assert_eq!(counts.len(), 4);
        for count in counts.values() {
            let frequency = *count as f64 / draws as f64;
            assert!((frequency - 0.25).abs() < 0.02, "frequency {frequency} too far from 0.25");
        }
    }

    fn record_strategy() -> impl Strategy<Value = Record> {
        (
            prop::option::of(prop::sample::select(vec!["A", "B", "C"])),
            prop::option::of(prop::sample::select(vec!["x", "y", "z"])),
            prop::option::of(0.0f64..10.0),
        )
            .prop_map(|(category, tag, score)| Record::new(category, tag, "item", score))
    }

    proptest! {
        #[test]
        fn prop_sampled_record_satisfies_filters(
            records in prop::collection::vec(record_strategy(), 0..40),
            category in prop::option::of(prop::sample::select(vec!["A", "B", "C"])),
            tag in prop::option::of(prop::sample::select(vec!["x", "y", "z"])),
            min_score in 0.0f64..12.0,
            seed in any::<u64>(),
        ) {
            let table = Table::new(TableKind::Categorized, records);
            let filters = SampleFilters {
                category: category.map(str::to_string),
                tag: tag.map(str::to_string),
                min_score,
            };
            let any_match = table.records().iter().any(|r| matches(r, &filters));

            match sample_one(&table, &filters, &mut StdRng::seed_from_u64(seed)) {
                Some(record) => {
                    prop_assert!(record.score.unwrap() >= min_score);
                    if let Some(tag) = tag {
                        prop_assert_eq!(record.tag(), Some(tag));
                    }
                    if let Some(category) = category {
                        prop_assert_eq!(record.category(), Some(category));
                    }
                }
                None => prop_assert!(!any_match),
            }
        }

        #[test]
        fn prop_distinct_tags_unique_and_scoped(
            records in prop::collection::vec(record_strategy(), 0..40),
            category in prop::sample::select(vec!["A", "B", "C"]),
        ) {
            let table = Table::new(TableKind::Categorized, records);
            let tags = distinct_tags(&table, Some(category)).unwrap();

            let unique_tags: HashSet<&str> = tags.iter().copied().collect();
            prop_assert_eq!(unique_tags.len(), tags.len());
            for tag in tags {
                prop_assert!(table
                    .records()
                    .iter()
                    .any(|r| r.category() == Some(category) && r.tag() == Some(tag)));
            }
        }
    }
}
