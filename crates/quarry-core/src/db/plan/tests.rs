use super::*;
use crate::{
    config::QueryConfig,
    db::{
        document::Document,
        filter::{by_id, element, where_field},
        index::IndexKind,
        memory::MemoryCollection,
        trace::tests::RecordingSink,
    },
    value::Value,
};

fn people() -> MemoryCollection {
    let mut people = MemoryCollection::new();
    for (name, age, city, bio, langs) in [
        ("ann", 31, "oslo", "likes quick foxes", vec!["en", "no"]),
        ("bob", 25, "rome", "lazy dog owner", vec!["it"]),
        ("cid", 42, "oslo", "quick thinker", vec!["no", "de"]),
        ("dee", 25, "paris", "fox hunter", vec!["fr"]),
    ] {
        people
            .insert(
                Document::new()
                    .with("name", name)
                    .with("age", age)
                    .with("city", city)
                    .with("bio", bio)
                    .with("langs", langs),
            )
            .unwrap();
    }
    people.create_index("name", IndexKind::Ordered, true).unwrap();
    people.create_index("age", IndexKind::Ordered, false).unwrap();
    people.create_index("bio", IndexKind::FullText, false).unwrap();

    people
}

fn ids(raw: &[u64]) -> Vec<RecordId> {
    raw.iter().copied().map(RecordId::new).collect()
}

fn accesses(plan: &QueryPlan) -> Vec<&ScanAccess> {
    plan.scans.iter().map(|scan| &scan.access).collect()
}

fn find(people: &MemoryCollection, filter: &Filter) -> Vec<RecordId> {
    QueryExecutor::new(people, people).find(filter).unwrap()
}

///
/// PLANNING
///

#[test]
fn scans_are_ordered_by_cost() {
    let people = people();
    let filter = where_field("bio").text("quick")
        & where_field("age").gt(20)
        & where_field("city").eq("oslo")
        & where_field("name").eq("ann")
        & by_id(RecordId::new(0));

    let plan = QueryExecutor::new(&people, &people).plan(&filter).unwrap();

    assert_eq!(
        accesses(&plan),
        vec![
            &ScanAccess::ById(RecordId::new(0)),
            &ScanAccess::Ordered { unique: true },
            &ScanAccess::Ordered { unique: false },
            &ScanAccess::FullText,
        ]
    );
    assert_eq!(plan.residual, Some(where_field("city").eq("oslo")));
    assert_eq!(find(&people, &filter), ids(&[0]));
}

#[test]
fn disjunction_of_indexed_branches_is_a_union() {
    let people = people();
    let filter = where_field("age").eq(25) | where_field("name").eq("cid");

    let plan = plan_query(&filter, &people, &QueryConfig::default()).unwrap();

    assert!(matches!(&plan.scans[..], [IndexScan { access: ScanAccess::Union(branches), .. }] if branches.len() == 2));
    assert_eq!(plan.residual, None);
    assert_eq!(find(&people, &filter), ids(&[1, 2, 3]));
}

#[test]
fn disjunction_with_an_unindexed_branch_stays_residual() {
    let people = people();
    let filter = where_field("age").eq(25) | where_field("city").eq("oslo");

    let plan = plan_query(&filter, &people, &QueryConfig::default()).unwrap();

    assert!(plan.is_full_scan());
    assert_eq!(plan.residual, Some(filter.clone()));
    assert_eq!(find(&people, &filter), ids(&[0, 1, 2, 3]));
}

#[test]
fn conjunction_under_disjunction_is_an_intersection() {
    let people = people();
    let filter =
        (where_field("age").eq(25) & where_field("name").eq("dee")) | where_field("name").eq("ann");

    let plan = plan_query(&filter, &people, &QueryConfig::default()).unwrap();

    let [IndexScan { access: ScanAccess::Union(branches), .. }] = &plan.scans[..] else {
        panic!("expected a single union scan, got {plan}");
    };
    assert!(matches!(branches[0].access, ScanAccess::Intersection(_)));
    assert_eq!(find(&people, &filter), ids(&[0, 3]));
}

#[test]
fn negation_regex_and_element_match_stay_residual() {
    let people = people();
    let filter = !where_field("age").eq(25)
        & where_field("name").regex("^c")
        & where_field("age").not_in([99])
        & where_field("langs").elem_match(element().eq("no"));

    let plan = plan_query(&filter, &people, &QueryConfig::default()).unwrap();

    assert!(plan.is_full_scan());
    assert_eq!(plan.residual, Some(filter.clone()));
    assert_eq!(find(&people, &filter), ids(&[2]));
}

#[test]
fn equality_on_a_full_text_field_is_not_planned() {
    let people = people();
    let filter = where_field("bio").eq("quick thinker");

    let plan = plan_query(&filter, &people, &QueryConfig::default()).unwrap();

    assert!(plan.is_full_scan());
    assert_eq!(find(&people, &filter), ids(&[2]));
}

#[test]
fn identifier_scan_requires_the_exact_string_form() {
    let people = people();

    let padded = where_field("_id").eq("02");
    let plan = plan_query(&padded, &people, &QueryConfig::default()).unwrap();
    assert!(plan.is_full_scan());
    assert!(find(&people, &padded).is_empty());

    let exact = where_field("_id").eq("2");
    let plan = plan_query(&exact, &people, &QueryConfig::default()).unwrap();
    assert_eq!(accesses(&plan), vec![&ScanAccess::ById(RecordId::new(2))]);
    assert_eq!(find(&people, &exact), ids(&[2]));

    assert!(find(&people, &by_id(RecordId::new(9))).is_empty());
}

#[test]
fn match_all_needs_no_residual() {
    let people = people();

    let plan = plan_query(&Filter::All, &people, &QueryConfig::default()).unwrap();

    assert_eq!(plan, QueryPlan::full_scan(&Filter::All));
    assert_eq!(plan.residual, None);
    assert_eq!(plan.to_string(), "FullScan");
    assert_eq!(find(&people, &Filter::All), ids(&[0, 1, 2, 3]));
}

#[test]
fn disabled_planner_still_uses_indexes_per_leaf() {
    let people = people();
    let config = QueryConfig::default().with_planner(false);
    let filter = where_field("bio").text("fox*") & where_field("age").lt(30);

    let plan = plan_query(&filter, &people, &config).unwrap();
    assert!(plan.is_full_scan());

    let found = QueryExecutor::new(&people, &people)
        .with_config(config)
        .find(&filter)
        .unwrap();
    assert_eq!(found, ids(&[3]));
}

#[test]
fn text_search_without_a_full_text_index_is_unsupported() {
    let people = people();

    for config in [QueryConfig::default(), QueryConfig::default().with_planner(false)] {
        let filter = where_field("age").gt(1) & !where_field("city").text("oslo");
        let err = plan_query(&filter, &people, &config).unwrap_err();

        assert!(err.is_unsupported(), "{err:?}");
        assert_eq!(err.message, "city is not full-text indexed");
    }
}

#[test]
fn malformed_filters_fail_at_plan_time() {
    let people = people();

    let err = plan_query(&where_field("age").gt(Value::Null), &people, &QueryConfig::default())
        .unwrap_err();
    assert!(err.is_validation());

    let err = plan_query(&where_field("name").regex("("), &people, &QueryConfig::default())
        .unwrap_err();
    assert!(err.is_filter());
}

///
/// EXECUTION
///

#[test]
fn dropped_index_moves_its_scan_to_the_residual() {
    let mut people = people();
    let filter = where_field("age").eq(25) & where_field("city").eq("rome");
    let plan = QueryExecutor::new(&people, &people).plan(&filter).unwrap();
    assert_eq!(plan.scans.len(), 1);

    assert!(people.drop_index("age"));
    let sink = RecordingSink::default();
    let found = QueryExecutor::new(&people, &people)
        .with_trace(&sink)
        .execute(&plan)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(found, ids(&[1]));
    assert!(sink.events().contains(&r#"IndexDropped { field: "age" }"#.to_string()));
}

#[test]
fn dropped_full_text_index_fails_the_deferred_search() {
    let mut people = people();
    let filter = where_field("bio").text("quick");
    let plan = QueryExecutor::new(&people, &people).plan(&filter).unwrap();

    people.drop_index("bio");

    let err = QueryExecutor::new(&people, &people)
        .execute(&plan)
        .err()
        .unwrap();
    assert!(err.is_unsupported());
}

#[test]
fn dropped_full_text_index_fails_even_after_an_empty_scan() {
    let mut people = people();
    let filter = where_field("name").eq("zed") & where_field("bio").text("quick");
    let plan = QueryExecutor::new(&people, &people).plan(&filter).unwrap();
    assert_eq!(plan.scans.len(), 2);

    people.drop_index("bio");

    let err = QueryExecutor::new(&people, &people)
        .execute(&plan)
        .err()
        .unwrap();
    assert!(err.is_unsupported());
}

#[test]
fn empty_scan_result_skips_remaining_scans() {
    let people = people();
    let sink = RecordingSink::default();
    let filter = where_field("name").eq("zed") & where_field("age").gt(20);

    let found = QueryExecutor::new(&people, &people)
        .with_trace(&sink)
        .find(&filter)
        .unwrap();

    assert!(found.is_empty());
    let lookups = sink
        .events()
        .iter()
        .filter(|event| event.starts_with("IndexLookup"))
        .count();
    assert_eq!(lookups, 1);
}

#[test]
fn scan_reports_visited_and_matched_counts() {
    let people = people();
    let sink = RecordingSink::default();

    let mut stream = QueryExecutor::new(&people, &people)
        .with_trace(&sink)
        .stream(&where_field("city").eq("oslo"))
        .unwrap();
    let found = stream.by_ref().collect::<Result<Vec<_>, _>>().unwrap();

    assert_eq!(found, ids(&[0, 2]));
    assert_eq!((stream.scanned(), stream.matched()), (4, 2));
    assert_eq!(
        sink.events().last().map(String::as_str),
        Some("ScanFinished { scanned: 4, matched: 2 }")
    );
}

#[test]
fn stream_ends_after_the_first_error() {
    let mut records = MemoryCollection::new();
    records
        .insert(Document::new().with("tags", Value::from_list(["a", "b"])))
        .unwrap();
    records.insert(Document::new().with("tags", "c")).unwrap();

    let mut stream = QueryExecutor::new(&records, &records)
        .stream(&where_field("tags").gt("a"))
        .unwrap();

    let err = stream.next().unwrap().unwrap_err();
    assert_eq!(err.message, "[a, b] is not comparable");
    assert!(stream.next().is_none());
}

#[test]
fn index_scan_over_list_values_is_not_comparable() {
    let mut records = MemoryCollection::new();
    records.create_index("tags", IndexKind::Ordered, false).unwrap();
    records
        .insert(Document::new().with("tags", Value::from_list(["a", "b"])))
        .unwrap();
    records.insert(Document::new().with("tags", "c")).unwrap();
    let executor = QueryExecutor::new(&records, &records);

    for filter in [where_field("tags").in_(["a"]), where_field("tags").gt("a")] {
        let plan = executor.plan(&filter).unwrap();
        assert!(!plan.is_full_scan());

        let err = executor.find(&filter).unwrap_err();
        assert!(err.is_filter());
        assert_eq!(err.message, "[a, b] is not comparable");
    }

    let found = executor.find(&where_field("tags").eq("c")).unwrap();
    assert_eq!(found, ids(&[1]));
}
