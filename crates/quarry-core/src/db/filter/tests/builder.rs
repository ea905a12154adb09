use super::{ID, person};
use crate::{
    db::{
        document::{Document, RecordId},
        filter::{CompareOp, ComparisonFilter, Filter, by_id, element, where_field},
    },
    value::{Value, ValueEnum},
};
use time::OffsetDateTime;

#[test]
fn filters_render_as_readable_expressions() {
    let filter = (where_field("age").gte(30) & where_field("name").eq("ann"))
        | !where_field("city").in_(["oslo", "rome"]);

    assert_eq!(
        filter.to_string(),
        "(((age >= 30) && (name == ann)) || !(city in [oslo, rome]))"
    );
    assert_eq!(where_field("name").regex("^a").to_string(), "(name =~ /^a/)");
    assert_eq!(where_field("bio").text("fox*").to_string(), "(bio : fox*)");
    assert_eq!(
        where_field("tags").elem_match(element().eq("red")).to_string(),
        "elemMatch(tags : ($ == red))"
    );
    assert_eq!(Filter::All.to_string(), "ALL");
}

#[test]
fn conjunction_and_disjunction_flatten() {
    let (a, b, c) = (
        where_field("a").eq(1),
        where_field("b").eq(2),
        where_field("c").eq(3),
    );

    assert_eq!(
        (a.clone() & b.clone()) & c.clone(),
        Filter::And(vec![a.clone(), b.clone(), c.clone()])
    );
    assert_eq!(
        a.clone() | (b.clone() | c.clone()),
        Filter::Or(vec![a.clone(), b.clone(), c.clone()])
    );
    assert_eq!(&a & &b, a.and(b));
}

#[test]
fn between_expands_to_two_bounds() {
    assert_eq!(
        where_field("age").between(1, 5),
        Filter::And(vec![where_field("age").gte(1), where_field("age").lte(5)])
    );
    assert_eq!(
        where_field("age").between_with(1, 5, false, true).to_string(),
        "((age > 1) && (age <= 5))"
    );
    assert_eq!(
        where_field("age").between_inclusive(1, 5, false).to_string(),
        "((age > 1) && (age < 5))"
    );
}

#[test]
fn by_id_is_equality_on_the_identifier() {
    assert_eq!(by_id(RecordId::new(7)), where_field("_id").eq(7u64));
    assert_eq!(by_id(RecordId::new(7)).field(), Some("_id"));
    assert!(by_id(ID).apply(ID, &person()).unwrap());
}

#[test]
fn leaves_expose_their_parts() {
    let Filter::Compare(leaf) = where_field("age").lt(3) else {
        panic!("expected a comparison leaf");
    };

    assert_eq!(leaf, ComparisonFilter::new("age", CompareOp::Lt, Value::Int(3)));
    assert_eq!(leaf.value(), &Value::Int(3));

    let Filter::In(set) = where_field("age").in_([1, 2]) else {
        panic!("expected a membership leaf");
    };
    assert_eq!(set.values(), &[Value::Int(1), Value::Int(2)]);
}

#[test]
fn validate_reports_malformed_leaves() {
    assert!(where_field("").eq(1).validate().unwrap_err().is_validation());
    assert!(where_field("age").lt(Value::Null).validate().unwrap_err().is_validation());
    assert!(
        where_field("age")
            .in_(Vec::<i32>::new())
            .validate()
            .unwrap_err()
            .is_validation()
    );
    assert!(
        where_field("tags")
            .in_([Value::from_list([1])])
            .validate()
            .unwrap_err()
            .is_validation()
    );
    assert!(where_field("name").regex("[").validate().unwrap_err().is_filter());
    assert!(where_field("").text("a").validate().is_err());

    let fine = where_field("age").eq(Value::Null) & where_field("name").regex("^a");
    assert!(fine.validate().is_ok());
}

#[test]
fn regex_size_limit_comes_from_the_config() {
    let config = crate::config::QueryConfig::default().with_regex_size_limit(16);

    let err = where_field("name")
        .regex("[a-z]{50}")
        .validate_with(&config)
        .unwrap_err();
    assert!(err.is_filter());
}

///
/// OBJECT CONTEXT
///

fn status(variant: &str) -> Value {
    Value::Enum(ValueEnum::new("Status", variant, 0))
}

#[test]
fn object_context_compares_enums_by_variant_name() {
    let stored = Document::new().with("status", "Active");
    let filter = where_field("status").eq(status("Active"));

    filter.bind_object_context(true).unwrap();

    assert!(filter.apply(ID, &stored).unwrap());
}

#[test]
fn object_context_compares_timestamps_as_millis() {
    let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
    let stored = Document::new().with("at", 1_700_000_000_500i64);

    let filter = where_field("at").gt(at) & where_field("kind").in_([status("Active")]);
    filter.bind_object_context(true).unwrap();

    let stored = stored.with("kind", "Active");
    assert!(filter.apply(ID, &stored).unwrap());
}

#[test]
fn plain_context_leaves_operands_untouched() {
    let stored = Document::new().with("status", "Active");
    let filter = where_field("status").eq(status("Active"));

    assert!(!filter.apply(ID, &stored).unwrap());
    // first evaluation fixed the context
    assert!(filter.bind_object_context(true).unwrap_err().is_validation());
}

#[test]
fn object_context_is_set_once() {
    let filter = where_field("a").eq(1) | where_field("b").not_in([2]);

    filter.bind_object_context(true).unwrap();
    filter.bind_object_context(true).unwrap();
    assert!(filter.bind_object_context(false).is_err());
}

#[test]
fn object_context_rejects_composite_operands() {
    let filter = where_field("tags").eq(vec!["red"]);
    filter.bind_object_context(true).unwrap();

    assert!(filter.apply(ID, &person()).unwrap_err().is_validation());
}
