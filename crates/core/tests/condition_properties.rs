//! Property tests: condition text survives a serialize/parse cycle unchanged.

use procura_core::condition::{parse, serialize, Clause, Condition};
use proptest::prelude::*;

/// Printable text with no double quote, including the language's own punctuation.
fn arb_double_quotable() -> impl Strategy<Value = String> {
    prop_oneof![
        r#"[ !#-~]{1,12}"#,
        r#"[a-z ]{0,3}(&&|\|\||\(|\)|=|')[a-z ]{0,3}"#,
        r#"[^"\p{Cc}]{1,8}"#,
    ]
}

/// Printable text with no single quote; it must contain a double quote to be interesting.
fn arb_single_quotable() -> impl Strategy<Value = String> {
    r#"[ -&(-~]{0,6}"[ -&(-~]{0,6}"#
}

fn arb_value() -> impl Strategy<Value = String> {
    prop_oneof![3 => arb_double_quotable(), 1 => arb_single_quotable()]
        .prop_filter("value must not be blank", |value| !value.trim().is_empty())
}

fn arb_clause() -> impl Strategy<Value = Clause> {
    prop_oneof![
        (arb_value(), proptest::option::of(arb_value())).prop_map(|(department, role)| {
            Clause::department(department, role).expect("generated value is valid")
        }),
        prop::collection::vec(arb_value(), 1..4)
            .prop_map(|ids| Clause::employees(ids).expect("generated ids are valid")),
    ]
}

fn arb_condition() -> impl Strategy<Value = Condition> {
    prop::collection::vec(arb_clause(), 0..5).prop_map(Condition::new)
}

proptest! {
    #[test]
    fn parse_inverts_serialize(condition in arb_condition()) {
        let text = serialize(&condition);
        let parsed = parse(&text);

        prop_assert!(parsed.is_ok(), "failed to parse {text:?}: {parsed:?}");
        prop_assert_eq!(parsed.expect("checked above"), condition);
    }

    #[test]
    fn serialize_is_stable_after_reparse(condition in arb_condition()) {
        let text = serialize(&condition);
        let reparsed = parse(&text).map(|condition| serialize(&condition));

        prop_assert_eq!(reparsed.ok(), Some(text));
    }

    #[test]
    fn padded_values_keep_their_whitespace(
        value in "[a-zA-Z0-9]{1,6}",
        left in " {0,3}",
        right in " {0,3}",
    ) {
        let padded = format!("{left}{value}{right}");
        let condition = Condition::new(vec![
            Clause::employees([padded.clone()]).expect("non-blank id"),
        ]);

        let parsed = parse(&serialize(&condition)).expect("round trip");
        prop_assert_eq!(parsed.clauses(), condition.clauses());
        prop_assert!(matches!(
            &parsed.clauses()[0],
            Clause::Employee(clause) if clause.employee_ids().contains(&padded)
        ));
    }
}
