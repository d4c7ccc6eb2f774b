//! Validator behavior over whole sources, one row per rule.

use omerta_lang::validator::{Severity, ValidationErrorKind, validate_each, validate_schema};
use omerta_lang::{Span, parse};
use rstest::rstest;

fn codes(src: &str) -> Vec<&'static str> {
    let schema = parse(src).expect("fixture parses");
    validate_schema(&schema)
        .errors
        .iter()
        .map(|e| e.code())
        .collect()
}

#[rstest]
#[case::minimal("transaction T { actor A {} message M A -> A {} }", &[])]
#[case::no_actors("transaction T { message M A -> A {} }", &["E002", "E002", "E003"])]
#[case::no_messages("transaction T { actor A {} }", &["E004"])]
#[case::duplicate_actor(
    "transaction T { actor A {} actor A {} message M A -> A {} }",
    &["E001"]
)]
#[case::same_name_other_category(
    "transaction T { actor A {} message A A -> A {} }",
    &[]
)]
#[case::goto_without_entry(
    "transaction T { actor A {} message M A -> A {} block S { goto S } }",
    &["E005"]
)]
#[case::unreachable_block(
    "transaction T { actor A {} message M A -> A {} entry block S { send M } block Dead { goto S } }",
    &["W001"]
)]
#[case::cycle_reached_from_entry(
    "transaction T { actor A {} message M A -> A {} entry block S { goto L } block L { goto S } }",
    &[]
)]
#[case::arity(
    "transaction T { actor A {} message M A -> A {} function f(a: uint) -> bool {} block S { call f() } }",
    &["E006"]
)]
#[case::unresolved_call_skips_arity(
    "transaction T { actor A {} message M A -> A {} block S { call g(1, 2) } }",
    &["E002"]
)]
#[case::unknown_field_type("transaction T { actor A {} message M A -> A { x: money } }", &["E007"])]
#[case::unknown_type_argument(
    "transaction T { actor A {} message M A -> A { x: list<money> } }",
    &["E007"]
)]
#[case::unknown_return_type(
    "transaction T { actor A {} message M A -> A {} function f() -> money {} }",
    &["E007"]
)]
#[case::duplicate_transaction(
    "transaction T { actor A {} message M A -> A {} } transaction T { actor A {} message M A -> A {} }",
    &["E001"]
)]
fn rule_codes(#[case] src: &str, #[case] expected: &[&str]) {
    assert_eq!(codes(src), expected);
}

#[test]
fn unreachable_block_is_only_a_warning() {
    let schema = parse(
        "transaction T { actor A {} message M A -> A {} entry block S { send M } block Dead { goto S } }",
    )
    .expect("fixture parses");
    let result = validate_schema(&schema);
    assert!(result.is_ok());
    assert_eq!(result.error_count(), 0);
    assert_eq!(result.warning_count(), 1);
    assert_eq!(result.errors[0].severity, Severity::Warning);
}

#[test]
fn duplicate_points_back_at_first_declaration() {
    let src = "transaction T {\n    actor A {}\n    actor A {}\n    message M A -> A {}\n}";
    let schema = parse(src).expect("fixture parses");
    let result = validate_schema(&schema);
    let error = &result.errors[0];
    assert_eq!((error.span.line, error.span.column), (3, 11));
    match &error.kind {
        ValidationErrorKind::DuplicateDeclaration {
            name,
            category,
            first_span,
        } => {
            assert_eq!(name, "A");
            assert_eq!(*category, "actor");
            assert_eq!((first_span.line, first_span.column), (2, 11));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        error.message,
        "duplicate actor `A` (first declared at 2:11)"
    );
}

#[test]
fn each_transaction_keeps_its_own_result() {
    let schema = parse(
        "transaction Good { actor A {} message M A -> A {} }\n\
         transaction Bad { actor A {} }",
    )
    .expect("fixture parses");
    let results = validate_each(&schema);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.name, "Good");
    assert!(results[0].1.errors.is_empty());
    assert_eq!(results[1].0.name, "Bad");
    assert_eq!(results[1].1.error_count(), 1);
}

#[test]
fn missing_declarations_point_at_transaction_name() {
    let schema = parse("transaction Lonely {}").expect("fixture parses");
    let result = validate_schema(&schema);
    assert_eq!(result.error_count(), 2);
    for error in &result.errors {
        assert_eq!(error.span, schema.transactions[0].span);
        assert_ne!(error.span, Span::default());
    }
}
