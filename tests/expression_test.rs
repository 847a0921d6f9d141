//! Tests for the condition language (parse + evaluate)

use rstest::rstest;

use jobad::domain::{evaluate, evaluate_with, ComparisonPolicy, Context, DomainError, Expr};
use jobad::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn ctx(pairs: &[(&str, &str)]) -> Context {
    pairs.iter().copied().collect()
}

#[rstest]
#[case("and(true,false)", &[], false)]
#[case("or(true,false)", &[], true)]
#[case("not(true)", &[], false)]
#[case("a=1", &[], false)]
#[case("a=1", &[("a", "1")], true)]
#[case("and(or(a=1,b=2),not(c=3))", &[("a", "1"), ("c", "4")], true)]
#[case("and(or(a=1,b=2),not(c=3))", &[("a", "1"), ("c", "3")], false)]
#[case("not(missing=x)", &[], true)]
fn given_context_when_evaluating_then_matches_expected(
    #[case] expr: &str,
    #[case] pairs: &[(&str, &str)],
    #[case] expected: bool,
) {
    assert_eq!(evaluate(expr, &ctx(pairs)).unwrap(), expected);
}

#[test]
fn given_same_inputs_when_evaluating_repeatedly_then_result_is_stable() {
    let context = ctx(&[("level", "3"), ("mode", "expert")]);
    let expr = "or(and(level>2,mode=expert),not(level<1))";

    let first = evaluate(expr, &context).unwrap();
    for _ in 0..10 {
        assert_eq!(evaluate(expr, &context).unwrap(), first);
    }
    assert_eq!(context.len(), 2);
}

#[rstest]
#[case("and(a=1)")]
#[case("or(a=1,b=2")]
#[case("not(a=1,b=2)")]
#[case("a")]
#[case("=1")]
#[case("")]
#[case("xor(a=1,b=2)")]
#[case("a=1 trailing)")]
fn given_malformed_expression_when_parsing_then_reports_error(#[case] expr: &str) {
    assert!(matches!(
        Expr::parse(expr),
        Err(DomainError::MalformedExpression { .. })
    ));
}

#[test]
fn given_malformed_expression_when_reporting_then_names_position() {
    let err = Expr::parse("and(a=1,b)").unwrap_err();
    match err {
        DomainError::MalformedExpression {
            expression,
            position,
            ..
        } => {
            assert_eq!(expression, "and(a=1,b)");
            assert_eq!(position, 8);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn given_deep_nesting_when_parsing_then_rejects_instead_of_overflowing() {
    let depth = 10_000;
    let expr = format!("{}true{}", "not(".repeat(depth), ")".repeat(depth));
    assert!(Expr::parse(&expr).is_err());

    let shallow = format!("{}true{}", "not(".repeat(4), ")".repeat(4));
    assert!(evaluate(&shallow, &Context::new()).unwrap());
}

#[rstest]
#[case(ComparisonPolicy::Numeric, "10", "9", true)]
#[case(ComparisonPolicy::Lexical, "10", "9", false)]
#[case(ComparisonPolicy::Numeric, "b", "a", true)]
#[case(ComparisonPolicy::Numeric, "-2", "-10", true)]
fn given_policy_when_comparing_greater_then_follows_policy(
    #[case] policy: ComparisonPolicy,
    #[case] actual: &str,
    #[case] literal: &str,
    #[case] expected: bool,
) {
    let context = ctx(&[("n", actual)]);
    let expr = format!("n>{}", literal);
    assert_eq!(evaluate_with(&expr, &context, policy).unwrap(), expected);
}

#[test]
fn given_numeric_policy_when_testing_equality_then_compares_text() {
    let context = ctx(&[("n", "01")]);
    assert!(!evaluate("n=1", &context).unwrap());
    assert!(evaluate("n=01", &context).unwrap());
}

#[test]
fn given_parsed_expression_when_displaying_then_reparses_to_same_tree() {
    let expr = Expr::parse(" or( not(a < 3) , and(b=x y, TRUE) )").unwrap();
    let canonical = expr.to_string();
    assert_eq!(canonical, "or(not(a<3),and(b=x y,true))");
    assert_eq!(Expr::parse(&canonical).unwrap(), expr);
}
