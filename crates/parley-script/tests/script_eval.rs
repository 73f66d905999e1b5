//! Integration tests for evaluating sandbox expressions.

use parley_script::{EvalError, ParseError, Scope, ScriptError, Value, evaluate, evaluate_with_depth};
use serde_json::json;

fn users_scope() -> Scope {
    Scope::new()
        .with(
            "users",
            Value::from(json!([
                {"username": "alice", "points": 10, "is": {"follower": true}},
                {"username": "bob", "points": 4, "is": {"follower": false}},
            ])),
        )
        .with("sender", "@carol")
        .with("param", Value::Null)
}

// =============================================================================
// Operators
// =============================================================================

#[test]
fn test_arithmetic_precedence() {
    let value = evaluate("2 + 3 * 4 - 10 % 4", &Scope::new()).unwrap();
    assert_eq!(value, Value::Number(12.0));
}

#[test]
fn test_string_concatenation() {
    let value = evaluate("'Hi ' + sender + '!'", &users_scope()).unwrap();
    assert_eq!(value.to_string(), "Hi @carol!");
}

#[test]
fn test_number_plus_string_concatenates() {
    let value = evaluate("1 + '1'", &Scope::new()).unwrap();
    assert_eq!(value, Value::from("11"));
}

#[test]
fn test_logical_operators_return_operands() {
    let value = evaluate("param || 'nobody'", &users_scope()).unwrap();
    assert_eq!(value, Value::from("nobody"));
    let value = evaluate("sender && 'present'", &users_scope()).unwrap();
    assert_eq!(value, Value::from("present"));
}

#[test]
fn test_loose_and_strict_equality() {
    let scope = Scope::new();
    assert_eq!(evaluate("1 == '1'", &scope).unwrap(), Value::Bool(true));
    assert_eq!(evaluate("1 === '1'", &scope).unwrap(), Value::Bool(false));
    assert_eq!(evaluate("null == undefined", &scope).unwrap(), Value::Bool(true));
}

#[test]
fn test_conditional_expression() {
    let scope = Scope::new().with("points", 42.0);
    let value = evaluate("points > 10 ? 'rich' : 'poor'", &scope).unwrap();
    assert_eq!(value, Value::from("rich"));
}

#[test]
fn test_return_statement_form() {
    let value = evaluate("return 'ok';", &Scope::new()).unwrap();
    assert_eq!(value, Value::from("ok"));
}

// =============================================================================
// Built-ins
// =============================================================================

#[test]
fn test_collection_helpers() {
    let scope = users_scope();
    assert_eq!(
        evaluate("_.map(users, 'username').join(', ')", &scope).unwrap(),
        Value::from("alice, bob")
    );
    assert_eq!(
        evaluate("_.size(_.filter(users, 'is.follower'))", &scope).unwrap(),
        Value::Number(1.0)
    );
    assert_eq!(
        evaluate("_.sum(_.map(users, 'points'))", &scope).unwrap(),
        Value::Number(14.0)
    );
    assert_eq!(
        evaluate("_.get(users, '[1].username')", &scope).unwrap(),
        Value::from("bob")
    );
}

#[test]
fn test_sample_returns_member() {
    let scope = users_scope();
    let value = evaluate("_.sample(users).username", &scope).unwrap();
    assert!(value == Value::from("alice") || value == Value::from("bob"));
}

#[test]
fn test_math_namespace() {
    let scope = Scope::new();
    assert_eq!(evaluate("Math.max(1, 7, 3)", &scope).unwrap(), Value::Number(7.0));
    assert_eq!(evaluate("Math.floor(7.9)", &scope).unwrap(), Value::Number(7.0));
    let random = evaluate("Math.random()", &scope).unwrap().to_number();
    assert!((0.0..1.0).contains(&random));
}

#[test]
fn test_string_methods() {
    let scope = Scope::new().with("param", "  Hello World  ");
    assert_eq!(
        evaluate("param.trim().toLowerCase()", &scope).unwrap(),
        Value::from("hello world")
    );
    assert_eq!(
        evaluate("param.trim().split(' ').length", &scope).unwrap(),
        Value::Number(2.0)
    );
    assert_eq!(
        evaluate("param.includes('World')", &scope).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_to_fixed() {
    let value = evaluate("(10 / 3).toFixed(2)", &Scope::new()).unwrap();
    assert_eq!(value, Value::from("3.33"));
}

#[test]
fn test_namespaces_cannot_be_shadowed() {
    let scope = Scope::new().with("Math", "nope");
    assert_eq!(evaluate("Math.abs(-2)", &scope).unwrap(), Value::Number(2.0));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_unknown_identifier() {
    let err = evaluate("process.exit()", &Scope::new()).unwrap_err();
    assert_eq!(
        err,
        ScriptError::Eval(EvalError::UnknownIdentifier {
            name: "process".to_string()
        })
    );
}

#[test]
fn test_property_of_null() {
    let err = evaluate("param.length", &users_scope()).unwrap_err();
    assert!(matches!(err, ScriptError::Eval(EvalError::NullAccess { .. })));
}

#[test]
fn test_plain_function_call_is_rejected() {
    let err = evaluate("sender()", &users_scope()).unwrap_err();
    assert!(matches!(err, ScriptError::Eval(EvalError::NotCallable { .. })));
}

#[test]
fn test_nesting_limit() {
    let source = format!("{}1{}", "[".repeat(20), "]".repeat(20));
    let err = evaluate_with_depth(&source, &Scope::new(), 8).unwrap_err();
    assert_eq!(err, ScriptError::Parse(ParseError::TooDeep { max_depth: 8 }));
}

#[test]
fn test_empty_expression() {
    let err = evaluate("  ;", &Scope::new()).unwrap_err();
    assert_eq!(err, ScriptError::Parse(ParseError::Empty));
}

// =============================================================================
// Expression size
// =============================================================================

#[test]
fn test_flat_chain_is_not_nesting() {
    let source = vec!["1"; 100].join(" + ");
    let value = evaluate(&source, &Scope::new()).unwrap();
    assert_eq!(value, Value::Number(100.0));

    let source = vec!["true"; 100].join(" && ");
    assert_eq!(evaluate(&source, &Scope::new()).unwrap(), Value::Bool(true));
}

#[test]
fn test_chain_short_circuits_left_to_right() {
    let value = evaluate("0 || '' || 'x' || missing.value", &Scope::new()).unwrap();
    assert_eq!(value, Value::from("x"));
    let value = evaluate("(1 && 0) && missing.value", &Scope::new()).unwrap();
    assert_eq!(value, Value::Number(0.0));
}

#[test]
fn test_mixed_chain_keeps_precedence() {
    let value = evaluate("1 + 2 * 3 - 4 / 2 + (5 - 1) * 2", &Scope::new()).unwrap();
    assert_eq!(value, Value::Number(13.0));
}

#[test]
fn test_overlong_chain_is_rejected() {
    let source = vec!["1"; 200_000].join("+");
    let err = evaluate(&source, &Scope::new()).unwrap_err();
    assert_eq!(
        err,
        ScriptError::Parse(ParseError::TooLong { max_operators: 512 })
    );

    let source = format!("{}x", "!".repeat(100_000));
    assert!(matches!(
        evaluate(&source, &Scope::new()),
        Err(ScriptError::Parse(ParseError::TooLong { .. }))
    ));
}
