// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
fn test_parse_variable_schema() {
    let yaml = r#"
type: number
default: 8080
description: "Port to listen on"
validate:
  - min: 1
  - max: 65535
    message: "port out of range"
"#;
    let schema: VariableSchema = serde_yaml::from_str(yaml).expect("Should parse schema");
    assert_eq!(schema.kind, VariableType::Number);
    assert_eq!(schema.default, Some(Value::Number(8080.0)));
    assert!(!schema.required);
    assert!(!schema.sensitive);
    assert_eq!(schema.rules.len(), 2);
    assert_eq!(schema.rules[0].check, Check::Min(1.0));
    assert_eq!(schema.rules[1].message.as_deref(), Some("port out of range"));
}

#[rstest]
fn test_type_defaults_to_string() {
    let schema: VariableSchema = serde_yaml::from_str("required: true").unwrap();
    assert_eq!(schema.kind, VariableType::String);
    assert!(schema.required);
    assert!(!schema.is_optional());
}

#[rstest]
fn test_unknown_field_is_rejected() {
    let result: Result<VariableSchema, _> = serde_yaml::from_str("type: string\nrequird: true");
    assert!(result.is_err());
}

#[rstest]
#[case("true", Value::Boolean(true))]
#[case("42", Value::Number(42.0))]
#[case("1.5", Value::Number(1.5))]
#[case("\"42\"", Value::String("42".to_string()))]
#[case("hello", Value::String("hello".to_string()))]
#[case("[a, b]", Value::Array(vec!["a".to_string(), "b".to_string()]))]
fn test_value_from_yaml(#[case] yaml: &str, #[case] expected: Value) {
    let value: Value = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(value, expected);
}

#[rstest]
fn test_value_display_matches_env_syntax() {
    assert_eq!(Value::Number(8080.0).to_string(), "8080");
    assert_eq!(Value::Number(0.25).to_string(), "0.25");
    assert_eq!(Value::Boolean(false).to_string(), "false");
    assert_eq!(
        Value::Array(vec!["a".into(), "b".into(), "c".into()]).to_string(),
        "a,b,c"
    );
}

#[rstest]
fn test_integral_numbers_serialize_as_integers() {
    let json = serde_json::to_string(&Value::Number(8080.0)).unwrap();
    assert_eq!(json, "8080");
    let json = serde_json::to_string(&Value::Number(2.5)).unwrap();
    assert_eq!(json, "2.5");
}

#[rstest]
fn test_rule_generic_message_names_value() {
    let rule = Rule::new(Check::Max(10.0));
    match rule.evaluate(&Value::Number(11.0)) {
        Verdict::Reject(Some(message)) => {
            assert!(message.contains("11"), "{message}");
            assert!(message.contains("at most 10"), "{message}");
        }
        other => panic!("Expected rejection, got {other:?}"),
    }
}

#[rstest]
fn test_rule_custom_message() {
    let rule = Rule::new(Check::OneOf(vec!["dev".into(), "prod".into()])).with_message("bad stage");
    assert_eq!(rule.evaluate(&Value::from("dev")), Verdict::Accept);
    assert_eq!(
        rule.evaluate(&Value::from("qa")),
        Verdict::Reject(Some("bad stage".to_string()))
    );
}

#[rstest]
fn test_array_checks_apply_per_element() {
    let value = Value::Array(vec!["ab".into(), "cd".into()]);
    assert_eq!(
        Rule::new(Check::Pattern("^[a-z]{2}$".into())).evaluate(&value),
        Verdict::Accept
    );
    assert_eq!(Rule::new(Check::MaxLength(2)).evaluate(&value), Verdict::Accept);
    assert_ne!(Rule::new(Check::MinLength(3)).evaluate(&value), Verdict::Accept);
}

#[rstest]
#[case(Check::Min(1.0), VariableType::Number, true)]
#[case(Check::Min(1.0), VariableType::String, false)]
#[case(Check::Pattern(".*".into()), VariableType::Number, false)]
#[case(Check::MaxLength(3), VariableType::Array, true)]
#[case(Check::OneOf(vec![]), VariableType::Boolean, false)]
fn test_check_applicability(#[case] check: Check, #[case] kind: VariableType, #[case] ok: bool) {
    assert_eq!(check.applies_to(kind), ok);
}

#[rstest]
fn test_transforms_run_before_hook() {
    let schema = VariableSchema::string()
        .transform(Transform::Trim)
        .transform_with(|value| match value {
            Value::String(s) => Value::String(format!("{s}!")),
            other => other,
        });
    assert_eq!(
        schema.apply_transforms(Value::from("  hi ")),
        Value::from("hi!")
    );
}

#[rstest]
fn test_verdict_conversions() {
    assert_eq!(Verdict::from(true), Verdict::Accept);
    assert_eq!(Verdict::from(false), Verdict::Reject(None));
    assert_eq!(
        Verdict::from("nope"),
        Verdict::Reject(Some("nope".to_string()))
    );
}

#[rstest]
fn test_rules_checked_before_hook() {
    let schema = VariableSchema::number()
        .rule(Rule::new(Check::Min(0.0)).with_message("negative"))
        .validate_with(|value| value.as_f64().is_some_and(|n| n < 100.0));
    assert_eq!(schema.check(&Value::Number(5.0)), Verdict::Accept);
    assert_eq!(
        schema.check(&Value::Number(-1.0)),
        Verdict::Reject(Some("negative".to_string()))
    );
    assert_eq!(schema.check(&Value::Number(500.0)), Verdict::Reject(None));
}
