//! Build script for eks-bootstrap-topology
//!
//! Validates the embedded IAM policy assets so a malformed document fails the
//! build instead of the first synthesis run.

use serde_json::Value;

const POLICY_ASSETS: &[&str] = &["assets/alb-controller-policy.json"];
const POLICY_LANGUAGE_VERSION: &str = "2012-10-17";

fn validate_statement(path: &str, index: usize, statement: &Value) {
    let effect = statement["Effect"].as_str().unwrap_or_else(|| {
        panic!("{path}: statement {index} has no Effect");
    });
    if effect != "Allow" && effect != "Deny" {
        panic!("{path}: statement {index} has invalid Effect {effect}");
    }

    let actions = statement["Action"]
        .as_array()
        .unwrap_or_else(|| panic!("{path}: statement {index} Action must be a list"));
    if actions.is_empty() || !actions.iter().all(Value::is_string) {
        panic!("{path}: statement {index} Action must be a non-empty list of strings");
    }

    match &statement["Resource"] {
        Value::String(_) => {}
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_string) => {}
        other => panic!("{path}: statement {index} has invalid Resource {other}"),
    }

    if let Some(condition) = statement.get("Condition") {
        let operators = condition
            .as_object()
            .unwrap_or_else(|| panic!("{path}: statement {index} Condition must be an object"));
        for (operator, keys) in operators {
            let keys = keys.as_object().unwrap_or_else(|| {
                panic!("{path}: statement {index} condition {operator} must be an object")
            });
            if !keys.values().all(Value::is_string) {
                panic!("{path}: statement {index} condition {operator} values must be strings");
            }
        }
    }
}

fn validate_policy(path: &str) {
    let data = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read policy asset {path}: {e}"));
    let doc: Value =
        serde_json::from_str(&data).unwrap_or_else(|e| panic!("{path} is not valid JSON: {e}"));

    if doc["Version"] != POLICY_LANGUAGE_VERSION {
        panic!("{path}: Version must be {POLICY_LANGUAGE_VERSION}");
    }

    let statements = doc["Statement"]
        .as_array()
        .unwrap_or_else(|| panic!("{path}: Statement must be a list"));
    if statements.is_empty() {
        panic!("{path}: Statement must not be empty");
    }

    for (index, statement) in statements.iter().enumerate() {
        validate_statement(path, index, statement);
    }
}

fn main() {
    for path in POLICY_ASSETS {
        println!("cargo:rerun-if-changed={path}");
        validate_policy(path);
    }
}
