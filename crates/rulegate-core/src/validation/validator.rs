//! Exhaustive structural validation.
//!
//! [`validate`] walks a document against a [`SchemaNode`] tree and returns
//! every violation it finds, in traversal order. It never stops at the first
//! problem and never fails: an empty result means the document is valid.
//!
//! Paths are dotted with bracketed indices (`rules[0].parameters.context`);
//! the document root is the empty path.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{ArraySchema, ObjectSchema, SchemaNode, StringSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
}

/// One mismatch between a document and its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
    pub severity: Severity,
}

impl Violation {
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Path for display; the root is shown as `<root>`.
    pub fn display_path(&self) -> &str {
        if self.path.is_empty() {
            "<root>"
        } else {
            &self.path
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.display_path(), self.message)
    }
}

/// Validate `document` against `schema`.
pub fn validate(schema: &SchemaNode, document: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    check(schema, document, "", &mut violations);
    violations
}

pub(crate) fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

pub(crate) fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// JSON type name of a value, distinguishing integers from other numbers.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_integer(value: &Value) -> bool {
    value.is_i64() || value.is_u64()
}

fn mismatch(node: &SchemaNode, value: &Value, path: &str) -> Violation {
    Violation::error(
        path,
        format!("expected {}, found {}", node.expected(), json_type(value)),
    )
}

/// Whether the value has the JSON type the node expects, ignoring any
/// finer constraint.
fn accepts_type(node: &SchemaNode, value: &Value) -> bool {
    match node {
        SchemaNode::Object(_) => value.is_object(),
        SchemaNode::Array(_) => value.is_array(),
        SchemaNode::String(_) | SchemaNode::Enum(_) => value.is_string(),
        SchemaNode::Integer => is_integer(value),
        SchemaNode::Boolean => value.is_boolean(),
        SchemaNode::Null => value.is_null(),
        SchemaNode::OneOf(variants) => variants.iter().any(|v| accepts_type(v, value)),
        SchemaNode::Any => true,
    }
}

fn check(node: &SchemaNode, value: &Value, path: &str, out: &mut Vec<Violation>) {
    match node {
        SchemaNode::Any => {}
        SchemaNode::Object(object) => match value.as_object() {
            Some(map) => check_object(object, map, path, out),
            None => out.push(mismatch(node, value, path)),
        },
        SchemaNode::Array(array) => match value.as_array() {
            Some(items) => check_array(array, items, path, out),
            None => out.push(mismatch(node, value, path)),
        },
        SchemaNode::String(string) => match value.as_str() {
            Some(s) => check_string(string, s, path, out),
            None => out.push(mismatch(node, value, path)),
        },
        SchemaNode::Integer if is_integer(value) => {}
        SchemaNode::Boolean if value.is_boolean() => {}
        SchemaNode::Null if value.is_null() => {}
        SchemaNode::Integer | SchemaNode::Boolean | SchemaNode::Null => {
            out.push(mismatch(node, value, path))
        }
        SchemaNode::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.iter().any(|a| a == s) => {}
            Some(s) => out.push(Violation::error(
                path,
                format!("value \"{s}\" is not one of: {}", allowed.join(", ")),
            )),
            None => out.push(mismatch(node, value, path)),
        },
        SchemaNode::OneOf(variants) => check_one_of(node, variants, value, path, out),
    }
}

fn check_object(
    object: &ObjectSchema,
    map: &Map<String, Value>,
    path: &str,
    out: &mut Vec<Violation>,
) {
    let start = out.len();

    for property in &object.properties {
        let property_path = child_path(path, &property.name);
        match map.get(&property.name) {
            Some(value) => check(&property.node, value, &property_path, out),
            None if property.required => out.push(Violation::error(
                property_path,
                format!("\"{}\" is required", property.name),
            )),
            None => {}
        }
    }

    let active: Vec<&ObjectSchema> = object
        .conditionals
        .iter()
        .filter(|c| map.get(&c.property) == Some(&c.equals))
        .map(|c| &c.then)
        .collect();

    if !object.additional_properties {
        for key in map.keys() {
            let declared = object.property(key).is_some()
                || active.iter().any(|then| then.property(key).is_some());
            if !declared {
                out.push(Violation::error(
                    child_path(path, key),
                    "unknown property is not allowed",
                ));
            }
        }
    }

    for then in active {
        let mut extra = Vec::new();
        check_object(then, map, path, &mut extra);
        for violation in extra {
            if !out[start..].contains(&violation) {
                out.push(violation);
            }
        }
    }
}

fn check_array(array: &ArraySchema, items: &[Value], path: &str, out: &mut Vec<Violation>) {
    if let Some(min) = array.min_items {
        if items.len() < min {
            out.push(Violation::error(
                path,
                format!("expected at least {min} item(s), found {}", items.len()),
            ));
        }
    }
    for (index, item) in items.iter().enumerate() {
        check(&array.items, item, &index_path(path, index), out);
    }
}

fn check_string(string: &StringSchema, value: &str, path: &str, out: &mut Vec<Violation>) {
    if let Some(min) = string.min_length {
        if value.chars().count() < min {
            out.push(Violation::error(
                path,
                format!("must be at least {min} character(s) long"),
            ));
        }
    }
}

fn check_one_of(
    node: &SchemaNode,
    variants: &[SchemaNode],
    value: &Value,
    path: &str,
    out: &mut Vec<Violation>,
) {
    if !accepts_type(node, value) {
        out.push(mismatch(node, value, path));
        return;
    }

    // One detail per variant: its first mismatch.
    let mut details = Vec::new();
    for variant in variants.iter().filter(|v| accepts_type(v, value)) {
        match validate(variant, value).into_iter().next() {
            None => return,
            Some(first) => details.push(first.to_string()),
        }
    }

    out.push(Violation::error(
        path,
        format!(
            "value matches none of the allowed variants ({})",
            details.join("; ")
        ),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ruleset_like() -> SchemaNode {
        ObjectSchema::new()
            .required("name", SchemaNode::non_empty_string())
            .optional("target", SchemaNode::enumeration(["branch", "tag", "push"]))
            .required(
                "enforcement",
                SchemaNode::enumeration(["disabled", "evaluate", "active"]),
            )
            .into()
    }

    #[test]
    fn test_valid_document_has_no_violations() {
        let doc = json!({"name": "protect", "enforcement": "active"});
        assert!(validate(&ruleset_like(), &doc).is_empty());
    }

    #[test]
    fn test_missing_required_property() {
        let violations = validate(&ruleset_like(), &json!({"name": "protect"}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "enforcement");
        assert_eq!(violations[0].message, "\"enforcement\" is required");
        assert_eq!(violations[0].to_string(), "enforcement: \"enforcement\" is required");
    }

    #[test]
    fn test_unknown_property_reported() {
        let doc = json!({"name": "x", "enforcement": "active", "colour": "red"});
        let violations = validate(&ruleset_like(), &doc);
        assert_eq!(violations, vec![Violation::error("colour", "unknown property is not allowed")]);
    }

    #[test]
    fn test_additional_properties_allowed() {
        let schema: SchemaNode = ObjectSchema::new().allow_additional().into();
        assert!(validate(&schema, &json!({"anything": 1})).is_empty());
    }

    #[test]
    fn test_enum_lists_allowed_values() {
        let doc = json!({"name": "x", "enforcement": "sometimes"});
        let violations = validate(&ruleset_like(), &doc);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "value \"sometimes\" is not one of: disabled, evaluate, active"
        );
    }

    #[test]
    fn test_type_mismatch_names_both_types() {
        let schema = SchemaNode::array(SchemaNode::Integer);
        let violations = validate(&schema, &json!([1, "two", 3.5]));
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].path, "[1]");
        assert_eq!(violations[0].message, "expected integer, found string");
        assert_eq!(violations[1].message, "expected integer, found number");
    }

    #[test]
    fn test_root_mismatch_displays_root() {
        let violations = validate(&ruleset_like(), &json!([]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].to_string(), "<root>: expected object, found array");
    }

    #[test]
    fn test_one_of_emits_single_summary() {
        let schema = SchemaNode::OneOf(vec![
            SchemaNode::non_empty_string(),
            SchemaNode::enumeration(["a", "b"]),
        ]);
        let violations = validate(&schema, &json!(""));
        assert_eq!(violations.len(), 1);
        assert!(violations[0]
            .message
            .starts_with("value matches none of the allowed variants"));
    }

    #[test]
    fn test_one_of_summary_keeps_first_mismatch_per_variant() {
        let strict: SchemaNode = ObjectSchema::new()
            .required("a", SchemaNode::Integer)
            .required("b", SchemaNode::Integer)
            .into();
        let named: SchemaNode = ObjectSchema::new()
            .required("name", SchemaNode::string())
            .allow_additional()
            .into();
        let schema = SchemaNode::OneOf(vec![strict, named]);

        let violations = validate(&schema, &json!({"c": true}));
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "value matches none of the allowed variants (a: \"a\" is required; name: \"name\" is required)"
        );
    }

    #[test]
    fn test_one_of_type_mismatch() {
        let schema = SchemaNode::OneOf(vec![SchemaNode::Integer, SchemaNode::Null]);
        assert!(validate(&schema, &json!(null)).is_empty());
        assert!(validate(&schema, &json!(4)).is_empty());
        let violations = validate(&schema, &json!("4"));
        assert_eq!(violations[0].message, "expected integer or null, found string");
    }

    #[test]
    fn test_min_items_and_min_length() {
        let schema = SchemaNode::Array(ArraySchema {
            items: Box::new(SchemaNode::non_empty_string()),
            min_items: Some(2),
        });
        let violations = validate(&schema, &json!([""]));
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].path, "");
        assert_eq!(violations[1].path, "[0]");
    }

    #[test]
    fn test_conditional_applies_only_when_matching() {
        let rule: SchemaNode = ObjectSchema::new()
            .required("type", SchemaNode::string())
            .when(
                "type",
                json!("deletion"),
                ObjectSchema::new()
                    .required("reason", SchemaNode::string())
                    .allow_additional(),
            )
            .into();

        assert!(validate(&rule, &json!({"type": "creation"})).is_empty());
        assert!(validate(&rule, &json!({"type": "deletion", "reason": "x"})).is_empty());

        let violations = validate(&rule, &json!({"type": "deletion"}));
        assert_eq!(violations, vec![Violation::error("reason", "\"reason\" is required")]);
    }

    #[test]
    fn test_conditional_does_not_duplicate_base_violations() {
        let rule: SchemaNode = ObjectSchema::new()
            .required("type", SchemaNode::string())
            .optional("size", SchemaNode::Integer)
            .when(
                "type",
                json!("fixed"),
                ObjectSchema::new()
                    .required("size", SchemaNode::Integer)
                    .allow_additional(),
            )
            .into();

        let violations = validate(&rule, &json!({"type": "fixed", "size": "big"}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "size");
    }

    #[test]
    fn test_nested_paths() {
        let schema: SchemaNode = ObjectSchema::new()
            .required(
                "rules",
                SchemaNode::array(
                    ObjectSchema::new()
                        .required("type", SchemaNode::string())
                        .into(),
                ),
            )
            .into();
        let violations = validate(&schema, &json!({"rules": [{"type": "a"}, {}]}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "rules[1].type");
    }
}
