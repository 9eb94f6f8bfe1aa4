//! Shaping ruleset documents for submission.

use serde_json::{Map, Value};

/// Ref-name tokens understood by the remote without a `refs/` prefix.
pub const SPECIAL_REF_TOKENS: [&str; 2] = ["~DEFAULT_BRANCH", "~ALL"];

/// Fields the remote returns on a fetched ruleset but rejects on write.
pub const READ_ONLY_FIELDS: [&str; 8] = [
    "id",
    "source",
    "source_type",
    "node_id",
    "_links",
    "created_at",
    "updated_at",
    "current_user_can_bypass",
];

/// Shape a ruleset document for a create/update call.
///
/// Only [`READ_ONLY_FIELDS`] are removed; every other key is kept so
/// validation still sees it. Nothing is defaulted. A `null` `conditions`
/// becomes `{}` and a `null` `bypass_actors` becomes `[]`. Ref-name patterns
/// are normalized with [`format_ref_pattern`] for the document's `target`
/// (`branch` when absent). Non-object input is returned unchanged.
pub fn prepare_ruleset_payload(document: &Value) -> Value {
    let Some(source) = document.as_object() else {
        return document.clone();
    };

    let mut payload: Map<String, Value> = source
        .iter()
        .filter(|(key, _)| !READ_ONLY_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    if let Some(actors) = payload.get_mut("bypass_actors") {
        if actors.is_null() {
            *actors = Value::Array(Vec::new());
        }
    }

    let target = payload
        .get("target")
        .and_then(Value::as_str)
        .unwrap_or("branch")
        .to_string();
    if let Some(conditions) = payload.get_mut("conditions") {
        if conditions.is_null() {
            *conditions = Value::Object(Map::new());
        }
        normalize_ref_conditions(conditions, &target);
    }

    Value::Object(payload)
}

fn normalize_ref_conditions(conditions: &mut Value, target: &str) {
    let Some(ref_name) = conditions.get_mut("ref_name") else {
        return;
    };
    for key in ["include", "exclude"] {
        if let Some(Value::Array(patterns)) = ref_name.get_mut(key) {
            for pattern in patterns.iter_mut() {
                if let Value::String(s) = pattern {
                    *s = format_ref_pattern(s, target);
                }
            }
        }
    }
}

/// Expand a short branch or tag name into a full ref pattern.
///
/// ```
/// use rulegate_core::format_ref_pattern;
///
/// assert_eq!(format_ref_pattern("main", "branch"), "refs/heads/main");
/// assert_eq!(format_ref_pattern("v*", "tag"), "refs/tags/v*");
/// assert_eq!(format_ref_pattern("~DEFAULT_BRANCH", "branch"), "~DEFAULT_BRANCH");
/// ```
pub fn format_ref_pattern(value: &str, target: &str) -> String {
    let value = value.trim();
    if value.is_empty() || value.starts_with("refs/") || SPECIAL_REF_TOKENS.contains(&value) {
        return value.to_string();
    }
    if target == "tag" {
        format!("refs/tags/{value}")
    } else {
        format!("refs/heads/{value}")
    }
}

/// Drop a `refs/heads/` or `refs/tags/` prefix for display.
pub fn strip_ref_prefix(value: &str) -> &str {
    ["refs/heads/", "refs/tags/"]
        .iter()
        .find_map(|prefix| value.strip_prefix(prefix))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prepare_drops_read_only_fields() {
        let fetched = json!({
            "id": 42,
            "name": "protect-main",
            "source_type": "Repository",
            "source": "octo/widgets",
            "node_id": "RRS_1",
            "enforcement": "evaluate",
            "rules": [{"type": "deletion"}],
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-02T00:00:00Z",
            "current_user_can_bypass": "never",
            "_links": {"self": {"href": "x"}}
        });
        let payload = prepare_ruleset_payload(&fetched);
        assert_eq!(
            payload,
            json!({
                "name": "protect-main",
                "enforcement": "evaluate",
                "rules": [{"type": "deletion"}]
            })
        );
    }

    #[test]
    fn test_prepare_keeps_unknown_keys_and_adds_no_defaults() {
        let payload = prepare_ruleset_payload(&json!({"name": "r", "enforcment": "disabled"}));
        assert_eq!(payload, json!({"name": "r", "enforcment": "disabled"}));
        assert_eq!(prepare_ruleset_payload(&json!({})), json!({}));
    }

    #[test]
    fn test_prepare_normalizes_ref_patterns() {
        let payload = prepare_ruleset_payload(&json!({
            "name": "tags",
            "target": "tag",
            "conditions": {"ref_name": {"include": ["v*", "refs/tags/rel"], "exclude": ["~ALL"]}},
            "bypass_actors": null
        }));
        assert_eq!(
            payload["conditions"]["ref_name"]["include"],
            json!(["refs/tags/v*", "refs/tags/rel"])
        );
        assert_eq!(payload["conditions"]["ref_name"]["exclude"], json!(["~ALL"]));
        assert_eq!(payload["bypass_actors"], json!([]));
    }

    #[test]
    fn test_prepare_keeps_non_objects() {
        assert_eq!(prepare_ruleset_payload(&json!([1])), json!([1]));
    }

    #[test]
    fn test_strip_ref_prefix() {
        assert_eq!(strip_ref_prefix("refs/heads/main"), "main");
        assert_eq!(strip_ref_prefix("refs/tags/v1"), "v1");
        assert_eq!(strip_ref_prefix("~DEFAULT_BRANCH"), "~DEFAULT_BRANCH");
    }

    #[test]
    fn test_format_blank_pattern() {
        assert_eq!(format_ref_pattern("  ", "branch"), "");
        assert_eq!(format_ref_pattern(" dev ", "branch"), "refs/heads/dev");
    }
}
