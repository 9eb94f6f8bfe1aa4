//! Ruleset checks that the structural schema cannot express.

use serde_json::Value;
use tracing::debug;

use crate::error::SchemaResult;
use crate::schema::{DocumentType, SchemaNode, SchemaSource};
use crate::validation::validator::{child_path, index_path, validate, Violation};

/// Cross-field checks on bypass actors.
///
/// - `RepositoryRole` actors name the role through `repository_role_name`.
/// - `Team` and `Integration` actors carry a non-null `actor_id`.
///
/// Values of the wrong type are left to the schema.
pub fn check_ruleset_semantics(document: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();

    let Some(actors) = document.get("bypass_actors").and_then(Value::as_array) else {
        return violations;
    };

    for (index, actor) in actors.iter().enumerate() {
        let Some(actor) = actor.as_object() else {
            continue;
        };
        let path = index_path("bypass_actors", index);
        match actor.get("actor_type").and_then(Value::as_str) {
            Some("RepositoryRole") if !actor.contains_key("repository_role_name") => {
                violations.push(Violation::error(
                    child_path(&path, "repository_role_name"),
                    "required for RepositoryRole actors",
                ));
            }
            Some(kind @ ("Team" | "Integration"))
                if actor.get("actor_id").map_or(true, Value::is_null) =>
            {
                violations.push(Violation::error(
                    child_path(&path, "actor_id"),
                    format!("an integer id is required for {kind} actors"),
                ));
            }
            _ => {}
        }
    }

    violations
}

/// Structural violations followed by semantic ones.
pub fn validate_ruleset(schema: &SchemaNode, document: &Value) -> Vec<Violation> {
    let mut violations = validate(schema, document);
    violations.extend(check_ruleset_semantics(document));
    debug!(violations = violations.len(), "validated ruleset payload");
    violations
}

/// Load the ruleset schema from `source` and validate `document`.
///
/// Errors only when the schema itself cannot be loaded.
pub fn validate_ruleset_with(
    source: &dyn SchemaSource,
    document: &Value,
) -> SchemaResult<Vec<Violation>> {
    let schema = source.load_schema(DocumentType::RepositoryRuleset)?;
    Ok(validate_ruleset(&schema, document))
}
