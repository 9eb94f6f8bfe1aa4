//! Document validation against compiled schemas.

pub mod ruleset;
pub mod validator;

pub use ruleset::{check_ruleset_semantics, validate_ruleset, validate_ruleset_with};
pub use validator::{json_type, validate, Severity, Violation};
