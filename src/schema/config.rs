//! Per-type model configuration

use serde::{Deserialize, Serialize};

use super::aliases::{to_pascalcase, to_snakecase};
use crate::validate::{PrimaryKeyPolicy, ValidationPolicy};

/// What happens to undeclared input keys of a permissive record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraPolicy {
    /// Promote to a dynamic field on the instance
    #[default]
    Allow,
    /// Drop silently
    Ignore,
    /// Reject like strict mode does
    Forbid,
}

/// Renaming applied to every input key before alias lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasFunction {
    #[default]
    None,
    SnakeCase,
    PascalCase,
}

impl AliasFunction {
    pub fn apply(&self, key: &str) -> String {
        match self {
            AliasFunction::None => key.to_string(),
            AliasFunction::SnakeCase => to_snakecase(key),
            AliasFunction::PascalCase => to_pascalcase(key),
        }
    }
}

/// Model configuration
///
/// Missing keys take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Display name, defaults to the type name
    pub name: Option<String>,
    pub description: Option<String>,
    /// Field errors abort construction; undeclared keys are rejected
    pub strict: bool,
    /// Attribute writes after construction are rejected
    pub frozen: bool,
    /// Drop nulls from plain-map export
    pub remove_nulls: bool,
    pub extra: ExtraPolicy,
    /// Hydrate foreign references into nested records
    pub as_objects: bool,
    pub alias_function: AliasFunction,
    pub primary_key_policy: PrimaryKeyPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            strict: true,
            frozen: false,
            remove_nulls: false,
            extra: ExtraPolicy::Allow,
            as_objects: false,
            alias_function: AliasFunction::None,
            primary_key_policy: PrimaryKeyPolicy::Strict,
        }
    }
}

impl ModelConfig {
    /// Default configuration with strict mode off
    pub fn permissive() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy::new(self.strict, self.primary_key_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert!(config.strict);
        assert!(!config.frozen);
        assert!(!config.as_objects);
        assert_eq!(config.extra, ExtraPolicy::Allow);
        assert_eq!(config.primary_key_policy, PrimaryKeyPolicy::Strict);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ModelConfig =
            serde_json::from_str(r#"{"strict": false, "extra": "forbid", "alias_function": "snake_case"}"#).unwrap();
        assert!(!config.strict);
        assert_eq!(config.extra, ExtraPolicy::Forbid);
        assert_eq!(config.alias_function, AliasFunction::SnakeCase);
        assert!(!config.remove_nulls);
    }

    #[test]
    fn test_primary_key_policy_json() {
        let config: ModelConfig = serde_json::from_str(r#"{"primary_key_policy": "defer_to_store"}"#).unwrap();
        assert_eq!(config.primary_key_policy, PrimaryKeyPolicy::DeferToStore);
    }

    #[test]
    fn test_alias_function_apply() {
        assert_eq!(AliasFunction::SnakeCase.apply("emailAddress"), "email_address");
        assert_eq!(AliasFunction::PascalCase.apply("email_address"), "EmailAddress");
        assert_eq!(AliasFunction::None.apply("emailAddress"), "emailAddress");
    }
}
