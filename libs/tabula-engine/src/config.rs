use serde::Deserialize;
use tabula_api::entity::EntitySchema;

use crate::error::EngineError;

/// How the encoder decides whether an Optional has a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalPolicy {
    /// null, false, 0 and "" all encode as absent.
    #[default]
    Falsy,
    /// Only null encodes as absent.
    Null,
}

impl OptionalPolicy {
    pub fn is_present(self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        match (self, value) {
            (_, Value::Null) => false,
            (Self::Null, _) => true,
            (Self::Falsy, Value::Bool(b)) => *b,
            (Self::Falsy, Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            (Self::Falsy, Value::String(s)) => !s.is_empty(),
            (Self::Falsy, Value::Array(_) | Value::Object(_)) => true,
        }
    }
}

/// How the decoder represents numeric slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericMode {
    /// Integer slots stay integers; float slots become f64.
    #[default]
    Preserve,
    /// Every numeric slot becomes f64. Loses precision above 2^53.
    Collapse,
}

/// Root configuration, parsed from TOML.
///
/// ```toml
/// optional = "falsy"
/// numeric = "preserve"
///
/// [[entities]]
/// name = "User"
/// properties = [
///     { name = "userId", type = "Uint64" },
///     { name = "tags", type = "List<Utf8>" },
/// ]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarshalConfig {
    #[serde(default)]
    pub optional: OptionalPolicy,

    #[serde(default)]
    pub numeric: NumericMode,

    /// Entity registrations, in declaration order.
    #[serde(default)]
    pub entities: Vec<EntitySchema>,
}

impl MarshalConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabula_api::types::{DeclaredType, PrimitiveTypeId};

    #[test]
    fn empty_config_uses_defaults() {
        let config = MarshalConfig::parse("").unwrap();
        assert_eq!(config.optional, OptionalPolicy::Falsy);
        assert_eq!(config.numeric, NumericMode::Preserve);
        assert!(config.entities.is_empty());
    }

    #[test]
    fn parses_policies_and_entities() {
        let config = MarshalConfig::parse(
            r#"
            optional = "null"
            numeric = "collapse"

            [[entities]]
            name = "User"
            properties = [
                { name = "userId", type = "Uint64" },
                { name = "tags", type = "List<Utf8>" },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(config.optional, OptionalPolicy::Null);
        assert_eq!(config.numeric, NumericMode::Collapse);
        let user = &config.entities[0];
        assert_eq!(user.name, "User");
        assert_eq!(user.typed_properties().collect::<Vec<_>>(), ["userId", "tags"]);
        assert_eq!(
            user.type_of("tags"),
            Some(&DeclaredType::list(DeclaredType::primitive(PrimitiveTypeId::UTF8)))
        );
    }

    #[test]
    fn bad_type_string_is_config_error() {
        let err = MarshalConfig::parse(
            r#"
            [[entities]]
            name = "User"
            properties = [{ name = "id", type = "List<" }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = MarshalConfig::load("/nonexistent/tabula.toml").unwrap_err();
        assert!(matches!(&err, EngineError::Config(msg) if msg.starts_with("/nonexistent/tabula.toml: ")));
    }

    #[test]
    fn falsy_policy_matches_loose_truthiness() {
        let policy = OptionalPolicy::Falsy;
        for absent in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!policy.is_present(&absent), "{absent} should be absent");
        }
        for present in [json!(true), json!(-1), json!("0"), json!([]), json!({})] {
            assert!(policy.is_present(&present), "{present} should be present");
        }
    }

    #[test]
    fn null_policy_keeps_falsy_values() {
        let policy = OptionalPolicy::Null;
        assert!(!policy.is_present(&json!(null)));
        assert!(policy.is_present(&json!(0)));
        assert!(policy.is_present(&json!("")));
        assert!(policy.is_present(&json!(false)));
    }
}
