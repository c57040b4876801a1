//! Envelope validation for service registration metadata.

use serde_json::{Map, Value};

/// Structured validation outcome. `errors` block registration; `warnings`
/// are logged and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ValidationResult {
    /// Whether the payload may proceed to registration.
    pub valid: bool,
    /// Blocking problems, human-readable.
    pub errors: Vec<String>,
    /// Non-blocking observations, human-readable.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn finish(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Realm names in platform-wide use. Registering under another realm is
/// allowed (any string value is accepted); it only produces a warning.
pub const KNOWN_REALMS: &[&str] = &[
    "smart_city",
    "business_enablement",
    "journey",
    "solution",
    "experience",
    "agentic",
];

/// Fields that count as "identifying" on a capability record. Presence of
/// any one of them is enough: normalization fills in the rest.
const IDENTIFYING_FIELDS: &[&str] = &[
    "description",
    "name",
    "capability_name",
    "service_name",
    "realm",
    "interface",
    "interface_name",
    "endpoints",
    "tools",
    "semantic_mapping",
    "contracts",
];

/// Whether `field` identifies a capability record.
pub fn is_identifying_field(field: &str) -> bool {
    IDENTIFYING_FIELDS.contains(&field)
}

/// Validate the top-level service metadata envelope.
///
/// Only `service_name` is strictly required. `capabilities`, when
/// present, must be a list of strings, a list of maps, or a single map.
/// `realm` and `service_type`, when present, must be strings; any string
/// value is accepted for both.
pub fn validate_service_metadata(metadata: &Map<String, Value>) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match metadata.get("service_name") {
        None | Some(Value::Null) => {
            errors.push("missing required field: 'service_name' (unique service identifier)".to_string());
        }
        Some(Value::String(name)) if name.trim().is_empty() => {
            errors.push("field 'service_name' cannot be empty".to_string());
        }
        Some(Value::String(_)) => {}
        Some(other) => {
            errors.push(format!(
                "field 'service_name' must be a string, got {}",
                type_name(other)
            ));
        }
    }

    if let Some(capabilities) = metadata.get("capabilities") {
        match capabilities {
            Value::Array(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    if !matches!(entry, Value::String(_) | Value::Object(_)) {
                        errors.push(format!(
                            "capability at index {index} must be a string or map, got {}",
                            type_name(entry)
                        ));
                    }
                }
            }
            Value::Object(_) => {}
            other => {
                errors.push(format!(
                    "field 'capabilities' must be a list or map, got {}",
                    type_name(other)
                ));
            }
        }
    }

    if let Some(realm) = metadata.get("realm") {
        match realm {
            Value::String(name) => {
                if !name.trim().is_empty() && !KNOWN_REALMS.contains(&name.as_str()) {
                    warnings.push(format!(
                        "realm '{name}' is not a standard realm name (expected one of: {})",
                        KNOWN_REALMS.join(", ")
                    ));
                }
            }
            other => {
                errors.push(format!(
                    "field 'realm' must be a string, got {}",
                    type_name(other)
                ));
            }
        }
    }

    // service_type may be any string ("content_processing",
    // "health_monitor", ...); restricting it to an enum was a prior bug.
    if let Some(service_type) = metadata.get("service_type") {
        if !service_type.is_string() {
            errors.push(format!(
                "field 'service_type' must be a string, got {}",
                type_name(service_type)
            ));
        }
    }

    ValidationResult::finish(errors, warnings)
}

/// Loose structural check for a capability record: valid as long as at
/// least one identifying field is present. Downstream normalization
/// fills in everything else.
pub fn validate_capability_structure(capability: &Map<String, Value>) -> bool {
    let has_identifier = capability.keys().any(|key| is_identifying_field(key));
    if !has_identifier {
        log::warn!(
            "capability structure missing identifying fields; expected at least one of: {}",
            IDENTIFYING_FIELDS.join(", ")
        );
    }
    has_identifier
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("test envelope is a map")
    }

    #[test]
    fn test_only_service_name_is_required() {
        let result = validate_service_metadata(&envelope(json!({"service_name": "Librarian"})));
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_missing_service_name_is_the_only_hard_failure() {
        let result = validate_service_metadata(&envelope(json!({"realm": "smart_city"})));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("service_name"));
    }

    #[test]
    fn test_empty_service_name_rejected() {
        let result = validate_service_metadata(&envelope(json!({"service_name": "  "})));
        assert!(!result.valid);
    }

    #[test]
    fn test_capabilities_flexible_shapes_accepted() {
        for capabilities in [
            json!(["search", "index"]),
            json!([{"name": "search"}]),
            json!({"detailed_capabilities": [{"name": "search"}]}),
        ] {
            let result = validate_service_metadata(&envelope(json!({
                "service_name": "Librarian",
                "capabilities": capabilities
            })));
            assert!(result.valid, "rejected shape: {result:?}");
        }
    }

    #[test]
    fn test_capabilities_wrong_type_rejected() {
        let result = validate_service_metadata(&envelope(json!({
            "service_name": "Librarian",
            "capabilities": "search"
        })));
        assert!(!result.valid);

        let result = validate_service_metadata(&envelope(json!({
            "service_name": "Librarian",
            "capabilities": [true]
        })));
        assert!(!result.valid);
        assert!(result.errors[0].contains("index 0"));
    }

    #[test]
    fn test_any_string_realm_accepted_with_warning() {
        let result = validate_service_metadata(&envelope(json!({
            "service_name": "Librarian",
            "realm": "made_up_realm"
        })));
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);

        let result = validate_service_metadata(&envelope(json!({
            "service_name": "Librarian",
            "realm": 7
        })));
        assert!(!result.valid);
    }

    #[test]
    fn test_any_string_service_type_accepted() {
        let result = validate_service_metadata(&envelope(json!({
            "service_name": "Nurse",
            "service_type": "health_monitor"
        })));
        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_capability_structure_requires_one_identifying_field() {
        assert!(validate_capability_structure(&envelope(
            json!({"description": "anything"})
        )));
        assert!(validate_capability_structure(&envelope(
            json!({"tools": ["t"]})
        )));
        assert!(!validate_capability_structure(&envelope(
            json!({"bogus": 1})
        )));
    }
}
