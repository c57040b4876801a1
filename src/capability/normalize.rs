//! Normalization of raw capability payloads.
//!
//! Services across the platform have historically registered capabilities
//! in several shapes: a list of capability name strings, a list of record
//! maps, a single record map, or a map with nested
//! `detailed_capabilities`. All of them funnel through here and come out
//! as [`CapabilityDefinition`]s with synthesized defaults, or as
//! per-entry rejection messages the caller logs and moves past.
//!
//! Pure transformation: no registry state is touched.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::definition::{CapabilityDefinition, Contract, ContractKind, EndpointSpec};
use crate::errors::ValidationError;
use crate::validation::{is_identifying_field, validate_capability_structure};

/// Result of normalizing a whole `capabilities` payload.
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    /// Successfully normalized definitions, in payload order.
    pub capabilities: Vec<CapabilityDefinition>,
    /// Human-readable messages for entries that could not be normalized.
    pub rejected: Vec<String>,
}

/// Normalize a single raw capability entry (name string or record map).
///
/// Defaults are synthesized for every field the payload omits: interface
/// `"I{Service}"`, protocol `"{Service}Protocol"`, empty endpoints and
/// tools, and a default REST contract when no contract-equivalent field
/// is present.
pub fn normalize(
    service_name: &str,
    default_realm: &str,
    raw: &Value,
) -> Result<CapabilityDefinition, ValidationError> {
    match raw {
        Value::String(name) => {
            if name.trim().is_empty() {
                return Err(ValidationError::MissingRequiredField {
                    field: "name".to_string(),
                    reason: "capability name is empty".to_string(),
                });
            }
            let mut cap = CapabilityDefinition::new(name.clone(), service_name);
            cap.realm = default_realm.to_string();
            Ok(cap)
        }
        Value::Object(record) => normalize_record(service_name, default_realm, record),
        other => Err(ValidationError::malformed(format!(
            "capability entry must be a string or map, got {}",
            json_type_name(other)
        ))),
    }
}

/// Normalize a whole `capabilities` payload: a single name string, a list
/// of entries, a single record, a `{name: record}` map, or a map with
/// nested `detailed_capabilities`.
///
/// Per-entry failures accumulate in [`NormalizeOutcome::rejected`] rather
/// than aborting the batch. Only a payload that is not a string, list, or
/// map at the top level is a hard error.
pub fn normalize_all(
    service_name: &str,
    default_realm: &str,
    raw: &Value,
) -> Result<NormalizeOutcome, ValidationError> {
    let mut outcome = NormalizeOutcome::default();
    match raw {
        Value::String(_) => match normalize(service_name, default_realm, raw) {
            Ok(cap) => outcome.capabilities.push(cap),
            Err(e) => outcome.rejected.push(e.to_string()),
        },
        Value::Array(entries) => {
            for (index, entry) in entries.iter().enumerate() {
                match normalize(service_name, default_realm, entry) {
                    Ok(cap) => outcome.capabilities.push(cap),
                    Err(e) => outcome
                        .rejected
                        .push(format!("capability at index {index}: {e}")),
                }
            }
        }
        Value::Object(map) => {
            if let Some(detailed) = map.get("detailed_capabilities") {
                return normalize_all(service_name, default_realm, detailed);
            }
            if map.keys().any(|k| is_identifying_field(k)) {
                // A single record map.
                match normalize(service_name, default_realm, raw) {
                    Ok(cap) => outcome.capabilities.push(cap),
                    Err(e) => outcome.rejected.push(e.to_string()),
                }
            } else if map.values().all(|v| v.is_object()) && !map.is_empty() {
                // `{capability_name: record}` map form.
                for (name, record) in map {
                    let mut named = record.clone();
                    if let Value::Object(obj) = &mut named {
                        obj.entry("name".to_string())
                            .or_insert_with(|| Value::String(name.clone()));
                    }
                    match normalize(service_name, default_realm, &named) {
                        Ok(cap) => outcome.capabilities.push(cap),
                        Err(e) => outcome.rejected.push(format!("capability '{name}': {e}")),
                    }
                }
            } else {
                return Err(ValidationError::malformed(
                    "capability map has no identifying fields and is not a name-to-record map",
                ));
            }
        }
        other => {
            return Err(ValidationError::malformed(format!(
                "capabilities must be a string, list, or map, got {}",
                json_type_name(other)
            )))
        }
    }
    Ok(outcome)
}

fn normalize_record(
    service_name: &str,
    default_realm: &str,
    record: &Map<String, Value>,
) -> Result<CapabilityDefinition, ValidationError> {
    if !validate_capability_structure(record) {
        return Err(ValidationError::malformed(
            "capability record has no identifying fields",
        ));
    }

    let capability_name = record
        .get("name")
        .or_else(|| record.get("capability_name"))
        .and_then(Value::as_str)
        .unwrap_or(service_name)
        .to_string();

    let mut cap = CapabilityDefinition::new(capability_name, service_name);
    cap.realm = record
        .get("realm")
        .and_then(Value::as_str)
        .unwrap_or(default_realm)
        .to_string();

    if let Some(description) = record.get("description").and_then(Value::as_str) {
        cap.description = description.to_string();
    }
    if let Some(protocol) = record.get("protocol").and_then(Value::as_str) {
        cap.protocol_name = protocol.to_string();
    }
    if let Some(Value::Object(mapping)) = record.get("semantic_mapping") {
        cap.semantic_mapping = Some(mapping.clone().into_iter().collect());
    }

    cap.contracts = synthesize_contracts(record)?;
    Ok(cap)
}

/// Build the contract map from a record: explicit `contracts` first, then
/// top-level `endpoints` and `tools` shorthands, then the default empty
/// REST contract so the definition stays invocable-by-description.
fn synthesize_contracts(
    record: &Map<String, Value>,
) -> Result<HashMap<ContractKind, Contract>, ValidationError> {
    let mut contracts: HashMap<ContractKind, Contract> = HashMap::new();

    if let Some(Value::Object(declared)) = record.get("contracts") {
        for (key, value) in declared {
            let Some(kind) = ContractKind::from_key(key) else {
                log::debug!("skipping unknown contract kind '{key}'");
                continue;
            };
            let contract: Contract = serde_json::from_value(value.clone()).map_err(|e| {
                ValidationError::malformed(format!("contract '{key}' is malformed: {e}"))
            })?;
            contracts.insert(kind, contract);
        }
    }

    if let Some(endpoints) = record.get("endpoints") {
        let specs: Vec<EndpointSpec> =
            serde_json::from_value(endpoints.clone()).map_err(|e| {
                ValidationError::malformed(format!("endpoints list is malformed: {e}"))
            })?;
        if !specs.is_empty() {
            contracts
                .entry(ContractKind::RestApi)
                .or_insert_with(Contract::default)
                .endpoints
                .extend(specs);
        }
    }

    if let Some(tools) = record.get("tools") {
        let names: Vec<String> = serde_json::from_value(tools.clone())
            .map_err(|e| ValidationError::malformed(format!("tools list is malformed: {e}")))?;
        if !names.is_empty() {
            contracts
                .entry(ContractKind::McpTool)
                .or_insert_with(Contract::default)
                .tools
                .extend(names);
        }
    }

    if contracts.is_empty() {
        contracts.insert(ContractKind::RestApi, Contract::default());
    }
    Ok(contracts)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
