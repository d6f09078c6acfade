// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Structural validation for `resource-inventory` payload bodies.

use super::{
    check_namespace_counts, check_namespace_key, field_path, require_array, require_object,
    require_u64, JsonMap, ValidationError,
};
use crate::payload::ResourceInventory;
use serde_json::Value;

const WORKLOAD_SECTIONS: [&str; 5] = [
    "pods",
    "deployments",
    "statefulSets",
    "replicaSets",
    "services",
];

pub(super) fn validate_body(body: &JsonMap) -> Result<ResourceInventory, ValidationError> {
    validate_namespaces(body)?;
    validate_resources(body)?;

    serde_json::from_value(Value::Object(body.clone())).map_err(|e| {
        ValidationError::new("body", format!("malformed resource-inventory body: {e}"))
    })
}

fn validate_namespaces(body: &JsonMap) -> Result<(), ValidationError> {
    let namespaces = require_object(body, "namespaces", "")?;
    let count = require_u64(namespaces, "count", "namespaces")?;
    let list = require_array(namespaces, "list", "namespaces")?;

    for (idx, entry) in list.iter().enumerate() {
        let path = format!("namespaces.list[{idx}]");
        let entry = entry
            .as_str()
            .ok_or_else(|| ValidationError::new(&path, "expected a string"))?;
        check_namespace_key(entry, &path)?;
    }

    if count != list.len() as u64 {
        return Err(ValidationError::new(
            "namespaces.count",
            format!(
                "does not match namespaces.list length ({count} vs {})",
                list.len()
            ),
        ));
    }
    Ok(())
}

fn validate_resources(body: &JsonMap) -> Result<(), ValidationError> {
    let resources = require_object(body, "resources", "")?;

    for section in WORKLOAD_SECTIONS {
        let prefix = field_path("resources", section);
        let counts = require_object(resources, section, "resources")?;
        require_u64(counts, "total", &prefix)?;
        let by_namespace = require_object(counts, "byNamespace", &prefix)?;
        check_namespace_counts(by_namespace, &field_path(&prefix, "byNamespace"))?;
    }

    // Pods additionally break the total down by phase.
    let pods = require_object(resources, "pods", "resources")?;
    for phase in ["running", "pending", "failed"] {
        require_u64(pods, phase, "resources.pods")?;
    }
    Ok(())
}
