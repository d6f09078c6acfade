// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Structural validation for `cluster-metadata` payload bodies.

use super::{
    check_bounded_string, check_kubernetes_version, optional_str, require_u64, JsonMap,
    ValidationError, NODE_COUNT_RANGE,
};
use crate::payload::ClusterMetadata;
use serde_json::Value;

pub(super) fn validate_body(body: &JsonMap) -> Result<ClusterMetadata, ValidationError> {
    let version = super::require_str(body, "kubernetesVersion", "")?;
    check_kubernetes_version(version, "kubernetesVersion")?;

    let node_count = require_u64(body, "nodeCount", "")?;
    let (min, max) = NODE_COUNT_RANGE;
    if node_count < min || node_count > max {
        return Err(ValidationError::new(
            "nodeCount",
            format!("must be between {min} and {max}, got {node_count}"),
        ));
    }

    for key in ["provider", "region", "zone"] {
        if let Some(value) = optional_str(body, key, "")? {
            check_bounded_string(value, key)?;
        }
    }

    serde_json::from_value(Value::Object(body.clone()))
        .map_err(|e| ValidationError::new("body", format!("malformed cluster-metadata body: {e}")))
}
