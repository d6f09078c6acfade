// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Structural validation gating every payload entering the pipeline's sinks.
//!
//! One validation function per payload kind, dispatched by [`validate`].
//! Validation is fail-fast: the first violation is returned with the exact
//! field path (dot/bracket notation) and a human-readable reason. On success
//! the raw body is narrowed to its typed shape; fields the schema does not
//! know are dropped, so downstream sinks only ever see schema-conformant
//! data.

mod cluster_metadata;
mod configuration_patterns;
mod resource_inventory;

use crate::payload::{CollectionKind, CollectionPayload, PayloadBody, RawCollection, Sanitization};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

pub(crate) type JsonMap = serde_json::Map<String, Value>;

/// Longest accepted free-form string field (provider names, bucket labels...).
pub const MAX_STRING_LEN: usize = 50;

/// Inclusive node count bounds for a cluster-metadata payload.
pub const NODE_COUNT_RANGE: (u64, u64) = (1, 10_000);

static SCHEMA_VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+\.\d+\.\d+$").expect("pattern compiles"));
static COLLECTION_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^coll_[a-z0-9]{32}$").expect("pattern compiles"));
static CLUSTER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cls_[a-z0-9]{32}$").expect("pattern compiles"));
static NAMESPACE_HASH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^namespace-[a-f0-9]{12}$").expect("pattern compiles"));
static KUBERNETES_VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?\d+\.\d+\.\d+([+-][0-9A-Za-z.+-]+)?$").expect("pattern compiles"));

/// A structural payload defect: the exact field that is wrong and why.
///
/// Always fatal to the one payload it describes; validation failures are
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {reason}")]
pub struct ValidationError {
    /// Dot/bracket path of the offending field, relative to the body
    /// (e.g. `resources.pods.byNamespace["namespace-abc"]`).
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    pub(crate) fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Validate a raw collection and narrow it to its typed, trusted shape.
///
/// This is the only producer of [`CollectionPayload`] values in the crate.
pub fn validate(raw: &RawCollection) -> Result<CollectionPayload, ValidationError> {
    if !SCHEMA_VERSION_PATTERN.is_match(&raw.schema_version) {
        return Err(ValidationError::new(
            "schemaVersion",
            format!("must match vMAJOR.MINOR.PATCH, got {:?}", raw.schema_version),
        ));
    }

    validate_sanitization(&raw.sanitization)?;

    let body = match raw.body.as_object() {
        Some(body) => body,
        None => return Err(ValidationError::new("body", "must be an object")),
    };
    validate_common_fields(body)?;

    let body = match raw.collection_type {
        CollectionKind::ClusterMetadata => {
            PayloadBody::ClusterMetadata(cluster_metadata::validate_body(body)?)
        }
        CollectionKind::ResourceInventory => {
            PayloadBody::ResourceInventory(resource_inventory::validate_body(body)?)
        }
        CollectionKind::ResourceConfigurationPatterns => {
            PayloadBody::ConfigurationPatterns(configuration_patterns::validate_body(body)?)
        }
    };

    Ok(CollectionPayload {
        schema_version: raw.schema_version.clone(),
        collection_type: raw.collection_type,
        body,
        sanitization: raw.sanitization.clone(),
    })
}

/// Fields every payload kind carries at the top of its body.
fn validate_common_fields(body: &JsonMap) -> Result<(), ValidationError> {
    let timestamp = require_str(body, "timestamp", "")?;
    check_timestamp(timestamp, "timestamp")?;

    let collection_id = require_str(body, "collectionId", "")?;
    check_pattern(
        collection_id,
        &COLLECTION_ID_PATTERN,
        "collectionId",
        "coll_ followed by 32 lowercase hex characters",
    )?;

    let cluster_id = require_str(body, "clusterId", "")?;
    check_pattern(
        cluster_id,
        &CLUSTER_ID_PATTERN,
        "clusterId",
        "cls_ followed by 32 lowercase hex characters",
    )?;

    Ok(())
}

fn validate_sanitization(sanitization: &Sanitization) -> Result<(), ValidationError> {
    for (idx, rule) in sanitization.applied_rules.iter().enumerate() {
        let path = format!("sanitization.appliedRules[{idx}]");
        check_bounded_string(rule, &path)?;
    }
    check_timestamp(&sanitization.sanitized_at, "sanitization.sanitizedAt")
}

pub(crate) fn field_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

pub(crate) fn map_key_path(prefix: &str, key: &str) -> String {
    format!("{prefix}[\"{key}\"]")
}

pub(crate) fn require_field<'a>(
    obj: &'a JsonMap,
    key: &str,
    prefix: &str,
) -> Result<&'a Value, ValidationError> {
    obj.get(key)
        .ok_or_else(|| ValidationError::new(field_path(prefix, key), "required field is missing"))
}

pub(crate) fn require_str<'a>(
    obj: &'a JsonMap,
    key: &str,
    prefix: &str,
) -> Result<&'a str, ValidationError> {
    let value = require_field(obj, key, prefix)?;
    value
        .as_str()
        .ok_or_else(|| ValidationError::new(field_path(prefix, key), "expected a string"))
}

pub(crate) fn require_u64(obj: &JsonMap, key: &str, prefix: &str) -> Result<u64, ValidationError> {
    let value = require_field(obj, key, prefix)?;
    value.as_u64().ok_or_else(|| {
        ValidationError::new(field_path(prefix, key), "expected a non-negative integer")
    })
}

pub(crate) fn require_object<'a>(
    obj: &'a JsonMap,
    key: &str,
    prefix: &str,
) -> Result<&'a JsonMap, ValidationError> {
    let value = require_field(obj, key, prefix)?;
    value
        .as_object()
        .ok_or_else(|| ValidationError::new(field_path(prefix, key), "expected an object"))
}

pub(crate) fn require_array<'a>(
    obj: &'a JsonMap,
    key: &str,
    prefix: &str,
) -> Result<&'a Vec<Value>, ValidationError> {
    let value = require_field(obj, key, prefix)?;
    value
        .as_array()
        .ok_or_else(|| ValidationError::new(field_path(prefix, key), "expected an array"))
}

/// Optional string field; `null` and absence are both treated as absent.
pub(crate) fn optional_str<'a>(
    obj: &'a JsonMap,
    key: &str,
    prefix: &str,
) -> Result<Option<&'a str>, ValidationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| ValidationError::new(field_path(prefix, key), "expected a string")),
    }
}

pub(crate) fn check_pattern(
    value: &str,
    pattern: &Regex,
    path: &str,
    expected: &str,
) -> Result<(), ValidationError> {
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            path,
            format!("must be {expected}, got {value:?}"),
        ))
    }
}

pub(crate) fn check_bounded_string(value: &str, path: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(path, "must not be empty"));
    }
    if value.len() > MAX_STRING_LEN {
        return Err(ValidationError::new(
            path,
            format!("must be at most {MAX_STRING_LEN} characters, got {}", value.len()),
        ));
    }
    Ok(())
}

pub(crate) fn check_timestamp(value: &str, path: &str) -> Result<(), ValidationError> {
    match chrono::DateTime::parse_from_rfc3339(value) {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::new(
            path,
            format!("must be an ISO-8601 timestamp, got {value:?}"),
        )),
    }
}

pub(crate) fn check_namespace_key(key: &str, path: &str) -> Result<(), ValidationError> {
    check_pattern(
        key,
        &NAMESPACE_HASH_PATTERN,
        path,
        "a hashed namespace identifier (namespace- followed by 12 hex characters)",
    )
}

pub(crate) fn check_kubernetes_version(value: &str, path: &str) -> Result<(), ValidationError> {
    check_bounded_string(value, path)?;
    check_pattern(
        value,
        &KUBERNETES_VERSION_PATTERN,
        path,
        "a Kubernetes version string",
    )
}

/// A map of hashed-namespace keys to non-negative counters.
pub(crate) fn check_namespace_counts(map: &JsonMap, prefix: &str) -> Result<(), ValidationError> {
    for (key, value) in map {
        let path = map_key_path(prefix, key);
        check_namespace_key(key, &path)?;
        if value.as_u64().is_none() {
            return Err(ValidationError::new(path, "expected a non-negative integer"));
        }
    }
    Ok(())
}

/// A map of bounded string labels to non-negative counters.
pub(crate) fn check_bucket_counts(map: &JsonMap, prefix: &str) -> Result<(), ValidationError> {
    for (key, value) in map {
        let path = map_key_path(prefix, key);
        check_bounded_string(key, &path)?;
        if value.as_u64().is_none() {
            return Err(ValidationError::new(path, "expected a non-negative integer"));
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_valid_cluster_metadata() {
        let raw = raw(CollectionKind::ClusterMetadata, cluster_metadata_body());
        let payload = validate(&raw).expect("payload should validate");
        assert_eq!(payload.collection_type, CollectionKind::ClusterMetadata);
        assert_eq!(payload.collection_id(), COLLECTION_ID);
        assert_eq!(payload.cluster_id(), CLUSTER_ID);
    }

    #[test]
    fn rejects_bad_schema_version() {
        let mut raw = raw(CollectionKind::ClusterMetadata, cluster_metadata_body());
        raw.schema_version = "1.0".to_string();
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "schemaVersion");
    }

    #[test]
    fn rejects_non_object_body() {
        let raw = raw(CollectionKind::ClusterMetadata, json!([1, 2, 3]));
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "body");
    }

    #[test]
    fn rejects_missing_timestamp() {
        let mut body = cluster_metadata_body();
        body.as_object_mut().unwrap().remove("timestamp");
        let err = validate(&raw(CollectionKind::ClusterMetadata, body)).unwrap_err();
        assert_eq!(err.path, "timestamp");
        assert_eq!(err.reason, "required field is missing");
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let mut body = cluster_metadata_body();
        body["timestamp"] = json!("yesterday at noon");
        let err = validate(&raw(CollectionKind::ClusterMetadata, body)).unwrap_err();
        assert_eq!(err.path, "timestamp");
    }

    #[test]
    fn rejects_malformed_collection_id() {
        let mut body = cluster_metadata_body();
        body["collectionId"] = json!("coll_SHOUTING");
        let err = validate(&raw(CollectionKind::ClusterMetadata, body)).unwrap_err();
        assert_eq!(err.path, "collectionId");
    }

    #[test]
    fn rejects_malformed_cluster_id() {
        let mut body = cluster_metadata_body();
        body["clusterId"] = json!("cluster-1");
        let err = validate(&raw(CollectionKind::ClusterMetadata, body)).unwrap_err();
        assert_eq!(err.path, "clusterId");
    }

    #[test]
    fn rejects_bad_sanitization_timestamp() {
        let mut raw = raw(CollectionKind::ClusterMetadata, cluster_metadata_body());
        raw.sanitization.sanitized_at = "not-a-time".to_string();
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "sanitization.sanitizedAt");
    }

    #[test]
    fn rejects_empty_sanitization_rule() {
        let mut raw = raw(CollectionKind::ClusterMetadata, cluster_metadata_body());
        raw.sanitization.applied_rules = vec!["namespace-hashing".to_string(), String::new()];
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "sanitization.appliedRules[1]");
    }

    #[test]
    fn error_display_is_path_and_reason() {
        let err = ValidationError::new("nodeCount", "must be between 1 and 10000");
        assert_eq!(err.to_string(), "nodeCount: must be between 1 and 10000");
    }
}
