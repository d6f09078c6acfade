// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Payload data model for the collection pipeline.
//!
//! [`RawCollection`] is the untrusted unit a collector hands the pipeline.
//! [`CollectionPayload`] is the trusted unit; the validator is the only
//! producer of trusted payloads, and the retention store and transmitter
//! only ever see trusted payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of payload kinds moved through the pipeline.
///
/// Adding a kind means adding a typed body struct and a validator for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    #[serde(rename = "cluster-metadata")]
    ClusterMetadata,
    #[serde(rename = "resource-inventory")]
    ResourceInventory,
    #[serde(rename = "resource-configuration-patterns")]
    ResourceConfigurationPatterns,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::ClusterMetadata,
        CollectionKind::ResourceInventory,
        CollectionKind::ResourceConfigurationPatterns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::ClusterMetadata => "cluster-metadata",
            CollectionKind::ResourceInventory => "resource-inventory",
            CollectionKind::ResourceConfigurationPatterns => "resource-configuration-patterns",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anonymization metadata carried on every payload.
///
/// Produced upstream by the collectors; the validator checks it and carries
/// it through onto the trusted payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sanitization {
    /// Names of the anonymization rules that were applied to the body.
    pub applied_rules: Vec<String>,
    /// When the rules were applied, ISO-8601.
    pub sanitized_at: String,
}

/// A not-yet-validated collection as produced by an external collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCollection {
    pub schema_version: String,
    pub collection_type: CollectionKind,
    pub body: serde_json::Value,
    pub sanitization: Sanitization,
}

/// A validated, typed collection payload.
///
/// Only the validator constructs these (outside of tests); downstream sinks
/// can rely on every field being schema-conformant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPayload {
    pub schema_version: String,
    pub collection_type: CollectionKind,
    pub body: PayloadBody,
    pub sanitization: Sanitization,
}

impl CollectionPayload {
    /// The `coll_`-prefixed identifier of this collection.
    pub fn collection_id(&self) -> &str {
        match &self.body {
            PayloadBody::ClusterMetadata(b) => &b.collection_id,
            PayloadBody::ResourceInventory(b) => &b.collection_id,
            PayloadBody::ConfigurationPatterns(b) => &b.collection_id,
        }
    }

    /// The `cls_`-prefixed identifier of the cluster this was collected from.
    pub fn cluster_id(&self) -> &str {
        match &self.body {
            PayloadBody::ClusterMetadata(b) => &b.cluster_id,
            PayloadBody::ResourceInventory(b) => &b.cluster_id,
            PayloadBody::ConfigurationPatterns(b) => &b.cluster_id,
        }
    }
}

/// Kind-specific payload body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadBody {
    ClusterMetadata(ClusterMetadata),
    ResourceInventory(ResourceInventory),
    ConfigurationPatterns(ConfigurationPatterns),
}

/// Body of a `cluster-metadata` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMetadata {
    pub timestamp: String,
    pub collection_id: String,
    pub cluster_id: String,
    pub kubernetes_version: String,
    pub node_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

/// Body of a `resource-inventory` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInventory {
    pub timestamp: String,
    pub collection_id: String,
    pub cluster_id: String,
    pub namespaces: NamespaceSummary,
    pub resources: ResourceCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSummary {
    pub count: u64,
    /// Hashed namespace identifiers (`namespace-<12 hex>`), never raw names.
    pub list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCounts {
    pub pods: PodCounts,
    pub deployments: WorkloadCounts,
    pub stateful_sets: WorkloadCounts,
    pub replica_sets: WorkloadCounts,
    pub services: WorkloadCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodCounts {
    pub total: u64,
    pub running: u64,
    pub pending: u64,
    pub failed: u64,
    pub by_namespace: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadCounts {
    pub total: u64,
    pub by_namespace: BTreeMap<String, u64>,
}

/// Body of a `resource-configuration-patterns` collection: eight closed-shape
/// aggregates of workload configuration counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationPatterns {
    pub timestamp: String,
    pub collection_id: String,
    pub cluster_id: String,
    pub resource_limits: ResourceLimitPatterns,
    pub replica_counts: ReplicaCountPatterns,
    pub image_pull_policies: ImagePullPolicyPatterns,
    pub security_contexts: SecurityContextPatterns,
    pub labels_annotations: LabelAnnotationPatterns,
    pub volumes: VolumePatterns,
    pub services: ServicePatterns,
    pub probes: ProbePatterns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimitPatterns {
    pub with_limits: u64,
    pub without_limits: u64,
    pub with_requests: u64,
    pub without_requests: u64,
    pub cpu_limit_buckets: BTreeMap<String, u64>,
    pub memory_limit_buckets: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaCountPatterns {
    pub single: u64,
    pub two_to_five: u64,
    pub six_to_ten: u64,
    pub above_ten: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePullPolicyPatterns {
    pub always: u64,
    pub if_not_present: u64,
    pub never: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContextPatterns {
    pub run_as_non_root: u64,
    pub privileged: u64,
    pub read_only_root_filesystem: u64,
    pub unset: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelAnnotationPatterns {
    pub total_labels: u64,
    pub total_annotations: u64,
    pub with_recommended_labels: u64,
    pub without_labels: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumePatterns {
    pub config_map: u64,
    pub secret: u64,
    pub empty_dir: u64,
    pub persistent_volume_claim: u64,
    pub host_path: u64,
    pub other: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePatterns {
    pub cluster_ip: u64,
    pub node_port: u64,
    pub load_balancer: u64,
    pub external_name: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbePatterns {
    pub liveness: u64,
    pub readiness: u64,
    pub startup: u64,
    pub none: u64,
}
