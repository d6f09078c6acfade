// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Structural validation for `resource-configuration-patterns` payload
//! bodies: eight closed-shape aggregates of workload configuration counters.

use super::{
    check_bucket_counts, field_path, require_object, require_u64, JsonMap, ValidationError,
};
use crate::payload::ConfigurationPatterns;
use serde_json::Value;

struct AggregateShape {
    key: &'static str,
    counters: &'static [&'static str],
    bucket_maps: &'static [&'static str],
}

const AGGREGATES: [AggregateShape; 8] = [
    AggregateShape {
        key: "resourceLimits",
        counters: &["withLimits", "withoutLimits", "withRequests", "withoutRequests"],
        bucket_maps: &["cpuLimitBuckets", "memoryLimitBuckets"],
    },
    AggregateShape {
        key: "replicaCounts",
        counters: &["single", "twoToFive", "sixToTen", "aboveTen"],
        bucket_maps: &[],
    },
    AggregateShape {
        key: "imagePullPolicies",
        counters: &["always", "ifNotPresent", "never"],
        bucket_maps: &[],
    },
    AggregateShape {
        key: "securityContexts",
        counters: &["runAsNonRoot", "privileged", "readOnlyRootFilesystem", "unset"],
        bucket_maps: &[],
    },
    AggregateShape {
        key: "labelsAnnotations",
        counters: &["totalLabels", "totalAnnotations", "withRecommendedLabels", "withoutLabels"],
        bucket_maps: &[],
    },
    AggregateShape {
        key: "volumes",
        counters: &["configMap", "secret", "emptyDir", "persistentVolumeClaim", "hostPath", "other"],
        bucket_maps: &[],
    },
    AggregateShape {
        key: "services",
        counters: &["clusterIp", "nodePort", "loadBalancer", "externalName"],
        bucket_maps: &[],
    },
    AggregateShape {
        key: "probes",
        counters: &["liveness", "readiness", "startup", "none"],
        bucket_maps: &[],
    },
];

pub(super) fn validate_body(body: &JsonMap) -> Result<ConfigurationPatterns, ValidationError> {
    for shape in &AGGREGATES {
        let aggregate = require_object(body, shape.key, "")?;
        for counter in shape.counters {
            require_u64(aggregate, counter, shape.key)?;
        }
        for bucket_map in shape.bucket_maps {
            let prefix = field_path(shape.key, bucket_map);
            let map = require_object(aggregate, bucket_map, shape.key)?;
            check_bucket_counts(map, &prefix)?;
        }
    }

    serde_json::from_value(Value::Object(body.clone())).map_err(|e| {
        ValidationError::new(
            "body",
            format!("malformed resource-configuration-patterns body: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use crate::payload::{CollectionKind, PayloadBody};
    use crate::validator::test_fixtures::*;
    use crate::validator::validate;
    use serde_json::json;

    fn patterns_body() -> serde_json::Value {
        json!({
            "timestamp": TIMESTAMP,
            "collectionId": COLLECTION_ID,
            "clusterId": CLUSTER_ID,
            "resourceLimits": {
                "withLimits": 14,
                "withoutLimits": 2,
                "withRequests": 15,
                "withoutRequests": 1,
                "cpuLimitBuckets": { "lte-500m": 9, "gt-500m": 5 },
                "memoryLimitBuckets": { "lte-512Mi": 11, "gt-512Mi": 3 },
            },
            "replicaCounts": { "single": 4, "twoToFive": 8, "sixToTen": 2, "aboveTen": 0 },
            "imagePullPolicies": { "always": 10, "ifNotPresent": 6, "never": 0 },
            "securityContexts": {
                "runAsNonRoot": 7,
                "privileged": 1,
                "readOnlyRootFilesystem": 5,
                "unset": 4,
            },
            "labelsAnnotations": {
                "totalLabels": 96,
                "totalAnnotations": 41,
                "withRecommendedLabels": 12,
                "withoutLabels": 1,
            },
            "volumes": {
                "configMap": 9,
                "secret": 6,
                "emptyDir": 3,
                "persistentVolumeClaim": 4,
                "hostPath": 0,
                "other": 1,
            },
            "services": { "clusterIp": 11, "nodePort": 2, "loadBalancer": 1, "externalName": 0 },
            "probes": { "liveness": 13, "readiness": 14, "startup": 2, "none": 1 },
        })
    }

    #[test]
    fn accepts_valid_patterns() {
        let payload = validate(&raw(
            CollectionKind::ResourceConfigurationPatterns,
            patterns_body(),
        ))
        .unwrap();
        match payload.body {
            PayloadBody::ConfigurationPatterns(b) => {
                assert_eq!(b.resource_limits.with_limits, 14);
                assert_eq!(b.resource_limits.cpu_limit_buckets.get("lte-500m"), Some(&9));
                assert_eq!(b.probes.none, 1);
            }
            other => panic!("wrong body kind: {other:?}"),
        }
    }

    #[test]
    fn missing_aggregate_is_rejected() {
        let mut body = patterns_body();
        body.as_object_mut().unwrap().remove("probes");
        let err = validate(&raw(CollectionKind::ResourceConfigurationPatterns, body)).unwrap_err();
        assert_eq!(err.path, "probes");
        assert_eq!(err.reason, "required field is missing");
    }

    #[test]
    fn missing_counter_is_rejected_with_nested_path() {
        let mut body = patterns_body();
        body["imagePullPolicies"].as_object_mut().unwrap().remove("never");
        let err = validate(&raw(CollectionKind::ResourceConfigurationPatterns, body)).unwrap_err();
        assert_eq!(err.path, "imagePullPolicies.never");
    }

    #[test]
    fn negative_counter_is_rejected() {
        let mut body = patterns_body();
        body["securityContexts"]["privileged"] = json!(-1);
        let err = validate(&raw(CollectionKind::ResourceConfigurationPatterns, body)).unwrap_err();
        assert_eq!(err.path, "securityContexts.privileged");
    }

    #[test]
    fn overlong_bucket_label_is_rejected_with_bracket_path() {
        let mut body = patterns_body();
        let long_label = "x".repeat(51);
        body["resourceLimits"]["cpuLimitBuckets"] = json!({ long_label.clone(): 1 });
        let err = validate(&raw(CollectionKind::ResourceConfigurationPatterns, body)).unwrap_err();
        assert_eq!(
            err.path,
            format!("resourceLimits.cpuLimitBuckets[\"{long_label}\"]")
        );
    }

    #[test]
    fn non_integer_bucket_value_is_rejected() {
        let mut body = patterns_body();
        body["resourceLimits"]["memoryLimitBuckets"] = json!({ "lte-512Mi": "lots" });
        let err = validate(&raw(CollectionKind::ResourceConfigurationPatterns, body)).unwrap_err();
        assert_eq!(err.path, "resourceLimits.memoryLimitBuckets[\"lte-512Mi\"]");
    }

    #[test]
    fn fail_fast_reports_only_the_first_violation() {
        let mut body = patterns_body();
        // Two defects; validation must surface the first in shape order.
        body["resourceLimits"].as_object_mut().unwrap().remove("withLimits");
        body["probes"].as_object_mut().unwrap().remove("liveness");
        let err = validate(&raw(CollectionKind::ResourceConfigurationPatterns, body)).unwrap_err();
        assert_eq!(err.path, "resourceLimits.withLimits");
    }
}
