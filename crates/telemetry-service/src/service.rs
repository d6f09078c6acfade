// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Service lifecycle and tier dispatch.
//!
//! For each registered collector the service schedules a recurring task
//! whose tick runs collect → validate → dispatch. Pro tier (credential
//! configured) transmits to the remote service; free tier retains locally.
//! A failed transmission never falls back to local retention; the cycle's
//! telemetry is lost and the next cycle tries again.

use crate::collector::Collector;
use crate::config::{
    TelemetryConfig, COLLECTION_OFFSET_RANGE_SECS, MIN_COLLECTION_INTERVAL_SECS,
};
use crate::error::ServiceError;
use std::sync::Arc;
use std::time::Duration;
use telemetry_pipeline::retention::RetentionStore;
use telemetry_pipeline::scheduler::{Scheduler, TaskCallback};
use telemetry_pipeline::transmitter::{
    RetryPolicy, TransmitOutcome, Transmitter, TransmitterConfig,
};
use telemetry_pipeline::validator;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Installation tier, selected by presence of a transmission credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// No credential: validated collections are retained locally.
    Free,
    /// Credential configured: validated collections are transmitted.
    Pro,
}

pub struct TelemetryService {
    scheduler: Scheduler,
    retention: Arc<Mutex<RetentionStore>>,
    tier: Tier,
}

impl TelemetryService {
    /// Wire the given collectors into a scheduler according to the config.
    /// Nothing runs until [`TelemetryService::start`].
    pub fn new(
        config: TelemetryConfig,
        collectors: Vec<Arc<dyn Collector>>,
    ) -> Result<Self, ServiceError> {
        config.validate()?;

        let retention = RetentionStore::new(config.retention_capacity)
            .map_err(|e| ServiceError::InvalidConfig(e.to_string()))?;
        let retention = Arc::new(Mutex::new(retention));

        let transmitter = match &config.api_key {
            Some(api_key) => {
                let transmitter = Transmitter::new(TransmitterConfig {
                    server_url: config.server_url.clone(),
                    api_key: api_key.clone(),
                    https_proxy: config.https_proxy.clone(),
                    request_timeout: Duration::from_secs(config.request_timeout_secs),
                    retry_policy: RetryPolicy::default(),
                })
                .map_err(|e| ServiceError::TransmitterInit(e.to_string()))?;
                Some(Arc::new(transmitter))
            }
            None => None,
        };
        let tier = if transmitter.is_some() {
            Tier::Pro
        } else {
            Tier::Free
        };
        info!(tier = ?tier, collectors = collectors.len(), "telemetry service configured");

        let mut scheduler = Scheduler::new();
        for collector in collectors {
            let kind = collector.kind();
            let interval_secs = config.interval_for(kind);

            let callback: TaskCallback = {
                let transmitter = transmitter.clone();
                let retention = Arc::clone(&retention);
                Arc::new(move || {
                    let collector = Arc::clone(&collector);
                    let transmitter = transmitter.clone();
                    let retention = Arc::clone(&retention);
                    Box::pin(async move {
                        run_collection(collector, transmitter, retention).await;
                        Ok(())
                    })
                })
            };

            scheduler.register(
                kind.as_str(),
                interval_secs,
                MIN_COLLECTION_INTERVAL_SECS,
                COLLECTION_OFFSET_RANGE_SECS,
                callback,
            );
        }

        Ok(TelemetryService {
            scheduler,
            retention,
            tier,
        })
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Activate all collection tasks.
    pub fn start(&mut self) -> Result<(), ServiceError> {
        if self.scheduler.is_started() {
            return Err(ServiceError::AlreadyStarted);
        }
        self.scheduler.start();
        Ok(())
    }

    /// Deactivate all collection tasks; idempotent.
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_started()
    }

    /// Handle to the local retention store for free-tier retrieval.
    pub fn retention(&self) -> Arc<Mutex<RetentionStore>> {
        Arc::clone(&self.retention)
    }
}

/// One collection cycle: collect, validate, dispatch by tier. Every failure
/// path is logged and absorbed here so nothing reaches the scheduler's
/// timer machinery.
async fn run_collection(
    collector: Arc<dyn Collector>,
    transmitter: Option<Arc<Transmitter>>,
    retention: Arc<Mutex<RetentionStore>>,
) {
    let kind = collector.kind();

    let raw = match collector.collect().await {
        Ok(raw) => raw,
        Err(err) => {
            error!(collection = %kind, error = %err, "collector failed, skipping this cycle");
            return;
        }
    };

    let payload = match validator::validate(&raw) {
        Ok(payload) => payload,
        Err(err) => {
            error!(collection = %kind, error = %err, "collected payload failed validation, dropping");
            return;
        }
    };

    match transmitter {
        Some(transmitter) => match transmitter.transmit(&payload).await {
            TransmitOutcome::Delivered { status } => {
                debug!(collection = %kind, status, "collection transmitted");
            }
            // transmit() already logged the failure; no fallback to local
            // retention on the pro tier.
            TransmitOutcome::Rejected { .. } | TransmitOutcome::Exhausted { .. } => {}
        },
        None => {
            let collection_id = payload.collection_id().to_string();
            retention.lock().await.store(payload);
            debug!(collection = %kind, collection_id = %collection_id, "collection retained locally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Collector;
    use async_trait::async_trait;
    use serde_json::json;
    use telemetry_pipeline::payload::{CollectionKind, RawCollection, Sanitization};

    struct FakeCollector {
        node_count: i64,
    }

    #[async_trait]
    impl Collector for FakeCollector {
        fn kind(&self) -> CollectionKind {
            CollectionKind::ClusterMetadata
        }

        async fn collect(&self) -> Result<RawCollection, Box<dyn std::error::Error + Send + Sync>> {
            Ok(RawCollection {
                schema_version: "v1.0.0".to_string(),
                collection_type: CollectionKind::ClusterMetadata,
                body: json!({
                    "timestamp": "2025-08-25T12:00:00Z",
                    "collectionId": format!("coll_{}", "a".repeat(32)),
                    "clusterId": format!("cls_{}", "b".repeat(32)),
                    "kubernetesVersion": "v1.29.3",
                    "nodeCount": self.node_count,
                }),
                sanitization: Sanitization {
                    applied_rules: vec!["namespace-hashing".to_string()],
                    sanitized_at: "2025-08-25T12:00:00Z".to_string(),
                },
            })
        }
    }

    struct BrokenCollector;

    #[async_trait]
    impl Collector for BrokenCollector {
        fn kind(&self) -> CollectionKind {
            CollectionKind::ResourceInventory
        }

        async fn collect(&self) -> Result<RawCollection, Box<dyn std::error::Error + Send + Sync>> {
            Err("cluster API unreachable".into())
        }
    }

    fn store() -> Arc<Mutex<RetentionStore>> {
        Arc::new(Mutex::new(RetentionStore::new(10).unwrap()))
    }

    fn transmitter_for(server_url: String) -> Arc<Transmitter> {
        Arc::new(
            Transmitter::new(TransmitterConfig {
                server_url,
                api_key: "test-api-key".to_string(),
                https_proxy: None,
                request_timeout: Duration::from_secs(5),
                retry_policy: RetryPolicy {
                    max_attempts: 3,
                    backoff: vec![Duration::from_millis(5)],
                },
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn free_tier_cycle_lands_in_retention() {
        let retention = store();
        run_collection(
            Arc::new(FakeCollector { node_count: 4 }),
            None,
            Arc::clone(&retention),
        )
        .await;

        let retention = retention.lock().await;
        assert_eq!(retention.len(), 1);
        assert!(retention
            .retrieve(&format!("coll_{}", "a".repeat(32)))
            .is_some());
    }

    #[tokio::test]
    async fn invalid_payload_is_dropped_before_any_sink() {
        let retention = store();
        run_collection(
            Arc::new(FakeCollector { node_count: 0 }),
            None,
            Arc::clone(&retention),
        )
        .await;

        assert!(retention.lock().await.is_empty());
    }

    #[tokio::test]
    async fn collector_failure_is_absorbed() {
        let retention = store();
        run_collection(Arc::new(BrokenCollector), None, Arc::clone(&retention)).await;
        assert!(retention.lock().await.is_empty());
    }

    #[tokio::test]
    async fn pro_tier_cycle_transmits_to_remote() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/collections")
            .match_header("authorization", "Bearer test-api-key")
            .with_status(202)
            .expect(1)
            .create_async()
            .await;

        let retention = store();
        run_collection(
            Arc::new(FakeCollector { node_count: 4 }),
            Some(transmitter_for(server.url())),
            Arc::clone(&retention),
        )
        .await;

        mock.assert_async().await;
        // Pro tier never writes to the local store.
        assert!(retention.lock().await.is_empty());
    }

    #[tokio::test]
    async fn rejected_transmission_does_not_fall_back_to_retention() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/collections")
            .with_status(400)
            .with_body("{\"message\":\"bad payload\"}")
            .expect(1)
            .create_async()
            .await;

        let retention = store();
        run_collection(
            Arc::new(FakeCollector { node_count: 4 }),
            Some(transmitter_for(server.url())),
            Arc::clone(&retention),
        )
        .await;

        mock.assert_async().await;
        assert!(retention.lock().await.is_empty());
    }

    #[test]
    fn tier_follows_credential_presence() {
        let free = TelemetryService::new(TelemetryConfig::default(), vec![]).unwrap();
        assert_eq!(free.tier(), Tier::Free);

        let pro = TelemetryService::new(
            TelemetryConfig {
                api_key: Some("_not_a_real_key_".to_string()),
                ..Default::default()
            },
            vec![],
        )
        .unwrap();
        assert_eq!(pro.tier(), Tier::Pro);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let result = TelemetryService::new(
            TelemetryConfig {
                retention_capacity: 0,
                ..Default::default()
            },
            vec![],
        );
        assert!(matches!(result, Err(ServiceError::InvalidConfig(_))));
    }
}
