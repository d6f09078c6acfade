// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Bounded in-memory retention of recent validated collections.
//!
//! The free-tier sink: a keyed ring buffer holding the most recent N
//! payloads. Eviction is FIFO by insertion order, not LRU; retrieval never
//! reorders, only [`RetentionStore::store`] does. The bound exists purely to
//! cap memory on long-running unattended installs; nothing survives a
//! restart.

use crate::payload::CollectionPayload;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Default number of retained collections.
pub const DEFAULT_RETENTION_CAPACITY: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    #[error("retention capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),
}

pub struct RetentionStore {
    capacity: usize,
    index: HashMap<String, CollectionPayload>,
    order: VecDeque<String>,
}

impl Default for RetentionStore {
    fn default() -> Self {
        RetentionStore {
            capacity: DEFAULT_RETENTION_CAPACITY,
            index: HashMap::new(),
            order: VecDeque::new(),
        }
    }
}

impl RetentionStore {
    pub fn new(capacity: usize) -> Result<Self, RetentionError> {
        if capacity == 0 {
            return Err(RetentionError::InvalidCapacity(capacity));
        }
        Ok(RetentionStore {
            capacity,
            index: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        })
    }

    /// Insert a payload, or update it in place if its collection id is
    /// already retained. Either way the payload becomes the most recent
    /// entry. When an insert pushes the store over capacity the oldest
    /// entry is evicted; eviction is a normal side effect, not an error.
    pub fn store(&mut self, payload: CollectionPayload) {
        let collection_id = payload.collection_id().to_string();

        if self.index.insert(collection_id.clone(), payload).is_some() {
            // Update in place: move to the most-recent position, size unchanged.
            if let Some(pos) = self.order.iter().position(|id| id == &collection_id) {
                self.order.remove(pos);
            }
            self.order.push_back(collection_id);
            return;
        }

        self.order.push_back(collection_id);
        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.index.remove(&evicted);
                debug!(collection_id = %evicted, "retention store full, evicted oldest collection");
            }
        }
    }

    /// Look up a retained payload by collection id. Returns a copy; the
    /// store keeps exclusive ownership of its entries.
    pub fn retrieve(&self, collection_id: &str) -> Option<CollectionPayload> {
        self.index.get(collection_id).cloned()
    }

    /// Up to `limit` retained payloads, most recent first.
    pub fn list_recent(&self, limit: usize) -> Vec<CollectionPayload> {
        self.order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| self.index.get(id).cloned())
            .collect()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
