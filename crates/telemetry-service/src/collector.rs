// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Boundary to the external data collectors.
//!
//! Collectors walk cluster-API objects and produce raw, not-yet-validated
//! collections; anonymization (namespace hashing) happens on their side of
//! the boundary. The pipeline never sees raw cluster strings and only ever
//! trusts what the validator lets through.

use async_trait::async_trait;
use std::error::Error;
use telemetry_pipeline::payload::{CollectionKind, RawCollection};

#[async_trait]
pub trait Collector: Send + Sync {
    /// The payload kind this collector produces; also its scheduler task key.
    fn kind(&self) -> CollectionKind;

    /// Gather one raw collection. Failures are absorbed and logged at the
    /// tick boundary; they never affect other collectors or future ticks.
    async fn collect(&self) -> Result<RawCollection, Box<dyn Error + Send + Sync>>;
}
