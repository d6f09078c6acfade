// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

/// Errors that can occur when configuring or running the telemetry service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to initialize transmission client: {0}")]
    TransmitterInit(String),

    #[error("Telemetry service already started")]
    AlreadyStarted,

    #[error("Runtime error: {0}")]
    Runtime(String),
}
