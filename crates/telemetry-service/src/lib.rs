// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Orchestration layer wiring collectors into the telemetry pipeline.
//!
//! Owns configuration, the collector boundary, and tier dispatch: with a
//! remote credential configured, validated collections go to the remote
//! service; without one they are retained locally for inspection.

#![deny(clippy::all)]

pub mod collector;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;
