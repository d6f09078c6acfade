// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Core collection pipeline for the operator telemetry subsystem.
//!
//! The pipeline moves anonymized cluster facts one direction: a scheduled
//! tick invokes an external collector, the collector's raw output is gated
//! by the [`validator`], and the validated payload is routed to either the
//! in-memory [`retention`] store (free tier) or the remote
//! [`transmitter`] (pro tier). Failures at any stage are logged and
//! absorbed; nothing in this crate is allowed to take down the process
//! that embeds it.

#![deny(clippy::all)]

pub mod payload;
pub mod retention;
pub mod scheduler;
pub mod transmitter;
pub mod validator;
