// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! Jittered recurring-task scheduler.
//!
//! Each registered task gets a deterministic start offset derived from a
//! stable hash of its type string, then repeats on its interval. The same
//! type always lands on the same offset, in this process and the next, which
//! spreads a fleet of operator instances across the offset window without
//! any coordination between them.
//!
//! Callback failures are caught and logged at the tick boundary; they never
//! stop the repeating timer and never leak into other tasks. Ticks of the
//! same task are serialized by its loop, so a slow callback delays that
//! task's next tick rather than overlapping it; distinct tasks tick fully
//! independently.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub type TaskError = Box<dyn Error + Send + Sync>;

/// Opaque recurring work. Each tick calls the closure for a fresh future.
pub type TaskCallback =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send>> + Send + Sync>;

struct RegisteredTask {
    interval: Duration,
    offset: Duration,
    callback: TaskCallback,
}

/// Registry of named recurring tasks with deterministic jittered offsets.
pub struct Scheduler {
    tasks: HashMap<String, RegisteredTask>,
    cancel: Option<CancellationToken>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            tasks: HashMap::new(),
            cancel: None,
        }
    }

    /// Register a task keyed by `task_type`; re-registering the same type
    /// overwrites the previous registration. An interval below the minimum
    /// is silently clamped (and logged), never rejected. Registrations only
    /// become active at [`Scheduler::start`].
    pub fn register(
        &mut self,
        task_type: &str,
        interval_secs: u64,
        min_interval_secs: u64,
        offset_range_secs: u64,
        callback: TaskCallback,
    ) {
        let mut effective_secs = interval_secs.max(min_interval_secs);
        if interval_secs < min_interval_secs {
            warn!(
                task = task_type,
                requested = interval_secs,
                clamped_to = effective_secs,
                "requested interval below minimum, clamping"
            );
        }
        // tokio intervals reject a zero period.
        effective_secs = effective_secs.max(1);

        let offset_secs = jitter_offset_secs(task_type, offset_range_secs);
        debug!(
            task = task_type,
            interval_secs = effective_secs,
            offset_secs,
            "registered scheduled task"
        );

        let replaced = self
            .tasks
            .insert(
                task_type.to_string(),
                RegisteredTask {
                    interval: Duration::from_secs(effective_secs),
                    offset: Duration::from_secs(offset_secs),
                    callback,
                },
            )
            .is_some();
        if replaced {
            warn!(task = task_type, "replaced existing task registration");
        }
    }

    /// Activate every registered task exactly once. Calling `start` while
    /// already started is a logged no-op.
    pub fn start(&mut self) {
        if self.cancel.is_some() {
            warn!("scheduler already started, ignoring start request");
            return;
        }

        let token = CancellationToken::new();
        for (task_type, task) in &self.tasks {
            tokio::spawn(run_task(
                task_type.clone(),
                task.offset,
                task.interval,
                Arc::clone(&task.callback),
                token.child_token(),
            ));
        }
        debug!(tasks = self.tasks.len(), "scheduler started");
        self.cancel = Some(token);
    }

    /// Deactivate all tasks, cancelling pending and future timers. An
    /// in-flight callback invocation is not interrupted. Idempotent.
    pub fn stop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
            debug!("scheduler stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_task(
    task_type: String,
    offset: Duration,
    interval: Duration,
    callback: TaskCallback,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + offset, interval);
    // A callback slower than the interval delays the next tick instead of
    // triggering a burst of back-to-back catch-up ticks.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            // Cancellation wins over a due tick so that stop() before the
            // first fire deterministically prevents any invocation.
            biased;
            _ = cancel.cancelled() => {
                debug!(task = %task_type, "task loop cancelled");
                return;
            }
            _ = ticker.tick() => {
                if let Err(err) = (callback)().await {
                    error!(task = %task_type, error = %err, "scheduled task callback failed");
                }
            }
        }
    }
}

/// Deterministic jitter offset for a task type: a stable cryptographic hash
/// of the type string truncated to an integer, modulo the offset window.
/// Stable across processes and restarts; different type strings land on
/// different phases.
pub fn jitter_offset_secs(task_type: &str, offset_range_secs: u64) -> u64 {
    if offset_range_secs == 0 {
        return 0;
    }
    let digest = Sha256::digest(task_type.as_bytes());
    let mut truncated = [0u8; 8];
    truncated.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(truncated) % offset_range_secs
}
