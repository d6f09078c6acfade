// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber at the configured level.
///
/// Safe to call more than once; only the first installation wins. The level
/// comes from the validated `log_level` config field, so the fallback filter
/// is only reached if a caller bypasses validation.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_does_not_panic() {
        init_logging("debug");
        init_logging("info");
    }

    #[test]
    fn bogus_level_falls_back_without_panic() {
        init_logging("extremely-loud[");
    }
}
