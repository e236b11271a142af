// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry, tracing, and metrics infrastructure.
//!
//! - **Tracing**: structured logging through `tracing` with an `EnvFilter`
//!   subscriber (`RUST_LOG` takes precedence over the configured level)
//! - **Metrics**: in-process operation timings and rewind/match counters,
//!   recorded when the `telemetry` feature is enabled
//!
//! # Usage
//!
//! ```rust,ignore
//! use hindsight::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::default())?;
//! ```

mod init;
pub mod metrics;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
pub use metrics::{Histogram, Metrics, MetricsSnapshot, OperationMetrics, GLOBAL_METRICS};
