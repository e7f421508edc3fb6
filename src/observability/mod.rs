//! Observability infrastructure.
//!
//! Provides:
//! - Structured logging setup for applications and tests
//! - OpenTelemetry metrics for publish and subscriber lifecycle

pub mod metrics;
pub mod tracing;
