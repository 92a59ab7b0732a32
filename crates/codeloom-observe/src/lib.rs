//! Observability setup for Codeloom: tracing subscriber and optional
//! OpenTelemetry export.

pub mod tracing_setup;
