//! flow-tape: Real-time options flow recorder
//!
//! This library provides the core components for:
//! - A long-lived WebSocket connection with pluggable reconnect policy
//! - Normalization of raw flow events into fixed-schema rows
//! - An in-memory table of recent rows
//! - A durable CSV tape mirroring the table
//! - Snapshot and export reads for a presentation layer
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod flow;
pub mod ingest;
pub mod reader;
pub mod service;
pub mod source;
pub mod store;
pub mod telemetry;
pub mod ws;
