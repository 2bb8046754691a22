//! Common library for the route optimizer.
//!
//! This crate provides shared functionality across the route-optimizer crates,
//! including configuration management, error handling and telemetry utilities.

// Configuration management
pub mod config;
pub use config::{Config, DedupPolicy, PartitionStrategy, ProviderKind, RouteMode};

// Error handling types
pub mod error;
pub use error::{Result, RouteError};

// Telemetry and observability
pub mod telemetry;

pub use telemetry::init_tracing;
