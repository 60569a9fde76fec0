//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod annotate;
pub mod compute_delta;
pub mod config;
pub mod profile_view;
pub mod short_window;
pub mod snapshot_cache;
