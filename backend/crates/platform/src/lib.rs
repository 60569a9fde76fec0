//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Minimum-gap request scheduling
//! - Rate-limited JSON fetching over HTTP
//! - Key-value persistence with in-memory and file-backed stores

pub mod http;
pub mod kv;
pub mod rate_limit;
