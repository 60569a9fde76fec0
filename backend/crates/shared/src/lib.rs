//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of vocabulary shared by every crate:
//! - Common error types and result aliases
//! - The numeric entity identifier used by the statistics API
//!
//! Only things with a consistent meaning across crates belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
