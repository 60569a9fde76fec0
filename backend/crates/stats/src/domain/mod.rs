//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (StatSnapshot, DeltaResult, CachedDelta, CacheEntry)
//! - Domain value objects (StatField, WindowDays, ApiKey)
//! - Domain services (shape-agnostic field extraction)
//! - Repository traits (ports to the statistics API and credentials)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
