//! Presentation Layer
//!
//! Badge formatting, HTTP handlers and DTOs for the API.

pub mod badge;
pub mod dto;
pub mod handlers;
pub mod router;
