//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository primitives into record lifecycle operations.
//! - Keep callers decoupled from storage details.

pub mod record_service;
