//! Infrastructure layer for external integrations.
//!
//! This layer provides the concrete key-value stores behind cached calls.
//!
//! # Modules
//!
//! - [`cache`] - Backend trait, Redis/in-memory/no-op implementations and the selector

pub mod cache;
