//! Shared configuration, extractors, and error handling for Quizdesk
//!
//! This crate provides common functionality used across the Quizdesk workspace:
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP mapping
//! - Validating request extractors
//! - State machine error types

pub mod config;
pub mod error;
pub mod extractors;
pub mod state;

pub use error::{Error, Result};
pub use extractors::ValidatedQuery;
pub use state::StateError;
