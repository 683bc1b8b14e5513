//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and clock reads into use-case level APIs.
//! - Keep callers decoupled from storage and query details.

pub mod publication_service;
