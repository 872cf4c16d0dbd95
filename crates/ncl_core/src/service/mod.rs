//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate synthesis, analysis and rendering into use-case level APIs.
//! - Keep CLI/FFI layers decoupled from model and backend details.

pub mod export_service;
pub mod session;
