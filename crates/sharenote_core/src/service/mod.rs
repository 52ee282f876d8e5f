//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate policy decisions and repository calls into use-case APIs.
//! - Keep transport layers decoupled from storage details.
//!
//! # Invariants
//! - Collaborators are passed in through constructors; services hold no
//!   state besides them.
//! - Every mutating note operation re-reads the note before deciding.

pub mod error;
pub mod identity;
pub mod note_service;
pub mod profile_service;
