//! Domain model for users and shareable notes.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own creation defaults and input validation for notes.
//!
//! # Invariants
//! - A note has exactly one owner, fixed at creation.
//! - The owner is never part of a note's shared-with list.
//! - Identifiers are assigned by storage and never reused.

pub mod note;
pub mod user;
