//! Entity model for schools, their students and student addresses.
//!
//! # Responsibility
//! - Define the in-memory shape of every persisted entity.
//! - Express ownership without reference cycles: a `School` owns its
//!   `Student`s, a `Student` owns its `Address`, and the way back up is a
//!   plain foreign-key id.
//!
//! # Invariants
//! - `id == None` means "not yet persisted"; repositories assign ids.
//! - Transient fields (`Student::age`) are never written to storage.

pub mod address;
pub mod school;
pub mod student;
