//! Generic and native object models.
//!
//! # Responsibility
//! - `resource`: storage-agnostic entity shape handed to and returned by the
//!   persister.
//! - `native`: the legacy store's own object shape with validation rules.
//!
//! # Invariants
//! - A resource is transient (no id) or persisted (stable id); ids are never
//!   reassigned once present.
//! - Native objects are validated against their `NativeModel` before any
//!   primary write.

pub mod native;
pub mod resource;
