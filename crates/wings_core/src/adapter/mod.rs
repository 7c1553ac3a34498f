//! Persistence adapter between generic resources and the native store.
//!
//! # Responsibility
//! - Bind a native store connection and a resource factory under one name.
//! - Hand out the persister (writes) and query service (reads) for that
//!   binding.
//!
//! # Invariants
//! - Every failure reaches the caller as a typed `AdapterError`; this layer
//!   never retries.
//! - Writes are issued in a fixed order but are not atomic as a group.

pub mod error;
pub mod metadata_adapter;
pub mod persister;
pub mod query_service;
pub mod resource_factory;

pub use error::{AdapterError, AdapterResult, FailedSaveError};
pub use metadata_adapter::MetadataAdapter;
pub use persister::Persister;
pub use query_service::QueryService;
pub use resource_factory::{ModelMapping, ResourceFactory};
