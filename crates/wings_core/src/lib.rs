//! Metadata adapter core for Wings.
//!
//! Translates application resources to native store objects and back,
//! persists them in SQLite, and keeps a full-text index in step.

pub mod actors;
pub mod adapter;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod registry;
pub mod search;
pub mod store;

pub use actors::{
    Actor, ActorError, ActorResult, ActorStack, ApplyDepositorActor, ChangeSet, CurrentUser,
    Environment, ModelActor, Next, TerminalActor,
};
pub use adapter::{
    AdapterError, AdapterResult, FailedSaveError, MetadataAdapter, ModelMapping, Persister,
    QueryService, ResourceFactory,
};
pub use config::{ConfigError, DatabaseConfig, LoggingConfig, WingsConfig};
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::native::{NativeModel, NativeObject, NativeValidationError};
pub use model::resource::{Attributes, Literal, Resource, ResourceId};
pub use registry::{AdapterRegistry, RegistryError};
pub use search::{SearchError, SearchHit, SearchIndex, SearchQuery, SqliteSearchIndex};
pub use store::{NativeStore, SqliteNativeStore, StoreError};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
