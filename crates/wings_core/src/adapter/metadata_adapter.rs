//! Named binding of one native store to its resource factory.

use super::error::{AdapterError, AdapterResult};
use super::persister::Persister;
use super::query_service::QueryService;
use super::resource_factory::ResourceFactory;
use crate::config::WingsConfig;
use crate::db::open_configured_db;
use crate::search::SqliteSearchIndex;
use crate::store::SqliteNativeStore;
use log::info;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Owns the store connection and the resource factory.
///
/// Shared through `Arc` by every persister and query service it hands out.
/// Store access is serialized on one connection lock.
pub struct MetadataAdapter {
    name: String,
    conn: Mutex<Connection>,
    resource_factory: ResourceFactory,
}

impl MetadataAdapter {
    /// Wraps an already migrated connection.
    pub fn new(
        name: impl Into<String>,
        conn: Connection,
        resource_factory: ResourceFactory,
    ) -> Arc<Self> {
        let name = name.into();
        info!(
            "event=adapter_init module=adapter status=ok adapter={} models={}",
            name,
            resource_factory.native_models().len()
        );
        Arc::new(Self {
            name,
            conn: Mutex::new(conn),
            resource_factory,
        })
    }

    /// Opens the configured store and names the adapter after the config.
    pub fn open(
        config: &WingsConfig,
        resource_factory: ResourceFactory,
    ) -> AdapterResult<Arc<Self>> {
        let conn = open_configured_db(&config.database)?;
        Ok(Self::new(config.adapter_name.trim(), conn, resource_factory))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_factory(&self) -> &ResourceFactory {
        &self.resource_factory
    }

    pub fn persister(self: &Arc<Self>) -> Persister {
        Persister::new(Arc::clone(self))
    }

    pub fn query_service(self: &Arc<Self>) -> QueryService {
        QueryService::new(Arc::clone(self))
    }

    /// Runs `f` against the store and index while holding the connection lock.
    pub(crate) fn with_backend<T, F>(&self, f: F) -> AdapterResult<T>
    where
        F: FnOnce(&SqliteNativeStore<'_>, &SqliteSearchIndex<'_>) -> AdapterResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AdapterError::BackendUnavailable(self.name.clone()))?;
        let store = SqliteNativeStore::try_new(&conn, self.resource_factory.native_models())?;
        let index = SqliteSearchIndex::new(&conn);
        f(&store, &index)
    }
}
