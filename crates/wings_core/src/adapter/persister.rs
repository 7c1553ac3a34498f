//! Resource persister.
//!
//! # Responsibility
//! - Save, delete and wipe resources through the native store.
//! - Return the refreshed resource view after every save.
//!
//! # Invariants
//! - A saved resource keeps the id it came in with; transient resources get a
//!   store-assigned id.
//! - An object that fails native validation writes nothing, not even its
//!   ordered member side collection.
//! - The ordered member side collection is written before its owner. The two
//!   writes are independent: a failure between them is not rolled back.
//! - `save_all` stops at the first failure; earlier saves stay committed.
//! - File content resources are rejected with `NotImplemented`.

use super::error::{AdapterError, AdapterResult, FailedSaveError};
use super::metadata_adapter::MetadataAdapter;
use super::resource_factory::ResourceFactory;
use crate::model::resource::{Resource, ResourceId};
use crate::search::{SearchIndex, MATCH_ALL_QUERY};
use crate::store::{NativeStore, StoreError};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;

/// Write side of a metadata adapter.
#[derive(Clone)]
pub struct Persister {
    adapter: Arc<MetadataAdapter>,
}

impl Persister {
    pub fn new(adapter: Arc<MetadataAdapter>) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &Arc<MetadataAdapter> {
        &self.adapter
    }

    pub fn resource_factory(&self) -> &ResourceFactory {
        self.adapter.resource_factory()
    }

    /// Persists `resource` and returns its canonical stored form.
    ///
    /// # Errors
    /// - `UnsupportedResourceKind` when the type tag has no mapping.
    /// - `FailedSave` when native validation rejects the object; the error
    ///   carries the rejected object.
    /// - `NotImplemented` for file content resources.
    pub fn save(&self, resource: &Resource) -> AdapterResult<Resource> {
        if resource.is_file_node() {
            return self.save_file(resource);
        }

        let started_at = Instant::now();
        let result = self
            .adapter
            .with_backend(|store, _| save_with(store, self.resource_factory(), resource));

        match &result {
            Ok(saved) => info!(
                "event=resource_save module=adapter status=ok adapter={} kind={} id={} created={} duration_ms={}",
                self.adapter.name(),
                saved.internal_resource,
                saved.id.as_ref().map(ResourceId::as_str).unwrap_or_default(),
                resource.id.is_none(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=resource_save module=adapter status=error adapter={} kind={} duration_ms={} error={}",
                self.adapter.name(),
                resource.internal_resource,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// File content persistence is deferred; callers get an explicit error
    /// instead of a silent no-op.
    pub fn save_file(&self, file_node: &Resource) -> AdapterResult<Resource> {
        warn!(
            "event=resource_save module=adapter status=error adapter={} kind={} error_code=not_implemented",
            self.adapter.name(),
            file_node.internal_resource
        );
        Err(AdapterError::NotImplemented("file node persistence"))
    }

    /// Saves each resource in order, failing fast.
    pub fn save_all(&self, resources: &[Resource]) -> AdapterResult<Vec<Resource>> {
        resources.iter().map(|resource| self.save(resource)).collect()
    }

    /// Deletes the native object behind `resource` by id alone.
    ///
    /// # Errors
    /// - `NotPersisted` when `resource` carries no identifier.
    /// - `NotFound` when the store has no object under that id.
    pub fn delete(&self, resource: &Resource) -> AdapterResult<()> {
        let id = resource
            .store_id()
            .ok_or(AdapterError::NotPersisted("delete"))?;

        let started_at = Instant::now();
        let result = self
            .adapter
            .with_backend(|store, _| store.delete(id.as_str()).map_err(AdapterError::from));

        match &result {
            Ok(()) => info!(
                "event=resource_delete module=adapter status=ok adapter={} id={} duration_ms={}",
                self.adapter.name(),
                id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=resource_delete module=adapter status=error adapter={} id={} error={}",
                self.adapter.name(),
                id,
                err
            ),
        }
        result
    }

    /// Clears the search index, commits, then clears every native object.
    ///
    /// Maintenance and test tooling only. Must not run concurrently with any
    /// other write on the same store.
    pub fn wipe(&self) -> AdapterResult<()> {
        let started_at = Instant::now();
        warn!(
            "event=store_wipe module=adapter status=start adapter={}",
            self.adapter.name()
        );

        self.adapter.with_backend(|store, index| wipe_with(store, index))?;

        warn!(
            "event=store_wipe module=adapter status=ok adapter={} duration_ms={}",
            self.adapter.name(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

fn save_with<S: NativeStore>(
    store: &S,
    factory: &ResourceFactory,
    resource: &Resource,
) -> AdapterResult<Resource> {
    let mut object = factory.from_resource(store, resource)?;

    if let Err(invalid) = object.validate() {
        return Err(FailedSaveError::new(invalid.to_string(), object).into());
    }

    if object.has_ordered_members() {
        store.save_ordered_members(&mut object)?;
    }

    match store.save(&mut object) {
        Ok(()) => factory.to_resource(&object),
        Err(StoreError::RecordInvalid(invalid)) => {
            Err(FailedSaveError::new(invalid.to_string(), object).into())
        }
        Err(err) => Err(err.into()),
    }
}

fn wipe_with<S: NativeStore, I: SearchIndex>(store: &S, index: &I) -> AdapterResult<()> {
    index.delete_by_query(MATCH_ALL_QUERY)?;
    index.commit()?;
    store.clean()?;
    Ok(())
}
