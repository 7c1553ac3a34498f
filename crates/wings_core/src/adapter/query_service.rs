//! Read side of a metadata adapter.

use super::error::{AdapterError, AdapterResult};
use super::metadata_adapter::MetadataAdapter;
use crate::model::resource::{Resource, ResourceId};
use crate::search::{SearchHit, SearchIndex, SearchQuery};
use crate::store::{NativeStore, StoreError};
use log::warn;
use std::sync::Arc;

/// Reads resources back through the resource factory.
#[derive(Clone)]
pub struct QueryService {
    adapter: Arc<MetadataAdapter>,
}

impl QueryService {
    pub fn new(adapter: Arc<MetadataAdapter>) -> Self {
        Self { adapter }
    }

    /// Loads one resource; `NotFound` when the id is unknown.
    pub fn find_by(&self, id: &ResourceId) -> AdapterResult<Resource> {
        let factory = self.adapter.resource_factory();
        self.adapter.with_backend(|store, _| {
            let object = store.find(id.as_str())?;
            factory.to_resource(&object)
        })
    }

    pub fn find_all(&self) -> AdapterResult<Vec<Resource>> {
        let factory = self.adapter.resource_factory();
        self.adapter.with_backend(|store, _| {
            store
                .all(None)?
                .iter()
                .map(|object| factory.to_resource(object))
                .collect()
        })
    }

    /// Loads every resource of one type tag.
    pub fn find_all_of_model(&self, internal_resource: &str) -> AdapterResult<Vec<Resource>> {
        let factory = self.adapter.resource_factory();
        let model = factory.mapping(internal_resource)?.native_model().name();
        self.adapter.with_backend(|store, _| {
            store
                .all(Some(model))?
                .iter()
                .map(|object| factory.to_resource(object))
                .collect()
        })
    }

    /// Loads the ordered members of `resource` in stored order.
    ///
    /// Member ids whose object has since been deleted are skipped.
    pub fn find_members(&self, resource: &Resource) -> AdapterResult<Vec<Resource>> {
        let Some(owner_id) = resource.store_id() else {
            return Ok(Vec::new());
        };
        let factory = self.adapter.resource_factory();

        self.adapter.with_backend(|store, _| {
            let mut members = Vec::new();
            for member_id in store.ordered_member_ids(owner_id.as_str())? {
                match store.find(&member_id) {
                    Ok(object) => members.push(factory.to_resource(&object)?),
                    Err(StoreError::NotFound(_)) => warn!(
                        "event=find_members module=adapter status=skip owner={} member={} reason=missing",
                        owner_id, member_id
                    ),
                    Err(err) => return Err(AdapterError::from(err)),
                }
            }
            Ok(members)
        })
    }

    pub fn count(&self) -> AdapterResult<usize> {
        self.adapter
            .with_backend(|store, _| store.count().map_err(AdapterError::from))
    }

    /// Keyword search over indexed objects.
    pub fn search(&self, query: &SearchQuery) -> AdapterResult<Vec<SearchHit>> {
        self.adapter
            .with_backend(|_, index| index.search(query).map_err(AdapterError::from))
    }
}
