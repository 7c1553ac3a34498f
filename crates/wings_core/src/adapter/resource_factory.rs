//! Bidirectional translation between resources and native objects.
//!
//! # Responsibility
//! - Resolve a resource type tag to its native model through an explicit
//!   mapping table built at startup.
//! - Load-then-mutate existing native objects; never recreate them.
//! - Normalize native multi-valued timestamps to resource scalars.
//!
//! # Invariants
//! - A resource with an id maps to a native object with that same id.
//! - Unregistered tags fail with `UnsupportedResourceKind`.
//! - `to_resource` yields `created_at`/`updated_at` as scalars or `None`.

use super::error::{AdapterError, AdapterResult};
use crate::model::native::{NativeModel, NativeModelCatalog, NativeObject};
use crate::model::resource::{Literal, Resource, ResourceId, MEMBER_IDS_ATTRIBUTE};
use crate::store::{NativeStore, StoreError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Copies resource state onto a native object. Values the native side cannot
/// hold are rejected, never dropped.
pub type Serializer = fn(&Resource, &mut NativeObject) -> AdapterResult<()>;
/// Copies native state onto a resource that already has identity set.
pub type Deserializer = fn(&NativeObject, &mut Resource);

/// One registered type tag.
#[derive(Debug, Clone)]
pub struct ModelMapping {
    native: Arc<NativeModel>,
    serializer: Serializer,
    deserializer: Deserializer,
}

impl ModelMapping {
    /// Maps onto `native` with name-for-name attribute copying.
    pub fn new(native: NativeModel) -> Self {
        Self {
            native: Arc::new(native),
            serializer: copy_attributes_to_native,
            deserializer: copy_properties_to_resource,
        }
    }

    pub fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn with_deserializer(mut self, deserializer: Deserializer) -> Self {
        self.deserializer = deserializer;
        self
    }

    pub fn native_model(&self) -> &Arc<NativeModel> {
        &self.native
    }
}

/// Default serializer.
///
/// `member_ids` feeds the ordered member list when the model has one; every
/// other attribute lands on the property of the same name.
///
/// # Errors
/// - `InvalidData` when `member_ids` holds a value that is neither an id nor
///   text.
pub fn copy_attributes_to_native(
    resource: &Resource,
    object: &mut NativeObject,
) -> AdapterResult<()> {
    for (name, values) in &resource.attributes {
        if name == MEMBER_IDS_ATTRIBUTE && object.has_ordered_members() {
            let member_ids = resource.member_ids().map_err(|value| {
                AdapterError::InvalidData(format!(
                    "`{MEMBER_IDS_ATTRIBUTE}` accepts only ids, got {value:?}"
                ))
            })?;
            object.ordered_member_ids = member_ids
                .into_iter()
                .map(|id| id.as_str().to_string())
                .collect();
            continue;
        }
        object.set_property(name.clone(), values.clone());
    }
    Ok(())
}

/// Default deserializer, inverse of [`copy_attributes_to_native`].
pub fn copy_properties_to_resource(object: &NativeObject, resource: &mut Resource) {
    resource.attributes.extend(
        object
            .properties
            .iter()
            .map(|(name, values)| (name.clone(), values.clone())),
    );
    if object.has_ordered_members() {
        resource.set(
            MEMBER_IDS_ATTRIBUTE,
            object
                .ordered_member_ids
                .iter()
                .map(|id| Literal::Id(ResourceId::from(id.as_str())))
                .collect(),
        );
    }
}

/// Stateless translator holding only its mapping table.
#[derive(Debug, Clone, Default)]
pub struct ResourceFactory {
    mappings: BTreeMap<String, ModelMapping>,
    tags_by_model: BTreeMap<String, String>,
    catalog: NativeModelCatalog,
}

impl ResourceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ResourceFactory::register`].
    pub fn with_mapping(mut self, tag: impl Into<String>, mapping: ModelMapping) -> Self {
        self.register(tag, mapping);
        self
    }

    /// Registers `tag`. Each native model should back exactly one tag; a later
    /// registration of the same model takes over the reverse mapping.
    pub fn register(&mut self, tag: impl Into<String>, mapping: ModelMapping) {
        let tag = tag.into();
        self.catalog.insert(Arc::clone(&mapping.native));
        self.tags_by_model
            .insert(mapping.native.name().to_string(), tag.clone());
        self.mappings.insert(tag, mapping);
    }

    pub fn mapping(&self, tag: &str) -> AdapterResult<&ModelMapping> {
        self.mappings
            .get(tag)
            .ok_or_else(|| AdapterError::UnsupportedResourceKind(tag.to_string()))
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.mappings.contains_key(tag)
    }

    /// Native models the store may load.
    pub fn native_models(&self) -> &NativeModelCatalog {
        &self.catalog
    }

    /// Type tag registered for a native model name.
    pub fn tag_for_model(&self, model: &str) -> AdapterResult<&str> {
        self.tags_by_model
            .get(model)
            .map(String::as_str)
            .ok_or_else(|| AdapterError::UnsupportedResourceKind(model.to_string()))
    }

    /// Builds the native object `resource` should be written as.
    ///
    /// The object is keyed by [`Resource::store_id`], the same id `delete`
    /// and member lookups use. An id that already exists in `store` loads
    /// that object and applies the resource attributes on top; an unknown id
    /// creates a fresh object under it; no id creates a fresh object the
    /// store will assign an id to.
    pub fn from_resource<S: NativeStore>(
        &self,
        store: &S,
        resource: &Resource,
    ) -> AdapterResult<NativeObject> {
        let mapping = self.mapping(&resource.internal_resource)?;

        let mut object = match resource.store_id() {
            Some(id) if id.is_blank() => {
                return Err(AdapterError::InvalidData(
                    "resource id cannot be blank".to_string(),
                ));
            }
            Some(id) => match store.find(id.as_str()) {
                Ok(existing) if existing.model_name() != mapping.native.name() => {
                    return Err(AdapterError::InvalidData(format!(
                        "`{id}` is stored as `{}`, not `{}`",
                        existing.model_name(),
                        mapping.native.name()
                    )));
                }
                Ok(existing) => existing,
                Err(StoreError::NotFound(_)) => {
                    NativeObject::with_id(Arc::clone(&mapping.native), id.as_str())
                }
                Err(err) => return Err(err.into()),
            },
            None => NativeObject::new(Arc::clone(&mapping.native)),
        };

        (mapping.serializer)(resource, &mut object)?;
        Ok(object)
    }

    /// Builds the resource view of a saved native object.
    pub fn to_resource(&self, object: &NativeObject) -> AdapterResult<Resource> {
        let tag = self.tag_for_model(object.model_name())?;
        let mapping = self.mapping(tag)?;
        let id = object.id.as_deref().ok_or_else(|| {
            AdapterError::InvalidData(format!(
                "`{}` object has no id; it was never saved",
                object.model_name()
            ))
        })?;

        let mut resource = Resource::with_id(tag, id);
        resource.alternate_ids = vec![ResourceId::from(id)];
        (mapping.deserializer)(object, &mut resource);
        resource.created_at = collapse_timestamp(&object.create_date, "create_date")?;
        resource.updated_at = collapse_timestamp(&object.modified_date, "modified_date")?;
        Ok(resource)
    }
}

fn collapse_timestamp(
    values: &[DateTime<Utc>],
    field: &str,
) -> AdapterResult<Option<DateTime<Utc>>> {
    match values {
        [] => Ok(None),
        [single] => Ok(Some(*single)),
        _ => Err(AdapterError::InvalidData(format!(
            "native `{field}` holds {} values; expected one",
            values.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{collapse_timestamp, ModelMapping, ResourceFactory};
    use crate::adapter::error::AdapterError;
    use crate::model::native::{NativeModel, NativeObject};
    use crate::model::resource::Literal;
    use chrono::Utc;
    use std::sync::Arc;

    fn factory() -> ResourceFactory {
        ResourceFactory::new().with_mapping(
            "Book",
            ModelMapping::new(NativeModel::new("BookObject").property("title", true)),
        )
    }

    #[test]
    fn collapse_accepts_zero_or_one_value() {
        let now = Utc::now();
        assert_eq!(collapse_timestamp(&[], "x").unwrap(), None);
        assert_eq!(collapse_timestamp(&[now], "x").unwrap(), Some(now));
        assert!(matches!(
            collapse_timestamp(&[now, now], "x"),
            Err(AdapterError::InvalidData(_))
        ));
    }

    #[test]
    fn to_resource_uses_registered_tag_and_scalar_timestamps() {
        let factory = factory();
        let model = factory.native_models().get("BookObject").unwrap();
        let now = Utc::now();
        let mut object = NativeObject::with_id(Arc::clone(&model), "b-1");
        object.set_property("title", vec![Literal::text("Foo")]);
        object.create_date = vec![now];
        object.modified_date = vec![now];

        let resource = factory.to_resource(&object).unwrap();
        assert_eq!(resource.internal_resource, "Book");
        assert_eq!(resource.id.as_ref().unwrap().as_str(), "b-1");
        assert_eq!(resource.alternate_ids.len(), 1);
        assert_eq!(resource.get("title"), &[Literal::text("Foo")]);
        assert_eq!(resource.created_at, Some(now));
        assert_eq!(resource.updated_at, Some(now));
    }

    #[test]
    fn to_resource_rejects_unsaved_object() {
        let factory = factory();
        let model = factory.native_models().get("BookObject").unwrap();
        let err = factory.to_resource(&NativeObject::new(model)).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidData(_)));
    }

    #[test]
    fn unregistered_tag_is_unsupported() {
        let err = factory().mapping("Sculpture").unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedResourceKind(tag) if tag == "Sculpture"));
        assert!(!factory().is_registered("Sculpture"));
    }
}
