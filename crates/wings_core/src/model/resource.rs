//! Resource domain model.
//!
//! # Responsibility
//! - Define the generic entity exchanged with persister callers.
//! - Keep attribute values typed but free of any storage concerns.
//!
//! # Invariants
//! - `id` is `None` for transient resources and immutable once set.
//! - `alternate_ids` is empty until the resource has been persisted.
//! - `created_at`/`updated_at` are scalars, never lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Internal type tag reserved for raw file content resources.
pub const FILE_NODE_RESOURCE: &str = "FileNode";

/// Attribute that carries ordered membership on models supporting it.
pub const MEMBER_IDS_ATTRIBUTE: &str = "member_ids";

/// Multi-valued attribute map keyed by attribute name.
pub type Attributes = BTreeMap<String, Vec<Literal>>;

/// Opaque resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Text(String),
    Integer(i64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    /// Reference to another resource.
    Id(ResourceId),
}

impl Literal {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the searchable text form, if this literal has one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Id(id) => Some(id.as_str()),
            Self::Integer(_) | Self::Boolean(_) | Self::DateTime(_) => None,
        }
    }

    pub fn as_id(&self) -> Option<&ResourceId> {
        match self {
            Self::Id(id) => Some(id),
            _ => None,
        }
    }
}

/// Generic, storage-agnostic persisted entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Primary identifier. `None` until first save.
    pub id: Option<ResourceId>,
    /// Identifiers the backing store knows this resource by.
    pub alternate_ids: Vec<ResourceId>,
    /// Type tag used to pick the native model on round-trip.
    pub internal_resource: String,
    pub attributes: Attributes,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// Creates a transient resource of the given type.
    pub fn new(internal_resource: impl Into<String>) -> Self {
        Self {
            id: None,
            alternate_ids: Vec::new(),
            internal_resource: internal_resource.into(),
            attributes: Attributes::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Creates a resource with a caller-chosen identifier.
    ///
    /// Saving it creates the native object under exactly this id.
    pub fn with_id(internal_resource: impl Into<String>, id: impl Into<ResourceId>) -> Self {
        let mut resource = Self::new(internal_resource);
        resource.id = Some(id.into());
        resource
    }

    /// Builder-style attribute assignment.
    pub fn attribute(mut self, name: impl Into<String>, values: Vec<Literal>) -> Self {
        self.set(name, values);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, values: Vec<Literal>) {
        self.attributes.insert(name.into(), values);
    }

    /// Returns attribute values, or an empty slice when unset.
    pub fn get(&self, name: &str) -> &[Literal] {
        self.attributes.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_file_node(&self) -> bool {
        self.internal_resource == FILE_NODE_RESOURCE
    }

    /// Identifier the backing store knows this resource by.
    ///
    /// Prefers the first alternate id and falls back to the primary id.
    pub fn store_id(&self) -> Option<&ResourceId> {
        self.alternate_ids.first().or(self.id.as_ref())
    }

    /// Ordered member ids carried in `member_ids`.
    ///
    /// `Id` and `Text` values are accepted; any other literal is returned as
    /// the error so callers can reject it.
    pub fn member_ids(&self) -> Result<Vec<ResourceId>, &Literal> {
        self.get(MEMBER_IDS_ATTRIBUTE)
            .iter()
            .map(|value| match value {
                Literal::Text(text) => Ok(ResourceId::from(text.as_str())),
                other => other.as_id().cloned().ok_or(other),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Literal, Resource, ResourceId, FILE_NODE_RESOURCE, MEMBER_IDS_ATTRIBUTE};

    #[test]
    fn new_resource_is_transient() {
        let resource = Resource::new("Book");
        assert!(!resource.is_persisted());
        assert!(resource.store_id().is_none());
        assert!(resource.get("title").is_empty());
    }

    #[test]
    fn store_id_prefers_alternate_ids() {
        let mut resource = Resource::with_id("Book", "primary");
        assert_eq!(resource.store_id(), Some(&ResourceId::from("primary")));

        resource.alternate_ids.push(ResourceId::from("native"));
        assert_eq!(resource.store_id(), Some(&ResourceId::from("native")));
    }

    #[test]
    fn file_node_is_detected_by_tag() {
        assert!(Resource::new(FILE_NODE_RESOURCE).is_file_node());
        assert!(!Resource::new("Book").is_file_node());
    }

    #[test]
    fn member_ids_accept_id_and_text_literals() {
        let resource = Resource::new("Collection").attribute(
            MEMBER_IDS_ATTRIBUTE,
            vec![Literal::Id("a".into()), Literal::text("b")],
        );
        assert_eq!(
            resource.member_ids().unwrap(),
            vec![ResourceId::from("a"), ResourceId::from("b")]
        );
    }

    #[test]
    fn member_ids_reject_non_id_literals() {
        let resource = Resource::new("Collection").attribute(
            MEMBER_IDS_ATTRIBUTE,
            vec![Literal::Id("a".into()), Literal::Integer(3), Literal::Boolean(true)],
        );
        assert_eq!(resource.member_ids(), Err(&Literal::Integer(3)));
    }

    #[test]
    fn literal_serializes_with_type_tag() {
        let json = serde_json::to_string(&Literal::text("Foo")).unwrap();
        assert_eq!(json, r#"{"type":"text","value":"Foo"}"#);
    }
}
