//! Native object model of the legacy store.
//!
//! # Responsibility
//! - Describe native classes (`NativeModel`) and the objects built from them.
//! - Own the validation rules the store enforces before a primary write.
//!
//! # Invariants
//! - Properties are always multi-valued lists; single-valued properties hold
//!   at most one value after validation.
//! - `create_date`/`modified_date` are lists, as the legacy store keeps them.
//! - `new_record` is cleared only by a successful store write.

use crate::model::resource::Literal;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Native object identifier.
pub type NativeId = String;

/// Declared property on a native model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDef {
    pub multiple: bool,
    pub required: bool,
}

/// A native class: property declarations plus optional ordered membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeModel {
    name: String,
    properties: BTreeMap<String, PropertyDef>,
    ordered_membership: bool,
}

impl NativeModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
            ordered_membership: false,
        }
    }

    /// Declares an optional property.
    pub fn property(mut self, name: impl Into<String>, multiple: bool) -> Self {
        self.properties.insert(
            name.into(),
            PropertyDef {
                multiple,
                required: false,
            },
        );
        self
    }

    /// Declares a property that must carry at least one value.
    pub fn required_property(mut self, name: impl Into<String>, multiple: bool) -> Self {
        self.properties.insert(
            name.into(),
            PropertyDef {
                multiple,
                required: true,
            },
        );
        self
    }

    /// Enables the ordered member side collection.
    pub fn with_ordered_members(mut self) -> Self {
        self.ordered_membership = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property_def(&self, name: &str) -> Option<PropertyDef> {
        self.properties.get(name).copied()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, PropertyDef)> {
        self.properties
            .iter()
            .map(|(name, def)| (name.as_str(), *def))
    }

    pub fn has_ordered_members(&self) -> bool {
        self.ordered_membership
    }
}

/// Native classes known to one store, keyed by model name.
#[derive(Debug, Clone, Default)]
pub struct NativeModelCatalog {
    models: BTreeMap<String, Arc<NativeModel>>,
}

impl NativeModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `model`, replacing any previous model with the same name.
    pub fn insert(&mut self, model: Arc<NativeModel>) {
        self.models.insert(model.name().to_string(), model);
    }

    pub fn get(&self, name: &str) -> Option<Arc<NativeModel>> {
        self.models.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Rejected native write. Message mirrors the legacy store wording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed: {}", issues.join(", "))]
pub struct NativeValidationError {
    pub model: String,
    pub issues: Vec<String>,
}

/// Legacy store object.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeObject {
    /// `None` until the store assigns one, unless supplied by the caller.
    pub id: Option<NativeId>,
    pub model: Arc<NativeModel>,
    pub properties: BTreeMap<String, Vec<Literal>>,
    /// Ordered membership side collection; only meaningful when the model
    /// has ordered members.
    pub ordered_member_ids: Vec<NativeId>,
    pub create_date: Vec<DateTime<Utc>>,
    pub modified_date: Vec<DateTime<Utc>>,
    pub new_record: bool,
}

impl NativeObject {
    /// Creates an unsaved object; the store generates its id on first write.
    pub fn new(model: Arc<NativeModel>) -> Self {
        Self {
            id: None,
            model,
            properties: BTreeMap::new(),
            ordered_member_ids: Vec::new(),
            create_date: Vec::new(),
            modified_date: Vec::new(),
            new_record: true,
        }
    }

    /// Creates an unsaved object that will be written under `id`.
    pub fn with_id(model: Arc<NativeModel>, id: impl Into<NativeId>) -> Self {
        let mut object = Self::new(model);
        object.id = Some(id.into());
        object
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn property(&self, name: &str) -> &[Literal] {
        self.properties.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn set_property(&mut self, name: impl Into<String>, values: Vec<Literal>) {
        self.properties.insert(name.into(), values);
    }

    pub fn has_ordered_members(&self) -> bool {
        self.model.has_ordered_members()
    }

    /// Concatenated text values used as the search document body.
    pub fn index_body(&self) -> String {
        self.properties
            .values()
            .flatten()
            .filter_map(Literal::as_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Checks this object against its model's rules.
    ///
    /// # Errors
    /// - Unknown property names.
    /// - More than one value on a single-valued property.
    /// - Missing or blank values on a required property.
    /// - Blank ordered member ids.
    pub fn validate(&self) -> Result<(), NativeValidationError> {
        let mut issues = Vec::new();

        for (name, values) in &self.properties {
            match self.model.property_def(name) {
                None => issues.push(format!("{name} is not a known property")),
                Some(def) if !def.multiple && values.len() > 1 => {
                    issues.push(format!("{name} accepts a single value"))
                }
                Some(_) => {}
            }
        }

        for (name, def) in self.model.properties() {
            if def.required && !has_present_value(self.property(name)) {
                issues.push(format!("{name} can't be blank"));
            }
        }

        if self
            .ordered_member_ids
            .iter()
            .any(|member| member.trim().is_empty())
        {
            issues.push("ordered members can't contain blank ids".to_string());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(NativeValidationError {
                model: self.model.name().to_string(),
                issues,
            })
        }
    }
}

fn has_present_value(values: &[Literal]) -> bool {
    values.iter().any(|value| match value {
        Literal::Text(text) => !text.trim().is_empty(),
        _ => true,
    })
}
