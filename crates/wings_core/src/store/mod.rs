//! Native object store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Define the create-or-update, delete and bulk-clear contract the
//!   persister writes through.
//! - Keep SQL details inside the store boundary.
//!
//! # Invariants
//! - `save` validates before any SQL mutation and never regenerates an
//!   existing id.
//! - Each call is one independent write; there is no transaction spanning
//!   several calls.
//! - `delete` of a missing id is `NotFound`, never a silent no-op.

use crate::db::DbError;
use crate::model::native::{NativeId, NativeObject, NativeValidationError};
use thiserror::Error;

pub mod sqlite;

pub use sqlite::SqliteNativeStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    RecordInvalid(#[from] NativeValidationError),
    #[error("native object not found: {0}")]
    NotFound(NativeId),
    #[error("native model `{0}` is not registered with this store")]
    UnknownModel(String),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("native store requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("native store requires table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("invalid persisted native data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Native store operations.
pub trait NativeStore {
    /// Loads one object by id.
    fn find(&self, id: &str) -> StoreResult<NativeObject>;
    fn exists(&self, id: &str) -> StoreResult<bool>;
    /// Validates and creates-or-updates `object`, assigning an id when absent
    /// and refreshing its timestamps.
    fn save(&self, object: &mut NativeObject) -> StoreResult<()>;
    /// Writes the ordered member side collection of `object`, assigning an id
    /// when absent so the list has an owner key.
    fn save_ordered_members(&self, object: &mut NativeObject) -> StoreResult<()>;
    /// Deletes one object by id, with its side collection and index document.
    fn delete(&self, id: &str) -> StoreResult<()>;
    /// Removes every object, side collection row and index document.
    fn clean(&self) -> StoreResult<()>;
    /// Lists objects, optionally restricted to one native model.
    fn all(&self, model: Option<&str>) -> StoreResult<Vec<NativeObject>>;
    fn ordered_member_ids(&self, owner_id: &str) -> StoreResult<Vec<NativeId>>;
    fn count(&self) -> StoreResult<usize>;
}
