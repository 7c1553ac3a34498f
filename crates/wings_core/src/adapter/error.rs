//! Error taxonomy surfaced to persister and query service callers.

use crate::db::DbError;
use crate::model::native::NativeObject;
use crate::model::resource::ResourceId;
use crate::search::SearchError;
use crate::store::StoreError;
use thiserror::Error;

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Native validation rejected a save.
///
/// Carries the object as it was about to be written so callers can see which
/// field failed and retry with corrected attributes.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FailedSaveError {
    pub message: String,
    pub object: Box<NativeObject>,
}

impl FailedSaveError {
    pub fn new(message: impl Into<String>, object: NativeObject) -> Self {
        Self {
            message: message.into(),
            object: Box::new(object),
        }
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    FailedSave(#[from] FailedSaveError),
    #[error("resource not found: {0}")]
    NotFound(ResourceId),
    #[error("no native mapping registered for resource kind `{0}`")]
    UnsupportedResourceKind(String),
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    #[error("resource has no identifier; cannot {0} a transient resource")]
    NotPersisted(&'static str),
    #[error("invalid adapter data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("backend of adapter `{0}` is unavailable: connection lock poisoned")]
    BackendUnavailable(String),
}

impl From<StoreError> for AdapterError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(ResourceId::from(id)),
            other => Self::Store(other),
        }
    }
}

impl From<DbError> for AdapterError {
    fn from(value: DbError) -> Self {
        Self::Store(StoreError::Db(value))
    }
}
