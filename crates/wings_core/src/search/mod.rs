//! Search index backing the native store.
//!
//! # Responsibility
//! - Define the index contract used by administrative operations.
//! - Expose keyword search over indexed native objects.
//!
//! # Invariants
//! - Index documents are keyed by native object id, one document per object.
//! - `delete_by_query` removals are visible immediately; `commit` compacts.

use crate::db::DbError;
use crate::model::native::NativeId;
use thiserror::Error;

pub mod fts;

pub use fts::SqliteSearchIndex;

/// Query matching every document.
pub const MATCH_ALL_QUERY: &str = "*:*";

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing, DB interaction and result decoding.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Query cannot be parsed by FTS5 syntax.
    #[error("invalid full-text query `{query}`: {message}")]
    InvalidQuery { query: String, message: String },
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid search row: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Search options for full-text query behavior.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    /// Optional native model filter.
    pub model: Option<String>,
    /// Maximum number of hits to return.
    pub limit: u32,
    /// Whether to pass text directly as raw FTS5 expression.
    pub raw_fts_syntax: bool,
}

impl SearchQuery {
    /// Creates a query with default limit and no model filter.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            limit: 20,
            raw_fts_syntax: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub object_id: NativeId,
    pub model: String,
    pub snippet: String,
}

/// Index operations the persister and query service rely on.
pub trait SearchIndex {
    /// Removes every document matching `query`; returns the removed count.
    fn delete_by_query(&self, query: &str) -> SearchResult<usize>;
    /// Makes pending index changes durable and compacts segments.
    fn commit(&self) -> SearchResult<()>;
    /// Administrative full clear.
    fn clean(&self) -> SearchResult<()>;
    fn count(&self) -> SearchResult<usize>;
    fn search(&self, query: &SearchQuery) -> SearchResult<Vec<SearchHit>>;
}
