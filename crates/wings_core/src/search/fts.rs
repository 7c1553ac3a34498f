//! SQLite FTS5 search index.
//!
//! # Responsibility
//! - Maintain one text document per native object.
//! - Serve keyword search and query-based deletion.
//!
//! # Invariants
//! - Document writes happen on the caller's connection, so the native store
//!   can index inside its own transaction.
//! - Result ordering is deterministic by rank and object id.

use super::{SearchError, SearchHit, SearchIndex, SearchQuery, SearchResult, MATCH_ALL_QUERY};
use crate::db::DbError;
use crate::model::native::NativeObject;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

static FIELD_QUERY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(id|model):(\S+)$").expect("valid field query regex"));

/// FTS5-backed index sharing the native store's connection.
pub struct SqliteSearchIndex<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSearchIndex<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SearchIndex for SqliteSearchIndex<'_> {
    fn delete_by_query(&self, query: &str) -> SearchResult<usize> {
        let query = query.trim();
        let removed = match parse_delete_query(query) {
            DeleteQuery::All => self.conn.execute("DELETE FROM search_documents;", [])?,
            DeleteQuery::Id(id) => self.conn.execute(
                "DELETE FROM search_documents WHERE object_id = ?1;",
                [id],
            )?,
            DeleteQuery::Model(model) => self
                .conn
                .execute("DELETE FROM search_documents WHERE model = ?1;", [model])?,
            DeleteQuery::Match(expr) => self
                .conn
                .execute(
                    "DELETE FROM search_documents
                     WHERE rowid IN (
                        SELECT rowid FROM search_documents WHERE search_documents MATCH ?1
                     );",
                    [expr],
                )
                .map_err(|err| map_query_error(err, expr))?,
        };

        info!("event=index_delete module=search status=ok removed={removed}");
        Ok(removed)
    }

    fn commit(&self) -> SearchResult<()> {
        self.conn.execute(
            "INSERT INTO search_documents(search_documents) VALUES ('optimize');",
            [],
        )?;
        Ok(())
    }

    fn clean(&self) -> SearchResult<()> {
        self.delete_by_query(MATCH_ALL_QUERY)?;
        self.commit()
    }

    fn count(&self) -> SearchResult<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM search_documents;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| SearchError::InvalidData(format!("negative document count {count}")))
    }

    fn search(&self, query: &SearchQuery) -> SearchResult<Vec<SearchHit>> {
        let Some(match_expr) = build_match_expression(query) else {
            return Ok(Vec::new());
        };

        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            "SELECT
                object_id,
                model,
                snippet(search_documents, 2, '[', ']', ' ... ', 10) AS snippet
             FROM search_documents
             WHERE search_documents MATCH ?",
        );
        let mut bind_values: Vec<Value> = vec![Value::Text(match_expr.clone())];

        if let Some(model) = query.model.as_deref() {
            sql.push_str(" AND model = ?");
            bind_values.push(Value::Text(model.to_string()));
        }

        sql.push_str(" ORDER BY bm25(search_documents), object_id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(query.limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt
            .query(params_from_iter(bind_values))
            .map_err(|err| map_query_error(err, &match_expr))?;
        let mut hits = Vec::new();

        while let Some(row) = rows
            .next()
            .map_err(|err| map_query_error(err, &match_expr))?
        {
            hits.push(parse_search_hit(row)?);
        }

        Ok(hits)
    }
}

/// Replaces the index document for `object`.
pub(crate) fn write_document(conn: &Connection, object: &NativeObject) -> rusqlite::Result<()> {
    let Some(id) = object.id.as_deref() else {
        return Ok(());
    };
    conn.execute("DELETE FROM search_documents WHERE object_id = ?1;", [id])?;
    conn.execute(
        "INSERT INTO search_documents (object_id, model, body) VALUES (?1, ?2, ?3);",
        params![id, object.model_name(), object.index_body()],
    )?;
    Ok(())
}

pub(crate) fn remove_document(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM search_documents WHERE object_id = ?1;", [id])?;
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum DeleteQuery<'a> {
    All,
    Id(&'a str),
    Model(&'a str),
    Match(&'a str),
}

fn parse_delete_query(query: &str) -> DeleteQuery<'_> {
    if query == MATCH_ALL_QUERY {
        return DeleteQuery::All;
    }
    if let Some(captures) = FIELD_QUERY_RE.captures(query) {
        let (Some(field), Some(value)) = (captures.get(1), captures.get(2)) else {
            return DeleteQuery::Match(query);
        };
        return match field.as_str() {
            "id" => DeleteQuery::Id(value.as_str()),
            _ => DeleteQuery::Model(value.as_str()),
        };
    }
    DeleteQuery::Match(query)
}

fn parse_search_hit(row: &Row<'_>) -> SearchResult<SearchHit> {
    let object_id: String = row.get("object_id")?;
    if object_id.trim().is_empty() {
        return Err(SearchError::InvalidData("blank object_id".to_string()));
    }

    Ok(SearchHit {
        object_id,
        model: row.get("model")?,
        snippet: row.get("snippet")?,
    })
}

fn build_match_expression(query: &SearchQuery) -> Option<String> {
    let text = query.text.trim();
    if text.is_empty() {
        return None;
    }

    if query.raw_fts_syntax {
        return Some(text.to_string());
    }

    let terms = text
        .split_whitespace()
        .map(escape_fts_term)
        .collect::<Vec<_>>();

    Some(terms.join(" AND "))
}

fn escape_fts_term(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }

    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}
