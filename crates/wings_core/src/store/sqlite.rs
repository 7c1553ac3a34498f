//! SQLite-backed native object store.
//!
//! # Responsibility
//! - Persist native objects as one row with a JSON property map.
//! - Keep the ordered member side collection and the search document in
//!   step with object writes.
//!
//! # Invariants
//! - Timestamps are integer microseconds; `updated_at` strictly increases on
//!   every update of the same id.
//! - The model of an existing row never changes.

use super::{NativeStore, StoreError, StoreResult};
use crate::db::migrations::{applied_version, latest_version};
use crate::model::native::{NativeId, NativeModelCatalog, NativeObject};
use crate::model::resource::Literal;
use crate::search::fts::{remove_document, write_document};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use uuid::Uuid;

const OBJECT_SELECT_SQL: &str = "SELECT
    id,
    model,
    properties,
    created_at,
    updated_at
FROM native_objects";

const REQUIRED_TABLES: &[&str] = &["native_objects", "ordered_members", "search_documents"];

/// Native store over one migrated SQLite connection.
pub struct SqliteNativeStore<'a> {
    conn: &'a Connection,
    models: &'a NativeModelCatalog,
}

impl<'a> SqliteNativeStore<'a> {
    /// Creates a store from a migrated connection and the models it may load.
    pub fn try_new(conn: &'a Connection, models: &'a NativeModelCatalog) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn, models })
    }

    fn parse_object_row(&self, row: &Row<'_>) -> StoreResult<NativeObject> {
        let id: String = row.get("id")?;
        let model_name: String = row.get("model")?;
        let model = self
            .models
            .get(&model_name)
            .ok_or_else(|| StoreError::UnknownModel(model_name.clone()))?;

        let properties_json: String = row.get("properties")?;
        let properties: BTreeMap<String, Vec<Literal>> = serde_json::from_str(&properties_json)
            .map_err(|err| {
                StoreError::InvalidData(format!(
                    "invalid properties for native object `{id}`: {err}"
                ))
            })?;

        let created_at = micros_to_datetime(row.get("created_at")?, "created_at")?;
        let updated_at = micros_to_datetime(row.get("updated_at")?, "updated_at")?;

        let mut object = NativeObject::with_id(model, id);
        object.properties = properties;
        object.create_date = vec![created_at];
        object.modified_date = vec![updated_at];
        object.new_record = false;
        Ok(object)
    }

    fn load_members(&self, object: &mut NativeObject) -> StoreResult<()> {
        if !object.has_ordered_members() {
            return Ok(());
        }
        if let Some(id) = object.id.as_deref() {
            object.ordered_member_ids = self.ordered_member_ids(id)?;
        }
        Ok(())
    }
}

impl NativeStore for SqliteNativeStore<'_> {
    fn find(&self, id: &str) -> StoreResult<NativeObject> {
        let mut stmt = self
            .conn
            .prepare(&format!("{OBJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let mut object = self.parse_object_row(row)?;
        self.load_members(&mut object)?;
        Ok(object)
    }

    fn exists(&self, id: &str) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM native_objects WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn save(&self, object: &mut NativeObject) -> StoreResult<()> {
        object.validate()?;

        let id = object.id.clone().unwrap_or_else(generate_id);
        let properties = serde_json::to_string(&object.properties).map_err(|err| {
            StoreError::InvalidData(format!("cannot encode properties of `{id}`: {err}"))
        })?;
        let now = Utc::now().timestamp_micros();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing = tx
            .query_row(
                "SELECT model, created_at, updated_at FROM native_objects WHERE id = ?1;",
                [id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let (created_at, updated_at) = match existing {
            Some((model, _, _)) if model != object.model_name() => {
                return Err(StoreError::InvalidData(format!(
                    "native object `{id}` is a `{model}`, not a `{}`",
                    object.model_name()
                )));
            }
            Some((_, created_at, previous_updated_at)) => {
                let updated_at = now.max(previous_updated_at + 1);
                tx.execute(
                    "UPDATE native_objects
                     SET
                        properties = ?2,
                        updated_at = ?3
                     WHERE id = ?1;",
                    params![id, properties, updated_at],
                )?;
                (created_at, updated_at)
            }
            None => {
                tx.execute(
                    "INSERT INTO native_objects (
                        id,
                        model,
                        properties,
                        created_at,
                        updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?4);",
                    params![id, object.model_name(), properties, now],
                )?;
                (now, now)
            }
        };

        object.id = Some(id);
        write_document(&tx, object)?;
        tx.commit()?;

        object.create_date = vec![micros_to_datetime(created_at, "created_at")?];
        object.modified_date = vec![micros_to_datetime(updated_at, "updated_at")?];
        object.new_record = false;
        Ok(())
    }

    fn save_ordered_members(&self, object: &mut NativeObject) -> StoreResult<()> {
        let id = object.id.get_or_insert_with(generate_id).clone();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM ordered_members WHERE owner_id = ?1;", [id.as_str()])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO ordered_members (owner_id, position, member_id)
                 VALUES (?1, ?2, ?3);",
            )?;
            for (position, member_id) in object.ordered_member_ids.iter().enumerate() {
                let position = i64::try_from(position).map_err(|_| {
                    StoreError::InvalidData(format!("member position overflow on `{id}`"))
                })?;
                insert.execute(params![id, position, member_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM native_objects WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tx.execute("DELETE FROM ordered_members WHERE owner_id = ?1;", [id])?;
        remove_document(&tx, id)?;
        tx.commit()?;
        Ok(())
    }

    fn clean(&self) -> StoreResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute_batch(
            "DELETE FROM native_objects;
             DELETE FROM ordered_members;
             DELETE FROM search_documents;",
        )?;
        tx.commit()?;
        Ok(())
    }

    fn all(&self, model: Option<&str>) -> StoreResult<Vec<NativeObject>> {
        let mut objects = Vec::new();
        let order = "ORDER BY created_at ASC, id ASC";

        match model {
            Some(model) => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{OBJECT_SELECT_SQL} WHERE model = ?1 {order};"))?;
                let mut rows = stmt.query([model])?;
                while let Some(row) = rows.next()? {
                    objects.push(self.parse_object_row(row)?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(&format!("{OBJECT_SELECT_SQL} {order};"))?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    objects.push(self.parse_object_row(row)?);
                }
            }
        }

        for object in &mut objects {
            self.load_members(object)?;
        }
        Ok(objects)
    }

    fn ordered_member_ids(&self, owner_id: &str) -> StoreResult<Vec<NativeId>> {
        let mut stmt = self.conn.prepare(
            "SELECT member_id FROM ordered_members
             WHERE owner_id = ?1
             ORDER BY position ASC;",
        )?;
        let ids = stmt
            .query_map([owner_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn count(&self) -> StoreResult<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM native_objects;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative object count {count}")))
    }
}

fn generate_id() -> NativeId {
    Uuid::new_v4().to_string()
}

fn micros_to_datetime(micros: i64, column: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid timestamp `{micros}` in native_objects.{column}"))
    })
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = applied_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [*table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(StoreError::MissingRequiredTable(*table));
        }
    }

    Ok(())
}
