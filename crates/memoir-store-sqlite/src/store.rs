//! [`SqliteStore`], the SQLite implementation of [`EventStore`] and
//! [`BlobStore`].

use std::path::Path;

use bytes::Bytes;
use chrono::Utc;
use rusqlite::OptionalExtension as _;

use memoir_core::{
  blob::Blob,
  event::{Event, EventFields, EventIdentity, NewEvent, Origin},
  photo::{NewPhoto, Photo},
  store::{BlobStore, EventStore},
};

use crate::{
  Error, Result,
  encode::{
    EVENT_COLUMNS, PHOTO_COLUMNS, RawEvent, RawIdentity, RawPhoto, encode_dt, raw_event,
    raw_photo,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A memoir store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT {EVENT_COLUMNS} ...` query and decode every row.
  async fn query_events(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<Event>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), raw_event)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  /// Run a `SELECT {PHOTO_COLUMNS} ...` query and decode every row.
  async fn query_photos(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<Photo>> {
    let raws: Vec<RawPhoto> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), raw_photo)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPhoto::into_photo).collect()
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  // ── Events ────────────────────────────────────────────────────────────────

  async fn find_event(&self, origin: Origin, external_id: &str) -> Result<Option<Event>> {
    let sql = format!(
      "SELECT {EVENT_COLUMNS} FROM events
       WHERE origin = ?1 AND external_id = ?2
       ORDER BY id
       LIMIT 1"
    );
    let params: Vec<rusqlite::types::Value> =
      vec![origin.as_ref().to_owned().into(), external_id.to_owned().into()];
    Ok(self.query_events(sql, params).await?.into_iter().next())
  }

  async fn get_event(&self, id: i64) -> Result<Option<Event>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1");
    Ok(self.query_events(sql, vec![id.into()]).await?.into_iter().next())
  }

  async fn insert_event(&self, input: NewEvent) -> Result<Event> {
    let now = Utc::now();
    let now_str = encode_dt(now);
    let origin_str = input.origin.as_ref().to_owned();
    let row = input.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (
             origin, external_source, external_id,
             event_date, event_type, event_name_line_1, event_name_line_2,
             event_description, posted_by_name, posted_by_photo,
             sync, active, approved, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
          rusqlite::params![
            origin_str,
            row.external_source,
            row.external_id,
            row.fields.event_date,
            row.fields.event_type,
            row.fields.event_name_line_1,
            row.fields.event_name_line_2,
            row.fields.event_description,
            row.fields.posted_by_name,
            row.fields.posted_by_photo,
            row.needs_sync,
            row.active,
            row.approved,
            now_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Event {
      id,
      origin: input.origin,
      external_source: input.external_source,
      external_id: input.external_id,
      fields: input.fields,
      needs_sync: input.needs_sync,
      active: input.active,
      approved: input.approved,
      created_at: now,
      updated_at: now,
    })
  }

  async fn update_event(&self, id: i64, fields: EventFields) -> Result<()> {
    let now_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE events SET
             event_date        = ?2,
             event_type        = ?3,
             event_name_line_1 = ?4,
             event_name_line_2 = ?5,
             event_description = ?6,
             posted_by_name    = ?7,
             posted_by_photo   = ?8,
             sync              = 1,
             updated_at        = ?9
           WHERE id = ?1",
          rusqlite::params![
            id,
            fields.event_date,
            fields.event_type,
            fields.event_name_line_1,
            fields.event_name_line_2,
            fields.event_description,
            fields.posted_by_name,
            fields.posted_by_photo,
            now_str,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::EventNotFound(id));
    }
    Ok(())
  }

  async fn delete_event(&self, id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM events WHERE id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_event_identities(&self) -> Result<Vec<EventIdentity>> {
    let raws: Vec<RawIdentity> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, origin, external_source, external_id FROM events ORDER BY id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawIdentity {
              id:              row.get(0)?,
              origin:          row.get(1)?,
              external_source: row.get(2)?,
              external_id:     row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIdentity::into_identity).collect()
  }

  // ── Photos ────────────────────────────────────────────────────────────────

  async fn list_photos(&self, event_id: i64) -> Result<Vec<Photo>> {
    let sql = format!(
      "SELECT {PHOTO_COLUMNS} FROM photos WHERE event_id = ?1 ORDER BY position, id"
    );
    self.query_photos(sql, vec![event_id.into()]).await
  }

  async fn list_all_photos(&self) -> Result<Vec<Photo>> {
    let sql = format!("SELECT {PHOTO_COLUMNS} FROM photos ORDER BY event_id, id");
    self.query_photos(sql, vec![]).await
  }

  async fn insert_photo(&self, input: NewPhoto) -> Result<Photo> {
    let now = Utc::now();
    let now_str = encode_dt(now);
    let row = input.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO photos (
             event_id, storage_key, public_url, original_source_url,
             position, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![
            row.event_id,
            row.storage_key,
            row.public_url,
            row.original_source_url,
            row.position,
            now_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Photo {
      id,
      event_id: input.event_id,
      storage_key: input.storage_key,
      public_url: input.public_url,
      original_source_url: input.original_source_url,
      position: input.position,
      created_at: now,
      updated_at: now,
    })
  }

  async fn update_photo_position(&self, id: i64, position: u32) -> Result<()> {
    let now_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE photos SET position = ?2, updated_at = ?3 WHERE id = ?1",
          rusqlite::params![id, position, now_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::PhotoNotFound(id));
    }
    Ok(())
  }

  async fn delete_photo(&self, id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM photos WHERE id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Push-sync surface ─────────────────────────────────────────────────────

  async fn list_pending_sync(&self, limit: usize) -> Result<Vec<Event>> {
    let sql = format!(
      "SELECT {EVENT_COLUMNS} FROM events
       WHERE sync = 1 AND approved = 1 AND active = 1
       ORDER BY updated_at, id
       LIMIT ?1"
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    self.query_events(sql, vec![limit.into()]).await
  }

  async fn mark_synced(&self, id: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("UPDATE events SET sync = 0 WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::EventNotFound(id));
    }
    Ok(())
  }
}

// ─── BlobStore impl ──────────────────────────────────────────────────────────

impl BlobStore for SqliteStore {
  type Error = Error;

  async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()> {
    let key = key.to_owned();
    let content_type = content_type.to_owned();
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO blobs (key, content_type, bytes, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(key) DO UPDATE SET
             content_type = excluded.content_type,
             bytes        = excluded.bytes",
          rusqlite::params![key, content_type, bytes.as_ref(), at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get(&self, key: &str) -> Result<Option<Blob>> {
    let key = key.to_owned();

    let row: Option<(String, Vec<u8>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT content_type, bytes FROM blobs WHERE key = ?1",
              rusqlite::params![key],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(row.map(|(content_type, bytes)| Blob::new(bytes, content_type)))
  }

  async fn delete(&self, key: &str) -> Result<()> {
    let key = key.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM blobs WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
