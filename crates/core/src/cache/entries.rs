//! Stored response operations and the [`CacheStorage`] implementation for
//! the SQLite backend.

use super::connection::CacheDb;
use super::storage::{CacheEntry, CacheStorage, ensure_storable};
use crate::{Error, RequestKey, Response};
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Row ready to be written: everything encoded up front so the closure
/// running on the database thread owns its data.
struct EncodedEntry {
    key_hash: String,
    method: String,
    url: String,
    status: u16,
    headers_json: String,
    body: Bytes,
    final_url: Option<String>,
}

impl EncodedEntry {
    fn new(key: &RequestKey, response: &Response) -> Result<Self, Error> {
        ensure_storable(key)?;
        Ok(Self {
            key_hash: key.hash(),
            method: key.method.clone(),
            url: key.url.clone(),
            status: response.status,
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.clone(),
            final_url: response.url.clone(),
        })
    }

    fn write(&self, conn: &rusqlite::Connection, generation: &str, now: &str) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
            params![generation, now],
        )?;
        conn.execute(
            "INSERT INTO entries (
                generation, key_hash, method, url, status, headers_json, body, final_url, stored_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(generation, key_hash) DO UPDATE SET
                status = excluded.status,
                headers_json = excluded.headers_json,
                body = excluded.body,
                final_url = excluded.final_url,
                stored_at = excluded.stored_at",
            params![
                generation,
                &self.key_hash,
                &self.method,
                &self.url,
                self.status,
                &self.headers_json,
                &self.body[..],
                &self.final_url,
                now,
            ],
        )?;
        Ok(())
    }
}

impl CacheDb {
    /// Insert or replace one stored response.
    pub async fn upsert_entry(&self, generation: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        let entry = EncodedEntry::new(key, response)?;
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                entry.write(conn, &generation, &now)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace several responses in one transaction.
    pub async fn upsert_entries(&self, generation: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        let encoded = entries
            .iter()
            .map(|(key, response)| EncodedEntry::new(key, response))
            .collect::<Result<Vec<_>, _>>()?;
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![generation, now],
                )?;
                for entry in &encoded {
                    entry.write(&tx, &generation, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the stored response for a request, if any.
    pub async fn get_entry(&self, generation: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let generation = generation.to_string();
        let key_hash = key.hash();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(u16, String, Vec<u8>, Option<String>)>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status, headers_json, body, final_url
                         FROM entries WHERE generation = ?1 AND key_hash = ?2",
                        params![generation, key_hash],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        let Some((status, headers_json, body, url)) = row else {
            return Ok(None);
        };

        let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
        Ok(Some(Response { url, status, headers, body: Bytes::from(body) }))
    }

    /// List entries of a generation, oldest first.
    pub async fn list_entries(&self, generation: &str) -> Result<Vec<CacheEntry>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, stored_at FROM entries
                     WHERE generation = ?1 ORDER BY rowid ASC",
                )?;
                let entries = stmt
                    .query_map(params![generation], |row| {
                        Ok(CacheEntry {
                            method: row.get(0)?,
                            url: row.get(1)?,
                            status: row.get(2)?,
                            stored_at: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        self.open_generation(generation).await
    }

    async fn has(&self, generation: &str) -> Result<bool, Error> {
        self.has_generation(generation).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.generation_names().await
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        self.delete_generation(generation).await
    }

    async fn match_request(&self, generation: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.get_entry(generation, key).await
    }

    async fn put(&self, generation: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.upsert_entry(generation, key, response).await
    }

    async fn put_all(&self, generation: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        self.upsert_entries(generation, entries).await
    }

    async fn entries(&self, generation: &str) -> Result<Vec<CacheEntry>, Error> {
        self.list_entries(generation).await
    }

    async fn set_activated(&self, generation: &str) -> Result<(), Error> {
        self.mark_activated(generation).await
    }

    async fn activated(&self) -> Result<Option<String>, Error> {
        self.activated_generation().await
    }
}
