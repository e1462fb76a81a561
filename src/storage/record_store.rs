// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Latest record set storage using SQLite.
//!
//! Holds exactly one value: the JSON text of the most recently decoded
//! record set. Every save replaces it.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeZone};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::record::{self, RecordSet};

/// Database file name inside the data directory.
pub const DB_FILE: &str = "bar_chart_data.db";

/// Key of the single persisted slot.
pub const DATA_KEY: &str = "json_data";

/// Single-slot record store.
#[derive(Clone)]
pub struct RecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl RecordStore {
    /// Create or open the store database.
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(DB_FILE);
        info!("Opening record store: {:?}", db_path);

        let conn = Connection::open(&db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Replace the stored record set.
    ///
    /// The write is committed before this returns, so a following `load`
    /// observes it.
    pub fn save(&self, records: &RecordSet) -> Result<()> {
        let json = record::encode(records)?;
        let timestamp = Local::now().timestamp();

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![DATA_KEY, json, timestamp],
        )?;
        tx.commit()?;

        debug!("Saved {} records", records.len());
        Ok(())
    }

    /// Load the most recently saved record set, if any.
    pub fn load(&self) -> Result<Option<RecordSet>> {
        let conn = self.conn.lock();
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![DATA_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(json) => {
                let records = record::decode(json.as_bytes())
                    .map_err(|e| anyhow!("stored record set is corrupt: {}", e))?;
                Ok(Some(records))
            }
            None => Ok(None),
        }
    }

    /// Time of the last successful save.
    pub fn last_saved_at(&self) -> Result<Option<DateTime<Local>>> {
        let conn = self.conn.lock();
        let secs: Option<i64> = conn
            .query_row(
                "SELECT updated_at FROM kv WHERE key = ?1",
                params![DATA_KEY],
                |row| row.get(0),
            )
            .optional()?;

        Ok(secs.and_then(|s| Local.timestamp_opt(s, 0).single()))
    }
}
