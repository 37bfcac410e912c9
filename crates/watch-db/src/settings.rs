//! Setting values keyed by name. Validation and defaults live in the
//! application; this layer stores raw strings.

use std::collections::BTreeMap;

use rusqlite::OptionalExtension;

use crate::{Database, DbError};

impl Database {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, DbError> {
        self.with_conn(|conn| {
            let value = conn
                .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                    row.get::<_, String>(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    /// Insert or overwrite a value.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = CURRENT_TIMESTAMP",
                [key, value],
            )?;
            Ok(())
        })
    }

    /// Store `value` only when `key` has no value yet. Returns whether a row
    /// was written.
    pub fn seed_setting(&self, key: &str, value: &str) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let written = conn.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO NOTHING",
                [key, value],
            )?;
            Ok(written > 0)
        })
    }

    /// Every stored value, ordered by key.
    pub fn get_all_settings(&self) -> Result<BTreeMap<String, String>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            let settings = rows.collect::<Result<BTreeMap<_, _>, _>>()?;
            Ok(settings)
        })
    }

    /// Forget a value. Deleting an absent key is not an error.
    pub fn delete_setting(&self, key: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}
