//! Saved Twitch credentials (a single row).

use serde::{Deserialize, Serialize};

use rusqlite::OptionalExtension;

use crate::{Database, DbError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub client_id: String,
    pub access_token: String,
    pub client_secret: Option<String>,
}

impl Database {
    /// Save credentials, replacing any previous row.
    ///
    /// A `None` secret keeps whatever secret was stored before.
    pub fn save_credentials(&self, creds: &StoredCredentials) -> Result<(), DbError> {
        if creds.client_id.is_empty() {
            return Err(DbError::InvalidData("client id must not be empty".into()));
        }
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO credentials (id, client_id, access_token, client_secret, updated_at)
                 VALUES (1, ?1, ?2, ?3, CURRENT_TIMESTAMP)
                 ON CONFLICT(id) DO UPDATE SET
                    client_id = ?1,
                    access_token = ?2,
                    client_secret = COALESCE(?3, client_secret),
                    updated_at = CURRENT_TIMESTAMP",
                rusqlite::params![creds.client_id, creds.access_token, creds.client_secret],
            )?;
            Ok(())
        })
    }

    pub fn get_credentials(&self) -> Result<Option<StoredCredentials>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT client_id, access_token, client_secret FROM credentials WHERE id = 1",
            )?;
            let creds = stmt
                .query_row([], |row| {
                    Ok(StoredCredentials {
                        client_id: row.get(0)?,
                        access_token: row.get(1)?,
                        client_secret: row.get::<_, Option<String>>(2)?.filter(|s| !s.is_empty()),
                    })
                })
                .optional()?;
            Ok(creds)
        })
    }

    pub fn clear_credentials(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM credentials", [])?;
            Ok(())
        })
    }
}
