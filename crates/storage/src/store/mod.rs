#![forbid(unsafe_code)]

mod booking;
mod error;
mod events;
mod prospects;
mod requests;
mod rows;
mod schema;
mod todos;
mod writes;

pub use booking::PublicBooking;
pub use error::StoreError;
pub use requests::*;
pub use rows::*;
pub use writes::*;

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use sb_core::ids::{OrganizationId, UserId};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILE_NAME: &str = "salesboard.db";
pub const SCHEMA_VERSION: &str = "v1";

/// Tenant and acting user for one call. Every read and write is confined to `organization`;
/// `user` is stamped on rows the call creates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    pub organization: OrganizationId,
    pub user: UserId,
}

impl Scope {
    pub fn new(organization: OrganizationId, user: UserId) -> Self {
        Self { organization, user }
    }

    fn org(&self) -> &str {
        self.organization.as_str()
    }
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::install(&conn)?;

        tracing::debug!(path = %db_path.display(), "store opened");
        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn schema_version(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

fn ensure_organization_tx(
    tx: &Transaction<'_>,
    organization: &str,
    now_ms: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT OR IGNORE INTO organizations(organization_id, created_at_ms) VALUES (?1, ?2)",
        params![organization, now_ms],
    )?;
    Ok(())
}

fn next_counter_tx(
    tx: &Transaction<'_>,
    organization: &str,
    name: &str,
) -> Result<i64, StoreError> {
    let current: i64 = tx
        .query_row(
            "SELECT value FROM counters WHERE organization_id=?1 AND name=?2",
            params![organization, name],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);
    let next = current + 1;
    tx.execute(
        r#"
        INSERT INTO counters(organization_id, name, value) VALUES (?1, ?2, ?3)
        ON CONFLICT(organization_id, name) DO UPDATE SET value=excluded.value
        "#,
        params![organization, name, next],
    )?;
    Ok(next)
}

fn mint_id_tx(
    tx: &Transaction<'_>,
    organization: &str,
    counter: &str,
    prefix: &str,
) -> Result<sb_core::ids::ItemId, StoreError> {
    let seq = next_counter_tx(tx, organization, counter)?;
    sb_core::ids::ItemId::try_new(format!("{prefix}-{seq:08X}"))
        .map_err(|_| StoreError::InvalidInput("minted id rejected"))
}

fn non_empty(value: &str, message: &'static str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidInput(message));
    }
    Ok(trimmed.to_string())
}

/// Empty optional text is stored as NULL.
fn opt_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
