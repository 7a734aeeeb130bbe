#![forbid(unsafe_code)]

use super::{SCHEMA_VERSION, StoreError};
use rusqlite::{Connection, params};

const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS organizations (
          organization_id TEXT PRIMARY KEY,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS counters (
          organization_id TEXT NOT NULL,
          name TEXT NOT NULL,
          value INTEGER NOT NULL,
          PRIMARY KEY (organization_id, name)
        );

        -- Manual board order lives in (pipeline_stage, sort_index); only relative order matters.
        CREATE TABLE IF NOT EXISTS prospects (
          organization_id TEXT NOT NULL,
          id TEXT NOT NULL,
          name TEXT NOT NULL,
          kind TEXT NOT NULL,
          country TEXT NOT NULL,
          city TEXT NOT NULL,
          website TEXT,
          phone TEXT,
          -- Lowercased; the key public demo bookings match on.
          email TEXT,
          pipeline_stage TEXT NOT NULL,
          priority TEXT NOT NULL,
          lead_source TEXT NOT NULL,
          assigned_to TEXT,
          notes TEXT,
          next_action TEXT,
          next_action_date TEXT,
          sort_index INTEGER NOT NULL,
          first_demo_scheduled_at_ms INTEGER,
          second_demo_scheduled_at_ms INTEGER,
          created_by TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          PRIMARY KEY (organization_id, id),
          FOREIGN KEY (organization_id) REFERENCES organizations(organization_id)
        );

        CREATE TABLE IF NOT EXISTS todos (
          organization_id TEXT NOT NULL,
          id TEXT NOT NULL,
          title TEXT NOT NULL,
          description TEXT,
          completed INTEGER NOT NULL DEFAULT 0,
          assigned_to TEXT NOT NULL,
          due_date TEXT NOT NULL,
          display_order INTEGER NOT NULL,
          screenshot_url TEXT,
          created_by TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          PRIMARY KEY (organization_id, id),
          FOREIGN KEY (organization_id) REFERENCES organizations(organization_id)
        );

        CREATE TABLE IF NOT EXISTS calendar_events (
          organization_id TEXT NOT NULL,
          id TEXT NOT NULL,
          title TEXT NOT NULL,
          description TEXT,
          event_type TEXT NOT NULL,
          start_ms INTEGER NOT NULL,
          end_ms INTEGER NOT NULL,
          all_day INTEGER NOT NULL DEFAULT 0,
          prospect_id TEXT,
          location TEXT,
          assigned_to TEXT NOT NULL,
          color TEXT NOT NULL,
          created_by TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          PRIMARY KEY (organization_id, id),
          FOREIGN KEY (organization_id) REFERENCES organizations(organization_id)
        );

        CREATE INDEX IF NOT EXISTS idx_prospects_stage
          ON prospects(organization_id, pipeline_stage, sort_index);
        CREATE INDEX IF NOT EXISTS idx_prospects_email
          ON prospects(organization_id, email);
        CREATE INDEX IF NOT EXISTS idx_todos_due
          ON todos(organization_id, due_date, display_order);
        CREATE INDEX IF NOT EXISTS idx_events_start
          ON calendar_events(organization_id, start_ms);
        CREATE INDEX IF NOT EXISTS idx_events_prospect
          ON calendar_events(organization_id, prospect_id);
"#;

pub(super) fn install(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;
    Ok(())
}
