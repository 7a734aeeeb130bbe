#![forbid(unsafe_code)]

use super::rows::{EVENT_COLUMNS, read_event};
use super::*;
use rusqlite::{OptionalExtension, params};
use sb_core::ids::ItemId;
use sb_core::model::{Assignee, EventType};

impl SqliteStore {
    /// Events starting inside `[start_ms, end_ms]`, earliest first.
    pub fn list_events(
        &self,
        scope: &Scope,
        range: EventRange,
    ) -> Result<Vec<CalendarEventRow>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM calendar_events \
             WHERE organization_id = ?1 AND start_ms >= ?2 AND start_ms <= ?3 \
             ORDER BY start_ms ASC, id ASC"
        ))?;
        let rows = stmt.query_map(
            params![scope.org(), range.start_ms, range.end_ms],
            read_event,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_event(&self, scope: &Scope, id: &ItemId) -> Result<CalendarEventRow, StoreError> {
        get_event_conn(&self.conn, scope.org(), id)
    }

    pub fn create_event(
        &mut self,
        scope: &Scope,
        request: EventCreateRequest,
    ) -> Result<CalendarEventRow, StoreError> {
        let tx = self.conn.transaction()?;
        let row = create_event_tx(&tx, scope, request)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn update_event(
        &mut self,
        scope: &Scope,
        id: &ItemId,
        patch: EventPatch,
    ) -> Result<CalendarEventRow, StoreError> {
        let tx = self.conn.transaction()?;
        let mut row = get_event_conn(&tx, scope.org(), id)?;

        if let Some(title) = patch.title {
            row.title = non_empty(&title, "event title must not be empty")?;
        }
        if let Some(description) = patch.description {
            row.description = opt_text(description);
        }
        if let Some(event_type) = patch.event_type {
            row.event_type = event_type;
        }
        if let Some(slot) = patch.slot {
            row.slot = slot;
        }
        if let Some(all_day) = patch.all_day {
            row.all_day = all_day;
        }
        if let Some(location) = patch.location {
            row.location = opt_text(location);
        }
        if let Some(assigned_to) = patch.assigned_to {
            row.assigned_to = assigned_to;
            row.color = assigned_to.color().to_string();
        }
        row.updated_at_ms = now_ms();

        tx.execute(
            r#"
            UPDATE calendar_events SET
                title = ?3, description = ?4, event_type = ?5, start_ms = ?6, end_ms = ?7,
                all_day = ?8, location = ?9, assigned_to = ?10, color = ?11, updated_at_ms = ?12
            WHERE organization_id = ?1 AND id = ?2
            "#,
            params![
                scope.org(),
                id.as_str(),
                row.title,
                row.description,
                row.event_type.as_str(),
                row.slot.start_ms(),
                row.slot.end_ms(),
                if row.all_day { 1i64 } else { 0i64 },
                row.location,
                row.assigned_to.as_str(),
                row.color,
                row.updated_at_ms,
            ],
        )?;
        tx.commit()?;
        Ok(row)
    }

    pub fn delete_event(&mut self, scope: &Scope, id: &ItemId) -> Result<(), StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM calendar_events WHERE organization_id = ?1 AND id = ?2",
            params![scope.org(), id.as_str()],
        )?;
        if deleted == 0 {
            return Err(StoreError::UnknownId);
        }
        Ok(())
    }

    pub fn prospect_demos(
        &self,
        scope: &Scope,
        prospect_id: &ItemId,
    ) -> Result<Vec<CalendarEventRow>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM calendar_events \
             WHERE organization_id = ?1 AND prospect_id = ?2 AND event_type = ?3 \
             ORDER BY start_ms ASC, id ASC"
        ))?;
        let rows = stmt.query_map(
            params![scope.org(), prospect_id.as_str(), EventType::Demo.as_str()],
            read_event,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

pub(super) fn create_event_tx(
    tx: &rusqlite::Transaction<'_>,
    scope: &Scope,
    request: EventCreateRequest,
) -> Result<CalendarEventRow, StoreError> {
    let title = non_empty(&request.title, "event title must not be empty")?;
    let now_ms = now_ms();
    ensure_organization_tx(tx, scope.org(), now_ms)?;

    if let Some(prospect_id) = request.prospect_id.as_ref() {
        super::prospects::get_prospect_conn(tx, scope.org(), prospect_id)?;
    }

    let assigned_to = request.assigned_to.unwrap_or(Assignee::Team);
    let id = mint_id_tx(tx, scope.org(), "event_seq", "EVT")?;
    tx.execute(
        r#"
        INSERT INTO calendar_events(
            organization_id, id, title, description, event_type, start_ms, end_ms, all_day,
            prospect_id, location, assigned_to, color, created_by, created_at_ms, updated_at_ms
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
        "#,
        params![
            scope.org(),
            id.as_str(),
            title,
            opt_text(request.description),
            request.event_type.as_str(),
            request.slot.start_ms(),
            request.slot.end_ms(),
            if request.all_day { 1i64 } else { 0i64 },
            request.prospect_id.as_ref().map(ItemId::as_str),
            opt_text(request.location),
            assigned_to.as_str(),
            assigned_to.color(),
            scope.user.as_str(),
            now_ms,
        ],
    )?;
    get_event_conn(tx, scope.org(), &id)
}

fn get_event_conn(
    conn: &rusqlite::Connection,
    organization: &str,
    id: &ItemId,
) -> Result<CalendarEventRow, StoreError> {
    conn.query_row(
        &format!("SELECT {EVENT_COLUMNS} FROM calendar_events WHERE organization_id = ?1 AND id = ?2"),
        params![organization, id.as_str()],
        read_event,
    )
    .optional()?
    .ok_or(StoreError::UnknownId)
}
