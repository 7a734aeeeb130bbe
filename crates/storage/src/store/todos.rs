#![forbid(unsafe_code)]

use super::rows::{TODO_COLUMNS, read_todo};
use super::*;
use rusqlite::{OptionalExtension, params};
use sb_core::calendar::DayBucket;
use sb_core::ids::ItemId;

impl SqliteStore {
    /// Todos ordered by due date, then board order.
    pub fn list_todos(&self, scope: &Scope, range: TodoRange) -> Result<Vec<TodoRow>, StoreError> {
        let from = range.from.map(|d| d.to_string());
        let until = range.until.map(|d| d.to_string());
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TODO_COLUMNS} FROM todos \
             WHERE organization_id = ?1 \
               AND (?2 IS NULL OR due_date >= ?2) \
               AND (?3 IS NULL OR due_date <= ?3) \
             ORDER BY due_date ASC, display_order ASC, created_at_ms ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![scope.org(), from, until], read_todo)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_todos_on(
        &self,
        scope: &Scope,
        days: &[DayBucket],
    ) -> Result<Vec<TodoRow>, StoreError> {
        let mut out = Vec::new();
        let mut seen = Vec::with_capacity(days.len());
        for day in days {
            if seen.contains(day) {
                continue;
            }
            seen.push(*day);
            out.extend(self.list_todos(
                scope,
                TodoRange {
                    from: Some(*day),
                    until: Some(*day),
                },
            )?);
        }
        Ok(out)
    }

    pub fn get_todo(&self, scope: &Scope, id: &ItemId) -> Result<TodoRow, StoreError> {
        get_todo_conn(&self.conn, scope.org(), id)
    }

    /// Appends to the end of the due day.
    pub fn create_todo(
        &mut self,
        scope: &Scope,
        request: TodoCreateRequest,
    ) -> Result<TodoRow, StoreError> {
        let title = non_empty(&request.title, "todo title must not be empty")?;
        let due = request.due.to_string();
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        ensure_organization_tx(&tx, scope.org(), now_ms)?;

        let display_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(display_order), -1) + 1 FROM todos \
             WHERE organization_id = ?1 AND due_date = ?2",
            params![scope.org(), due],
            |row| row.get(0),
        )?;
        let id = mint_id_tx(&tx, scope.org(), "todo_seq", "TODO")?;

        tx.execute(
            r#"
            INSERT INTO todos(
                organization_id, id, title, description, completed, assigned_to, due_date,
                display_order, created_by, created_at_ms, updated_at_ms
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
            params![
                scope.org(),
                id.as_str(),
                title,
                opt_text(request.description),
                request.assigned_to.as_str(),
                due,
                display_order,
                scope.user.as_str(),
                now_ms,
            ],
        )?;

        let row = get_todo_conn(&tx, scope.org(), &id)?;
        tx.commit()?;
        Ok(row)
    }

    /// Payload-only edit; the due day and board position move through reorder writes.
    pub fn update_todo(
        &mut self,
        scope: &Scope,
        id: &ItemId,
        patch: TodoPatch,
    ) -> Result<TodoRow, StoreError> {
        let tx = self.conn.transaction()?;
        let mut row = get_todo_conn(&tx, scope.org(), id)?;

        if let Some(title) = patch.title {
            row.title = non_empty(&title, "todo title must not be empty")?;
        }
        if let Some(description) = patch.description {
            row.description = opt_text(description);
        }
        if let Some(completed) = patch.completed {
            row.completed = completed;
        }
        if let Some(assigned_to) = patch.assigned_to {
            row.assigned_to = assigned_to;
        }
        if let Some(screenshot_url) = patch.screenshot_url {
            row.screenshot_url = opt_text(screenshot_url);
        }
        row.updated_at_ms = now_ms();

        tx.execute(
            r#"
            UPDATE todos SET
                title = ?3, description = ?4, completed = ?5, assigned_to = ?6,
                screenshot_url = ?7, updated_at_ms = ?8
            WHERE organization_id = ?1 AND id = ?2
            "#,
            params![
                scope.org(),
                id.as_str(),
                row.title,
                row.description,
                if row.completed { 1i64 } else { 0i64 },
                row.assigned_to.as_str(),
                row.screenshot_url,
                row.updated_at_ms,
            ],
        )?;
        tx.commit()?;
        Ok(row)
    }

    pub fn delete_todo(&mut self, scope: &Scope, id: &ItemId) -> Result<(), StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM todos WHERE organization_id = ?1 AND id = ?2",
            params![scope.org(), id.as_str()],
        )?;
        if deleted == 0 {
            return Err(StoreError::UnknownId);
        }
        Ok(())
    }
}

pub(super) fn get_todo_conn(
    conn: &rusqlite::Connection,
    organization: &str,
    id: &ItemId,
) -> Result<TodoRow, StoreError> {
    conn.query_row(
        &format!("SELECT {TODO_COLUMNS} FROM todos WHERE organization_id = ?1 AND id = ?2"),
        params![organization, id.as_str()],
        read_todo,
    )
    .optional()?
    .ok_or(StoreError::UnknownId)
}
