#![forbid(unsafe_code)]

use super::rows::{PROSPECT_COLUMNS, parsed, read_prospect};
use super::*;
use rusqlite::{OptionalExtension, params};
use sb_core::ids::ItemId;
use sb_core::model::{DemoKind, PipelineStage, Priority};
use sb_core::stats::PipelineStats;

impl SqliteStore {
    /// Whole board, each stage in display order.
    pub fn list_prospects(&self, scope: &Scope) -> Result<Vec<ProspectRow>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROSPECT_COLUMNS} FROM prospects \
             WHERE organization_id = ?1 \
             ORDER BY sort_index ASC, created_at_ms ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![scope.org()], read_prospect)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_prospect(&self, scope: &Scope, id: &ItemId) -> Result<ProspectRow, StoreError> {
        get_prospect_conn(&self.conn, scope.org(), id)
    }

    pub fn create_prospect(
        &mut self,
        scope: &Scope,
        request: ProspectCreateRequest,
    ) -> Result<ProspectRow, StoreError> {
        let tx = self.conn.transaction()?;
        let row = insert_prospect_tx(&tx, scope, request)?;
        tx.commit()?;
        tracing::debug!(
            id = row.id.as_str(),
            stage = row.stage.as_str(),
            sort_index = row.sort_index,
            "prospect created"
        );
        Ok(row)
    }

    pub fn update_prospect(
        &mut self,
        scope: &Scope,
        id: &ItemId,
        patch: ProspectPatch,
    ) -> Result<ProspectRow, StoreError> {
        let tx = self.conn.transaction()?;
        let mut row = get_prospect_conn(&tx, scope.org(), id)?;

        if let Some(name) = patch.name {
            row.name = non_empty(&name, "prospect name must not be empty")?;
        }
        if let Some(kind) = patch.kind {
            row.kind = kind.trim().to_string();
        }
        if let Some(country) = patch.country {
            row.country = country.trim().to_string();
        }
        if let Some(city) = patch.city {
            row.city = city.trim().to_string();
        }
        if let Some(website) = patch.website {
            row.website = opt_text(website);
        }
        if let Some(phone) = patch.phone {
            row.phone = opt_text(phone);
        }
        if let Some(email) = patch.email {
            row.email = normalize_email(email)?;
        }
        if let Some(priority) = patch.priority {
            row.priority = priority;
        }
        if let Some(lead_source) = patch.lead_source {
            row.lead_source = lead_source;
        }
        if let Some(assigned_to) = patch.assigned_to {
            row.assigned_to = opt_text(assigned_to);
        }
        if let Some(notes) = patch.notes {
            row.notes = opt_text(notes);
        }
        if let Some(next_action) = patch.next_action {
            row.next_action = opt_text(next_action);
        }
        if let Some(next_action_date) = patch.next_action_date {
            row.next_action_date = opt_text(next_action_date);
        }
        row.updated_at_ms = now_ms();

        tx.execute(
            r#"
            UPDATE prospects SET
                name = ?3, kind = ?4, country = ?5, city = ?6, website = ?7, phone = ?8,
                priority = ?9, lead_source = ?10, assigned_to = ?11, notes = ?12,
                next_action = ?13, next_action_date = ?14, updated_at_ms = ?15, email = ?16
            WHERE organization_id = ?1 AND id = ?2
            "#,
            params![
                scope.org(),
                id.as_str(),
                row.name,
                row.kind,
                row.country,
                row.city,
                row.website,
                row.phone,
                row.priority.as_str(),
                row.lead_source.as_str(),
                row.assigned_to,
                row.notes,
                row.next_action,
                row.next_action_date,
                row.updated_at_ms,
                row.email,
            ],
        )?;
        tx.commit()?;
        Ok(row)
    }

    /// Siblings keep their sort indices; the gap is harmless.
    pub fn delete_prospect(&mut self, scope: &Scope, id: &ItemId) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute(
            "DELETE FROM prospects WHERE organization_id = ?1 AND id = ?2",
            params![scope.org(), id.as_str()],
        )?;
        if deleted == 0 {
            return Err(StoreError::UnknownId);
        }
        tx.execute(
            "UPDATE calendar_events SET prospect_id = NULL WHERE organization_id = ?1 AND prospect_id = ?2",
            params![scope.org(), id.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Prospect counts per stage and priority.
    pub fn pipeline_stats(&self, scope: &Scope) -> Result<PipelineStats, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT pipeline_stage, priority, COUNT(*) FROM prospects \
             WHERE organization_id = ?1 GROUP BY pipeline_stage, priority",
        )?;
        let groups = stmt.query_map(params![scope.org()], |row| {
            let stage = parsed(row, 0, "pipeline_stage", PipelineStage::parse)?;
            let priority = parsed(row, 1, "priority", Priority::parse)?;
            let count = row.get::<_, i64>(2)?;
            Ok((stage, priority, usize::try_from(count).unwrap_or_default()))
        })?;
        Ok(PipelineStats::tally(
            groups.collect::<Result<Vec<_>, _>>()?,
        ))
    }

    pub fn set_demo_scheduled(
        &mut self,
        scope: &Scope,
        id: &ItemId,
        demo: DemoKind,
        at_ms: i64,
    ) -> Result<(), StoreError> {
        set_demo_scheduled_conn(&self.conn, scope.org(), id, demo, at_ms)
    }
}

/// Inserts at the end of the request's stage column.
pub(super) fn insert_prospect_tx(
    tx: &rusqlite::Transaction<'_>,
    scope: &Scope,
    request: ProspectCreateRequest,
) -> Result<ProspectRow, StoreError> {
    let name = non_empty(&request.name, "prospect name must not be empty")?;
    let email = normalize_email(request.email)?;
    let now_ms = now_ms();
    ensure_organization_tx(tx, scope.org(), now_ms)?;

    let sort_index = next_stage_index(tx, scope.org(), request.stage)?;
    let id = mint_id_tx(tx, scope.org(), "prospect_seq", "PRO")?;

    tx.execute(
        r#"
        INSERT INTO prospects(
            organization_id, id, name, kind, country, city, website, phone,
            pipeline_stage, priority, lead_source, assigned_to, notes, next_action,
            next_action_date, sort_index, created_by, created_at_ms, updated_at_ms, email
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?18, ?19)
        "#,
        params![
            scope.org(),
            id.as_str(),
            name,
            request.kind.trim(),
            request.country.trim(),
            request.city.trim(),
            opt_text(request.website),
            opt_text(request.phone),
            request.stage.as_str(),
            request.priority.as_str(),
            request.lead_source.as_str(),
            opt_text(request.assigned_to),
            opt_text(request.notes),
            opt_text(request.next_action),
            opt_text(request.next_action_date),
            sort_index,
            scope.user.as_str(),
            now_ms,
            email,
        ],
    )?;

    get_prospect_conn(tx, scope.org(), &id)
}

pub(super) fn next_stage_index(
    conn: &rusqlite::Connection,
    organization: &str,
    stage: PipelineStage,
) -> Result<i64, StoreError> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(sort_index), -1) + 1 FROM prospects \
         WHERE organization_id = ?1 AND pipeline_stage = ?2",
        params![organization, stage.as_str()],
        |row| row.get(0),
    )?)
}

/// Lowercased and trimmed; empty becomes `None`.
pub(super) fn normalize_email(value: Option<String>) -> Result<Option<String>, StoreError> {
    let Some(email) = opt_text(value) else {
        return Ok(None);
    };
    let email = email.to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace) =>
        {
            Ok(Some(email))
        }
        _ => Err(StoreError::InvalidInput("email must look like name@domain")),
    }
}

pub(super) fn get_prospect_conn(
    conn: &rusqlite::Connection,
    organization: &str,
    id: &ItemId,
) -> Result<ProspectRow, StoreError> {
    conn.query_row(
        &format!("SELECT {PROSPECT_COLUMNS} FROM prospects WHERE organization_id = ?1 AND id = ?2"),
        params![organization, id.as_str()],
        read_prospect,
    )
    .optional()?
    .ok_or(StoreError::UnknownId)
}

pub(super) fn set_demo_scheduled_conn(
    conn: &rusqlite::Connection,
    organization: &str,
    id: &ItemId,
    demo: DemoKind,
    at_ms: i64,
) -> Result<(), StoreError> {
    let column = match demo {
        DemoKind::First => "first_demo_scheduled_at_ms",
        DemoKind::Second => "second_demo_scheduled_at_ms",
    };
    let changed = conn.execute(
        &format!(
            "UPDATE prospects SET {column} = ?3, updated_at_ms = ?4 \
             WHERE organization_id = ?1 AND id = ?2"
        ),
        params![organization, id.as_str(), at_ms, now_ms()],
    )?;
    if changed == 0 {
        return Err(StoreError::UnknownId);
    }
    Ok(())
}
