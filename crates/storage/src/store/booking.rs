#![forbid(unsafe_code)]

use super::events::create_event_tx;
use super::prospects::{
    get_prospect_conn, insert_prospect_tx, next_stage_index, normalize_email,
    set_demo_scheduled_conn,
};
use super::rows::{PROSPECT_COLUMNS, read_prospect};
use super::*;
use rusqlite::{OptionalExtension, params};
use sb_core::model::{DemoKind, EventType, LeadSource, PipelineStage, Priority};

const DEFAULT_DEMO_LOCATION: &str = "Google Meet / Teams";

/// Outcome of a public demo booking.
#[derive(Clone, Debug)]
pub struct PublicBooking {
    pub prospect: ProspectRow,
    pub event: CalendarEventRow,
    /// `true` when no prospect had this email yet.
    pub created: bool,
    pub demo: DemoKind,
}

impl SqliteStore {
    /// Books a demo for a website visitor.
    ///
    /// The prospect is matched on its lowercased email, or created in "not contacted". The
    /// demo counts as the second one when a first was already scheduled. A prospect that has
    /// not reached the demo's column yet is moved to the end of it; later stages stay put.
    pub fn book_public_demo(
        &mut self,
        scope: &Scope,
        request: PublicDemoRequest,
    ) -> Result<PublicBooking, StoreError> {
        let contact = non_empty(&request.contact_name, "contact name must not be empty")?;
        let company = non_empty(&request.company, "company must not be empty")?;
        let email = normalize_email(Some(request.email))?
            .ok_or(StoreError::InvalidInput("email must not be empty"))?;

        let tx = self.conn.transaction()?;
        let existing = tx
            .query_row(
                &format!(
                    "SELECT {PROSPECT_COLUMNS} FROM prospects \
                     WHERE organization_id = ?1 AND email = ?2 \
                     ORDER BY created_at_ms ASC, id ASC LIMIT 1"
                ),
                params![scope.org(), email],
                read_prospect,
            )
            .optional()?;

        let created = existing.is_none();
        let prospect = match existing {
            Some(row) => {
                let line = format!("Contact: {contact}\nUpdated via website demo booking.");
                let notes = match row.notes.as_deref() {
                    Some(notes) => format!("{notes}\n\n{line}"),
                    None => line,
                };
                tx.execute(
                    "UPDATE prospects SET phone = COALESCE(?3, phone), notes = ?4, updated_at_ms = ?5 \
                     WHERE organization_id = ?1 AND id = ?2",
                    params![
                        scope.org(),
                        row.id.as_str(),
                        opt_text(request.phone),
                        notes,
                        now_ms()
                    ],
                )?;
                row
            }
            None => {
                let mut new = ProspectCreateRequest::new(company.clone(), PipelineStage::NotContacted);
                new.kind = "Golf".to_string();
                new.country = "Finland".to_string();
                new.city = "Unknown".to_string();
                new.email = Some(email.clone());
                new.phone = request.phone;
                new.priority = Priority::Medium;
                new.lead_source = LeadSource::Website;
                new.assigned_to = Some(request.responsible.as_str().to_string());
                new.notes = Some(format!("Contact: {contact}\nBooked demo via website."));
                insert_prospect_tx(&tx, scope, new)?
            }
        };

        let demo = if prospect.first_demo_at_ms.is_some() {
            DemoKind::Second
        } else {
            DemoKind::First
        };
        let event = create_event_tx(
            &tx,
            scope,
            EventCreateRequest {
                title: format!("Demo - {company}"),
                description: Some(format!(
                    "Website demo booking\nContact: {contact}\nEmail: {email}"
                )),
                event_type: EventType::Demo,
                slot: request.slot,
                all_day: false,
                prospect_id: Some(prospect.id.clone()),
                location: Some(
                    request
                        .location
                        .unwrap_or_else(|| DEFAULT_DEMO_LOCATION.to_string()),
                ),
                assigned_to: Some(request.responsible),
            },
        )?;
        set_demo_scheduled_conn(&tx, scope.org(), &prospect.id, demo, request.slot.start_ms())?;

        let target = demo.stage();
        if prospect.stage < target {
            let sort_index = next_stage_index(&tx, scope.org(), target)?;
            tx.execute(
                "UPDATE prospects SET pipeline_stage = ?3, sort_index = ?4, updated_at_ms = ?5 \
                 WHERE organization_id = ?1 AND id = ?2",
                params![
                    scope.org(),
                    prospect.id.as_str(),
                    target.as_str(),
                    sort_index,
                    now_ms()
                ],
            )?;
        }

        let prospect = get_prospect_conn(&tx, scope.org(), &prospect.id)?;
        tx.commit()?;
        tracing::info!(
            id = prospect.id.as_str(),
            event = event.id.as_str(),
            demo = demo.label(),
            created,
            "public demo booked"
        );
        Ok(PublicBooking {
            prospect,
            event,
            created,
            demo,
        })
    }
}
