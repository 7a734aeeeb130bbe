#![forbid(unsafe_code)]

use crate::*;
use sb_core::calendar::{DayBucket, layout_day, week_days, week_start};
use sb_core::model::EventType;
use sb_storage::{EventCreateRequest, EventPatch, EventRange};
use serde_json::{Value, json};

pub(super) fn dispatch(
    server: &mut RpcServer,
    op: &str,
    args: Args,
) -> Option<Result<Value, Value>> {
    let out = match op {
        "list" => server.events_list(&args),
        "create" => server.events_create(&args),
        "update" => server.events_update(&args),
        "delete" => server.events_delete(&args),
        "layout" => server.events_layout(&args),
        _ => return None,
    };
    Some(out)
}

fn calendar_err(err: sb_core::calendar::CalendarError) -> Value {
    ai_error("INVALID_INPUT", err.message())
}

/// Whole days `from..=until` as an inclusive millisecond range.
fn day_range(from: DayBucket, until: DayBucket) -> EventRange {
    EventRange {
        start_ms: from.start_ms(),
        end_ms: until.end_ms() - 1,
    }
}

impl RpcServer {
    /// `{from, until}` picks explicit days; otherwise the Monday-first week around `week`
    /// (default today).
    fn events_list(&self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let from = optional_day(args, "from")?;
        let until = optional_day(args, "until")?;

        let (from, until, days) = match (from, until) {
            (Some(from), Some(until)) => {
                if until < from {
                    return Err(ai_error("INVALID_INPUT", "until must not be before from"));
                }
                (from, until, Vec::new())
            }
            (None, None) => {
                let anchor = optional_day(args, "week")?.unwrap_or_else(DayBucket::today_utc);
                let days = week_days(anchor).map_err(calendar_err)?;
                let start = week_start(anchor).map_err(calendar_err)?;
                let end = days.last().copied().unwrap_or(start);
                (start, end, days)
            }
            _ => {
                return Err(ai_error_with(
                    "INVALID_INPUT",
                    "from and until go together",
                    Some("Pass both days, or week for a Monday-first week"),
                ));
            }
        };

        let rows = self
            .store
            .list_events(&scope, day_range(from, until))
            .map_err(store_err)?;
        let mut body = json!({
            "from": from.to_string(),
            "until": until.to_string(),
            "count": rows.len(),
            "events": events_json(&rows),
        });
        if !days.is_empty() {
            body["week"] = json!(
                days.iter()
                    .map(|day| json!({ "date": day.to_string(), "label": day.short_label() }))
                    .collect::<Vec<_>>()
            );
        }
        Ok(ai_ok("events_list", body))
    }

    fn events_create(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let request = EventCreateRequest {
            title: require_string(args, "title")?,
            description: optional_string(args, "description")?,
            event_type: optional_event_type(args, "event_type")?.unwrap_or(EventType::Task),
            slot: require_slot(args)?,
            all_day: optional_bool(args, "all_day")?.unwrap_or(false),
            prospect_id: optional_item_id(args, "prospect_id")?,
            location: optional_string(args, "location")?,
            assigned_to: optional_assignee(args, "assigned_to")?,
        };
        let row = self
            .store
            .create_event(&scope, request)
            .map_err(store_err)?;
        Ok(ai_ok("events_create", json!({ "event": event_json(&row) })))
    }

    fn events_update(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let id = require_item_id(args, "id")?;
        let patch = EventPatch {
            title: optional_string(args, "title")?,
            description: optional_nullable_string(args, "description")?,
            event_type: optional_event_type(args, "event_type")?,
            slot: optional_slot(args)?,
            all_day: optional_bool(args, "all_day")?,
            location: optional_nullable_string(args, "location")?,
            assigned_to: optional_assignee(args, "assigned_to")?,
        };
        let row = self
            .store
            .update_event(&scope, &id, patch)
            .map_err(store_err)?;
        Ok(ai_ok("events_update", json!({ "event": event_json(&row) })))
    }

    fn events_delete(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let id = require_item_id(args, "id")?;
        self.store.delete_event(&scope, &id).map_err(store_err)?;
        Ok(ai_ok("events_delete", json!({ "deleted": id.as_str() })))
    }

    /// Lane placement for one day column of the week view.
    fn events_layout(&self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let day = require_day(args, "date")?;
        let rows = self
            .store
            .list_events(&scope, day_range(day, day))
            .map_err(store_err)?;
        let placements = layout_day(
            rows.iter()
                .filter(|row| !row.all_day)
                .map(|row| (row.id.clone(), row.slot)),
        );
        Ok(ai_ok(
            "events_layout",
            json!({
                "date": day.to_string(),
                "placements": layout_json(&placements),
                "events": events_json(&rows),
            }),
        ))
    }
}
