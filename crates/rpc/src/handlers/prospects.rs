#![forbid(unsafe_code)]

use super::move_result_body;
use crate::*;
use sb_core::calendar::{DayBucket, booking_slot};
use sb_core::ids::ItemId;
use sb_core::model::{Assignee, PipelineStage, team_for_org};
use sb_core::pipeline::PendingStageChange;
use sb_storage::{
    DemoSchedule, ProspectCreateRequest, ProspectMove, ProspectPatch, ProspectRow,
    PublicDemoRequest, Scope,
};
use serde_json::{Value, json};

pub(super) fn dispatch(
    server: &mut RpcServer,
    op: &str,
    args: Args,
) -> Option<Result<Value, Value>> {
    let out = match op {
        "list" => server.prospects_list(&args),
        "get" => server.prospects_get(&args),
        "create" => server.prospects_create(&args),
        "update" => server.prospects_update(&args),
        "delete" => server.prospects_delete(&args),
        "move" => server.prospects_move(&args),
        "confirm_demo" => server.prospects_confirm_demo(&args),
        "cancel_demo" => server.prospects_cancel_demo(&args),
        "stats" => server.prospects_stats(&args),
        "book_demo" => server.prospects_book_demo(&args),
        _ => return None,
    };
    Some(out)
}

impl RpcServer {
    fn prospects_list(&self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let rows = self.store.list_prospects(&scope).map_err(store_err)?;
        Ok(ai_ok(
            "prospects_list",
            json!({
                "org": scope.organization.as_str(),
                "count": rows.len(),
                "columns": board_json(&rows),
                "team": team_json(team_for_org(scope.organization.as_str())),
            }),
        ))
    }

    fn prospects_get(&self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let id = require_item_id(args, "id")?;
        let row = self.store.get_prospect(&scope, &id).map_err(store_err)?;
        let demos = self.store.prospect_demos(&scope, &id).map_err(store_err)?;
        Ok(ai_ok(
            "prospects_get",
            json!({
                "prospect": prospect_json(&row),
                "demos": events_json(&demos),
            }),
        ))
    }

    fn prospects_create(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let name = require_string(args, "name")?;
        let stage = optional_stage(args, "stage")?.unwrap_or(PipelineStage::NotContacted);

        let mut request = ProspectCreateRequest::new(name, stage);
        request.kind = optional_string(args, "kind")?.unwrap_or_default();
        request.country = optional_string(args, "country")?.unwrap_or_default();
        request.city = optional_string(args, "city")?.unwrap_or_default();
        request.website = optional_string(args, "website")?;
        request.phone = optional_string(args, "phone")?;
        request.email = optional_string(args, "email")?;
        if let Some(priority) = optional_priority(args, "priority")? {
            request.priority = priority;
        }
        if let Some(lead_source) = optional_lead_source(args, "lead_source")? {
            request.lead_source = lead_source;
        }
        request.assigned_to = optional_string(args, "assigned_to")?;
        request.notes = optional_string(args, "notes")?;
        request.next_action = optional_string(args, "next_action")?;
        request.next_action_date = optional_string(args, "next_action_date")?;

        let row = self
            .store
            .create_prospect(&scope, request)
            .map_err(store_err)?;
        Ok(ai_ok(
            "prospects_create",
            json!({ "prospect": prospect_json(&row) }),
        ))
    }

    fn prospects_update(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let id = require_item_id(args, "id")?;
        if args.contains_key("stage") || args.contains_key("sort_index") {
            return Err(ai_error_with(
                "INVALID_INPUT",
                "stage and sort_index cannot be edited directly",
                Some("Use prospects.move to change a prospect's column or position"),
            ));
        }

        let patch = ProspectPatch {
            name: optional_string(args, "name")?,
            kind: optional_string(args, "kind")?,
            country: optional_string(args, "country")?,
            city: optional_string(args, "city")?,
            website: optional_nullable_string(args, "website")?,
            phone: optional_nullable_string(args, "phone")?,
            email: optional_nullable_string(args, "email")?,
            priority: optional_priority(args, "priority")?,
            lead_source: optional_lead_source(args, "lead_source")?,
            assigned_to: optional_nullable_string(args, "assigned_to")?,
            notes: optional_nullable_string(args, "notes")?,
            next_action: optional_nullable_string(args, "next_action")?,
            next_action_date: optional_nullable_string(args, "next_action_date")?,
        };
        let row = self
            .store
            .update_prospect(&scope, &id, patch)
            .map_err(store_err)?;
        Ok(ai_ok(
            "prospects_update",
            json!({ "prospect": prospect_json(&row) }),
        ))
    }

    fn prospects_delete(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let id = require_item_id(args, "id")?;
        self.store.delete_prospect(&scope, &id).map_err(store_err)?;
        self.pending
            .retain(|_, pending| !pending.holds(&scope, &id));
        Ok(ai_ok("prospects_delete", json!({ "deleted": id.as_str() })))
    }

    fn prospects_move(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let mv = require_move(args, "source_stage", "dest_stage", optional_stage)?;

        match self.store.move_prospect(&scope, &mv).map_err(store_err)? {
            ProspectMove::Applied(result) => {
                let (body, warnings) = move_result_body(&result, "columns", board_json, |stage| {
                    stage.as_str().to_string()
                });
                Ok(ai_ok_with_warnings("prospects_move", body, warnings))
            }
            ProspectMove::Pending(change) => {
                let mut body = json!({
                    "status": "pending_demo",
                    "prospect_id": change.item_id.as_str(),
                    "demo": change.demo.label(),
                    "from": change.from.as_str(),
                    "to": change.demo.stage().as_str(),
                    "columns": board_json(change.optimistic_items()),
                });
                body["token"] = json!(self.hold_pending(scope, change));
                Ok(ai_ok("prospects_move", body))
            }
            ProspectMove::Unchanged { items, reason } => Ok(ai_ok(
                "prospects_move",
                json!({
                    "status": "unchanged",
                    "reason": reason.as_str(),
                    "reload": reason.is_invalid_move(),
                    "columns": board_json(&items),
                }),
            )),
        }
    }

    fn prospects_confirm_demo(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let token = require_string(args, "token")?;
        let slot = require_slot(args)?;
        let responsible = optional_assignee(args, "responsible")?;
        let PendingDemo { change, .. } = self.take_pending(&scope, &token)?;

        let confirmed = self
            .store
            .confirm_demo(&scope, change, DemoSchedule { slot, responsible })
            .map_err(|err| {
                tracing::warn!(token = token.as_str(), error = %err, "demo confirmation failed");
                store_err(err)
            })?;
        let (mut body, warnings) = move_result_body(&confirmed.result, "columns", board_json, |stage| {
            stage.as_str().to_string()
        });
        if let Some(obj) = body.as_object_mut() {
            obj.insert("event".to_string(), event_json(&confirmed.event));
        }
        Ok(ai_ok_with_warnings("prospects_confirm_demo", body, warnings))
    }

    fn prospects_cancel_demo(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let token = require_string(args, "token")?;
        let PendingDemo { change, .. } = self.take_pending(&scope, &token)?;
        let prospect_id = change.item_id.as_str().to_string();
        let snapshot = change.cancel();
        Ok(ai_ok(
            "prospects_cancel_demo",
            json!({
                "status": "cancelled",
                "prospect_id": prospect_id,
                "columns": board_json(&snapshot),
            }),
        ))
    }

    fn prospects_stats(&self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let stats = self.store.pipeline_stats(&scope).map_err(store_err)?;
        let mut body = stats_json(&stats);
        body["org"] = json!(scope.organization.as_str());
        Ok(ai_ok("prospects_stats", body))
    }

    /// A demo booked from the public website: `{name, email, company, phone?, date, time}`.
    /// `today` overrides the clock for the past/horizon check.
    fn prospects_book_demo(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let today = optional_day(args, "today")?.unwrap_or_else(DayBucket::today_utc);
        let day = require_day(args, "date")?;
        let time = require_string(args, "time")?;
        let slot = booking_slot(today, day, &time).map_err(|err| {
            ai_error_with(
                "INVALID_INPUT",
                err.message(),
                Some("Pick a start between 09:00 and 16:00, from today up to 60 days ahead"),
            )
        })?;
        let responsible = match optional_assignee(args, "responsible")? {
            Some(assignee) => assignee,
            None => default_demo_host(scope.organization.as_str()),
        };

        let request = PublicDemoRequest {
            contact_name: require_string(args, "name")?,
            email: require_string(args, "email")?,
            company: require_string(args, "company")?,
            phone: optional_string(args, "phone")?,
            slot,
            location: optional_string(args, "location")?,
            responsible,
        };
        let booking = self
            .store
            .book_public_demo(&scope, request)
            .map_err(store_err)?;
        self.pending
            .retain(|_, pending| !pending.holds(&scope, &booking.prospect.id));
        Ok(ai_ok(
            "prospects_book_demo",
            json!({
                "created": booking.created,
                "demo": booking.demo.label(),
                "prospect": prospect_json(&booking.prospect),
                "event": event_json(&booking.event),
            }),
        ))
    }

    /// Stores a gated change under a fresh token. A newer drag of the same prospect replaces
    /// the older one, and the oldest entry goes once the map is full.
    fn hold_pending(&mut self, scope: Scope, change: PendingStageChange<ProspectRow>) -> String {
        self.pending.retain(|seq, pending| {
            let replaced = pending.holds(&scope, &change.item_id);
            if replaced {
                tracing::debug!(
                    token = pending_token(*seq).as_str(),
                    id = change.item_id.as_str(),
                    "pending demo replaced by a newer drag"
                );
            }
            !replaced
        });
        while self.pending.len() >= MAX_PENDING_DEMOS {
            if let Some((seq, _)) = self.pending.pop_first() {
                tracing::warn!(token = pending_token(seq).as_str(), "pending demo evicted");
            }
        }

        self.pending_seq += 1;
        let token = pending_token(self.pending_seq);
        tracing::info!(
            token = token.as_str(),
            id = change.item_id.as_str(),
            "stage change waiting for a demo time"
        );
        self.pending
            .insert(self.pending_seq, PendingDemo { scope, change });
        token
    }

    /// Removes the change behind `token`, but only for the organization that created it.
    fn take_pending(&mut self, scope: &Scope, token: &str) -> Result<PendingDemo, Value> {
        let seq = token_seq(token)
            .filter(|seq| {
                self.pending
                    .get(seq)
                    .is_some_and(|pending| pending.belongs_to(scope))
            })
            .ok_or_else(|| unknown_token(token))?;
        self.pending.remove(&seq).ok_or_else(|| unknown_token(token))
    }
}

impl PendingDemo {
    fn belongs_to(&self, scope: &Scope) -> bool {
        self.scope.organization == scope.organization
    }

    fn holds(&self, scope: &Scope, id: &ItemId) -> bool {
        self.belongs_to(scope) && &self.change.item_id == id
    }
}

/// First named member of the organization's team; the shared "Team" lane otherwise.
fn default_demo_host(organization: &str) -> Assignee {
    team_for_org(organization)
        .iter()
        .copied()
        .find(|member| *member != Assignee::Team)
        .unwrap_or(Assignee::Team)
}

fn pending_token(seq: u64) -> String {
    format!("demo-{seq}")
}

fn token_seq(token: &str) -> Option<u64> {
    token.strip_prefix("demo-")?.parse().ok()
}

fn unknown_token(token: &str) -> Value {
    ai_error_with(
        "UNKNOWN_TOKEN",
        &format!("no pending demo for token {token}"),
        Some("The change was already confirmed or cancelled; reload the board"),
    )
}
