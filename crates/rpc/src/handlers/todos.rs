#![forbid(unsafe_code)]

use super::move_result_body;
use crate::*;
use sb_core::calendar::{DayBucket, rolling_window};
use sb_core::model::Assignee;
use sb_storage::{TodoCreateRequest, TodoPatch, TodoRange, TodoRow};
use serde_json::{Value, json};

pub(super) fn dispatch(
    server: &mut RpcServer,
    op: &str,
    args: Args,
) -> Option<Result<Value, Value>> {
    let out = match op {
        "list" => server.todos_list(&args),
        "create" => server.todos_create(&args),
        "update" => server.todos_update(&args),
        "delete" => server.todos_delete(&args),
        "move" => server.todos_move(&args),
        "roll_over" => server.todos_roll_over(&args),
        "window" => server.todos_window(&args),
        _ => return None,
    };
    Some(out)
}

fn today_arg(args: &Args) -> Result<DayBucket, Value> {
    Ok(optional_day(args, "today")?.unwrap_or_else(DayBucket::today_utc))
}

fn calendar_err(err: sb_core::calendar::CalendarError) -> Value {
    ai_error("INVALID_INPUT", err.message())
}

impl RpcServer {
    fn todos_list(&self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let range = TodoRange {
            from: optional_day(args, "from")?,
            until: optional_day(args, "until")?,
        };
        let rows = self.store.list_todos(&scope, range).map_err(store_err)?;
        Ok(ai_ok(
            "todos_list",
            json!({ "count": rows.len(), "todos": todos_json(&rows) }),
        ))
    }

    fn todos_create(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let request = TodoCreateRequest {
            title: require_string(args, "title")?,
            description: optional_string(args, "description")?,
            assigned_to: optional_assignee(args, "assigned_to")?.unwrap_or(Assignee::Team),
            due: require_day(args, "due_date")?,
        };
        let row = self.store.create_todo(&scope, request).map_err(store_err)?;
        Ok(ai_ok("todos_create", json!({ "todo": todo_json(&row) })))
    }

    fn todos_update(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let id = require_item_id(args, "id")?;
        if args.contains_key("due_date") || args.contains_key("display_order") {
            return Err(ai_error_with(
                "INVALID_INPUT",
                "due_date and display_order cannot be edited directly",
                Some("Use todos.move to change a todo's day or position"),
            ));
        }

        let patch = TodoPatch {
            title: optional_string(args, "title")?,
            description: optional_nullable_string(args, "description")?,
            completed: optional_bool(args, "completed")?,
            assigned_to: optional_assignee(args, "assigned_to")?,
            screenshot_url: optional_nullable_string(args, "screenshot_url")?,
        };
        let row = self
            .store
            .update_todo(&scope, &id, patch)
            .map_err(store_err)?;
        Ok(ai_ok("todos_update", json!({ "todo": todo_json(&row) })))
    }

    fn todos_delete(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let id = require_item_id(args, "id")?;
        self.store.delete_todo(&scope, &id).map_err(store_err)?;
        Ok(ai_ok("todos_delete", json!({ "deleted": id.as_str() })))
    }

    fn todos_move(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let mv = require_move(args, "source_date", "dest_date", optional_day)?;
        let result = self.store.move_todo(&scope, &mv).map_err(store_err)?;
        let (body, warnings) = move_result_body(
            &result,
            "todos",
            |rows: &[TodoRow]| todos_json(rows),
            |day| day.to_string(),
        );
        Ok(ai_ok_with_warnings("todos_move", body, warnings))
    }

    /// Carries yesterday's open todos to the end of today unless `from` / `to` say otherwise.
    fn todos_roll_over(&mut self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let to = match optional_day(args, "to")? {
            Some(day) => day,
            None => today_arg(args)?,
        };
        let from = match optional_day(args, "from")? {
            Some(day) => day,
            None => to.previous_day().map_err(calendar_err)?,
        };
        let result = self
            .store
            .roll_over_todos(&scope, from, to)
            .map_err(store_err)?;
        let (mut body, warnings) = move_result_body(
            &result,
            "todos",
            |rows: &[TodoRow]| todos_json(rows),
            |day| day.to_string(),
        );
        if let Some(obj) = body.as_object_mut() {
            obj.insert("from".to_string(), json!(from.to_string()));
            obj.insert("to".to_string(), json!(to.to_string()));
        }
        Ok(ai_ok_with_warnings("todos_roll_over", body, warnings))
    }

    /// The rolling day columns of the todo board, starting today.
    fn todos_window(&self, args: &Args) -> Result<Value, Value> {
        let scope = self.scope_for(args)?;
        let today = today_arg(args)?;
        let days = optional_usize(args, "days")?.unwrap_or(self.window_days);
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(ai_error(
                "INVALID_INPUT",
                &format!("days must be in 1..={MAX_WINDOW_DAYS}"),
            ));
        }

        let window = rolling_window(today, days).map_err(calendar_err)?;
        let until = window.last().map(|day| day.bucket).unwrap_or(today);
        let rows = self
            .store
            .list_todos(
                &scope,
                TodoRange {
                    from: Some(today),
                    until: Some(until),
                },
            )
            .map_err(store_err)?;
        Ok(ai_ok(
            "todos_window",
            json!({ "days": window_json(&window, &rows) }),
        ))
    }
}
