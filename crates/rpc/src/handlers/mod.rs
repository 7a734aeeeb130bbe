#![forbid(unsafe_code)]

mod events;
mod prospects;
mod todos;

use crate::{Args, RpcServer, outcome_str, report_json, warning, writes_json};
use sb_core::reorder::Ordered;
use sb_storage::MoveResult;
use serde_json::{Value, json};

pub(crate) const METHODS: &[&str] = &[
    "events.create",
    "events.delete",
    "events.layout",
    "events.list",
    "events.update",
    "prospects.cancel_demo",
    "prospects.confirm_demo",
    "prospects.book_demo",
    "prospects.create",
    "prospects.delete",
    "prospects.get",
    "prospects.list",
    "prospects.move",
    "prospects.stats",
    "prospects.update",
    "todos.create",
    "todos.delete",
    "todos.list",
    "todos.move",
    "todos.roll_over",
    "todos.update",
    "todos.window",
];

/// Runs `name` and returns its envelope, or `None` for a method missing from [`METHODS`].
pub(crate) fn dispatch_handler(server: &mut RpcServer, name: &str, args: Args) -> Option<Value> {
    if !METHODS.contains(&name) {
        return None;
    }
    let (group, op) = name.split_once('.')?;
    let body = match group {
        "prospects" => prospects::dispatch(server, op, args),
        "todos" => todos::dispatch(server, op, args),
        "events" => events::dispatch(server, op, args),
        _ => None,
    }?;
    Some(body.unwrap_or_else(|err| err))
}

/// Envelope body shared by every applied move: status, write-set, persistence report, and the
/// rows the client should now show under `items_key`.
pub(super) fn move_result_body<T: Ordered>(
    result: &MoveResult<T>,
    items_key: &str,
    items_json: impl Fn(&[T]) -> Value,
    bucket: impl Fn(&T::Bucket) -> String,
) -> (Value, Vec<Value>) {
    let mut warnings = Vec::new();
    if result.report.needs_reload() {
        warnings.push(warning(
            "WRITES_FAILED",
            &format!(
                "{} of {} writes failed",
                result.report.failed.len(),
                result.reassignment.writes.len()
            ),
            "Rows below were re-read from the store; discard the local order",
        ));
    }

    let mut body = serde_json::Map::new();
    body.insert(
        "status".to_string(),
        json!(outcome_str(&result.reassignment.outcome)),
    );
    body.insert(
        "writes".to_string(),
        writes_json(&result.reassignment.writes, bucket),
    );
    body.insert("report".to_string(), report_json(&result.report));
    body.insert("reloaded".to_string(), json!(result.reloaded.is_some()));
    body.insert(items_key.to_string(), items_json(result.current_items()));
    (Value::Object(body), warnings)
}
