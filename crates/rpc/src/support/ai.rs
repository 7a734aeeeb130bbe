#![forbid(unsafe_code)]

use sb_storage::StoreError;
use serde_json::{Value, json};

pub(crate) fn store_error_code(err: &StoreError) -> &'static str {
    match err {
        StoreError::InvalidInput(_) => "INVALID_INPUT",
        StoreError::UnknownId => "UNKNOWN_ID",
        StoreError::StaleView(_) => "STALE_VIEW",
        StoreError::Io(_) | StoreError::Sql(_) => "STORE_ERROR",
    }
}

pub(crate) fn format_store_error(err: &StoreError) -> String {
    match err {
        StoreError::Io(e) => format!("IO: {e}"),
        StoreError::Sql(e) => format!("SQL: {e}"),
        StoreError::InvalidInput(msg) => format!("Invalid input: {msg}"),
        StoreError::UnknownId => "Unknown id".to_string(),
        StoreError::StaleView(reason) => {
            format!("The board changed since the drag ({})", reason.as_str())
        }
    }
}

pub(crate) fn store_err(err: StoreError) -> Value {
    if matches!(err, StoreError::Io(_) | StoreError::Sql(_)) {
        tracing::error!(error = %err, "store failure");
    }
    let recovery = match err {
        StoreError::StaleView(_) => Some("Reload the board and drag again"),
        _ => None,
    };
    ai_error_with(store_error_code(&err), &format_store_error(&err), recovery)
}

pub(crate) fn warning(code: &str, message: &str, recovery: &str) -> Value {
    json!({
        "code": code,
        "message": message,
        "recovery": recovery
    })
}

pub(crate) fn ai_ok_with_warnings(intent: &str, result: Value, warnings: Vec<Value>) -> Value {
    json!({
        "success": true,
        "intent": intent,
        "result": result,
        "warnings": warnings,
        "error": null
    })
}

pub(crate) fn ai_ok(intent: &str, result: Value) -> Value {
    ai_ok_with_warnings(intent, result, Vec::new())
}

pub(crate) fn ai_error_with(code: &str, message: &str, recovery: Option<&str>) -> Value {
    let mut error_obj = serde_json::Map::new();
    error_obj.insert("code".to_string(), Value::String(code.to_string()));
    error_obj.insert(
        "message".to_string(),
        Value::String(message.trim().to_string()),
    );
    if let Some(recovery) = recovery {
        error_obj.insert(
            "recovery".to_string(),
            Value::String(recovery.trim().to_string()),
        );
    }

    json!({
        "success": false,
        "intent": "error",
        "result": {},
        "warnings": [],
        "error": Value::Object(error_obj)
    })
}

pub(crate) fn ai_error(code: &str, message: &str) -> Value {
    ai_error_with(code, message, None)
}
