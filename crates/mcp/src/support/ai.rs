#![forbid(unsafe_code)]

use serde_json::{Value, json};
use tt_core::ValidationError;
use tt_storage::StoreError;

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

pub(crate) fn ai_error(code: &str, message: &str) -> Value {
    ai_error_with(code, message, None)
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

pub(crate) fn validation_error(err: &ValidationError) -> Value {
    let recovery = match err {
        ValidationError::DanglingReference { .. } => {
            Some("Reference a thoughtNumber that was already submitted in this session.")
        }
        ValidationError::RevisionWithoutTarget => {
            Some("Pass revisesThought with the number of the thought being revised.")
        }
        _ => None,
    };
    ai_error_with(err.code(), &err.to_string(), recovery)
}

pub(crate) fn store_error(err: &StoreError) -> Value {
    let recovery = match err {
        StoreError::UnknownSession(_) => Some("Call list_sessions to see known session ids."),
        _ => None,
    };
    ai_error_with(err.code(), &format_store_error(err), recovery)
}

pub(crate) fn format_store_error(err: &StoreError) -> String {
    match err {
        StoreError::Io(e) => format!("IO: {e}"),
        StoreError::Sql(e) => format!("SQL: {e}"),
        StoreError::Json(e) => format!("Corrupt document: {e}"),
        StoreError::InvalidId(e) => format!("Invalid id: {e}"),
        StoreError::InvalidInput(msg) => format!("Invalid input: {msg}"),
        StoreError::UnknownSession(id) => format!("Session not found: {id}"),
    }
}
