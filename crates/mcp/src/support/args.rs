#![forbid(unsafe_code)]

use super::ai::ai_error;
use serde_json::{Map, Value};

pub(crate) type Args = Map<String, Value>;

pub(crate) fn args_object(args: &Value) -> Result<&Args, Value> {
    match args {
        Value::Object(obj) => Ok(obj),
        _ => Err(ai_error("INVALID_INPUT", "arguments must be an object")),
    }
}

pub(crate) fn require_string(args: &Args, key: &str) -> Result<String, Value> {
    match optional_string(args, key)? {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must not be empty"),
        )),
        None => Err(ai_error("INVALID_INPUT", &format!("{key} is required"))),
    }
}

pub(crate) fn optional_string(args: &Args, key: &str) -> Result<Option<String>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::String(v) => Ok(Some(v.to_string())),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a string"),
        )),
    }
}

pub(crate) fn optional_positive_u32(args: &Args, key: &str) -> Result<Option<u32>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    let invalid = || {
        ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a positive integer"),
        )
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .filter(|v| *v > 0)
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

pub(crate) fn optional_object<'a>(args: &'a Args, key: &str) -> Result<Option<&'a Args>, Value> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(obj)) => Ok(Some(obj)),
        Some(_) => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be an object"),
        )),
    }
}
