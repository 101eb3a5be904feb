#![forbid(unsafe_code)]

use serde::Deserialize;
use serde_json::{Value, json};

pub(crate) const PARSE_ERROR: i64 = -32700;
pub(crate) const INVALID_REQUEST: i64 = -32600;
pub(crate) const METHOD_NOT_FOUND: i64 = -32601;
pub(crate) const INVALID_PARAMS: i64 = -32602;
pub(crate) const NOT_INITIALIZED: i64 = -32002;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    #[serde(rename = "jsonrpc")]
    pub(crate) _jsonrpc: Option<String>,
    pub(crate) method: String,
    #[serde(default)]
    pub(crate) id: Option<Value>,
    #[serde(default)]
    pub(crate) params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn is_notification(&self) -> bool {
        matches!(self.id, None | Some(Value::Null))
    }
}

pub(crate) fn json_rpc_response(id: Option<Value>, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub(crate) fn json_rpc_error(id: Option<Value>, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

pub(crate) fn tool_text_content(payload: &Value) -> Value {
    json!({
        "type": "text",
        "text": serde_json::to_string_pretty(payload).unwrap_or_else(|_| "{}".to_string()),
    })
}

/// Parses one JSON-RPC message; the error is a ready-to-send JSON-RPC error response.
pub(crate) fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, Value> {
    let data: Value = serde_json::from_slice(body)
        .map_err(|e| json_rpc_error(None, PARSE_ERROR, &format!("Parse error: {e}")))?;

    let (id, has_method) = match data.as_object() {
        Some(obj) => (obj.get("id").cloned(), obj.contains_key("method")),
        None => {
            return Err(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
        }
    };
    if !has_method {
        return Err(json_rpc_error(id, INVALID_REQUEST, "Invalid Request"));
    }

    serde_json::from_value::<JsonRpcRequest>(data)
        .map_err(|e| json_rpc_error(id, INVALID_REQUEST, &format!("Invalid Request: {e}")))
}
