#![forbid(unsafe_code)]

use serde_json::{Value, json};
use std::sync::Arc;
use tt_core::{EngineSnapshot, SessionId, ThoughtEngine};
use tt_storage::{DocumentationRenderer, SessionStore};

/// One MCP session: a private thought engine plus the store session it writes to.
///
/// The engine is never shared; the store is shared by every session in the process.
pub struct McpServer {
    initialized: bool,
    pub(crate) engine: ThoughtEngine,
    pub(crate) store: Arc<SessionStore>,
    pub(crate) renderer: Arc<dyn DocumentationRenderer>,
    pub(crate) session_id: Option<SessionId>,
}

impl McpServer {
    pub fn new(store: Arc<SessionStore>, renderer: Arc<dyn DocumentationRenderer>) -> Self {
        Self {
            initialized: false,
            engine: ThoughtEngine::new(),
            store,
            renderer,
            session_id: None,
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.engine.snapshot()
    }

    /// The store session the last `sequential_thinking` call resolved to.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn handle(&mut self, request: crate::JsonRpcRequest) -> Option<Value> {
        let method = request.method.as_str();

        if method == "initialize" {
            self.initialized = true;
            return Some(crate::json_rpc_response(
                request.id,
                json!({
                    "protocolVersion": crate::MCP_VERSION,
                    "serverInfo": { "name": crate::SERVER_NAME, "version": crate::SERVER_VERSION },
                    "capabilities": { "tools": {} }
                }),
            ));
        }

        if method == "notifications/initialized" {
            return None;
        }

        if !self.initialized {
            if request.is_notification() {
                return None;
            }
            return Some(crate::json_rpc_error(
                request.id,
                crate::NOT_INITIALIZED,
                "Server not initialized",
            ));
        }

        if method == "ping" {
            return Some(crate::json_rpc_response(request.id, json!({})));
        }

        if method == "tools/list" {
            return Some(crate::json_rpc_response(
                request.id,
                json!({ "tools": crate::handlers::tool_definitions() }),
            ));
        }

        if method == "tools/call" {
            let Some(params_obj) = request.params.as_ref().and_then(|v| v.as_object()) else {
                return Some(crate::json_rpc_error(
                    request.id,
                    crate::INVALID_PARAMS,
                    "params must be an object",
                ));
            };
            let Some(tool_name) = params_obj.get("name").and_then(|v| v.as_str()) else {
                return Some(crate::json_rpc_error(
                    request.id,
                    crate::INVALID_PARAMS,
                    "params.name must be a string",
                ));
            };
            let args = params_obj
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));
            let response_body = self.call_tool(tool_name, args);

            return Some(crate::json_rpc_response(
                request.id,
                json!({
                    "content": [crate::tool_text_content(&response_body)],
                    "isError": !response_body.get("success").and_then(|v| v.as_bool()).unwrap_or(false)
                }),
            ));
        }

        if request.is_notification() {
            return None;
        }
        Some(crate::json_rpc_error(
            request.id,
            crate::METHOD_NOT_FOUND,
            &format!("Method not found: {method}"),
        ))
    }

    pub(crate) fn call_tool(&mut self, name: &str, args: Value) -> Value {
        let Some(resp) = crate::handlers::dispatch_tool(self, name, args) else {
            return crate::ai_error_with(
                "UNKNOWN_TOOL",
                &format!("Unknown tool: {name}"),
                Some("Call tools/list for the available tools."),
            );
        };
        resp
    }
}

#[cfg(test)]
mod tests;
