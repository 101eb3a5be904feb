#![forbid(unsafe_code)]

use super::*;
use crate::JsonRpcRequest;
use tt_core::TaskId;
use tt_storage::{
    DocumentStorage, DocumentationArtifact, MarkdownRenderer, MemoryDocumentStore, NoopEventSink,
    SessionRecord, Storage, StoreError, TaskRecord, ThoughtRecord,
};

fn memory_server() -> McpServer {
    let storage = Arc::new(DocumentStorage::new(MemoryDocumentStore::new()));
    server_over(storage)
}

fn server_over(storage: Arc<dyn Storage>) -> McpServer {
    let store = Arc::new(SessionStore::new(storage, Arc::new(NoopEventSink)));
    let mut server = McpServer::new(store, Arc::new(MarkdownRenderer));
    let init = server.handle(request(json!({
        "jsonrpc": "2.0", "id": 0, "method": "initialize", "params": {}
    })));
    assert!(init.is_some());
    server
}

fn request(value: Value) -> JsonRpcRequest {
    serde_json::from_value(value).expect("request")
}

fn call(server: &mut McpServer, name: &str, args: Value) -> Value {
    let resp = server
        .handle(request(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": name, "arguments": args }
        })))
        .expect("response");
    let text = resp["result"]["content"][0]["text"]
        .as_str()
        .expect("content text");
    let payload: Value = serde_json::from_str(text).expect("payload json");
    assert_eq!(
        resp["result"]["isError"].as_bool(),
        payload["success"].as_bool().map(|ok| !ok)
    );
    payload
}

fn step(number: u32, total: u32, next: bool) -> Value {
    json!({
        "thought": format!("step {number}"),
        "thoughtNumber": number,
        "totalThoughts": total,
        "nextThoughtNeeded": next
    })
}

#[test]
fn requests_before_initialize_are_rejected() {
    let store = Arc::new(SessionStore::new(
        Arc::new(DocumentStorage::new(MemoryDocumentStore::new())),
        Arc::new(NoopEventSink),
    ));
    let mut server = McpServer::new(store, Arc::new(MarkdownRenderer));
    let resp = server
        .handle(request(json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/list" })))
        .expect("response");
    assert_eq!(resp["error"]["code"], crate::NOT_INITIALIZED);
}

#[test]
fn tools_list_names_every_tool() {
    let mut server = memory_server();
    let resp = server
        .handle(request(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" })))
        .expect("response");
    let mut names = resp["result"]["tools"]
        .as_array()
        .expect("tools")
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(
        names,
        vec![
            "create_task",
            "finalize_session",
            "get_context",
            "list_sessions",
            "sequential_thinking",
            "update_task",
        ]
    );
}

#[test]
fn unknown_tool_and_method_are_distinct_errors() {
    let mut server = memory_server();
    let payload = call(&mut server, "nope", json!({}));
    assert_eq!(payload["error"]["code"], "UNKNOWN_TOOL");

    let resp = server
        .handle(request(json!({ "jsonrpc": "2.0", "id": 9, "method": "resources/list" })))
        .expect("response");
    assert_eq!(resp["error"]["code"], crate::METHOD_NOT_FOUND);

    let none = server.handle(request(
        json!({ "jsonrpc": "2.0", "method": "notifications/cancelled" }),
    ));
    assert!(none.is_none());
}

#[test]
fn thoughts_continue_the_same_store_session() {
    let mut server = memory_server();
    let first = call(&mut server, "sequential_thinking", step(1, 3, true));
    assert_eq!(first["success"], true);
    assert_eq!(first["result"]["persisted"], true);
    assert_eq!(first["result"]["thoughtHistoryLength"], 1);
    let session = first["result"]["sessionId"].as_str().expect("id").to_string();

    let second = call(&mut server, "sequential_thinking", step(5, 3, true));
    assert_eq!(second["result"]["totalThoughts"], 5);
    assert_eq!(second["result"]["sessionId"], session.as_str());

    let context = call(&mut server, "get_context", json!({}));
    assert_eq!(context["result"]["session"]["thoughtCount"], 2);
    assert_eq!(context["result"]["thoughts"][1]["thoughtNumber"], 5);
}

#[test]
fn invalid_thought_is_a_tool_error_and_leaves_state_alone() {
    let mut server = memory_server();
    call(&mut server, "sequential_thinking", step(1, 2, true));

    let payload = call(
        &mut server,
        "sequential_thinking",
        json!({ "thought": "x", "thoughtNumber": "2", "totalThoughts": 2, "nextThoughtNeeded": true }),
    );
    assert_eq!(payload["success"], false);
    assert_eq!(payload["error"]["code"], "INVALID_INPUT");

    let dangling = call(
        &mut server,
        "sequential_thinking",
        json!({
            "thought": "revise", "thoughtNumber": 2, "totalThoughts": 2,
            "nextThoughtNeeded": true, "isRevision": true, "revisesThought": 7
        }),
    );
    assert_eq!(dangling["error"]["code"], "UNKNOWN_REFERENCE");

    assert_eq!(server.snapshot().thought_history_length, 1);
    let context = call(&mut server, "get_context", json!({}));
    assert_eq!(context["result"]["session"]["thoughtCount"], 1);
}

#[test]
fn branches_are_reported_in_first_seen_order() {
    let mut server = memory_server();
    call(&mut server, "sequential_thinking", step(1, 3, true));
    for branch in ["beta", "alpha", "beta"] {
        call(
            &mut server,
            "sequential_thinking",
            json!({
                "thought": format!("on {branch}"), "thoughtNumber": 2, "totalThoughts": 3,
                "nextThoughtNeeded": true, "branchFromThought": 1, "branchId": branch
            }),
        );
    }
    let last = call(&mut server, "sequential_thinking", step(3, 3, true));
    assert_eq!(last["result"]["branches"], json!(["beta", "alpha"]));
}

#[test]
fn task_commit_and_final_thought_finalize_the_session() {
    let mut server = memory_server();
    call(&mut server, "sequential_thinking", step(1, 2, true));
    let mut last = step(2, 2, false);
    last["taskCommit"] = json!({ "title": "Write the answer" });
    let payload = call(&mut server, "sequential_thinking", last);

    assert_eq!(payload["result"]["task"]["status"], "completed");
    let summary = payload["result"]["documentation"]["summary"]
        .as_str()
        .expect("summary");
    assert!(summary.contains("2 thoughts"), "{summary}");
    assert!(summary.contains("1 completed task"), "{summary}");

    let sessions = call(&mut server, "list_sessions", json!({}));
    assert_eq!(sessions["result"]["count"], 1);
    assert_eq!(sessions["result"]["sessions"][0]["status"], "completed");
    assert_eq!(sessions["result"]["sessions"][0]["taskCount"], 1);
}

#[test]
fn task_commit_without_title_is_a_warning() {
    let mut server = memory_server();
    let mut args = step(1, 1, true);
    args["taskCommit"] = json!({ "taskId": "t-unknown" });
    let payload = call(&mut server, "sequential_thinking", args);
    assert_eq!(payload["success"], true);
    assert_eq!(payload["result"]["persisted"], true);
    assert_eq!(payload["warnings"][0]["code"], "TASK_NOT_COMMITTED");
}

#[test]
fn task_tools_round_trip() {
    let mut server = memory_server();
    call(&mut server, "sequential_thinking", step(1, 2, true));

    let created = call(&mut server, "create_task", json!({ "title": "Outline" }));
    let task_id = created["result"]["task"]["taskId"]
        .as_str()
        .expect("task id")
        .to_string();
    assert_eq!(created["result"]["task"]["status"], "pending");

    let moved = call(
        &mut server,
        "update_task",
        json!({ "taskId": task_id, "status": "in_progress" }),
    );
    assert_eq!(moved["result"]["updated"], true);

    let backwards = call(
        &mut server,
        "update_task",
        json!({ "taskId": task_id, "status": "pending" }),
    );
    assert_eq!(backwards["result"]["updated"], false);
    assert_eq!(backwards["warnings"][0]["code"], "TASK_NOT_UPDATED");

    let bad = call(
        &mut server,
        "update_task",
        json!({ "taskId": task_id, "status": "done" }),
    );
    assert_eq!(bad["error"]["code"], "INVALID_INPUT");

    let context = call(&mut server, "get_context", json!({}));
    assert_eq!(context["result"]["session"]["taskCount"], 0);
    assert_eq!(context["result"]["tasks"][0]["status"], "in_progress");
}

#[test]
fn get_context_for_unknown_session_is_not_found() {
    let mut server = memory_server();
    let payload = call(&mut server, "get_context", json!({ "sessionId": "missing" }));
    assert_eq!(payload["error"]["code"], "NOT_FOUND");

    let payload = call(&mut server, "get_context", json!({}));
    assert_eq!(payload["error"]["code"], "INVALID_INPUT");
}

struct BrokenStorage;

fn broken() -> StoreError {
    StoreError::Io(std::io::Error::other("disk unavailable"))
}

impl Storage for BrokenStorage {
    fn create_session(&self, _: &SessionRecord) -> Result<(), StoreError> {
        Err(broken())
    }
    fn get_session(&self, _: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        Err(broken())
    }
    fn update_session(&self, _: &SessionRecord) -> Result<(), StoreError> {
        Err(broken())
    }
    fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        Err(broken())
    }
    fn delete_session(&self, _: &SessionId) -> Result<(), StoreError> {
        Err(broken())
    }
    fn append_thought(&self, _: &ThoughtRecord) -> Result<(), StoreError> {
        Err(broken())
    }
    fn list_thoughts(&self, _: &SessionId) -> Result<Vec<ThoughtRecord>, StoreError> {
        Err(broken())
    }
    fn create_task(&self, _: &TaskRecord) -> Result<(), StoreError> {
        Err(broken())
    }
    fn get_task(&self, _: &SessionId, _: &TaskId) -> Result<Option<TaskRecord>, StoreError> {
        Err(broken())
    }
    fn list_tasks(&self, _: &SessionId) -> Result<Vec<TaskRecord>, StoreError> {
        Err(broken())
    }
    fn update_task(&self, _: &TaskRecord) -> Result<bool, StoreError> {
        Err(broken())
    }
    fn save_documentation(&self, _: &DocumentationArtifact) -> Result<(), StoreError> {
        Err(broken())
    }
    fn get_documentation(
        &self,
        _: &SessionId,
    ) -> Result<Option<DocumentationArtifact>, StoreError> {
        Err(broken())
    }
}

#[test]
fn store_failures_keep_the_reasoning_result() {
    let mut server = server_over(Arc::new(BrokenStorage));
    let payload = call(&mut server, "sequential_thinking", step(1, 2, false));
    assert_eq!(payload["success"], true);
    assert_eq!(payload["result"]["persisted"], false);
    assert_eq!(payload["result"]["thoughtHistoryLength"], 1);
    assert!(payload["result"].get("documentation").is_none());
    assert_eq!(payload["warnings"][0]["code"], "STORE_ERROR");

    let sessions = call(&mut server, "list_sessions", json!({}));
    assert_eq!(sessions["result"]["count"], 0);
}
