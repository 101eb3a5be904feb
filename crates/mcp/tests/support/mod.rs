#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::Value;
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub(crate) struct Server {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    _storage: Option<tempfile::TempDir>,
    storage_dir: PathBuf,
}

impl Server {
    pub(crate) fn start() -> Self {
        Self::start_with_args(&[])
    }

    pub(crate) fn start_with_args(extra_args: &[&str]) -> Self {
        let storage = tempfile::tempdir().expect("create temp dir");
        let storage_dir = storage.path().to_path_buf();
        let mut server = Self::start_in(&storage_dir, extra_args);
        server._storage = Some(storage);
        server
    }

    /// Starts against a caller-owned storage dir, so a second process can reopen it.
    pub(crate) fn start_in(storage_dir: &Path, extra_args: &[&str]) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_tt_mcp"))
            .arg("--storage-dir")
            .arg(storage_dir)
            .args(extra_args)
            .env_remove("THINKTRAIL_TRANSPORT")
            .env_remove("THINKTRAIL_BACKEND")
            .env_remove("THINKTRAIL_LOG_CONSOLE")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn tt_mcp");

        let stdin = child.stdin.take().expect("stdin");
        let stdout = BufReader::new(child.stdout.take().expect("stdout"));

        Self {
            child,
            stdin,
            stdout,
            _storage: None,
            storage_dir: storage_dir.to_path_buf(),
        }
    }

    pub(crate) fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub(crate) fn send(&mut self, req: Value) {
        writeln!(self.stdin, "{req}").expect("write request");
        self.stdin.flush().expect("flush request");
    }

    pub(crate) fn send_raw(&mut self, raw: &str) {
        writeln!(self.stdin, "{raw}").expect("write raw");
        self.stdin.flush().expect("flush raw");
    }

    pub(crate) fn recv(&mut self) -> Value {
        let mut line = String::new();
        self.stdout.read_line(&mut line).expect("read response");
        assert!(!line.trim().is_empty(), "empty response line");
        serde_json::from_str(&line).expect("parse response json")
    }

    pub(crate) fn request(&mut self, req: Value) -> Value {
        self.send(req);
        self.recv()
    }

    pub(crate) fn initialize_default(&mut self) {
        let _ = self.request(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": { "protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": { "name": "test", "version": "0" } }
        }));
        self.send(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
            "params": {}
        }));
    }

    pub(crate) fn start_initialized() -> Self {
        let mut server = Self::start();
        server.initialize_default();
        server
    }

    pub(crate) fn call_tool(&mut self, id: i64, name: &str, arguments: Value) -> Value {
        let resp = self.request(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }));
        extract_tool_text(&resp)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub(crate) fn extract_tool_text(resp: &Value) -> Value {
    let text = resp
        .get("result")
        .and_then(|v| v.get("content"))
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("text"))
        .and_then(|v| v.as_str())
        .expect("result.content[0].text");
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

pub(crate) fn assert_json_rpc_error(resp: &Value, expected_code: i64) {
    let code = resp
        .get("error")
        .and_then(|v| v.get("code"))
        .and_then(|v| v.as_i64())
        .expect("error.code");
    assert_eq!(code, expected_code);
}

pub(crate) fn thought(number: u32, total: u32, next: bool) -> Value {
    json!({
        "thought": format!("thought {number}"),
        "thoughtNumber": number,
        "totalThoughts": total,
        "nextThoughtNeeded": next
    })
}
