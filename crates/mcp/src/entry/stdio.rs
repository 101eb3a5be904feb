#![forbid(unsafe_code)]

use crate::{McpServer, PARSE_ERROR, json_rpc_error, parse_request};
use serde_json::Value;
use std::io::{self, BufRead, Read, Write};

const MAX_CONTENT_LENGTH_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StdioMode {
    NewlineJson,
    ContentLength,
}

fn detect_mode_from_first_line(line: &[u8]) -> Option<StdioMode> {
    let trimmed = line.trim_ascii_start();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with(b"{") || trimmed.starts_with(b"[") {
        return Some(StdioMode::NewlineJson);
    }
    // Header framing; some clients send Content-Type before Content-Length.
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with(b"content-length:") || lower.starts_with(b"content-type:") {
        return Some(StdioMode::ContentLength);
    }
    None
}

fn parse_content_length_header(line: &[u8]) -> Option<usize> {
    let line = std::str::from_utf8(line).ok()?;
    let (key, value) = line.trim().split_once(':')?;
    if !key.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse::<usize>().ok()
}

enum Frame {
    Body(Vec<u8>),
    /// The frame was consumed but cannot be dispatched; the message goes back as a parse error.
    Rejected(&'static str),
    Eof,
}

/// Reads the rest of a header block starting at `header` and then the body.
fn read_content_length_frame<R: BufRead>(reader: &mut R, mut header: Vec<u8>) -> io::Result<Frame> {
    let mut content_length = parse_content_length_header(&header);
    while !header.trim_ascii().is_empty() {
        header.clear();
        if reader.read_until(b'\n', &mut header)? == 0 {
            return Ok(Frame::Eof);
        }
        if content_length.is_none() {
            content_length = parse_content_length_header(&header);
        }
    }

    let Some(len) = content_length else {
        return Ok(Frame::Rejected("Missing Content-Length header"));
    };
    if len > MAX_CONTENT_LENGTH_BYTES {
        io::copy(&mut reader.by_ref().take(len as u64), &mut io::sink())?;
        return Ok(Frame::Rejected("Content-Length exceeds max allowed size"));
    }

    let mut body = vec![0u8; len];
    match reader.read_exact(&mut body) {
        Ok(()) => Ok(Frame::Body(body)),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(Frame::Eof),
        Err(err) => Err(err),
    }
}

fn write_response<W: Write>(writer: &mut W, mode: StdioMode, resp: &Value) -> io::Result<()> {
    match mode {
        StdioMode::NewlineJson => {
            writeln!(writer, "{}", serde_json::to_string(resp)?)?;
        }
        StdioMode::ContentLength => {
            let body = serde_json::to_vec(resp)?;
            write!(writer, "Content-Length: {}\r\n\r\n", body.len())?;
            writer.write_all(&body)?;
        }
    }
    writer.flush()
}

fn handle_message<W: Write>(
    server: &mut McpServer,
    writer: &mut W,
    mode: StdioMode,
    body: &[u8],
) -> io::Result<()> {
    let resp = match parse_request(body) {
        Ok(request) => server.handle(request),
        Err(resp) => Some(resp),
    };
    match resp {
        Some(resp) => write_response(writer, mode, &resp),
        None => Ok(()),
    }
}

/// Serves one implicit session over a byte stream until EOF.
///
/// Framing is detected once, from the first non-empty line, and kept for the whole stream.
/// Malformed input, including bytes that are not UTF-8, is answered with a JSON-RPC error;
/// only failures of the stream itself end the loop.
pub fn serve_stream<R: BufRead, W: Write>(
    server: &mut McpServer,
    mut reader: R,
    mut writer: W,
) -> io::Result<()> {
    let mut mode: Option<StdioMode> = None;

    loop {
        let mut line = Vec::new();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let current = match mode {
            Some(v) => v,
            None => match detect_mode_from_first_line(&line) {
                Some(detected) => {
                    tracing::debug!(mode = ?detected, "stdio framing detected");
                    mode = Some(detected);
                    detected
                }
                None => continue,
            },
        };

        match current {
            StdioMode::NewlineJson => {
                let raw = line.trim_ascii();
                if raw.is_empty() {
                    continue;
                }
                handle_message(server, &mut writer, current, raw)?;
            }
            StdioMode::ContentLength => {
                if line.trim_ascii().is_empty() {
                    continue;
                }
                match read_content_length_frame(&mut reader, line)? {
                    Frame::Body(body) => handle_message(server, &mut writer, current, &body)?,
                    Frame::Rejected(reason) => {
                        tracing::warn!(reason, "dropping unreadable stdio frame");
                        let resp = json_rpc_error(None, PARSE_ERROR, reason);
                        write_response(&mut writer, current, &resp)?;
                    }
                    Frame::Eof => break,
                }
            }
        }
    }

    Ok(())
}

pub fn run_stdio(server: &mut McpServer) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    tracing::info!("serving MCP on stdio");
    serve_stream(server, stdin.lock(), stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;
    use tt_storage::{
        DocumentStorage, MarkdownRenderer, MemoryDocumentStore, NoopEventSink, SessionStore,
    };

    fn server() -> McpServer {
        let store = SessionStore::new(
            Arc::new(DocumentStorage::new(MemoryDocumentStore::new())),
            Arc::new(NoopEventSink),
        );
        McpServer::new(Arc::new(store), Arc::new(MarkdownRenderer))
    }

    fn run(input: &str) -> String {
        run_bytes(input.as_bytes())
    }

    fn run_bytes(input: &[u8]) -> String {
        let mut out = Vec::new();
        serve_stream(&mut server(), Cursor::new(input), &mut out).expect("serve");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn newline_framing_answers_each_request() {
        let out = run(concat!(
            "\n",
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
            "{oops\n",
        ));
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3, "{out}");
        let ping: Value = serde_json::from_str(lines[1]).expect("json");
        assert_eq!(ping["id"], 2);
        let parse_error: Value = serde_json::from_str(lines[2]).expect("json");
        assert_eq!(parse_error["error"]["code"], -32700);
    }

    #[test]
    fn newline_framing_survives_invalid_utf8() {
        let mut input = Vec::new();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#);
        input.push(b'\n');
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"pi\xffng\"}\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#);
        input.push(b'\n');

        let out = run_bytes(&input);
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3, "{out}");
        let parse_error: Value = serde_json::from_str(lines[1]).expect("json");
        assert_eq!(parse_error["error"]["code"], -32700);
        let ping: Value = serde_json::from_str(lines[2]).expect("json");
        assert_eq!(ping["id"], 3);
        assert!(ping.get("error").is_none(), "{ping}");
    }

    #[test]
    fn content_length_framing_rejects_bad_frames_and_continues() {
        let init = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
        let ping = r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#;
        let mut input = Vec::new();
        input.extend_from_slice(format!("Content-Length: {}\r\n\r\n{init}", init.len()).as_bytes());
        input.extend_from_slice(b"Content-Type: \xff\r\n\r\n");
        input.extend_from_slice(format!("Content-Length: {}\r\n\r\n{ping}", ping.len()).as_bytes());

        let out = run_bytes(&input);
        let bodies = out
            .split("Content-Length: ")
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| {
                let (_, body) = chunk.split_once("\r\n\r\n").expect("frame");
                serde_json::from_str::<Value>(body).expect("json")
            })
            .collect::<Vec<_>>();
        assert_eq!(bodies.len(), 3, "{out}");
        assert_eq!(bodies[1]["error"]["code"], -32700);
        assert_eq!(bodies[2]["id"], 2);
    }

    #[test]
    fn content_length_framing_round_trips() {
        let body = r#"{"jsonrpc":"2.0","id":7,"method":"initialize","params":{}}"#;
        let input = format!(
            "Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let out = run(&input);
        let (headers, payload) = out.split_once("\r\n\r\n").expect("frame");
        assert_eq!(headers, format!("Content-Length: {}", payload.len()));
        let resp: Value = serde_json::from_str(payload).expect("json");
        assert_eq!(resp["result"]["protocolVersion"], crate::MCP_VERSION);
    }

    #[test]
    fn content_length_header_parsing() {
        assert_eq!(parse_content_length_header(b"Content-Length: 42\r\n"), Some(42));
        assert_eq!(parse_content_length_header(b"content-length:7"), Some(7));
        assert_eq!(parse_content_length_header(b"Content-Type: x"), None);
        assert_eq!(parse_content_length_header(b"Content-Length: \xff"), None);
        assert_eq!(detect_mode_from_first_line(b"   "), None);
        assert_eq!(
            detect_mode_from_first_line(b"{\"a\":1}"),
            Some(StdioMode::NewlineJson)
        );
    }
}
