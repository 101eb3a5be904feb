#![forbid(unsafe_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub(crate) const LAST_CRASH_FILE: &str = "tt_mcp_last_crash.txt";

fn write_last_crash(storage_dir: &Path, kind: &str, detail: &str) {
    // Best-effort; never includes request bodies.
    let _ = std::fs::create_dir_all(storage_dir);
    let path = storage_dir.join(LAST_CRASH_FILE);

    let mut out = String::new();
    let ts_ms = tt_storage::unix_ms_now();
    let _ = writeln!(out, "ts={}", tt_storage::rfc3339_from_ms(ts_ms));
    let _ = writeln!(out, "pid={}", std::process::id());
    let _ = writeln!(out, "kind={kind}");
    let _ = writeln!(out, "build={}", super::build_fingerprint());
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let _ = writeln!(out, "cwd={}", cwd.to_string_lossy());
    let _ = writeln!(out, "args={:?}", std::env::args().collect::<Vec<_>>());
    let _ = writeln!(out, "detail={detail}");

    let _ = std::fs::write(path, out);
}

pub fn install_crash_reporter(storage_dir: PathBuf) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let mut detail = info.to_string();
        let backtrace = std::backtrace::Backtrace::force_capture();
        let _ = write!(&mut detail, "\nbacktrace:\n{backtrace}");
        write_last_crash(&storage_dir, "panic", &detail);
        default_hook(info);
    }));
}
