#![forbid(unsafe_code)]

/// Version plus the short git sha of the checkout the binary was built from, when known.
pub fn build_fingerprint() -> String {
    match option_env!("TT_GIT_SHA") {
        Some(sha) if !sha.trim().is_empty() => format!("{}+{}", crate::SERVER_VERSION, sha.trim()),
        _ => crate::SERVER_VERSION.to_string(),
    }
}
