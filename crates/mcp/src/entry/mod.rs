#![forbid(unsafe_code)]

pub(crate) mod http;
pub(crate) mod stdio;
