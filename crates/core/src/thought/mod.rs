#![forbid(unsafe_code)]

mod engine;
mod input;

pub use engine::*;
pub use input::*;
