//! Text generation over a chat provider with a tool loop.

pub mod text;

pub use text::{generate_text, MAX_TOOL_ITERATIONS};
