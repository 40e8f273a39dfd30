//! Search tool and the two-round tool-calling protocol.

mod controller;
mod tools;

pub use controller::ToolController;
pub use tools::{parse_tool_call, tool_definitions, Source, ToolCall, ToolContext};
