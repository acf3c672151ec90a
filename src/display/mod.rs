//! Console formatting for response payloads.
//!
//! Everything here returns lines instead of printing them:
//! - `text`: line limits, truncation and wrapping
//! - `json`: pretty JSON and depth-limited JSON trees

pub mod json;
pub mod text;

pub use json::{format_data, json_head, traverse_json};
pub use text::{format_text, process_line, text_head, FormatError, LineFormat, Overflow};
