//! Report rendering.

pub mod generator;

pub use generator::{empty_sections, generate_json_report, generate_markdown_report};
