//! CLI command implementations.

pub mod canned;
pub mod item;
pub mod list;
pub mod render;
