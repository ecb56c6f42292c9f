use anyhow::Result;

use crate::interpreter::Value;

/// Something that can run Breeze source text.
pub trait Engine {
    /// Parses and runs `source`, returning the value of its last top-level
    /// expression statement (or top-level `return`), if there was one.
    fn run(&mut self, source: &str) -> Result<Option<Value>>;
}
