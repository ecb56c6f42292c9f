//! Runtime for the Breeze scripting language: a tagged value model, a chain
//! of lexical scopes, and a tree-walking evaluator, plus the small lexer and
//! parser that turn source text into the tree it walks.

pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;

mod engine;

pub use engine::Engine;
pub use interpreter::{new_engine as new_interpreter, new_engine_with_io as new_interpreter_with_io};
pub use lexer::Lexer;
pub use parser::Parser;
