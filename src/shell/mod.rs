//! Purpose: Interactive shell on top of a `RowStore`.
//! Exports: `Interpreter`, `Flow`, `Repl`, `run_lines`, completion and history helpers.
//! Role: Everything between a typed line and rendered rows.
//! Invariants: The interpreter is sink-agnostic; only `Repl` touches the terminal.
pub mod complete;
pub mod history;
pub mod interpreter;
pub mod repl;

pub use complete::{ShellHelper, Suggestions};
pub use interpreter::{Flow, Interpreter, Verb};
pub use repl::{Repl, run_lines};
