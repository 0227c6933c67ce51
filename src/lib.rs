//! Purpose: Library crate behind the `rowshell` binary and its tests.
//! Exports: `core` (data model, decoding, rendering, query building, errors),
//! `api` (row-store capability and implementations), `shell` (interpreter and REPL).
//! Role: Keeps command interpretation testable without a terminal or network.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
pub mod shell;
