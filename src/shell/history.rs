//! Purpose: Resolve where interactive command history is persisted.
//! Exports: `history_path`, `HISTORY_ENV_VAR`.
//! Role: Configuration helper for the REPL; rustyline does the file I/O.
//! Invariants: Default is `~/.rowshell_history`; `ROWSHELL_HISTORY` overrides it.
//! Invariants: An empty `ROWSHELL_HISTORY` disables persistence.
use std::ffi::OsString;
use std::path::PathBuf;

const DEFAULT_HISTORY_FILE: &str = ".rowshell_history";
pub const HISTORY_ENV_VAR: &str = "ROWSHELL_HISTORY";

pub fn history_path() -> Option<PathBuf> {
    resolve_history_path(
        std::env::var_os(HISTORY_ENV_VAR),
        std::env::var_os("HOME"),
    )
}

fn resolve_history_path(custom: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(custom) = custom {
        if custom.is_empty() {
            return None;
        }
        return Some(PathBuf::from(custom));
    }
    home.filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(DEFAULT_HISTORY_FILE))
}
