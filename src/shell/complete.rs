//! Purpose: Tab-completion suggestions for the interactive prompt.
//! Exports: `Suggest`, `Suggestions`, `COMMANDS`, `ShellHelper`.
//! Role: Read-only suggestion tables built once per process; rustyline glue.
//! Invariants: Suggestions are never reloaded after startup.
//! Invariants: Matching is a case-insensitive prefix match on the word being typed.
use std::borrow::Cow;

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::api::RowStore;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Suggest {
    pub text: Cow<'static, str>,
    pub description: Cow<'static, str>,
}

impl Suggest {
    const fn fixed(text: &'static str, description: &'static str) -> Self {
        Self {
            text: Cow::Borrowed(text),
            description: Cow::Borrowed(description),
        }
    }
}

pub const COMMANDS: &[Suggest] = &[
    Suggest::fixed("ls", "List tables"),
    Suggest::fixed("lookup", "Read from a single row"),
    Suggest::fixed("read", "Read from multiple rows"),
    Suggest::fixed("exit", "Exit this prompt"),
    Suggest::fixed("quit", "Exit this prompt"),
];

#[derive(Clone, Debug, Default)]
pub struct Suggestions {
    tables: Vec<Suggest>,
}

impl Suggestions {
    pub fn new(tables: impl IntoIterator<Item = String>) -> Self {
        let tables = tables
            .into_iter()
            .map(|table| Suggest {
                description: Cow::Owned(table.clone()),
                text: Cow::Owned(table),
            })
            .collect();
        Self { tables }
    }

    /// Table names come from the store once; a failing store leaves them empty.
    pub fn from_store<S: RowStore + ?Sized>(store: &S) -> Self {
        match store.list_tables() {
            Ok(tables) => Self::new(tables),
            Err(err) => {
                tracing::warn!("table suggestions unavailable: {err}");
                Self::default()
            }
        }
    }

    /// Suggestions for the text before the cursor.
    pub fn complete(&self, before_cursor: &str) -> Vec<&Suggest> {
        if before_cursor.is_empty() {
            return Vec::new();
        }
        let args: Vec<&str> = before_cursor.split(' ').collect();
        match args.as_slice() {
            [word] => filter_has_prefix(COMMANDS, word),
            [command, table] if matches!(*command, "lookup" | "read") => {
                filter_has_prefix(&self.tables, table)
            }
            _ => Vec::new(),
        }
    }
}

fn filter_has_prefix<'a>(suggestions: &'a [Suggest], word: &str) -> Vec<&'a Suggest> {
    let word = word.to_lowercase();
    suggestions
        .iter()
        .filter(|suggest| suggest.text.to_lowercase().starts_with(&word))
        .collect()
}

/// rustyline helper that completes the word under the cursor.
pub struct ShellHelper {
    suggestions: Suggestions,
}

impl ShellHelper {
    pub fn new(suggestions: Suggestions) -> Self {
        Self { suggestions }
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before = &line[..pos];
        let start = before.rfind(' ').map_or(0, |index| index + 1);
        let candidates = self
            .suggestions
            .complete(before)
            .into_iter()
            .map(|suggest| Pair {
                display: format!("{:<8} {}", suggest.text, suggest.description),
                replacement: suggest.text.to_string(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}
