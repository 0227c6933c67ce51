//! Purpose: Interpret one shell line at a time against a row store.
//! Exports: `Interpreter`, `Flow`, `Verb`.
//! Role: Parse `<verb> [<table>] [<key> | <arg>=<value> ...]`, call the store, render rows.
//! Invariants: Writes only to the injected output and error sinks.
//! Invariants: No command failure ends the session; only `exit`/`quit` do.
//! Invariants: Argument errors are reported before any store call is made.
use std::io::Write;

use crate::api::RowStore;
use crate::core::error::{Error, ErrorKind};
use crate::core::query::{build_query, parse_args};
use crate::core::render::write_row;
use crate::core::row::ResultSet;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verb {
    List,
    Lookup,
    Read,
    Exit,
}

impl Verb {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "ls" => Some(Verb::List),
            "lookup" => Some(Verb::Lookup),
            "read" => Some(Verb::Read),
            "exit" | "quit" => Some(Verb::Exit),
            _ => None,
        }
    }
}

pub struct Interpreter<S, W, E> {
    store: S,
    out: W,
    err: E,
}

impl<S, W, E> Interpreter<S, W, E>
where
    S: RowStore,
    W: Write,
    E: Write,
{
    pub fn new(store: S, out: W, err: E) -> Self {
        Self { store, out, err }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (S, W, E) {
        (self.store, self.out, self.err)
    }

    /// Runs one line to completion and reports whether the session goes on.
    pub fn execute(&mut self, line: &str) -> Flow {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((first, args)) = tokens.split_first() else {
            return Flow::Continue;
        };
        let Some(verb) = Verb::parse(first) else {
            tracing::debug!(command = *first, "ignoring unknown command");
            return Flow::Continue;
        };
        tracing::debug!(?verb, table = args.first().copied(), "dispatch");

        let result = match verb {
            Verb::Exit => return Flow::Exit,
            Verb::List => self.list_tables(),
            Verb::Lookup => self.lookup(args),
            Verb::Read => self.read(args),
        };
        let result = result.and_then(|()| self.out.flush().map_err(Error::from));
        if let Err(err) = result {
            self.report(&err);
        }
        Flow::Continue
    }

    fn list_tables(&mut self) -> Result<(), Error> {
        let tables = self.store.list_tables()?;
        for table in tables {
            writeln!(self.out, "{table}")?;
        }
        Ok(())
    }

    fn lookup(&mut self, args: &[&str]) -> Result<(), Error> {
        let [table, key, ..] = args else {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("lookup requires a table and a row key")
                .with_hint("Try `lookup <table> <key>`."));
        };
        let result = self.store.get_row(table, key)?;
        self.print_rows(&result)
    }

    fn read(&mut self, args: &[&str]) -> Result<(), Error> {
        let Some((table, rest)) = args.split_first() else {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("read requires a table")
                .with_hint("Try `read <table> [prefix=|start=|end=|count=|regex=|version=...]`."));
        };
        let query = build_query(&parse_args(rest.iter().copied()))?;
        let result = self.store.get_rows(table, &query.range, &query.options)?;
        self.print_rows(&result)
    }

    fn print_rows(&mut self, result: &ResultSet) -> Result<(), Error> {
        for row in &result.rows {
            write_row(&mut self.out, row)?;
        }
        Ok(())
    }

    fn report(&mut self, err: &Error) {
        if err.kind() != ErrorKind::Usage {
            tracing::warn!(kind = ?err.kind(), "command failed: {err}");
        }
        let _ = writeln!(self.err, "Error: {err}");
        if let Some(hint) = err.hint() {
            let _ = writeln!(self.err, "hint: {hint}");
        }
        let _ = self.err.flush();
    }
}
