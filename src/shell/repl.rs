//! Purpose: Drive the interpreter from a line editor or from plain line input.
//! Exports: `Repl`, `run_lines`, `PROMPT`.
//! Role: Session loop; owns history persistence and prompt handling.
//! Invariants: One line is executed to completion before the next is read.
//! Invariants: Ctrl-C discards the current line; Ctrl-D, `exit` and `quit` end the session.
use std::io::{self, BufRead, Stderr, Stdout, Write};

use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use crate::api::RowStore;
use crate::core::error::{Error, ErrorKind};
use crate::shell::complete::{ShellHelper, Suggestions};
use crate::shell::history::history_path;
use crate::shell::interpreter::{Flow, Interpreter};

pub const PROMPT: &str = "rowshell> ";

pub struct Repl<S> {
    interpreter: Interpreter<S, Stdout, Stderr>,
    editor: Editor<ShellHelper, DefaultHistory>,
}

impl<S: RowStore> Repl<S> {
    pub fn new(store: S, suggestions: Suggestions) -> Result<Self, Error> {
        let mut editor = Editor::new().map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to initialize line editor: {err}"))
        })?;
        editor.set_helper(Some(ShellHelper::new(suggestions)));

        if let Some(history_file) = history_path() {
            if let Err(err) = editor.load_history(&history_file) {
                tracing::debug!(path = %history_file.display(), "no history loaded: {err}");
            }
        }

        Ok(Self {
            interpreter: Interpreter::new(store, io::stdout(), io::stderr()),
            editor,
        })
    }

    pub fn run(&mut self) -> Result<(), Error> {
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = self.editor.add_history_entry(line.as_str());
                    }
                    if self.interpreter.execute(&line) == Flow::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => {
                    break;
                }
                Err(err) => {
                    self.save_history();
                    return Err(Error::new(ErrorKind::Io)
                        .with_message(format!("failed to read input: {err}")));
                }
            }
        }

        self.save_history();
        Ok(())
    }

    fn save_history(&mut self) {
        if let Some(history_file) = history_path() {
            if let Err(err) = self.editor.save_history(&history_file) {
                tracing::warn!(path = %history_file.display(), "could not save history: {err}");
            }
        }
    }
}

/// Feeds lines to the interpreter without prompting, stopping at EOF or `exit`.
pub fn run_lines<S, W, E, R>(interpreter: &mut Interpreter<S, W, E>, input: R) -> Result<(), Error>
where
    S: RowStore,
    W: Write,
    E: Write,
    R: BufRead,
{
    for line in input.lines() {
        let line = line?;
        if interpreter.execute(&line) == Flow::Exit {
            break;
        }
    }
    Ok(())
}
