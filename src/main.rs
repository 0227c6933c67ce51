//! Purpose: `rowshell` CLI entry point.
//! Role: Binary crate root; parses args, builds the row store, runs the shell.
//! Invariants: Query output goes to stdout; diagnostics and logs go to stderr.
//! Invariants: Startup failures exit with `api::to_exit_code`; command failures never do.
//! Invariants: The local UTC offset is resolved before any other work starts.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueHint};
use time::UtcOffset;
use tracing_subscriber::EnvFilter;

use rowshell::api::{
    Error, ErrorKind, RemoteClient, RowStore, load_snapshot, local_offset, to_exit_code,
};
use rowshell::shell::{Flow, Interpreter, Repl, Suggestions, run_lines};

#[derive(Parser)]
#[command(
    name = "rowshell",
    version,
    about = "Interactive shell for inspecting rows in a wide-column store",
    long_about = None,
    after_help = r#"COMMANDS (at the prompt)
  ls                                   List tables
  lookup <table> <key>                 Read a single row
  read <table> [arg=value ...]         Read multiple rows
      prefix=<p>  start=<s> end=<e>  count=<n>  regex=<re>  version=<n>
  exit | quit                          Leave the shell

EXAMPLES
  $ rowshell --endpoint http://localhost:8086 --project my-project --instance my-instance
  $ rowshell --snapshot tables.json -e 'read users prefix=1 version=1'
  $ echo 'ls' | rowshell --snapshot tables.json

NOTES
  - History is kept in ~/.rowshell_history (override with ROWSHELL_HISTORY)
  - Set RUST_LOG=debug to trace store requests on stderr"#
)]
struct Cli {
    #[arg(
        long,
        help = "Row store endpoint, e.g. http://localhost:8086 or localhost:8086",
        value_hint = ValueHint::Url,
        required_unless_present = "snapshot",
        conflicts_with = "snapshot"
    )]
    endpoint: Option<String>,
    #[arg(long, default_value = "test-project", help = "Project that owns the instance")]
    project: String,
    #[arg(long, default_value = "test-instance", help = "Instance holding the tables")]
    instance: String,
    #[arg(long, help = "Bearer token sent with every request")]
    token: Option<String>,
    #[arg(long, default_value_t = 30_000, help = "Per-request timeout in milliseconds")]
    timeout_ms: u64,
    #[arg(
        long,
        help = "Serve tables from a JSON snapshot instead of a live endpoint",
        value_hint = ValueHint::FilePath
    )]
    snapshot: Option<PathBuf>,
    #[arg(
        short = 'e',
        long = "execute",
        help = "Run a command line and exit (repeatable, runs in order)"
    )]
    execute: Vec<String>,
}

fn main() {
    let offset = local_offset();
    init_tracing();
    let cli = Cli::parse();

    let exit_code = match run(cli, offset) {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli, offset: UtcOffset) -> Result<(), Error> {
    let store = open_store(&cli, offset)?;

    if !cli.execute.is_empty() {
        let mut interpreter = Interpreter::new(store, io::stdout(), io::stderr());
        for line in &cli.execute {
            if interpreter.execute(line) == Flow::Exit {
                break;
            }
        }
        return Ok(());
    }

    if io::stdin().is_terminal() {
        let suggestions = Suggestions::from_store(&store);
        let mut repl = Repl::new(store, suggestions)?;
        return repl.run();
    }

    let mut interpreter = Interpreter::new(store, io::stdout(), io::stderr());
    run_lines(&mut interpreter, io::stdin().lock())
}

fn open_store(cli: &Cli, offset: UtcOffset) -> Result<Box<dyn RowStore>, Error> {
    if let Some(path) = &cli.snapshot {
        tracing::debug!(path = %path.display(), "loading snapshot");
        return Ok(Box::new(load_snapshot(path, offset)?));
    }
    let Some(endpoint) = &cli.endpoint else {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("no row store configured")
            .with_hint("Pass --endpoint <url> or --snapshot <file>."));
    };

    let mut client =
        RemoteClient::new(endpoint.as_str())?.with_timeout(Duration::from_millis(cli.timeout_ms));
    if let Some(token) = &cli.token {
        client = client.with_token(token.as_str());
    }
    tracing::debug!(
        endpoint = %client.base_url(),
        project = %cli.project,
        instance = %cli.instance,
        "using remote row store"
    );
    let store = client
        .instance(cli.project.as_str(), cli.instance.as_str())
        .with_offset(offset);
    Ok(Box::new(store))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn emit_error(err: &Error) {
    eprintln!("rowshell: {err}");
    if let Some(hint) = err.hint() {
        eprintln!("hint: {hint}");
    }
}
