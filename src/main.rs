use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tinydb::statement::{InputType, MetaCommand, Statement};
use tinydb::Table;

/// A single-table record store driven by a line-oriented prompt.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Database file to open, created if missing.
    filename: PathBuf,
}

struct InputBuffer {
    buffer: String,
}

impl InputBuffer {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Returns false once stdin is exhausted. Bytes that are not UTF-8 are
    /// replaced rather than rejected, so a garbled line is just an unknown command.
    fn read_input(&mut self) -> io::Result<bool> {
        let mut line = Vec::new();
        let bytes_read = io::stdin().lock().read_until(b'\n', &mut line)?;
        self.buffer = String::from_utf8_lossy(&line).trim().to_string();
        Ok(bytes_read > 0)
    }
}

fn print_prompt() -> io::Result<()> {
    print!("db > ");
    io::stdout().flush()
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn execute(statement: Statement, table: &mut Table) -> tinydb::Result<()> {
    match statement {
        Statement::Insert(row) => table.insert(&row),
        Statement::Select => {
            for row in table.select()? {
                println!("{row}");
            }
            Ok(())
        }
    }
}

type BoxError = Box<dyn std::error::Error>;

fn repl(table: &mut Table) -> Result<(), BoxError> {
    let mut input_buffer = InputBuffer::new();

    loop {
        print_prompt()?;
        if !input_buffer.read_input()? {
            info!("end of input, closing");
            break;
        }

        match InputType::parse(&input_buffer.buffer) {
            InputType::Meta(MetaCommand::Exit) => break,
            InputType::Meta(MetaCommand::Unrecognized) => {
                println!("Unrecognized command '{}'", input_buffer.buffer);
            }
            InputType::Statement(Err(err)) => println!("{err}"),
            InputType::Statement(Ok(statement)) => match execute(statement, table) {
                Ok(()) => println!("Executed."),
                Err(err) if !err.is_fatal() => println!("Error: {err}"),
                Err(err) => return Err(err.into()),
            },
        }
    }
    Ok(())
}

// The table is closed on every way out of the loop, so rows inserted before a
// failure still reach the file.
fn run(cli: Cli) -> Result<(), BoxError> {
    let mut table = Table::open(&cli.filename)?;
    let result = repl(&mut table);
    if result.is_err() {
        warn!("session ended early, flushing table");
    }
    let closed = table.close();
    result?;
    closed?;
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
