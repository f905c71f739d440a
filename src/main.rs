use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::error::{ConsoleReporter, Reporter};
use rox::interpreter::{max_call_depth_for_stack, Interpreter, DEFAULT_STACK_SIZE};
use rox::scanner::Scanner;

/// Exit status after a syntax (lex, parse or resolve) error.
const EXIT_SYNTAX: u8 = 65;

/// Exit status after a runtime error.
const EXIT_RUNTIME: u8 = 70;

/// Exit status when the input cannot be read.
const EXIT_IO: u8 = 74;

/// Stack for the interpreter thread.  The call-depth limit is derived from it.
const INTERPRETER_STACK_SIZE: usize = DEFAULT_STACK_SIZE;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to rox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Runs a Lox program, or starts a REPL when no file is given
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file as UTF-8 text.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("rox.log").context("Failed to create rox.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to rox.log");
    Ok(())
}

fn tokenize(filename: &PathBuf) -> Result<ExitCode> {
    let source = match read_file(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            return Ok(ExitCode::from(EXIT_IO));
        }
    };

    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    Ok(if tokenized {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_SYNTAX)
    })
}

/// An interpreter whose call-depth limit fits the worker thread's stack.
fn new_interpreter() -> Interpreter {
    let mut interpreter = Interpreter::new();
    interpreter.set_max_call_depth(max_call_depth_for_stack(INTERPRETER_STACK_SIZE));
    interpreter
}

fn run_file(filename: &PathBuf) -> ExitCode {
    let source = match read_file(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::from(EXIT_IO);
        }
    };

    let mut interpreter = new_interpreter();
    let mut reporter = ConsoleReporter::new();

    rox::run(&source, &mut interpreter, &mut reporter);

    if reporter.had_syntax_error() {
        ExitCode::from(EXIT_SYNTAX)
    } else if reporter.had_runtime_error() {
        ExitCode::from(EXIT_RUNTIME)
    } else {
        ExitCode::SUCCESS
    }
}

/// Line-at-a-time prompt sharing one global environment across lines.
fn run_prompt() -> Result<ExitCode> {
    let mut interpreter = new_interpreter();
    let mut reporter = ConsoleReporter::new();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next() else {
            println!();
            return Ok(ExitCode::SUCCESS);
        };
        let line = line.context("Failed to read from stdin")?;

        rox::run(&line, &mut interpreter, &mut reporter);
        reporter.reset();
    }
}

fn main() -> Result<ExitCode> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    // Tree-walking recursion is deep; give it a roomy stack.
    let worker = thread::Builder::new()
        .name("rox".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || match args.commands {
            Commands::Tokenize { filename } => tokenize(&filename),
            Commands::Run {
                filename: Some(filename),
            } => Ok(run_file(&filename)),
            Commands::Run { filename: None } => run_prompt(),
        })
        .context("Failed to spawn interpreter thread")?;

    worker
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))?
}
