use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::Ast;
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::session::{self, RunError, Session};

const EX_DATAERR: i32 = 65;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox: a tree-walking Lox interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Log file written when --log is given
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses a program and prints its syntax tree
    Parse {
        filename: PathBuf,

        /// Print the tree as JSON instead of s-expressions
        #[arg(long)]
        json: bool,
    },

    /// Evaluates a single expression from a file and prints the result
    Evaluate { filename: PathBuf },

    /// Runs a program; starts a REPL when no file is given
    Run { filename: Option<PathBuf> },
}

fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename)
        .map_err(LoxError::from)
        .context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .map_err(LoxError::from)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let source = String::from_utf8(buf)
        .map_err(LoxError::from)
        .context(format!("{:?} is not valid UTF-8", filename))?;

    Ok(source)
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

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
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn report(errors: &[LoxError]) {
    for e in errors {
        eprintln!("{}", e);
    }
}

fn exit_with(error: RunError) -> ! {
    match &error {
        RunError::Static(errors) => report(errors),
        RunError::Runtime(e) => eprintln!("{}", e),
    }

    debug!("Exiting with code {}", error.exit_code());
    std::process::exit(error.exit_code());
}

fn tokenize(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EX_DATAERR);
        std::process::exit(EX_DATAERR);
    }

    Ok(())
}

fn parse(filename: &Path, json: bool) -> Result<()> {
    let source = read_file(filename)?;

    let statements = match session::parse_source(&source) {
        Ok(statements) => statements,
        Err(errors) => exit_with(RunError::Static(errors)),
    };

    if json {
        let out = serde_json::to_string_pretty(&statements).context("Failed to serialize AST")?;
        println!("{}", out);
    } else {
        let printer = Ast;
        for stmt in &statements {
            println!("{}", printer.print_stmt(stmt));
        }
    }

    Ok(())
}

fn evaluate(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;
    let (tokens, errors) = Scanner::new(&source).scan_all();

    if !errors.is_empty() {
        exit_with(RunError::Static(errors));
    }

    let expr = match Parser::new(&tokens).parse_expression() {
        Ok(expr) => expr,
        Err(e) => exit_with(RunError::Static(vec![e])),
    };

    // A lone expression has no scopes, so every name is a global and no
    // resolution pass is needed.
    let mut interpreter = Interpreter::new();

    match interpreter.evaluate(&expr) {
        Ok(value) => println!("{}", value),
        Err(e) => exit_with(RunError::Runtime(e)),
    }

    Ok(())
}

fn run_file(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;
    let mut session = Session::new();

    if let Err(e) = session.run(&source) {
        exit_with(e);
    }

    info!("Program executed successfully");
    Ok(())
}

fn run_repl() -> Result<()> {
    info!("Starting REPL");

    let mut session = Session::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        if line.trim().is_empty() {
            break;
        }

        // Errors are reported and the session carries on with its globals.
        match session.run(&line) {
            Ok(()) => {}
            Err(RunError::Static(errors)) => report(&errors),
            Err(RunError::Runtime(e)) => eprintln!("{}", e),
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match &args.commands {
        Commands::Tokenize { filename } => tokenize(filename),
        Commands::Parse { filename, json } => parse(filename, *json),
        Commands::Evaluate { filename } => evaluate(filename),
        Commands::Run {
            filename: Some(filename),
        } => run_file(filename),
        Commands::Run { filename: None } => run_repl(),
    }
}
