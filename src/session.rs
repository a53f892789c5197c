//! One program run (or one REPL) from source text to side effects.
//!
//! Phases run in order and each gate the next: scanning and parsing must be
//! clean before resolution, and resolution must be clean before anything
//! executes.  The interpreter, and with it the global scope, lives as long
//! as the session.

use std::io::Write;

use log::{debug, info};
use thiserror::Error;

use crate::ast::Stmt;
use crate::error::{LoxError, RuntimeError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

#[derive(Debug, Error)]
pub enum RunError {
    /// Lexical, syntax or resolution diagnostics; nothing was executed.
    #[error("{} static error(s)", .0.len())]
    Static(Vec<LoxError>),

    /// The first runtime error; later top-level statements did not run.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl RunError {
    /// Conventional process exit code (sysexits `EX_DATAERR` / `EX_SOFTWARE`).
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => 65,
            RunError::Runtime(_) => 70,
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self::with_interpreter(Interpreter::with_output(output))
    }

    /// Wrap an interpreter that already has host functions registered.
    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Session { interpreter }
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Scan, parse, resolve and execute `source`.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        let statements = parse_source(source).map_err(RunError::Static)?;

        Resolver::new(&mut self.interpreter)
            .resolve(&statements)
            .map_err(RunError::Static)?;

        debug!("Resolution clean, executing");

        self.interpreter.interpret(&statements)?;

        info!("Run completed");

        Ok(())
    }
}

/// Scan and parse `source`, collecting every lexical and syntax error.
pub fn parse_source(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, mut errors) = Scanner::new(source).scan_all();

    match Parser::new(&tokens).parse() {
        Ok(statements) if errors.is_empty() => Ok(statements),
        Ok(_) => Err(errors),
        Err(parse_errors) => {
            errors.extend(parse_errors);
            errors.sort_by_key(|e| e.line());
            Err(errors)
        }
    }
}
