//! Centralised error hierarchy for the **Rox interpreter**.
//!
//! Two disjoint families live here:
//!
//! * [`LoxError`] covers everything reported *before* execution starts
//!   (scanner, parser, resolver) plus host I/O.  Static diagnostics are
//!   collected and reported together.
//! * [`RuntimeError`] is raised by the evaluator at the point of failure and
//!   aborts the remaining top-level statements.
//!
//! The `return` unwind is not an error and never passes through these types;
//! see `interpreter::ControlFlow`.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        LoxError::Resolve { message, line }
    }

    /// Source line of a static diagnostic, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. } => Some(*line),
            LoxError::Runtime(e) => Some(e.line),
            LoxError::Io(_) | LoxError::Utf8(_) => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// What went wrong while evaluating.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),

    #[error("Undefined property '{0}'.")]
    UndefinedProperty(String),

    /// Bad operand types, or a superclass that is not a class.
    #[error("{0}")]
    TypeError(&'static str),

    #[error("Can only call functions and classes.")]
    NotCallable,

    #[error("Expected {expected} arguments but got {got}.")]
    ArityMismatch { expected: usize, got: usize },

    /// Call nesting exceeded `interpreter::MAX_CALL_DEPTH`.
    #[error("Stack overflow.")]
    StackOverflow,

    #[error("Only instances have properties.")]
    OnlyInstancesHaveProperties,

    #[error("Only instances have fields.")]
    OnlyInstancesHaveFields,

    /// Failure reported by a host-provided native function.
    #[error("{0}")]
    Native(String),

    /// The output sink rejected a `print`.
    #[error("Failed to write output: {0}")]
    Output(String),
}

impl RuntimeErrorKind {
    /// Attach the source line the failure is reported at.
    pub fn at(self, line: usize) -> RuntimeError {
        RuntimeError { line, kind: self }
    }
}

/// A located runtime failure.  Only the first one of a run is surfaced.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind}\n[line {line}]")]
pub struct RuntimeError {
    pub line: usize,
    pub kind: RuntimeErrorKind,
}

pub const OPERAND_MUST_BE_NUMBER: &str = "Operand must be a number.";
pub const OPERANDS_MUST_BE_NUMBERS: &str = "Operands must be numbers.";
pub const OPERANDS_MUST_BE_NUMBERS_OR_STRINGS: &str =
    "Operands must be two numbers or two strings.";
pub const SUPERCLASS_MUST_BE_CLASS: &str = "Superclass must be a class.";
