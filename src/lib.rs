//! # ecru
//!
//! ecru is a small statically typed expression-and-statement language with
//! exact arithmetic, written in Rust. Source text is tokenized, parsed into
//! a syntax tree, bound, type checked, and executed by a tree-walking
//! evaluator over an exact numeric tower: naturals stored as prime
//! factorizations, integers, fractions and residues modulo `n`.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use std::{panic, thread};

use tracing::{debug, instrument, warn};

use crate::{
    ast::Program,
    error::{Diagnostic, EcruResult},
    interpreter::{
        binder::bind_program,
        checker::core::check_program,
        evaluator::{
            core::{Context, MAX_CALL_DEPTH},
            io::IoBuffer,
        },
        parser::core::parse_program,
    },
};
pub use crate::interpreter::lexer::tokenize;

/// Defines the structure of parsed code.
///
/// This module declares the statement and expression nodes that represent the
/// syntactic structure of a program, together with their canonical
/// parenthesized rendering. The tree is built by the parser, annotated by
/// the checker, and walked by the evaluator.
///
/// # Responsibilities
/// - Defines expression and statement types for all language constructs.
/// - Attaches a node id and a source span to every node.
/// - Renders programs in the canonical `Program(...)` form.
pub mod ast;
/// Provides the single error channel shared by every phase.
///
/// This module defines the diagnostic raised by the tokenizer, parser,
/// binder, checker and evaluator, and the errors of the numeric tower that
/// the evaluator lifts into diagnostics.
///
/// # Responsibilities
/// - Defines the error kind taxonomy.
/// - Attaches a source span and, at run time, the active calls.
/// - Renders diagnostics and stack traces.
pub mod error;
/// Orchestrates the phases of the interpreter.
///
/// This module ties together lexing, parsing, binding, type checking,
/// evaluation and the value representations.
pub mod interpreter;
/// General utilities.
///
/// Source spans and the number theory the numeric tower is built on.
pub mod util;

/// Stack reserved for the thread a program runs on. Deep user recursion is
/// limited by [`CompileOptions::max_call_depth`], not by the host stack.
const INTERPRETER_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Knobs for one [`compile_with`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Deepest allowed nesting of user calls before `StackOverflowError`.
    pub max_call_depth:    usize,
    /// Frames shown in a rendered stack trace before the `+N more` tail.
    pub stack_trace_limit: usize,
    /// Whether to run the program after it type checks.
    pub execute:           bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { max_call_depth:    MAX_CALL_DEPTH,
               stack_trace_limit: 8,
               execute:           true, }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    /// Canonical rendering of the parsed program, or `"Error"` when parsing
    /// failed.
    pub parse_tree:  String,
    /// What the program printed, and the diagnostic that stopped it.
    pub buffer:      IoBuffer,
    /// The fatal diagnostic, if any.
    pub error_msg:   Option<String>,
    /// Stack trace of the fatal diagnostic, if any.
    pub error_stack: Option<String>,
}

impl CompileOutput {
    /// Whether the run finished without a diagnostic.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error_msg.is_none()
    }
}

/// Tokenizes and parses source text.
///
/// # Example
/// ```
/// let program = ecru::parse("x: Z; x = 3;").unwrap();
///
/// assert_eq!(program.to_string(), "Program(DeclStmt(x,Z),AssignStmt(x,3))");
/// assert!(ecru::parse("x").is_err());
/// ```
pub fn parse(source: &str) -> EcruResult<Program> {
    parse_program(tokenize(source)?)
}

/// Compiles and runs source text with the default [`CompileOptions`].
///
/// # Example
/// ```
/// let output = ecru::compile("print 1 + 2 * 3;");
///
/// assert_eq!(output.parse_tree, "Program(Print(Add(1,Mul(2,3))))");
/// assert_eq!(output.buffer.stdout, "7");
/// assert!(output.is_ok());
///
/// let output = ecru::compile("x = 3;");
///
/// assert!(output.error_msg.unwrap().starts_with("UndefinedIdentifierError"));
/// assert!(output.buffer.stdout.is_empty());
/// ```
#[must_use]
pub fn compile(source: &str) -> CompileOutput {
    compile_with(source, &CompileOptions::default())
}

/// Compiles and runs source text.
///
/// The phases run in order and the first diagnostic ends the run. Output
/// printed before a runtime error is kept. The whole pipeline runs on a
/// dedicated thread with a large stack; if that thread cannot be spawned it
/// runs on the caller's thread instead.
///
/// # Parameters
/// - `source`: The program text.
/// - `options`: Call depth, stack trace length, and whether to execute.
///
/// # Returns
/// A [`CompileOutput`]; never panics on a user error.
#[must_use]
#[instrument(skip_all)]
pub fn compile_with(source: &str, options: &CompileOptions) -> CompileOutput {
    thread::scope(|scope| {
        let spawned = thread::Builder::new().name("ecru".to_string())
                                            .stack_size(INTERPRETER_STACK_SIZE)
                                            .spawn_scoped(scope, || run_pipeline(source, options));
        match spawned {
            Ok(handle) => handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)),
            Err(error) => {
                warn!(%error, "could not spawn interpreter thread");
                run_pipeline(source, options)
            },
        }
    })
}

fn run_pipeline(source: &str, options: &CompileOptions) -> CompileOutput {
    let mut buffer = IoBuffer::new();
    let program = match parse(source) {
        Ok(program) => program,
        Err(diagnostic) => return failed("Error".to_string(), buffer, &diagnostic, options),
    };
    let parse_tree = program.to_string();
    match execute(&program, options, &mut buffer) {
        Ok(()) => CompileOutput { parse_tree,
                                  buffer,
                                  error_msg: None,
                                  error_stack: None },
        Err(diagnostic) => failed(parse_tree, buffer, &diagnostic, options),
    }
}

/// Binds, checks and, if enabled, runs a parsed program. Output goes into
/// `buffer` even when the run fails.
fn execute(program: &Program, options: &CompileOptions, buffer: &mut IoBuffer) -> EcruResult<()> {
    let resolution = bind_program(program)?;
    let typed = check_program(program, &resolution)?;
    if !options.execute {
        return Ok(());
    }
    let mut context = Context::new(&resolution);
    context.max_call_depth = options.max_call_depth;
    let outcome = context.run(&typed);
    *buffer = std::mem::take(&mut context.buffer);
    outcome
}

fn failed(parse_tree: String, mut buffer: IoBuffer, diagnostic: &Diagnostic, options: &CompileOptions)
          -> CompileOutput {
    debug!(kind = %diagnostic.kind, "run failed");
    let message = diagnostic.to_string();
    buffer.report(&message);
    CompileOutput { parse_tree,
                    buffer,
                    error_msg: Some(message),
                    error_stack: Some(diagnostic.render_stack(options.stack_trace_limit)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parse_failures_render_as_error() {
        let output = compile("print 1");
        assert_eq!(output.parse_tree, "Error");
        assert!(output.error_msg.unwrap().starts_with(&ErrorKind::MissingSemicolonError.to_string()));
        assert!(output.buffer.stderr.starts_with("MissingSemicolonError"));
    }

    #[test]
    fn checking_without_running() {
        let options = CompileOptions { execute: false,
                                       ..CompileOptions::default() };
        let output = compile_with("print 1;", &options);
        assert!(output.is_ok());
        assert!(output.buffer.stdout.is_empty());
    }

    #[test]
    fn output_before_a_runtime_error_is_kept() {
        let output = compile("println 1; x: Z = 0; print 1 / x;");
        assert_eq!(output.buffer.stdout, "1\n");
        assert!(output.error_msg.unwrap().starts_with("DivisionByZeroError"));
        assert_eq!(output.error_stack.as_deref(), Some("    at <program>"));
    }

    #[test]
    fn call_depth_is_configurable() {
        let source = "f(n: Z): Z { if (n == 0) { return 0; } return f(n - 1); } print f(20);";
        assert_eq!(compile(source).buffer.stdout, "0");
        let options = CompileOptions { max_call_depth: 10,
                                       stack_trace_limit: 2,
                                       ..CompileOptions::default() };
        let output = compile_with(source, &options);
        assert!(output.error_msg.unwrap().starts_with("StackOverflowError"));
        assert!(output.error_stack.unwrap().contains("+8 more"));
    }
}
