//! minibash execution engine
//!
//! Walks the concrete-syntax tree produced by tree-sitter-bash and turns
//! it into process behavior: word expansion, fork/exec with pipe and
//! redirection wiring, short-circuit lists, and SIGCHLD discipline around
//! foreground waits.

mod builtins;
mod error;
mod eval;
mod exec;
mod expand;
mod redirect;
pub mod signals;

pub use error::{ExpandError, InterpreterError};
pub use redirect::{Redirect, RedirectOp};

use minibash_syntax::{language, new_parser, Parser, Registry};

/// The evaluator context. Everything the engine needs between statements
/// lives here rather than in process-wide state, so evaluation can
/// re-enter itself for command substitution.
pub struct Interpreter {
    registry: Registry,
    parser: Parser,
    shell_pid: u32,
    last_status: i32,
}

impl Interpreter {
    /// Build an interpreter with the bash grammar loaded and the symbol
    /// and field registries resolved.
    ///
    /// # Errors
    ///
    /// Returns `InterpreterError::Grammar` if the grammar cannot be
    /// loaded into the tree-sitter runtime.
    pub fn new() -> Result<Self, InterpreterError> {
        Ok(Self {
            registry: Registry::new(&language()),
            parser: new_parser()?,
            shell_pid: std::process::id(),
            last_status: 0,
        })
    }

    /// Exit status of the most recently completed statement.
    #[must_use]
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Parse and execute `script`, returning the final exit status.
    ///
    /// SIGCHLD must be unblocked on entry. It is blocked for the whole
    /// statement walk, so every foreground wait inside runs without racing
    /// the handler, and unblocked again before returning.
    ///
    /// # Errors
    ///
    /// Returns `InterpreterError::Parse` if the parser yields no tree.
    /// Script-level failures are not errors; they end up in the returned
    /// status per the shell's own rules.
    pub fn run_script(&mut self, script: &str) -> Result<i32, InterpreterError> {
        debug_assert!(!signals::sigchld_is_blocked());
        let tree = self
            .parser
            .parse(script, None)
            .ok_or(InterpreterError::Parse)?;
        signals::block_sigchld();
        self.eval_program(script, tree.root_node());
        signals::unblock_sigchld();
        Ok(self.last_status)
    }
}
