//! Error types for the execution engine.
//!
//! Almost every failure a script can provoke is recovered to an exit
//! status; only the variants here cross an API boundary.

use thiserror::Error;

/// Failures that abort interpreter construction or a whole script run.
#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("failed to load the bash grammar: {0}")]
    Grammar(#[from] minibash_syntax::LanguageError),

    #[error("parser produced no syntax tree")]
    Parse,
}

/// Failures surfaced while expanding a word to its concrete bytes.
///
/// The statement owning the expansion is not executed; the evaluator
/// reports the error on stderr and records status 1.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("command substitution failed: {0}")]
    Substitution(#[source] nix::Error),
}
