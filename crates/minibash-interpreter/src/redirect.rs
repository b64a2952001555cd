//! Redirection planning and descriptor wiring.
//!
//! A plan is the ordered list of `file_redirect` clauses attached to a
//! command or a redirected statement. Plans are applied either inside a
//! forked child (open, dup onto the target, close) or in the parent,
//! which opens files once and hands raw descriptors to the process
//! runner. Later clauses for the same stream override earlier ones; the
//! overridden file is dropped, which closes it.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;

use minibash_syntax::{node_text, Node, NodeKind};
use nix::unistd::dup2;

use crate::Interpreter;

/// What a single `file_redirect` clause asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOp {
    /// `< path`: open read-only onto fd 0.
    Input,
    /// `> path`: create/truncate onto fd 1.
    Truncate,
    /// `>> path`: create/append onto fd 1.
    Append,
}

/// One ordered entry of a statement's descriptor plan. The destination
/// path is the raw source slice; it is not expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub op: RedirectOp,
    pub path: String,
}

impl Redirect {
    fn open(&self) -> io::Result<File> {
        match self.op {
            RedirectOp::Input => File::open(&self.path),
            RedirectOp::Truncate => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path),
            RedirectOp::Append => OpenOptions::new()
                .write(true)
                .create(true)
                .append(true)
                .open(&self.path),
        }
    }

    fn target_fd(&self) -> i32 {
        match self.op {
            RedirectOp::Input => 0,
            RedirectOp::Truncate | RedirectOp::Append => 1,
        }
    }

    fn stream_name(&self) -> &'static str {
        match self.op {
            RedirectOp::Input => "input",
            RedirectOp::Truncate | RedirectOp::Append => "output",
        }
    }

    fn report_open_failure(&self, err: &io::Error) {
        eprintln!(
            "minibash: cannot open for {}: {}",
            self.stream_name(),
            self.path
        );
        log::debug!("redirect open failed: {err}");
    }
}

impl Interpreter {
    /// Scan `node`'s children for redirect clauses, in source order.
    /// Unsupported operator forms are skipped with a log line.
    pub(crate) fn redirect_plan(&self, input: &str, node: Node) -> Vec<Redirect> {
        let mut plan = Vec::new();
        for i in 0..node.named_child_count() {
            let Some(child) = node.named_child(i) else { continue };
            if self.registry.kind_of(child) != NodeKind::FileRedirect {
                continue;
            }
            let clause = node_text(input, child);
            let Some(op) = redirect_op(clause) else {
                log::warn!("unsupported redirect form: {clause}");
                continue;
            };
            let path = child
                .child_by_field_id(self.registry.fields.destination)
                .map(|dest| node_text(input, dest).to_string())
                .unwrap_or_default();
            plan.push(Redirect { op, path });
        }
        plan
    }
}

/// Decode the operator from the leading non-blank bytes of the clause.
/// `&>`, here-docs, and fd-numbered forms are out of scope.
fn redirect_op(clause: &str) -> Option<RedirectOp> {
    let trimmed = clause.trim_start();
    if trimmed.starts_with(">>") {
        Some(RedirectOp::Append)
    } else if trimmed.starts_with("<<") {
        None
    } else if trimmed.starts_with('>') {
        Some(RedirectOp::Truncate)
    } else if trimmed.starts_with('<') {
        Some(RedirectOp::Input)
    } else {
        None
    }
}

/// Apply a plan inside a forked child. On failure a diagnostic is printed
/// and the caller must exit with status 1 without executing the command.
pub(crate) fn apply_in_child(plan: &[Redirect]) -> Result<(), ()> {
    for redirect in plan {
        let file = match redirect.open() {
            Ok(file) => file,
            Err(err) => {
                redirect.report_open_failure(&err);
                return Err(());
            }
        };
        if dup2(file.as_raw_fd(), redirect.target_fd()).is_err() {
            return Err(());
        }
        // `file` drops here, closing the descriptor we just duped from
    }
    Ok(())
}

/// Open a statement-level plan in the parent. The returned files are the
/// final stdin/stdout targets for the statement body; the caller keeps
/// them alive across the wait and drops them afterwards.
pub(crate) fn open_in_parent(plan: &[Redirect]) -> Result<(Option<File>, Option<File>), ()> {
    let mut stdin_file = None;
    let mut stdout_file = None;
    for redirect in plan {
        match redirect.open() {
            Ok(file) => match redirect.op {
                RedirectOp::Input => stdin_file = Some(file),
                RedirectOp::Truncate | RedirectOp::Append => stdout_file = Some(file),
            },
            Err(err) => {
                redirect.report_open_failure(&err);
                return Err(());
            }
        }
    }
    Ok((stdin_file, stdout_file))
}
