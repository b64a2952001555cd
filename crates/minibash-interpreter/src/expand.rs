//! Word expansion: turning argument nodes into owned byte strings.
//!
//! Covers bare words, quote stripping, double-quoted rendering with
//! embedded expansions, `$VAR`/`${VAR}`/`$?`/`$$`, and `$( ... )` command
//! substitution, plus argv assembly for a command node. There is no word
//! splitting and no pathname expansion anywhere in this shell.

use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::AsRawFd;

use minibash_syntax::{node_text, Node, NodeKind};
use nix::unistd::{dup2, fork, pipe, ForkResult};

use crate::error::ExpandError;
use crate::exec;
use crate::signals;
use crate::Interpreter;

impl Interpreter {
    /// Expand one argument-like node to its concrete bytes.
    ///
    /// Unknown node kinds expand to the empty string; a result is always
    /// produced unless command substitution could not even be spawned.
    pub(crate) fn expand_argument(
        &mut self,
        input: &str,
        node: Node,
    ) -> Result<String, ExpandError> {
        match self.registry.kind_of(node) {
            NodeKind::Word => Ok(node_text(input, node).to_string()),
            NodeKind::RawString => {
                Ok(strip_outer_quotes(node_text(input, node), '\'').to_string())
            }
            NodeKind::String => self.render_double_quoted(input, node),
            NodeKind::SimpleExpansion => Ok(self.expand_simple(input, node)),
            NodeKind::Expansion => Ok(self.expand_braced(input, node)),
            NodeKind::CommandSubstitution => self.expand_substitution(input, node),
            other => {
                log::trace!("expanding unsupported node kind {other:?} to empty");
                Ok(String::new())
            }
        }
    }

    /// `$NAME`, `$?`, `$$`. Unset variables expand to the empty string;
    /// anything else unrecognized falls back to the literal slice.
    fn expand_simple(&self, input: &str, node: Node) -> String {
        let raw = node_text(input, node);
        if raw == "$?" {
            return self.last_status.to_string();
        }
        if raw == "$$" {
            return self.shell_pid.to_string();
        }
        match node.named_child(0) {
            Some(name) if self.registry.kind_of(name) == NodeKind::VariableName => {
                std::env::var(node_text(input, name)).unwrap_or_default()
            }
            _ => raw.to_string(),
        }
    }

    /// `${NAME}` reads the environment like `$NAME`. Modifier forms are
    /// not honored and come back as the literal slice.
    fn expand_braced(&self, input: &str, node: Node) -> String {
        let raw = node_text(input, node);
        if node.named_child_count() == 1 {
            if let Some(name) = node.named_child(0) {
                if self.registry.kind_of(name) == NodeKind::VariableName {
                    let var = node_text(input, name);
                    if raw == format!("${{{var}}}") {
                        return std::env::var(var).unwrap_or_default();
                    }
                }
            }
        }
        raw.to_string()
    }

    /// Double-quoted string: concatenate the parts in order. A part of an
    /// unknown kind contributes its literal bytes.
    fn render_double_quoted(&mut self, input: &str, node: Node) -> Result<String, ExpandError> {
        if node.named_child_count() == 0 {
            return Ok(strip_outer_quotes(node_text(input, node), '"').to_string());
        }
        let mut rendered = String::new();
        for i in 0..node.named_child_count() {
            let Some(part) = node.named_child(i) else { continue };
            match self.registry.kind_of(part) {
                NodeKind::StringContent => rendered.push_str(node_text(input, part)),
                NodeKind::Expansion => rendered.push_str(&self.expand_braced(input, part)),
                NodeKind::SimpleExpansion => rendered.push_str(&self.expand_simple(input, part)),
                NodeKind::CommandSubstitution => {
                    rendered.push_str(&self.expand_substitution(input, part)?);
                }
                _ => rendered.push_str(node_text(input, part)),
            }
        }
        Ok(rendered)
    }

    /// `$(CMD)`: run the inner text as a nested script of this same
    /// engine with stdout captured through a pipe, then strip trailing
    /// newlines from the captured bytes.
    fn expand_substitution(&mut self, input: &str, node: Node) -> Result<String, ExpandError> {
        let inner = substitution_body(node_text(input, node));

        let _ = std::io::stdout().flush();
        let (reader, writer) = pipe().map_err(ExpandError::Substitution)?;
        match unsafe { fork() }.map_err(ExpandError::Substitution)? {
            ForkResult::Child => {
                drop(reader);
                let _ = dup2(writer.as_raw_fd(), 1);
                drop(writer);
                signals::unblock_sigchld();
                let status = self.run_script(inner).unwrap_or(1);
                std::process::exit(status);
            }
            ForkResult::Parent { child } => {
                drop(writer);
                let mut captured = Vec::new();
                let _ = File::from(reader).read_to_end(&mut captured);
                exec::reap(child);

                let mut text = String::from_utf8_lossy(&captured).into_owned();
                while text.ends_with('\n') {
                    text.pop();
                }
                Ok(text)
            }
        }
    }

    /// Build the argument vector for a `command` node, preserving empty
    /// strings positionally. An empty vector means there was no program
    /// name to run.
    pub(crate) fn expand_to_argv(
        &mut self,
        input: &str,
        command: Node,
    ) -> Result<Vec<String>, ExpandError> {
        let Some(program) = self.program_name_node(command) else {
            return Ok(Vec::new());
        };
        let mut argv = vec![self.expand_argument(input, program)?];
        for i in 0..command.named_child_count() {
            let Some(child) = command.named_child(i) else { continue };
            if self.registry.kind_of(child) == NodeKind::CommandName {
                continue;
            }
            if self.registry.skippable_for_argv(child) || !self.registry.is_argument(child) {
                continue;
            }
            argv.push(self.expand_argument(input, child)?);
        }
        Ok(argv)
    }

    /// The node whose expansion becomes argv[0]: the first argument-like
    /// descendant of `command_name`, or the first argument-like top-level
    /// child when the grammar supplied no usable `command_name`.
    fn program_name_node<'tree>(&self, command: Node<'tree>) -> Option<Node<'tree>> {
        for i in 0..command.named_child_count() {
            let Some(child) = command.named_child(i) else { continue };
            if self.registry.kind_of(child) == NodeKind::CommandName {
                for j in 0..child.named_child_count() {
                    let Some(inner) = child.named_child(j) else { continue };
                    if self.registry.is_argument(inner) {
                        return Some(inner);
                    }
                }
                break;
            }
        }
        for i in 0..command.named_child_count() {
            let Some(child) = command.named_child(i) else { continue };
            if self.registry.kind_of(child) == NodeKind::CommandName {
                continue;
            }
            if !self.registry.skippable_for_argv(child) && self.registry.is_argument(child) {
                return Some(child);
            }
        }
        None
    }
}

/// Remove a matching outer quote pair; unmatched input comes back verbatim.
fn strip_outer_quotes(raw: &str, quote: char) -> &str {
    match raw
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
    {
        Some(inner) => inner,
        None => raw,
    }
}

/// Strip the `$(` and `)` wrapper from a substitution slice.
fn substitution_body(raw: &str) -> &str {
    raw.strip_prefix("$(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(raw)
}
