//! Statement dispatch and list short-circuit semantics.
//!
//! The grammar does not name the `&&`/`||`/`;`/`&` junctions inside a
//! `list` node, so they are discovered from the raw source bytes between
//! adjacent statements. Grammars that expose an explicit binary node with
//! an `operator` field route through the same list walk.

use minibash_syntax::{node_text, Node, NodeKind};

use crate::Interpreter;

/// Junction operators recognized between adjacent list statements.
/// `&` is sequencing here; backgrounding is not implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Junction {
    And,
    Or,
    Seq,
}

impl Interpreter {
    /// Walk the top-level statements of a program in source order.
    pub(crate) fn eval_program(&mut self, input: &str, program: Node) {
        for i in 0..program.named_child_count() {
            let Some(statement) = program.named_child(i) else { continue };
            self.eval_statement(input, statement);
        }
    }

    /// Evaluate one statement and record its exit status.
    pub(crate) fn eval_statement(&mut self, input: &str, statement: Node) -> i32 {
        log::trace!("eval {}", statement.kind());
        let status = match self.registry.kind_of(statement) {
            NodeKind::Comment => self.last_status,
            NodeKind::VariableAssignment => self.eval_assignment(input, statement),
            NodeKind::Command => self.run_simple_command(input, statement),
            NodeKind::Pipeline => self.run_pipeline_with_io(input, statement, None, None),
            NodeKind::RedirectedStatement => self.run_redirected_statement(input, statement),
            NodeKind::List => self.eval_list(input, statement),
            NodeKind::Subshell => self.eval_subshell(input, statement),
            _ => {
                if statement
                    .child_by_field_id(self.registry.fields.operator)
                    .is_some()
                {
                    self.eval_list(input, statement)
                } else {
                    log::warn!("unimplemented statement kind: {}", statement.kind());
                    1
                }
            }
        };
        self.last_status = status;
        status
    }

    /// `NAME=VALUE`: the value is expanded like any word, an absent value
    /// is the empty string, and the variable lands in the environment.
    fn eval_assignment(&mut self, input: &str, assignment: Node) -> i32 {
        let name_node = assignment
            .child_by_field_id(self.registry.fields.name)
            .or_else(|| assignment.named_child(0));
        let Some(name_node) = name_node else { return 1 };
        let name = node_text(input, name_node).to_string();

        let value_node = assignment
            .child_by_field_id(self.registry.fields.value)
            .or_else(|| assignment.named_child(1));
        let value = match value_node {
            Some(node) if self.registry.is_argument(node) => {
                match self.expand_argument(input, node) {
                    Ok(value) => value,
                    Err(err) => {
                        eprintln!("minibash: {err}");
                        return 1;
                    }
                }
            }
            // number literals, concatenations: the raw slice is the value
            Some(node) => node_text(input, node).to_string(),
            None => String::new(),
        };
        std::env::set_var(name, value);
        0
    }

    /// Left-to-right list walk with short-circuit. A skipped right
    /// operand leaves the status of the last evaluated statement intact.
    fn eval_list(&mut self, input: &str, list: Node) -> i32 {
        let count = list.named_child_count();
        let Some(first) = list.named_child(0) else { return 0 };
        let mut status = self.eval_statement(input, first);
        let mut prev = first;
        for i in 1..count {
            let Some(current) = list.named_child(i) else { continue };
            let run_right = match junction_between(input, prev.end_byte(), current.start_byte()) {
                Junction::And => status == 0,
                Junction::Or => status != 0,
                Junction::Seq => true,
            };
            if run_right {
                status = self.eval_statement(input, current);
            }
            prev = current;
        }
        status
    }

    /// Subshell statements evaluate their children in sequence.
    fn eval_subshell(&mut self, input: &str, subshell: Node) -> i32 {
        let mut status = self.last_status;
        for i in 0..subshell.named_child_count() {
            let Some(child) = subshell.named_child(i) else { continue };
            status = self.eval_statement(input, child);
        }
        status
    }
}

/// First operator in the byte gap between two adjacent list statements.
/// Two-byte operators win over one-byte ones at the same position; an
/// empty or operator-free gap means plain sequencing.
pub(crate) fn junction_between(input: &str, gap_start: usize, gap_end: usize) -> Junction {
    let gap = input.get(gap_start..gap_end).unwrap_or("").as_bytes();
    let mut i = 0;
    while i < gap.len() {
        match gap[i] {
            b'&' if i + 1 < gap.len() && gap[i + 1] == b'&' => return Junction::And,
            b'|' if i + 1 < gap.len() && gap[i + 1] == b'|' => return Junction::Or,
            b';' | b'&' => return Junction::Seq,
            _ => i += 1,
        }
    }
    Junction::Seq
}
