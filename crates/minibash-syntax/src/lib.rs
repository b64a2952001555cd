//! Grammar registry for the bash concrete-syntax tree
//!
//! minibash does not parse shell syntax itself; it consumes the tree
//! produced by tree-sitter-bash. This crate resolves the grammar's field
//! and symbol ids once at startup and gives the interpreter typed views
//! of the nodes it dispatches on.

pub use tree_sitter::{Language, LanguageError, Node, Parser, Tree};

/// The bash grammar consumed by the interpreter.
#[must_use]
pub fn language() -> Language {
    tree_sitter_bash::language()
}

/// Build a parser configured for the bash grammar.
///
/// # Errors
///
/// Returns `LanguageError` if the grammar's ABI version is incompatible
/// with the linked tree-sitter runtime.
pub fn new_parser() -> Result<Parser, LanguageError> {
    let mut parser = Parser::new();
    parser.set_language(language())?;
    Ok(parser)
}

/// Slice the source text covered by `node`.
///
/// Byte ranges come from the parse of this same buffer, so the lookup is
/// infallible in practice; a mismatched buffer yields the empty string.
#[must_use]
pub fn node_text<'a>(input: &'a str, node: Node) -> &'a str {
    input.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Grammar field ids, suitable for `Node::child_by_field_id`.
///
/// An id of zero means the grammar does not define the field; lookups
/// with it simply return `None`.
#[derive(Debug, Clone, Copy)]
pub struct Fields {
    pub body: u16,
    pub condition: u16,
    pub name: u16,
    pub left: u16,
    pub right: u16,
    pub operator: u16,
    pub value: u16,
    pub redirect: u16,
    pub destination: u16,
    pub variable: u16,
}

impl Fields {
    fn resolve(language: &Language) -> Self {
        let field = |name: &str| language.field_id_for_name(name).unwrap_or(0);
        Self {
            body: field("body"),
            condition: field("condition"),
            name: field("name"),
            left: field("left"),
            right: field("right"),
            operator: field("operator"),
            value: field("value"),
            redirect: field("redirect"),
            destination: field("destination"),
            variable: field("variable"),
        }
    }
}

/// Numeric symbol ids for the node kinds the evaluator understands.
#[derive(Debug, Clone, Copy)]
struct Symbols {
    program: u16,
    comment: u16,
    command: u16,
    command_name: u16,
    word: u16,
    raw_string: u16,
    string: u16,
    string_content: u16,
    simple_expansion: u16,
    expansion: u16,
    variable_name: u16,
    command_substitution: u16,
    file_redirect: u16,
    variable_assignment: u16,
    pipeline: u16,
    redirected_statement: u16,
    list: u16,
    subshell: u16,
}

impl Symbols {
    fn resolve(language: &Language) -> Self {
        let sym = |kind: &str| language.id_for_node_kind(kind, true);
        Self {
            program: sym("program"),
            comment: sym("comment"),
            command: sym("command"),
            command_name: sym("command_name"),
            word: sym("word"),
            raw_string: sym("raw_string"),
            string: sym("string"),
            string_content: sym("string_content"),
            simple_expansion: sym("simple_expansion"),
            expansion: sym("expansion"),
            variable_name: sym("variable_name"),
            command_substitution: sym("command_substitution"),
            file_redirect: sym("file_redirect"),
            variable_assignment: sym("variable_assignment"),
            pipeline: sym("pipeline"),
            redirected_statement: sym("redirected_statement"),
            list: sym("list"),
            subshell: sym("subshell"),
        }
    }
}

/// Node kinds the evaluator dispatches on, one variant per grammar symbol
/// plus a catch-all for everything the engine does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Program,
    Comment,
    Command,
    CommandName,
    Word,
    RawString,
    String,
    StringContent,
    SimpleExpansion,
    Expansion,
    VariableName,
    CommandSubstitution,
    FileRedirect,
    VariableAssignment,
    Pipeline,
    RedirectedStatement,
    List,
    Subshell,
    Other,
}

/// Field and symbol ids resolved once from the grammar.
pub struct Registry {
    pub fields: Fields,
    syms: Symbols,
}

impl Registry {
    #[must_use]
    pub fn new(language: &Language) -> Self {
        Self {
            fields: Fields::resolve(language),
            syms: Symbols::resolve(language),
        }
    }

    /// Classify a node by its cached symbol id.
    #[must_use]
    pub fn kind_of(&self, node: Node) -> NodeKind {
        let id = node.kind_id();
        let s = &self.syms;
        if id == s.program {
            NodeKind::Program
        } else if id == s.comment {
            NodeKind::Comment
        } else if id == s.command {
            NodeKind::Command
        } else if id == s.command_name {
            NodeKind::CommandName
        } else if id == s.word {
            NodeKind::Word
        } else if id == s.raw_string {
            NodeKind::RawString
        } else if id == s.string {
            NodeKind::String
        } else if id == s.string_content {
            NodeKind::StringContent
        } else if id == s.simple_expansion {
            NodeKind::SimpleExpansion
        } else if id == s.expansion {
            NodeKind::Expansion
        } else if id == s.variable_name {
            NodeKind::VariableName
        } else if id == s.command_substitution {
            NodeKind::CommandSubstitution
        } else if id == s.file_redirect {
            NodeKind::FileRedirect
        } else if id == s.variable_assignment {
            NodeKind::VariableAssignment
        } else if id == s.pipeline {
            NodeKind::Pipeline
        } else if id == s.redirected_statement {
            NodeKind::RedirectedStatement
        } else if id == s.list {
            NodeKind::List
        } else if id == s.subshell {
            NodeKind::Subshell
        } else {
            NodeKind::Other
        }
    }

    /// True for node kinds that may contribute an element to argv.
    #[must_use]
    pub fn is_argument(&self, node: Node) -> bool {
        matches!(
            self.kind_of(node),
            NodeKind::Word
                | NodeKind::RawString
                | NodeKind::String
                | NodeKind::SimpleExpansion
                | NodeKind::Expansion
                | NodeKind::CommandSubstitution
        )
    }

    /// True for command children that never contribute to argv.
    #[must_use]
    pub fn skippable_for_argv(&self, node: Node) -> bool {
        matches!(
            self.kind_of(node),
            NodeKind::FileRedirect | NodeKind::VariableAssignment
        )
    }
}
