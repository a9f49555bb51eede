//! Locate and rewrite the version declaration in Go source.
//!
//! The source is parsed with tree-sitter. The first top-level `const` or
//! `var` spec whose first name is `version` (any case) must be initialized
//! with a string literal; that literal's byte span is the version. Rewrites
//! splice a new interpreted literal into the span, so every other byte of
//! the file (comments, formatting) is preserved, and the result is parsed
//! again before it is handed back.

use std::ops::Range;

use thiserror::Error;
use tree_sitter::{Language, LanguageError, Node, Parser, Tree};

/// Errors from inspecting Go source.
#[derive(Error, Debug)]
pub enum GoSourceError {
    /// The bundled grammar could not be loaded.
    #[error("failed to load Go grammar: {0}")]
    Language(#[from] LanguageError),

    /// The source does not parse cleanly.
    #[error("source contains syntax errors")]
    Syntax,

    /// No top-level declaration is named `version`.
    #[error("no top-level version const or var declaration")]
    NotFound,

    /// The version declaration is not initialized with a string literal.
    #[error("`{0}` is not initialized with a string literal")]
    NotLiteral(String),
}

/// Result alias for Go source operations.
pub type GoSourceResult<T> = Result<T, GoSourceError>;

/// A located version declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDeclaration {
    /// Identifier as written in the source.
    pub name: String,
    /// Literal contents without quotes.
    pub value: String,
    /// Byte span of the literal, quotes included.
    pub literal: Range<usize>,
}

/// Find the version declaration in `source`.
pub fn find_version(source: &str) -> GoSourceResult<VersionDeclaration> {
    let tree = parse(source)?;
    locate(&tree, source)
}

/// Return `source` with the version literal replaced by `"next"`.
pub fn replace_version(source: &str, next: &str) -> GoSourceResult<String> {
    let decl = find_version(source)?;
    let mut out = String::with_capacity(source.len() + next.len());
    out.push_str(&source[..decl.literal.start]);
    out.push('"');
    out.push_str(next);
    out.push('"');
    out.push_str(&source[decl.literal.end..]);

    parse(&out)?;
    Ok(out)
}

fn parse(source: &str) -> GoSourceResult<Tree> {
    let language = Language::from(tree_sitter_go::LANGUAGE);
    let mut parser = Parser::new();
    parser.set_language(&language)?;

    let tree = parser.parse(source, None).ok_or(GoSourceError::Syntax)?;
    if tree.root_node().has_error() {
        return Err(GoSourceError::Syntax);
    }
    Ok(tree)
}

fn locate(tree: &Tree, source: &str) -> GoSourceResult<VersionDeclaration> {
    let root = tree.root_node();
    let mut cursor = root.walk();
    let declarations = root
        .named_children(&mut cursor)
        .filter(|n| matches!(n.kind(), "const_declaration" | "var_declaration"));

    for declaration in declarations {
        let mut specs = Vec::new();
        collect_specs(declaration, &mut specs);

        for spec in specs {
            let Some(name) = spec.child_by_field_name("name") else {
                continue;
            };
            let name = text(name, source);
            if !name.eq_ignore_ascii_case("version") {
                continue;
            }

            let literal = spec
                .child_by_field_name("value")
                .and_then(first_named_child)
                .filter(|v| matches!(v.kind(), "interpreted_string_literal" | "raw_string_literal"))
                .ok_or_else(|| GoSourceError::NotLiteral(name.to_string()))?;

            return Ok(VersionDeclaration {
                name: name.to_string(),
                value: text(literal, source)
                    .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
                    .to_string(),
                literal: literal.byte_range(),
            });
        }
    }
    Err(GoSourceError::NotFound)
}

/// Specs in source order; grouped `var ( ... )` blocks nest a spec list.
fn collect_specs<'tree>(node: Node<'tree>, out: &mut Vec<Node<'tree>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "const_spec" | "var_spec" => out.push(child),
            _ => collect_specs(child, out),
        }
    }
}

fn first_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let first = node.named_children(&mut cursor).next();
    first
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}
