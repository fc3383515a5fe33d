use super::{compact_dotted, NameContext, NameNode, NamespaceScope, SyntaxParts, TextSpan, TypeDeclaration};
use crate::error::AnalyzerError;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser};

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "record_struct_declaration",
    "delegate_declaration",
];

pub(super) fn parse(path: &Path, text: &str) -> Result<SyntaxParts, AnalyzerError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
        .map_err(|e| AnalyzerError::Parse {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
    let tree = parser.parse(text, None).ok_or_else(|| AnalyzerError::Parse {
        path: path.to_path_buf(),
        details: "parser produced no tree".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        // partial trees are normal while code is mid-upgrade
        debug!(path = %path.display(), "C# source has syntax errors");
    }

    let mut collector = Collector {
        source: text.as_bytes(),
        text_len: text.len(),
        namespace_stack: Vec::new(),
        parts: SyntaxParts::default(),
    };
    collector.visit(root);
    Ok(collector.parts)
}

struct Collector<'s> {
    source: &'s [u8],
    text_len: usize,
    namespace_stack: Vec<String>,
    parts: SyntaxParts,
}

impl<'s> Collector<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "using_directive" => self.visit_using(node),
            "namespace_declaration" | "file_scoped_namespace_declaration" => self.visit_namespace(node),
            kind if TYPE_DECLARATIONS.contains(&kind) => self.visit_type_declaration(node),
            "identifier" | "generic_name" | "qualified_name" | "member_access_expression"
            | "alias_qualified_name" => self.visit_name(node, NameContext::Simple),
            "attribute" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.visit_name(name, NameContext::Attribute);
                }
                self.visit_children_except(node, node.child_by_field_name("name"));
            }
            _ => self.visit_children_except(node, declared_name(node)),
        }
    }

    fn visit_children_except(&mut self, node: Node, skip: Option<Node>) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            if skip.is_some_and(|s| s.id() == child.id()) {
                continue;
            }
            self.visit(child);
        }
    }

    fn visit_using(&mut self, node: Node) {
        let alias = node.child_by_field_name("name");
        let mut cursor = node.walk();
        let aliased = alias.is_some() || node.children(&mut cursor).any(|c| matches!(c.kind(), "=" | "name_equals"));
        let target = node
            .named_children(&mut cursor)
            .filter(|c| alias.map_or(true, |a| a.id() != c.id()))
            .filter(|c| matches!(c.kind(), "identifier" | "qualified_name" | "alias_qualified_name"))
            .last();

        if let Some(target) = target {
            if !aliased {
                self.parts.imports.push(compact_dotted(self.text(target)));
            }
            self.parts
                .import_spans
                .push(TextSpan::new(node.start_byte(), node.end_byte()));
            self.visit_name(target, NameContext::Import);
        }
    }

    fn visit_namespace(&mut self, node: Node) {
        let name_node = node.child_by_field_name("name");
        let Some(name_node) = name_node else {
            self.visit_children_except(node, None);
            return;
        };

        let local = compact_dotted(self.text(name_node));
        let name = match self.namespace_stack.last() {
            Some(outer) => format!("{}.{}", outer, local),
            None => local,
        };
        let end = if node.kind() == "file_scoped_namespace_declaration" {
            self.text_len
        } else {
            node.end_byte()
        };
        self.parts.namespaces.push(NamespaceScope {
            name: name.clone(),
            span: TextSpan::new(node.start_byte(), end),
        });

        self.namespace_stack.push(name);
        self.visit_children_except(node, Some(name_node));
        // file-scoped namespaces cover the remainder of the file, siblings included
        if node.kind() == "namespace_declaration" {
            self.namespace_stack.pop();
        }
    }

    fn visit_type_declaration(&mut self, node: Node) {
        let name = node.child_by_field_name("name");
        if let Some(name) = name {
            self.parts.declarations.push(TypeDeclaration {
                namespace: self.namespace_stack.last().cloned(),
                name: self.text(name).to_string(),
            });
        }
        self.visit_children_except(node, name);
    }

    /// Emits every name in a dotted name or member access. `context` applies
    /// to the rightmost name.
    fn visit_name(&mut self, node: Node, context: NameContext) {
        match node.kind() {
            "identifier" => self.push(node, None, None, context, false),
            "generic_name" => {
                if let Some(identifier) = first_child_of_kind(node, "identifier") {
                    self.push(identifier, None, None, context, true);
                }
                self.visit_type_arguments(node);
            }
            "qualified_name" => {
                let inner = if context == NameContext::Import {
                    NameContext::Import
                } else {
                    NameContext::Simple
                };
                if let Some(qualifier) = node.child_by_field_name("qualifier") {
                    self.visit_name(qualifier, inner);
                }
                if let Some(name) = node.child_by_field_name("name") {
                    let context = if context == NameContext::Simple {
                        NameContext::Qualified
                    } else {
                        context
                    };
                    self.push_right(node.child_by_field_name("qualifier"), name, context);
                }
            }
            "member_access_expression" => {
                let expression = node.child_by_field_name("expression");
                if let Some(expression) = expression {
                    self.visit(expression);
                }
                if let Some(name) = node.child_by_field_name("name") {
                    self.push_right(expression, name, NameContext::MemberAccess);
                }
            }
            "alias_qualified_name" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.visit_name(name, context);
                }
            }
            _ => self.visit(node),
        }
    }

    /// Emits the right-hand name of a dotted pair.
    fn push_right(&mut self, left: Option<Node>, right: Node, context: NameContext) {
        let qualifier = left.and_then(|l| dotted_text(l, self.source));
        let start = left.map(|l| l.start_byte());
        match right.kind() {
            "identifier" => self.push(right, qualifier, start, context, false),
            "generic_name" => {
                if let Some(identifier) = first_child_of_kind(right, "identifier") {
                    self.push(identifier, qualifier, start, context, true);
                }
                self.visit_type_arguments(right);
            }
            _ => self.visit(right),
        }
    }

    fn visit_type_arguments(&mut self, generic: Node) {
        if let Some(arguments) = first_child_of_kind(generic, "type_argument_list") {
            self.visit_children_except(arguments, None);
        }
    }

    fn push(
        &mut self,
        identifier: Node,
        qualifier: Option<String>,
        qualifier_start: Option<usize>,
        context: NameContext,
        is_generic: bool,
    ) {
        let span = TextSpan::new(identifier.start_byte(), identifier.end_byte());
        let full_start = match (&qualifier, qualifier_start) {
            (Some(_), Some(start)) => start,
            _ => span.start,
        };
        self.parts.names.push(NameNode {
            simple_name: self.text(identifier).to_string(),
            qualifier,
            context,
            is_generic,
            span,
            full_span: TextSpan::new(full_start, span.end),
        });
    }
}

/// Dotted text of a pure name expression; `None` once anything other than
/// names and dots is involved.
fn dotted_text(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => node.utf8_text(source).ok().map(str::to_string),
        "generic_name" => first_child_of_kind(node, "identifier")
            .and_then(|i| i.utf8_text(source).ok())
            .map(str::to_string),
        "qualified_name" => {
            let left = dotted_text(node.child_by_field_name("qualifier")?, source)?;
            let right = dotted_text(node.child_by_field_name("name")?, source)?;
            Some(format!("{}.{}", left, right))
        }
        "member_access_expression" => {
            let left = dotted_text(node.child_by_field_name("expression")?, source)?;
            let right = dotted_text(node.child_by_field_name("name")?, source)?;
            Some(format!("{}.{}", left, right))
        }
        "alias_qualified_name" => dotted_text(node.child_by_field_name("name")?, source),
        _ => None,
    }
}

/// Identifier a declaration introduces, which is not a reference.
fn declared_name(node: Node) -> Option<Node> {
    let kind = node.kind();
    let declares = kind.ends_with("_declaration")
        || matches!(
            kind,
            "variable_declarator"
                | "parameter"
                | "type_parameter"
                | "local_function_statement"
                | "catch_declaration"
                | "labeled_statement"
        );
    if !declares {
        return None;
    }
    node.child_by_field_name("name")
        .or_else(|| first_child_of_kind(node, "identifier").filter(|_| kind == "variable_declarator"))
}

fn first_child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|c| c.kind() == kind);
    found
}
