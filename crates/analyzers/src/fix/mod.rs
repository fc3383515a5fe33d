//! Code fixes for the upgrade diagnostics.
//!
//! A fixer reads the property bag of a diagnostic it declared itself able
//! to fix and turns it into text edits. Edits replace exactly the flagged
//! span, so surrounding comments and formatting stay untouched.

mod attribute_upgrade;
mod batch;
mod interop_api;
mod type_upgrade;

pub use attribute_upgrade::AttributeUpgradeCodeFixer;
pub use batch::{apply_edits, BatchFixer, FixResult};
pub use interop_api::InteropApiCodeFixer;
pub use type_upgrade::TypeUpgradeCodeFixer;

use crate::diagnostic::Diagnostic;
use crate::error::AnalyzerError;
use crate::syntax::{NameNode, SyntaxTree, TextSpan};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextEdit {
    pub span: TextSpan,
    pub new_text: String,
}

impl TextEdit {
    pub fn replace(span: TextSpan, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    pub fn insert(offset: usize, new_text: impl Into<String>) -> Self {
        Self::replace(TextSpan::new(offset, offset), new_text)
    }
}

pub trait CodeFixer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Diagnostic ids this fixer handles. A closed list.
    fn fixable_diagnostic_ids(&self) -> &'static [&'static str];

    /// Edits for one diagnostic. Empty when the diagnostic only explains.
    fn compute_edits(&self, tree: &SyntaxTree, diagnostic: &Diagnostic) -> Result<Vec<TextEdit>, AnalyzerError>;
}

/// The flagged name node of `diagnostic`.
pub(crate) fn flagged_name<'a>(tree: &'a SyntaxTree, diagnostic: &Diagnostic) -> Result<&'a NameNode, AnalyzerError> {
    tree.name_at(diagnostic.location.span).ok_or_else(|| AnalyzerError::Fix {
        id: diagnostic.id.clone(),
        path: tree.path().to_path_buf(),
        details: format!(
            "no name at {}..{}",
            diagnostic.location.span.start, diagnostic.location.span.end
        ),
    })
}

/// Rewrites `node` to `new_full_name`, keeping the written style: a
/// qualified reference stays qualified, a simple one stays simple and gets
/// an import when its namespace is not in scope yet.
pub(crate) fn rename_edits(tree: &SyntaxTree, node: &NameNode, new_full_name: &str) -> Vec<TextEdit> {
    if node.qualifier.is_some() {
        return vec![TextEdit::replace(node.full_span, new_full_name)];
    }

    let (namespace, simple) = match new_full_name.rsplit_once('.') {
        Some((namespace, simple)) => (Some(namespace), simple),
        None => (None, new_full_name),
    };

    let mut edits = vec![TextEdit::replace(node.full_span, simple)];
    if let Some(namespace) = namespace {
        let in_scope = tree.has_import(namespace)
            || tree
                .enclosing_namespaces(node.span.start)
                .iter()
                .any(|ns| tree.language().names_equal(ns, namespace));
        if !in_scope {
            let directive = format!("{}\n", tree.language().import_directive(namespace));
            edits.push(TextEdit::insert(tree.import_insertion_point(), directive));
        }
    }
    edits
}
