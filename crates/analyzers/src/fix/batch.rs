use super::{AttributeUpgradeCodeFixer, CodeFixer, InteropApiCodeFixer, TextEdit, TypeUpgradeCodeFixer};
use crate::compilation::Compilation;
use crate::diagnostic::Diagnostic;
use crate::error::AnalyzerError;
use crate::syntax::SyntaxTree;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed text of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixResult {
    pub path: PathBuf,
    pub text: String,
    pub applied: usize,
    pub skipped: usize,
}

impl FixResult {
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Applies every fixable diagnostic of a document in one pass.
pub struct BatchFixer {
    fixers: Vec<Arc<dyn CodeFixer>>,
}

impl BatchFixer {
    pub fn new(fixers: Vec<Arc<dyn CodeFixer>>) -> Self {
        Self { fixers }
    }

    pub fn with_defaults() -> Self {
        Self::new(vec![
            Arc::new(TypeUpgradeCodeFixer),
            Arc::new(AttributeUpgradeCodeFixer),
            Arc::new(InteropApiCodeFixer),
        ])
    }

    pub fn fixer_for(&self, diagnostic_id: &str) -> Option<&Arc<dyn CodeFixer>> {
        self.fixers
            .iter()
            .find(|f| f.fixable_diagnostic_ids().contains(&diagnostic_id))
    }

    pub fn fix_document(&self, tree: &SyntaxTree, diagnostics: &[Diagnostic]) -> FixResult {
        let mut edits = Vec::new();
        let mut failed = 0;

        for diagnostic in diagnostics.iter().filter(|d| d.location.path == tree.path()) {
            let Some(fixer) = self.fixer_for(&diagnostic.id) else {
                continue;
            };
            match fixer.compute_edits(tree, diagnostic) {
                Ok(mut computed) => edits.append(&mut computed),
                Err(e) => {
                    warn!(fixer = fixer.name(), error = %e, "Fix could not be computed");
                    failed += 1;
                }
            }
        }

        let (text, applied, skipped) = apply_edits(tree.text(), edits);
        debug!(path = %tree.path().display(), applied, skipped, "Fixed document");

        FixResult {
            path: tree.path().to_path_buf(),
            text,
            applied,
            skipped: skipped + failed,
        }
    }

    /// Fixes every document of `compilation` that has diagnostics.
    pub fn fix_all(&self, compilation: &Compilation, diagnostics: &[Diagnostic]) -> Result<Vec<FixResult>, AnalyzerError> {
        let mut by_path: BTreeMap<&PathBuf, Vec<Diagnostic>> = BTreeMap::new();
        for diagnostic in diagnostics {
            by_path
                .entry(&diagnostic.location.path)
                .or_default()
                .push(diagnostic.clone());
        }

        let mut results = Vec::with_capacity(by_path.len());
        for (path, diagnostics) in by_path {
            let tree = compilation.tree(path).ok_or_else(|| AnalyzerError::Fix {
                id: diagnostics[0].id.clone(),
                path: path.clone(),
                details: "document is not part of the compilation".to_string(),
            })?;
            results.push(self.fix_document(tree, &diagnostics));
        }
        Ok(results)
    }
}

/// Applies non-overlapping edits to `text`.
///
/// Identical edits are applied once and edits that would not change the
/// text are dropped. An edit overlapping one that was already accepted is
/// skipped. Returns the new text with the applied and
/// skipped counts.
pub fn apply_edits(text: &str, mut edits: Vec<TextEdit>) -> (String, usize, usize) {
    edits.sort_by(|a, b| a.span.cmp(&b.span).then_with(|| a.new_text.cmp(&b.new_text)));
    edits.dedup();

    let mut accepted: Vec<TextEdit> = Vec::with_capacity(edits.len());
    let mut skipped = 0;
    for edit in edits {
        let in_bounds = edit.span.start <= edit.span.end
            && edit.span.end <= text.len()
            && text.is_char_boundary(edit.span.start)
            && text.is_char_boundary(edit.span.end);
        if !in_bounds || accepted.iter().any(|a| a.span.overlaps(&edit.span)) {
            warn!(start = edit.span.start, end = edit.span.end, "Skipping conflicting edit");
            skipped += 1;
            continue;
        }
        if text[edit.span.start..edit.span.end] == edit.new_text {
            continue;
        }
        accepted.push(edit);
    }

    let mut result = text.to_string();
    for edit in accepted.iter().rev() {
        result.replace_range(edit.span.start..edit.span.end, &edit.new_text);
    }

    (result, accepted.len(), skipped)
}
