use super::{flagged_name, rename_edits, CodeFixer, TextEdit};
use crate::analyzer::TYPE_UPGRADE_ID;
use crate::diagnostic::{Diagnostic, FixKind};
use crate::error::AnalyzerError;
use crate::syntax::SyntaxTree;

/// Replaces a flagged type reference with its mapped replacement.
#[derive(Debug, Default)]
pub struct TypeUpgradeCodeFixer;

impl CodeFixer for TypeUpgradeCodeFixer {
    fn name(&self) -> &'static str {
        "type-upgrade"
    }

    fn fixable_diagnostic_ids(&self) -> &'static [&'static str] {
        &[TYPE_UPGRADE_ID]
    }

    fn compute_edits(&self, tree: &SyntaxTree, diagnostic: &Diagnostic) -> Result<Vec<TextEdit>, AnalyzerError> {
        let hint = diagnostic.fix_hint()?;
        let (FixKind::ReplaceIdentifier, Some(new_name)) = (hint.kind, hint.new_identifier.as_deref()) else {
            return Ok(Vec::new());
        };

        let node = flagged_name(tree, diagnostic)?;
        Ok(rename_edits(tree, node, new_name))
    }
}
