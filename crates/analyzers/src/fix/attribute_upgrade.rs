use super::{flagged_name, rename_edits, CodeFixer, TextEdit};
use crate::analyzer::ATTRIBUTE_UPGRADE_ID;
use crate::diagnostic::{Diagnostic, FixKind};
use crate::error::AnalyzerError;
use crate::syntax::SyntaxTree;

/// Replaces a flagged attribute, keeping the short (`[HttpGet]`) or long
/// (`[HttpGetAttribute]`) form it was written in.
#[derive(Debug, Default)]
pub struct AttributeUpgradeCodeFixer;

impl CodeFixer for AttributeUpgradeCodeFixer {
    fn name(&self) -> &'static str {
        "attribute-upgrade"
    }

    fn fixable_diagnostic_ids(&self) -> &'static [&'static str] {
        &[ATTRIBUTE_UPGRADE_ID]
    }

    fn compute_edits(&self, tree: &SyntaxTree, diagnostic: &Diagnostic) -> Result<Vec<TextEdit>, AnalyzerError> {
        let hint = diagnostic.fix_hint()?;
        let (FixKind::ReplaceAttribute, Some(new_name)) = (hint.kind, hint.new_identifier.as_deref()) else {
            return Ok(Vec::new());
        };

        let node = flagged_name(tree, diagnostic)?;
        let short_form = !node.simple_name.ends_with("Attribute");
        let new_name = match new_name.strip_suffix("Attribute") {
            Some(stripped) if short_form && !stripped.ends_with('.') && !stripped.is_empty() => stripped,
            _ => new_name,
        };
        Ok(rename_edits(tree, node, new_name))
    }
}
