use super::{CodeFixer, TextEdit};
use crate::analyzer::INTEROP_API_ID;
use crate::diagnostic::{Diagnostic, FixKind};
use crate::error::AnalyzerError;
use crate::syntax::SyntaxTree;

/// Leaves a TODO comment above APIs that cannot be rewritten mechanically.
#[derive(Debug, Default)]
pub struct InteropApiCodeFixer;

impl InteropApiCodeFixer {
    fn marker() -> String {
        format!("TODO {}:", INTEROP_API_ID)
    }
}

impl CodeFixer for InteropApiCodeFixer {
    fn name(&self) -> &'static str {
        "interop-api"
    }

    fn fixable_diagnostic_ids(&self) -> &'static [&'static str] {
        &[INTEROP_API_ID]
    }

    fn compute_edits(&self, tree: &SyntaxTree, diagnostic: &Diagnostic) -> Result<Vec<TextEdit>, AnalyzerError> {
        let hint = diagnostic.fix_hint()?;
        if hint.kind != FixKind::ExplainOnly {
            return Ok(Vec::new());
        }
        let url = hint.documentation_url.unwrap_or_default();

        let line_start = tree.line_start(diagnostic.location.span.start);
        let marker = Self::marker();

        // already annotated on a previous run
        if line_start > 0 {
            let previous = tree.text()[..line_start - 1]
                .rsplit('\n')
                .next()
                .unwrap_or_default();
            if previous.trim_start().starts_with(tree.language().line_comment()) && previous.contains(&marker) {
                return Ok(Vec::new());
            }
        }

        let comment = format!(
            "{}{} {} {} See {}\n",
            tree.indentation_at(line_start),
            tree.language().line_comment(),
            marker,
            diagnostic.message,
            url
        );
        Ok(vec![TextEdit::insert(line_start, comment)])
    }
}
