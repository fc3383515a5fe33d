use super::{
    attribute_name_variants, confirm, is_name_suffix, Analyzer, NodeAnalyzer, NodeContext, API_ALERT_BASE_ID,
    UPGRADE_CATEGORY,
};
use crate::compilation::Compilation;
use crate::diagnostic::{Diagnostic, DiagnosticDescriptor, FixHint, Severity};
use crate::name_matcher::NameMatcher;
use crate::syntax::NameContext;
use crate::target_syntax::{
    load_additional_api_targets, load_default_api_targets, TargetSyntax, TargetSyntaxMessage, TargetSyntaxType,
};
use std::collections::HashMap;
use tracing::debug;

/// Reports references to APIs listed in the `*.apitargets` tables.
///
/// Each rule gets its own diagnostic id, `UA0013_<RuleId>`.
#[derive(Debug, Default)]
pub struct ApiAlertAnalyzer {
    /// Replaces the embedded default table when set.
    rules: Option<Vec<TargetSyntaxMessage>>,
}

impl ApiAlertAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `rules` instead of the embedded defaults. Additional files of the
    /// compilation are still added.
    pub fn with_rules(rules: Vec<TargetSyntaxMessage>) -> Self {
        Self { rules: Some(rules) }
    }

    pub fn diagnostic_id(rule_id: &str) -> String {
        format!("{}_{}", API_ALERT_BASE_ID, rule_id)
    }

    fn descriptor(rule_id: &str) -> DiagnosticDescriptor {
        DiagnosticDescriptor::new(
            Self::diagnostic_id(rule_id),
            format!("Unsupported API: {}", rule_id),
            UPGRADE_CATEGORY,
            Severity::Warning,
        )
    }

    fn load(&self, compilation: &Compilation) -> Vec<TargetSyntaxMessage> {
        let mut rules = match &self.rules {
            Some(rules) => rules.clone(),
            None => load_default_api_targets(),
        };
        rules.extend(load_additional_api_targets(compilation.additional_texts()));
        rules
    }
}

impl Analyzer for ApiAlertAnalyzer {
    fn name(&self) -> &'static str {
        "api-alert"
    }

    fn descriptors(&self) -> Vec<DiagnosticDescriptor> {
        let rules = match &self.rules {
            Some(rules) => rules.clone(),
            None => load_default_api_targets(),
        };
        rules.iter().map(|rule| Self::descriptor(&rule.id)).collect()
    }

    fn start(&self, compilation: &Compilation) -> Option<Box<dyn NodeAnalyzer>> {
        let rules = self.load(compilation);
        if rules.is_empty() {
            debug!("No API alert rules, skipping");
            return None;
        }
        debug!(rules = rules.len(), "API alert rules loaded");
        Some(Box::new(ApiAlertNodeAnalyzer::new(rules)))
    }
}

struct Target {
    rule: usize,
    syntax: TargetSyntax,
    matcher: NameMatcher,
}

struct ApiAlertNodeAnalyzer {
    rules: Vec<(DiagnosticDescriptor, String)>,
    /// Lowercased simple name, plus its `Attribute`-less form, to targets.
    by_simple_name: HashMap<String, Vec<Target>>,
}

impl ApiAlertNodeAnalyzer {
    fn new(messages: Vec<TargetSyntaxMessage>) -> Self {
        let mut rules = Vec::with_capacity(messages.len());
        let mut by_simple_name: HashMap<String, Vec<Target>> = HashMap::new();

        for (index, message) in messages.into_iter().enumerate() {
            for syntax in message.target_syntaxes {
                let key = syntax.simple_name().to_lowercase();
                let key = match key.strip_suffix("attribute") {
                    Some(stripped) if !stripped.is_empty() => stripped.to_string(),
                    _ => key,
                };
                by_simple_name.entry(key).or_default().push(Target {
                    rule: index,
                    matcher: syntax.name_matcher(),
                    syntax,
                });
            }
            rules.push((ApiAlertAnalyzer::descriptor(&message.id), message.message));
        }

        Self { rules, by_simple_name }
    }

    fn candidates(&self, simple_name: &str) -> &[Target] {
        let key = simple_name.to_lowercase();
        let key = key.strip_suffix("attribute").filter(|k| !k.is_empty()).unwrap_or(key.as_str());
        self.by_simple_name.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    fn structural_match(&self, context: &NodeContext<'_>, target: &Target) -> bool {
        let node = context.node;
        let language = context.language();

        match target.syntax.syntax_type {
            // the receiver is often an expression of unknown type
            TargetSyntaxType::Member => {
                node.context == NameContext::MemberAccess
                    && language.names_equal(&node.simple_name, target.syntax.simple_name())
            }
            TargetSyntaxType::Type | TargetSyntaxType::Namespace => {
                if node.context == NameContext::MemberAccess && node.qualifier.is_none() {
                    return false;
                }
                attribute_name_variants(&node.qualified_name())
                    .iter()
                    .any(|written| is_name_suffix(written, &target.syntax.full_name, language))
            }
        }
    }
}

impl NodeAnalyzer for ApiAlertNodeAnalyzer {
    fn analyze_name(&self, context: &NodeContext<'_>, diagnostics: &mut Vec<Diagnostic>) {
        let candidates = self.candidates(&context.node.simple_name);
        if candidates.is_empty() {
            return;
        }

        let resolution = context.resolve();
        let mut reported: Vec<usize> = Vec::new();

        for target in candidates {
            if reported.contains(&target.rule) || !self.structural_match(context, target) {
                continue;
            }
            if !confirm(&resolution, &target.matcher, target.syntax.alert_on_ambiguous_match) {
                continue;
            }

            let (descriptor, message) = &self.rules[target.rule];
            let span = match target.syntax.syntax_type {
                TargetSyntaxType::Member => context.node.span,
                TargetSyntaxType::Type | TargetSyntaxType::Namespace => context.node.full_span,
            };
            diagnostics.push(
                Diagnostic::new(descriptor, message.clone(), context.location(span))
                    .with_fix_hint(&FixHint::explain_only()),
            );
            reported.push(target.rule);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{SemanticModel, SymbolTable};
    use crate::syntax::SyntaxTree;

    fn rule(id: &str, full_name: &str, syntax_type: TargetSyntaxType, ambiguous: bool) -> TargetSyntaxMessage {
        TargetSyntaxMessage {
            id: id.to_string(),
            target_syntaxes: vec![TargetSyntax::new(full_name, syntax_type, ambiguous)],
            message: format!("{} is not supported", full_name),
        }
    }

    fn run(rules: Vec<TargetSyntaxMessage>, path: &str, source: &str, references: &str) -> Vec<Diagnostic> {
        let analyzer = ApiAlertNodeAnalyzer::new(rules);
        let tree = SyntaxTree::parse(path, source).unwrap();
        let table = SymbolTable::parse_reference_list(references);
        let model = SemanticModel::new(&tree, &table);
        let mut diagnostics = Vec::new();
        for node in tree.names() {
            analyzer.analyze_name(&NodeContext::new(&model, node), &mut diagnostics);
        }
        diagnostics
    }

    #[test]
    fn test_resolved_user_type_is_not_flagged() {
        let rules = vec![rule("HttpContext", "System.Web.HttpContext", TargetSyntaxType::Type, true)];
        let source = "using Contoso;\nclass A { HttpContext context; }\n";
        let diagnostics = run(rules, "a.cs", source, "T:Contoso.HttpContext\n");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_resolved_target_is_flagged() {
        let rules = vec![rule("HttpContext", "System.Web.HttpContext", TargetSyntaxType::Type, false)];
        let source = "using System.Web;\nclass A { HttpContext context; }\n";
        let diagnostics = run(rules, "a.cs", source, "T:System.Web.HttpContext\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, "UA0013_HttpContext");
        assert_eq!(diagnostics[0].location.line, 2);
    }

    #[test]
    fn test_member_requires_member_access() {
        let rules = vec![rule("Current", "System.Web.HttpContext.Current", TargetSyntaxType::Member, true)];
        let source = "class A { void M() { var Current = 1; var c = HttpContext.Current; } }\n";
        let diagnostics = run(rules, "a.cs", source, "");
        assert_eq!(diagnostics.len(), 1);
        let span = diagnostics[0].location.span;
        assert_eq!(&source[span.start..span.end], "Current");
        assert!(source[..span.start].ends_with("HttpContext."));
    }

    #[test]
    fn test_attribute_suffix_forms() {
        let rules = vec![rule("HandleError", "System.Web.Mvc.HandleErrorAttribute", TargetSyntaxType::Type, true)];
        let source = "[HandleError]\nclass A {}\n[HandleErrorAttribute]\nclass B {}\n";
        let diagnostics = run(rules, "a.cs", source, "");
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_visual_basic_ignores_case() {
        let rules = vec![rule("HtmlHelper", "System.Web.Mvc.HtmlHelper", TargetSyntaxType::Type, true)];
        let source = "Imports System.Web.Mvc\nModule M\n    Dim h As htmlhelper\nEnd Module\n";
        let diagnostics = run(rules, "a.vb", source, "");
        assert_eq!(diagnostics.len(), 1);
    }
}
