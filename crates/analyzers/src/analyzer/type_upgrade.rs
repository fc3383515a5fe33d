use super::{
    confirm, is_name_suffix, namespace_of, Analyzer, NodeAnalyzer, NodeContext, TYPE_UPGRADE_ID, UPGRADE_CATEGORY,
};
use crate::compilation::Compilation;
use crate::diagnostic::{Diagnostic, DiagnosticDescriptor, FixHint, Severity};
use crate::name_matcher::NameMatcher;
use crate::semantic::SymbolResolution;
use crate::syntax::NameContext;
use crate::type_map::{TypeMap, TypeMapping};
use std::collections::HashMap;
use tracing::debug;

/// Reports types that have a replacement (or none) in the `*.typemap` tables.
#[derive(Debug, Default)]
pub struct TypeUpgradeAnalyzer;

impl TypeUpgradeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn descriptor() -> DiagnosticDescriptor {
        DiagnosticDescriptor::new(TYPE_UPGRADE_ID, "Types should be upgraded", UPGRADE_CATEGORY, Severity::Warning)
    }
}

impl Analyzer for TypeUpgradeAnalyzer {
    fn name(&self) -> &'static str {
        "type-upgrade"
    }

    fn descriptors(&self) -> Vec<DiagnosticDescriptor> {
        vec![Self::descriptor()]
    }

    fn start(&self, compilation: &Compilation) -> Option<Box<dyn NodeAnalyzer>> {
        let map = TypeMap::load(compilation.additional_texts());
        if map.is_empty() {
            debug!("No type mappings, skipping");
            return None;
        }
        debug!(mappings = map.len(), "Type mappings loaded");
        Some(Box::new(MappingNodeAnalyzer::new(map.iter().cloned(), MappingMode::Types)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MappingMode {
    /// Every type reference except attribute names.
    Types,
    /// Attribute names only.
    Attributes,
}

struct Entry {
    mapping: TypeMapping,
    matcher: NameMatcher,
}

/// Shared by the type and attribute upgrade analyzers.
pub(super) struct MappingNodeAnalyzer {
    mode: MappingMode,
    descriptor: DiagnosticDescriptor,
    by_simple_name: HashMap<String, Vec<Entry>>,
}

impl MappingNodeAnalyzer {
    pub(super) fn new(mappings: impl IntoIterator<Item = TypeMapping>, mode: MappingMode) -> Self {
        let mut by_simple_name: HashMap<String, Vec<Entry>> = HashMap::new();
        for mapping in mappings {
            let mut key = mapping.simple_name().to_lowercase();
            if mode == MappingMode::Attributes {
                if let Some(stripped) = key.strip_suffix("attribute") {
                    key = stripped.to_string();
                }
            }
            by_simple_name.entry(key).or_default().push(Entry {
                matcher: NameMatcher::for_type(&mapping.old_name),
                mapping,
            });
        }

        let descriptor = match mode {
            MappingMode::Types => TypeUpgradeAnalyzer::descriptor(),
            MappingMode::Attributes => super::AttributeUpgradeAnalyzer::descriptor(),
        };

        Self {
            mode,
            descriptor,
            by_simple_name,
        }
    }

    fn candidates(&self, simple_name: &str) -> &[Entry] {
        let mut key = simple_name.to_lowercase();
        if self.mode == MappingMode::Attributes {
            if let Some(stripped) = key.strip_suffix("attribute").filter(|s| !s.is_empty()) {
                key = stripped.to_string();
            }
        }
        self.by_simple_name.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names as written that can stand for `old_name`.
    fn written_forms(&self, context: &NodeContext<'_>) -> Vec<String> {
        let written = context.node.qualified_name();
        match self.mode {
            MappingMode::Types => vec![written],
            MappingMode::Attributes => super::attribute_name_variants(&written),
        }
    }

    fn applies_to(&self, context: &NodeContext<'_>) -> bool {
        match (self.mode, context.node.context) {
            (MappingMode::Attributes, NameContext::Attribute) => true,
            (MappingMode::Attributes, _) => false,
            (MappingMode::Types, NameContext::Attribute | NameContext::Import) => false,
            (MappingMode::Types, _) => true,
        }
    }

    fn message(&self, mapping: &TypeMapping) -> String {
        let kind = match self.mode {
            MappingMode::Types => "Type",
            MappingMode::Attributes => "Attribute",
        };
        match &mapping.new_name {
            Some(new_name) => format!("{} '{}' should be replaced with '{}'", kind, mapping.old_name, new_name),
            None => format!("{} '{}' has no replacement and should be removed", kind, mapping.old_name),
        }
    }

    fn hint(&self, mapping: &TypeMapping) -> FixHint {
        match (&mapping.new_name, self.mode) {
            (Some(new_name), MappingMode::Types) => FixHint::replace_identifier(new_name.clone()),
            (Some(new_name), MappingMode::Attributes) => FixHint::replace_attribute(new_name.clone()),
            (None, _) => FixHint::explain_only(),
        }
    }
}

impl NodeAnalyzer for MappingNodeAnalyzer {
    fn analyze_name(&self, context: &NodeContext<'_>, diagnostics: &mut Vec<Diagnostic>) {
        if !self.applies_to(context) {
            return;
        }
        let candidates = self.candidates(&context.node.simple_name);
        if candidates.is_empty() {
            return;
        }

        let language = context.language();
        let node = context.node;
        let written = self.written_forms(context);
        let resolution = context.resolve();

        // mappings whose namespace is imported win over same-named ones
        let mut ordered: Vec<&Entry> = candidates.iter().collect();
        ordered.sort_by_key(|entry| {
            !namespace_of(&entry.mapping.old_name).is_some_and(|ns| context.tree.has_import(ns))
        });

        for entry in ordered {
            let old_name = entry.mapping.old_name.as_str();
            let spelled_out = written.iter().any(|w| language.names_equal(w, old_name));

            // `Foo.Bar` as an expression is only a type reference when fully spelled out
            if node.context == NameContext::MemberAccess && !spelled_out {
                continue;
            }
            if !written.iter().any(|w| is_name_suffix(w, old_name, language)) {
                continue;
            }

            let flagged = match &resolution {
                SymbolResolution::Unresolved => {
                    spelled_out
                        || (node.qualifier.is_none()
                            && namespace_of(old_name).is_some_and(|ns| context.tree.has_import(ns)))
                }
                other => confirm(other, &entry.matcher, true),
            };
            if !flagged {
                continue;
            }

            diagnostics.push(
                Diagnostic::new(&self.descriptor, self.message(&entry.mapping), context.location(node.full_span))
                    .with_fix_hint(&self.hint(&entry.mapping)),
            );
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::FixKind;
    use crate::semantic::{SemanticModel, SymbolTable};
    use crate::syntax::SyntaxTree;

    fn run(source: &str, references: &str) -> Vec<Diagnostic> {
        let mappings = vec![
            TypeMapping::new(
                "System.Web.Mvc.ActionResult",
                Some("Microsoft.AspNetCore.Mvc.ActionResult".to_string()),
            ),
            TypeMapping::new("System.Web.Mvc.Removed", None),
        ];
        let analyzer = MappingNodeAnalyzer::new(mappings, MappingMode::Types);
        let tree = SyntaxTree::parse("a.cs", source).unwrap();
        let table = SymbolTable::parse_reference_list(references);
        let model = SemanticModel::new(&tree, &table);
        let mut diagnostics = Vec::new();
        for node in tree.names() {
            analyzer.analyze_name(&NodeContext::new(&model, node), &mut diagnostics);
        }
        diagnostics
    }

    #[test]
    fn test_imported_type_is_flagged_without_references() {
        let source = "using System.Web.Mvc;\nclass C { ActionResult Index() { return null; } }\n";
        let diagnostics = run(source, "");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, TYPE_UPGRADE_ID);
        let hint = diagnostics[0].fix_hint().unwrap();
        assert_eq!(hint.kind, FixKind::ReplaceIdentifier);
        assert_eq!(hint.new_identifier.as_deref(), Some("Microsoft.AspNetCore.Mvc.ActionResult"));
    }

    #[test]
    fn test_same_name_without_import_is_ignored() {
        let source = "class C { ActionResult Index() { return null; } }\n";
        assert!(run(source, "").is_empty());
    }

    #[test]
    fn test_user_type_is_ignored() {
        let source = "using System.Web.Mvc;\nusing Contoso;\nclass C { ActionResult Index() { return null; } }\n";
        assert!(run(source, "T:Contoso.ActionResult\n").is_empty());
    }

    #[test]
    fn test_qualified_reference_and_removed_type() {
        let source = "class C { System.Web.Mvc.ActionResult A; System.Web.Mvc.Removed B; }\n";
        let diagnostics = run(source, "");
        assert_eq!(diagnostics.len(), 2);
        let first = diagnostics[0].location.span;
        assert_eq!(&source[first.start..first.end], "System.Web.Mvc.ActionResult");
        assert_eq!(diagnostics[1].fix_hint().unwrap().kind, FixKind::ExplainOnly);
    }
}
