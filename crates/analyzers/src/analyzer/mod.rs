//! Analyzers and the callbacks they register.
//!
//! An [`Analyzer`] is started once per compilation. Starting loads whatever
//! tables it needs and either returns a [`NodeAnalyzer`] that is called for
//! every name in every tree, or `None` when there is nothing to look for.
//! Node analyzers only read their tables, so the driver may call them from
//! several threads at once.

mod api_alert;
mod attribute_upgrade;
mod interop_api;
mod type_upgrade;

pub use api_alert::ApiAlertAnalyzer;
pub use attribute_upgrade::AttributeUpgradeAnalyzer;
pub use interop_api::{InteropApi, InteropApiAnalyzer, INTEROP_API_DOCUMENTATION_URL};
pub use type_upgrade::TypeUpgradeAnalyzer;

use crate::compilation::Compilation;
use crate::diagnostic::{Diagnostic, DiagnosticDescriptor, Location};
use crate::name_matcher::NameMatcher;
use crate::semantic::{SemanticModel, SymbolResolution};
use crate::syntax::{Language, NameNode, SyntaxTree, TextSpan};

pub const TYPE_UPGRADE_ID: &str = "UA0002";
pub const ATTRIBUTE_UPGRADE_ID: &str = "UA0010";
pub const API_ALERT_BASE_ID: &str = "UA0013";
pub const INTEROP_API_ID: &str = "UA0014";

pub const UPGRADE_CATEGORY: &str = "Upgrade";

pub trait Analyzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn descriptors(&self) -> Vec<DiagnosticDescriptor>;

    /// Whether node callbacks may run on several trees in parallel.
    fn concurrent(&self) -> bool {
        true
    }

    fn start(&self, compilation: &Compilation) -> Option<Box<dyn NodeAnalyzer>>;
}

pub trait NodeAnalyzer: Send + Sync {
    fn analyze_name(&self, context: &NodeContext<'_>, diagnostics: &mut Vec<Diagnostic>);
}

/// A name node together with the tree and model it belongs to.
pub struct NodeContext<'a> {
    pub tree: &'a SyntaxTree,
    pub model: &'a SemanticModel<'a>,
    pub node: &'a NameNode,
}

impl<'a> NodeContext<'a> {
    pub fn new(model: &'a SemanticModel<'a>, node: &'a NameNode) -> Self {
        Self {
            tree: model.tree(),
            model,
            node,
        }
    }

    pub fn language(&self) -> Language {
        self.tree.language()
    }

    pub fn location(&self, span: TextSpan) -> Location {
        Location::in_tree(self.tree, span)
    }

    pub fn resolve(&self) -> SymbolResolution {
        self.model.resolve(self.node)
    }
}

/// `written` names the same thing as the tail of `full_name`, on a dot boundary.
pub(crate) fn is_name_suffix(written: &str, full_name: &str, language: Language) -> bool {
    if written.is_empty() || written.len() > full_name.len() {
        return false;
    }
    let split = full_name.len() - written.len();
    let Some(tail) = full_name.get(split..) else {
        return false;
    };
    language.names_equal(tail, written) && (split == 0 || full_name.as_bytes()[split - 1] == b'.')
}

/// Attribute names may be written with or without the `Attribute` suffix.
pub(crate) fn attribute_name_variants(written: &str) -> Vec<String> {
    let mut variants = vec![written.to_string()];
    match written.strip_suffix("Attribute") {
        Some(stripped) if !stripped.is_empty() && !stripped.ends_with('.') => variants.push(stripped.to_string()),
        _ => variants.push(format!("{}Attribute", written)),
    }
    variants
}

/// How a candidate match fares once binding information is considered.
///
/// A resolved symbol must be the expected one. Anything else is left to
/// `on_unconfirmed`.
pub(crate) fn confirm(resolution: &SymbolResolution, matcher: &NameMatcher, on_unconfirmed: bool) -> bool {
    match resolution {
        SymbolResolution::Resolved(symbol) => matcher.matches(Some(symbol)),
        SymbolResolution::ErrorType { .. } | SymbolResolution::Unresolved => on_unconfirmed,
    }
}

/// Namespace part of a dotted name.
pub(crate) fn namespace_of(full_name: &str) -> Option<&str> {
    full_name.rsplit_once('.').map(|(ns, _)| ns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        simple = { "HtmlHelper", "System.Web.Mvc.HtmlHelper", Language::CSharp, true },
        partial = { "Mvc.HtmlHelper", "System.Web.Mvc.HtmlHelper", Language::CSharp, true },
        full = { "System.Web.Mvc.HtmlHelper", "System.Web.Mvc.HtmlHelper", Language::CSharp, true },
        not_on_boundary = { "Helper", "System.Web.Mvc.HtmlHelper", Language::CSharp, false },
        other_qualifier = { "Foo.HtmlHelper", "System.Web.Mvc.HtmlHelper", Language::CSharp, false },
        case_sensitive = { "htmlhelper", "System.Web.Mvc.HtmlHelper", Language::CSharp, false },
        vb_case = { "mvc.htmlhelper", "System.Web.Mvc.HtmlHelper", Language::VisualBasic, true },
        longer = { "A.System.Web", "System.Web", Language::CSharp, false },
    )]
    fn test_is_name_suffix(written: &str, full: &str, language: Language, expected: bool) {
        assert_eq!(is_name_suffix(written, full, language), expected);
    }

    #[test]
    fn test_attribute_name_variants() {
        assert_eq!(attribute_name_variants("HttpGet"), vec!["HttpGet", "HttpGetAttribute"]);
        assert_eq!(attribute_name_variants("HttpGetAttribute"), vec!["HttpGetAttribute", "HttpGet"]);
        assert_eq!(attribute_name_variants("Attribute"), vec!["Attribute", "AttributeAttribute"]);
    }
}
