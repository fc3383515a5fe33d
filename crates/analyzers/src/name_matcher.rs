//! Matches symbols against fully qualified API names.

use crate::semantic::Symbol;

/// Predicate for "is this symbol the API named `full_name`".
///
/// Names are compared case-insensitively, segment by segment, from the
/// symbol outward. A match requires the walk to end exactly at the global
/// namespace, so `Foo.HttpContext` never matches `System.Web.HttpContext`
/// and `System.Web.HttpContext` never matches `My.System.Web.HttpContext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatcher {
    /// Container segments, innermost first.
    reversed_parts: Vec<String>,
    member: Option<String>,
}

impl NameMatcher {
    /// Matcher for a namespace or type.
    pub fn for_type(full_name: &str) -> Self {
        Self {
            reversed_parts: split_reversed(full_name),
            member: None,
        }
    }

    /// Matcher for `member` declared on `type_full_name`.
    pub fn for_member(type_full_name: &str, member: &str) -> Self {
        Self {
            reversed_parts: split_reversed(type_full_name),
            member: Some(member.to_string()),
        }
    }

    /// Splits `Namespace.Type.Member` into a member matcher.
    pub fn for_member_full_name(full_name: &str) -> Self {
        match full_name.rsplit_once('.') {
            Some((owner, member)) => Self::for_member(owner, member),
            None => Self::for_member("", full_name),
        }
    }

    pub fn is_member(&self) -> bool {
        self.member.is_some()
    }

    pub fn matches(&self, symbol: Option<&Symbol>) -> bool {
        let Some(symbol) = symbol else {
            return false;
        };

        match &self.member {
            Some(member) => {
                symbol.kind().is_member()
                    && symbol.name().eq_ignore_ascii_case(member)
                    && symbol
                        .containing()
                        .is_some_and(|owner| self.matches_type(owner))
            }
            None => self.matches_type(symbol),
        }
    }

    fn matches_type(&self, symbol: &Symbol) -> bool {
        if symbol.kind().is_member() {
            return false;
        }

        let mut current = symbol;
        for part in &self.reversed_parts {
            if current.is_global_namespace() || !current.name().eq_ignore_ascii_case(part) {
                return false;
            }
            match current.containing() {
                Some(next) => current = next,
                None => return false,
            }
        }
        current.is_global_namespace()
    }
}

fn split_reversed(full_name: &str) -> Vec<String> {
    full_name
        .split('.')
        .filter(|p| !p.is_empty())
        .rev()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::SymbolTable;
    use crate::syntax::Language;
    use yare::parameterized;

    fn table() -> SymbolTable {
        SymbolTable::parse_reference_list(
            "T:System.Web.HttpContext\nP:System.Web.HttpContext.Current\nT:Foo.HttpContext\nT:My.System.Web.HttpContext\nM:Windows.Graphics.Printing.PrintManager.GetForCurrentView\n",
        )
    }

    fn symbol(name: &str) -> std::sync::Arc<Symbol> {
        table().lookup(name, Language::CSharp).remove(0)
    }

    #[parameterized(
        exact = { "System.Web.HttpContext", "System.Web.HttpContext", true },
        other_namespace = { "System.Web.HttpContext", "Foo.HttpContext", false },
        longer_chain = { "System.Web.HttpContext", "My.System.Web.HttpContext", false },
        case_insensitive = { "system.web.httpcontext", "System.Web.HttpContext", true },
        namespace = { "System.Web", "System.Web", true },
        member_is_not_type = { "System.Web.HttpContext", "System.Web.HttpContext.Current", false },
    )]
    fn test_type_matcher(target: &str, symbol_name: &str, expected: bool) {
        let matcher = NameMatcher::for_type(target);
        assert_eq!(matcher.matches(Some(&symbol(symbol_name))), expected);
    }

    #[test]
    fn test_none_never_matches() {
        assert!(!NameMatcher::for_type("System.Web.HttpContext").matches(None));
        assert!(!NameMatcher::for_member("System.Web.HttpContext", "Current").matches(None));
    }

    #[test]
    fn test_member_matcher() {
        let matcher = NameMatcher::for_member_full_name("System.Web.HttpContext.Current");
        assert!(matcher.is_member());
        assert!(matcher.matches(Some(&symbol("System.Web.HttpContext.Current"))));
        assert!(!matcher.matches(Some(&symbol("System.Web.HttpContext"))));

        let print = NameMatcher::for_member("Windows.Graphics.Printing.PrintManager", "getforcurrentview");
        assert!(print.matches(Some(&symbol("Windows.Graphics.Printing.PrintManager.GetForCurrentView"))));
        assert!(!print.matches(Some(&symbol("System.Web.HttpContext.Current"))));
    }
}
