//! A small semantic model: which symbol, if any, a name binds to.
//!
//! Symbols come from a [`SymbolTable`] filled with the referenced API
//! surface plus the types declared in the compilation. Binding follows the
//! usual lookup order: the name as written, then every enclosing namespace,
//! then every imported namespace. Binding is deliberately three-valued,
//! since a name that fails to bind is the normal case for code that still
//! references a removed API.

use crate::syntax::{Language, NameContext, NameNode, SyntaxTree};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Namespace,
    Type,
    Method,
    Property,
    Field,
    Event,
}

impl SymbolKind {
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            SymbolKind::Method | SymbolKind::Property | SymbolKind::Field | SymbolKind::Event
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
    containing: Option<Arc<Symbol>>,
}

impl Symbol {
    pub fn global_namespace() -> Arc<Symbol> {
        Arc::new(Symbol {
            name: String::new(),
            kind: SymbolKind::Namespace,
            containing: None,
        })
    }

    pub fn new(name: impl Into<String>, kind: SymbolKind, containing: Arc<Symbol>) -> Self {
        Self {
            name: name.into(),
            kind,
            containing: Some(containing),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// Namespace or type this symbol is declared in.
    pub fn containing(&self) -> Option<&Symbol> {
        self.containing.as_deref()
    }

    pub fn is_global_namespace(&self) -> bool {
        self.kind == SymbolKind::Namespace && self.containing.is_none()
    }

    pub fn full_name(&self) -> String {
        let mut parts = Vec::new();
        let mut current = Some(self);
        while let Some(symbol) = current {
            if !symbol.is_global_namespace() {
                parts.push(symbol.name.as_str());
            }
            current = symbol.containing();
        }
        parts.reverse();
        parts.join(".")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Outcome of binding a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolResolution {
    Resolved(Arc<Symbol>),
    /// Written where a type or namespace is expected, but nothing (or more
    /// than one thing) by that name is known. Typical of a missing reference.
    ErrorType { name: String },
    /// No binding information at all.
    Unresolved,
}

impl SymbolResolution {
    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            SymbolResolution::Resolved(symbol) => Some(symbol),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, SymbolResolution::Resolved(_))
    }
}

/// Known namespaces, types and members by full name.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    global: Arc<Symbol>,
    symbols: HashMap<String, Arc<Symbol>>,
    folded: HashMap<String, Vec<String>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            global: Symbol::global_namespace(),
            symbols: HashMap::new(),
            folded: HashMap::new(),
        }
    }

    /// Parses a reference list, one symbol per line. Lines use documentation
    /// id prefixes (`N:`, `T:`, `M:`, `P:`, `F:`, `E:`); a bare name is a type.
    /// Method signatures after `(` are ignored. Blank lines and `#` comments
    /// are skipped.
    pub fn parse_reference_list(text: &str) -> Self {
        let mut table = Self::new();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (kind, name) = match line.split_once(':') {
                Some(("N", rest)) => (SymbolKind::Namespace, rest),
                Some(("T", rest)) => (SymbolKind::Type, rest),
                Some(("M", rest)) => (SymbolKind::Method, rest),
                Some(("P", rest)) => (SymbolKind::Property, rest),
                Some(("F", rest)) => (SymbolKind::Field, rest),
                Some(("E", rest)) => (SymbolKind::Event, rest),
                _ => (SymbolKind::Type, line),
            };
            let name = name.split('(').next().unwrap_or(name).trim();
            match kind {
                SymbolKind::Namespace => {
                    table.add_namespace(name);
                }
                SymbolKind::Type => {
                    table.add_type(name);
                }
                member => {
                    if let Some((owner, member_name)) = name.rsplit_once('.') {
                        table.add_member(owner, member_name, member);
                    }
                }
            }
        }
        table
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn add_namespace(&mut self, full_name: &str) -> Arc<Symbol> {
        let mut current = self.global.clone();
        for part in full_name.split('.').filter(|p| !p.is_empty()) {
            current = self.child(&current, part, SymbolKind::Namespace);
        }
        current
    }

    /// Adds a type; every dotted prefix not already known as a type becomes a namespace.
    pub fn add_type(&mut self, full_name: &str) -> Arc<Symbol> {
        match full_name.rsplit_once('.') {
            Some((container, name)) => {
                let owner = match self.symbols.get(container) {
                    Some(existing) => existing.clone(),
                    None => self.add_namespace(container),
                };
                self.child(&owner, name, SymbolKind::Type)
            }
            None => {
                let global = self.global.clone();
                self.child(&global, full_name, SymbolKind::Type)
            }
        }
    }

    pub fn add_member(&mut self, type_full_name: &str, member: &str, kind: SymbolKind) -> Arc<Symbol> {
        let owner = match self.symbols.get(type_full_name) {
            Some(existing) if existing.kind() == SymbolKind::Type => existing.clone(),
            _ => self.add_type(type_full_name),
        };
        self.child(&owner, member, kind)
    }

    fn child(&mut self, parent: &Arc<Symbol>, name: &str, kind: SymbolKind) -> Arc<Symbol> {
        let full_name = if parent.is_global_namespace() {
            name.to_string()
        } else {
            format!("{}.{}", parent.full_name(), name)
        };
        if let Some(existing) = self.symbols.get(&full_name) {
            return existing.clone();
        }
        let symbol = Arc::new(Symbol::new(name, kind, parent.clone()));
        self.folded
            .entry(full_name.to_lowercase())
            .or_default()
            .push(full_name.clone());
        self.symbols.insert(full_name, symbol.clone());
        symbol
    }

    /// Symbols named `full_name`. Visual Basic lookups ignore case and can
    /// therefore find more than one.
    pub fn lookup(&self, full_name: &str, language: Language) -> Vec<Arc<Symbol>> {
        match language {
            Language::CSharp => self.symbols.get(full_name).cloned().into_iter().collect(),
            Language::VisualBasic => self
                .folded
                .get(&full_name.to_lowercase())
                .into_iter()
                .flatten()
                .filter_map(|name| self.symbols.get(name).cloned())
                .collect(),
        }
    }

    pub fn merge(&mut self, other: &SymbolTable) {
        let mut names: Vec<&Arc<Symbol>> = other.symbols.values().collect();
        names.sort_by_key(|s| s.full_name().matches('.').count());
        for symbol in names {
            let full_name = symbol.full_name();
            match symbol.kind() {
                SymbolKind::Namespace => {
                    self.add_namespace(&full_name);
                }
                SymbolKind::Type => {
                    self.add_type(&full_name);
                }
                member => {
                    if let Some(owner) = symbol.containing() {
                        self.add_member(&owner.full_name(), symbol.name(), member);
                    }
                }
            }
        }
    }
}

/// Binds names of one syntax tree against a symbol table.
pub struct SemanticModel<'a> {
    tree: &'a SyntaxTree,
    table: &'a SymbolTable,
}

impl<'a> SemanticModel<'a> {
    pub fn new(tree: &'a SyntaxTree, table: &'a SymbolTable) -> Self {
        Self { tree, table }
    }

    pub fn tree(&self) -> &SyntaxTree {
        self.tree
    }

    pub fn resolve(&self, node: &NameNode) -> SymbolResolution {
        match node.context {
            NameContext::MemberAccess => self.resolve_member(node),
            NameContext::Import => {
                let name = node.qualified_name();
                self.unique(self.table.lookup(&name, self.tree.language()), name)
            }
            NameContext::Attribute => {
                let suffixed = format!("{}Attribute", node.simple_name);
                let found = self.bind(node.qualifier.as_deref(), &suffixed, node.span.start);
                if !found.is_empty() {
                    return self.unique(found, node.qualified_name());
                }
                self.resolve_type(node)
            }
            NameContext::Simple | NameContext::Qualified => self.resolve_type(node),
        }
    }

    fn resolve_type(&self, node: &NameNode) -> SymbolResolution {
        let found = self.bind(node.qualifier.as_deref(), &node.simple_name, node.span.start);
        if found.is_empty() && node.context == NameContext::Simple && !node.is_generic {
            // could just as well be a local or a member of the enclosing type
            return SymbolResolution::Unresolved;
        }
        self.unique(found, node.qualified_name())
    }

    fn resolve_member(&self, node: &NameNode) -> SymbolResolution {
        let Some(qualifier) = node.qualifier.as_deref() else {
            return SymbolResolution::Unresolved;
        };
        let (receiver_qualifier, receiver_name) = match qualifier.rsplit_once('.') {
            Some((left, right)) => (Some(left), right),
            None => (None, qualifier),
        };
        let receivers = self.bind(receiver_qualifier, receiver_name, node.span.start);
        let [receiver] = receivers.as_slice() else {
            return SymbolResolution::Unresolved;
        };

        let found = self
            .table
            .lookup(&format!("{}.{}", receiver.full_name(), node.simple_name), self.tree.language());
        match receiver.kind() {
            // `Namespace.Type` written in expression form
            SymbolKind::Namespace => self.unique(found, node.qualified_name()),
            SymbolKind::Type => match found.as_slice() {
                [member] => SymbolResolution::Resolved(member.clone()),
                _ => SymbolResolution::Unresolved,
            },
            _ => SymbolResolution::Unresolved,
        }
    }

    /// Every symbol `qualifier.name` can refer to from `offset`.
    fn bind(&self, qualifier: Option<&str>, name: &str, offset: usize) -> Vec<Arc<Symbol>> {
        let written = match qualifier {
            Some(q) => format!("{}.{}", q, name),
            None => name.to_string(),
        };

        let mut scoped = vec![written.clone()];
        for namespace in self.tree.enclosing_namespaces(offset) {
            let mut prefix = namespace;
            loop {
                scoped.push(format!("{}.{}", prefix, written));
                match prefix.rsplit_once('.') {
                    Some((outer, _)) => prefix = outer,
                    None => break,
                }
            }
        }

        // names in scope hide imported ones
        for candidate in &scoped {
            let found = self.table.lookup(candidate, self.tree.language());
            if !found.is_empty() {
                return found;
            }
        }

        let mut found: Vec<Arc<Symbol>> = Vec::new();
        for import in self.tree.imports() {
            for symbol in self.table.lookup(&format!("{}.{}", import, written), self.tree.language()) {
                if !found.iter().any(|f| Arc::ptr_eq(f, &symbol)) {
                    found.push(symbol);
                }
            }
        }
        found
    }

    fn unique(&self, found: Vec<Arc<Symbol>>, name: String) -> SymbolResolution {
        match found.as_slice() {
            [symbol] => SymbolResolution::Resolved(symbol.clone()),
            _ => SymbolResolution::ErrorType { name },
        }
    }
}
