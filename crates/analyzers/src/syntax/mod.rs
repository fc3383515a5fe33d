//! Language-neutral view of a source file.
//!
//! The analyzers only care about names: every identifier reference in a
//! file becomes a [`NameNode`] carrying its simple name, the dotted text
//! written to its left and the syntactic position it appears in. Both
//! front ends produce the same shape, so analyzers never branch on
//! language except for name comparison.

mod csharp;
mod visual_basic;

use crate::error::AnalyzerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    CSharp,
    VisualBasic,
}

impl Language {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "cs" => Some(Language::CSharp),
            "vb" => Some(Language::VisualBasic),
            _ => None,
        }
    }

    /// C# names are case-sensitive, Visual Basic names are not.
    pub fn names_equal(&self, a: &str, b: &str) -> bool {
        match self {
            Language::CSharp => a == b,
            Language::VisualBasic => a.eq_ignore_ascii_case(b),
        }
    }

    pub fn line_comment(&self) -> &'static str {
        match self {
            Language::CSharp => "//",
            Language::VisualBasic => "'",
        }
    }

    /// Directive that brings a namespace into scope.
    pub fn import_directive(&self, namespace: &str) -> String {
        match self {
            Language::CSharp => format!("using {};", namespace),
            Language::VisualBasic => format!("Imports {}", namespace),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::CSharp => f.write_str("C#"),
            Language::VisualBasic => f.write_str("Visual Basic"),
        }
    }
}

/// Half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &TextSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Syntactic position of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameContext {
    /// A name on its own, or the leftmost part of a dotted name.
    Simple,
    /// Right-hand part of a dotted type or namespace name.
    Qualified,
    /// Name after the `.` of a member access expression.
    MemberAccess,
    /// Name of an attribute.
    Attribute,
    /// Part of a `using` / `Imports` directive.
    Import,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameNode {
    pub simple_name: String,
    /// Dotted text to the left of the name, when it is made of names only.
    pub qualifier: Option<String>,
    pub context: NameContext,
    /// Written with type arguments (`List<T>`, `List(Of T)`).
    pub is_generic: bool,
    /// The identifier token.
    pub span: TextSpan,
    /// From the start of the qualifier to the end of the identifier.
    pub full_span: TextSpan,
}

impl NameNode {
    /// Best-effort qualified name built from syntax alone.
    pub fn qualified_name(&self) -> String {
        match &self.qualifier {
            Some(qualifier) => format!("{}.{}", qualifier, self.simple_name),
            None => self.simple_name.clone(),
        }
    }

    pub fn is_member_access_name(&self) -> bool {
        self.context == NameContext::MemberAccess
    }

    pub fn is_attribute(&self) -> bool {
        self.context == NameContext::Attribute
    }
}

/// A type declared in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub namespace: Option<String>,
    pub name: String,
}

impl TypeDeclaration {
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

/// Namespace block and the text it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceScope {
    pub name: String,
    pub span: TextSpan,
}

/// Output of a language front end.
#[derive(Debug, Default)]
pub(crate) struct SyntaxParts {
    pub names: Vec<NameNode>,
    pub imports: Vec<String>,
    pub import_spans: Vec<TextSpan>,
    pub declarations: Vec<TypeDeclaration>,
    pub namespaces: Vec<NamespaceScope>,
}

#[derive(Debug)]
pub struct SyntaxTree {
    path: PathBuf,
    language: Language,
    text: String,
    line_starts: Vec<usize>,
    parts: SyntaxParts,
}

impl SyntaxTree {
    /// Parses `text`, picking the language from the file extension.
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self, AnalyzerError> {
        let path = path.into();
        let language = Language::from_path(&path).ok_or_else(|| AnalyzerError::Parse {
            path: path.clone(),
            details: "not a C# or Visual Basic source file".to_string(),
        })?;
        Self::parse_with(language, path, text)
    }

    pub fn parse_with(
        language: Language,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> Result<Self, AnalyzerError> {
        let path = path.into();
        let text = text.into();
        let parts = match language {
            Language::CSharp => csharp::parse(&path, &text)?,
            Language::VisualBasic => visual_basic::parse(&text),
        };

        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Ok(Self {
            path,
            language,
            text,
            line_starts,
            parts,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn names(&self) -> &[NameNode] {
        &self.parts.names
    }

    /// Namespaces brought into scope by `using` / `Imports`.
    pub fn imports(&self) -> &[String] {
        &self.parts.imports
    }

    pub fn declarations(&self) -> &[TypeDeclaration] {
        &self.parts.declarations
    }

    pub fn namespaces(&self) -> &[NamespaceScope] {
        &self.parts.namespaces
    }

    pub fn text_at(&self, span: TextSpan) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    /// Namespaces enclosing `offset`, innermost first.
    pub fn enclosing_namespaces(&self, offset: usize) -> Vec<&str> {
        let mut scopes: Vec<&NamespaceScope> = self
            .parts
            .namespaces
            .iter()
            .filter(|ns| ns.span.contains(offset))
            .collect();
        scopes.sort_by_key(|ns| std::cmp::Reverse(ns.span.start));
        scopes.into_iter().map(|ns| ns.name.as_str()).collect()
    }

    /// 1-based line and column.
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|start| *start <= offset);
        let start = self.line_starts[line.saturating_sub(1)];
        (line.max(1), offset.saturating_sub(start) + 1)
    }

    pub fn line_start(&self, offset: usize) -> usize {
        let line = self.line_starts.partition_point(|start| *start <= offset);
        self.line_starts[line.saturating_sub(1)]
    }

    /// Leading whitespace of the line containing `offset`.
    pub fn indentation_at(&self, offset: usize) -> &str {
        let start = self.line_start(offset);
        let rest = &self.text[start..];
        let width = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        &rest[..width]
    }

    /// Where a new import directive goes: after the last existing one, or at
    /// the top of the file.
    pub fn import_insertion_point(&self) -> usize {
        match self.parts.import_spans.iter().map(|s| s.end).max() {
            Some(end) => self.text[end..]
                .find('\n')
                .map(|i| end + i + 1)
                .unwrap_or(self.text.len()),
            None => 0,
        }
    }

    pub fn has_import(&self, namespace: &str) -> bool {
        self.parts
            .imports
            .iter()
            .any(|i| self.language.names_equal(i, namespace))
    }

    /// Name whose identifier or full span equals `span`.
    pub fn name_at(&self, span: TextSpan) -> Option<&NameNode> {
        self.parts
            .names
            .iter()
            .find(|n| n.full_span == span || n.span == span)
    }
}

/// Removes whitespace from dotted text such as `System . Web`.
pub(crate) fn compact_dotted(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
