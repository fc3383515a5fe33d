//! Diagnostics and the property bag read back by code fixers.

use crate::error::AnalyzerError;
use crate::syntax::{SyntaxTree, TextSpan};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const FIX_KIND_KEY: &str = "FixKind";
pub const NEW_IDENTIFIER_KEY: &str = "NewIdentifier";
pub const DOCUMENTATION_URL_KEY: &str = "DocumentationUrl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Static description of a diagnostic an analyzer can report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticDescriptor {
    pub id: String,
    pub title: String,
    pub category: &'static str,
    pub severity: Severity,
}

impl DiagnosticDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>, category: &'static str, severity: Severity) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category,
            severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: PathBuf,
    pub span: TextSpan,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn in_tree(tree: &SyntaxTree, span: TextSpan) -> Self {
        let (line, column) = tree.line_column(span.start);
        Self {
            path: tree.path().to_path_buf(),
            span,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: String,
    pub message: String,
    pub severity: Severity,
    pub location: Location,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Diagnostic {
    pub fn new(descriptor: &DiagnosticDescriptor, message: impl Into<String>, location: Location) -> Self {
        Self {
            id: descriptor.id.clone(),
            message: message.into(),
            severity: descriptor.severity,
            location,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_fix_hint(mut self, hint: &FixHint) -> Self {
        self.properties = hint.to_properties();
        self
    }

    pub fn fix_hint(&self) -> Result<FixHint, AnalyzerError> {
        FixHint::from_properties(&self.id, &self.properties)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}: {}", self.location, self.severity, self.id, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixKind {
    ReplaceIdentifier,
    ReplaceAttribute,
    ExplainOnly,
}

impl FixKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixKind::ReplaceIdentifier => "ReplaceIdentifier",
            FixKind::ReplaceAttribute => "ReplaceAttribute",
            FixKind::ExplainOnly => "ExplainOnly",
        }
    }

    fn requires_identifier(&self) -> bool {
        matches!(self, FixKind::ReplaceIdentifier | FixKind::ReplaceAttribute)
    }
}

impl FromStr for FixKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ReplaceIdentifier" => Ok(FixKind::ReplaceIdentifier),
            "ReplaceAttribute" => Ok(FixKind::ReplaceAttribute),
            "ExplainOnly" => Ok(FixKind::ExplainOnly),
            other => Err(format!("unknown fix kind '{}'", other)),
        }
    }
}

/// Typed view of a diagnostic's property bag.
///
/// | id | `FixKind` | `NewIdentifier` | `DocumentationUrl` |
/// |---|---|---|---|
/// | `UA0002` | `ReplaceIdentifier` or `ExplainOnly` | with `ReplaceIdentifier` | optional |
/// | `UA0010` | `ReplaceAttribute` or `ExplainOnly` | with `ReplaceAttribute` | optional |
/// | `UA0013_*` | `ExplainOnly` | absent | absent |
/// | `UA0014` | `ExplainOnly` | absent | required |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixHint {
    pub kind: FixKind,
    pub new_identifier: Option<String>,
    pub documentation_url: Option<String>,
}

impl FixHint {
    pub fn replace_identifier(new_identifier: impl Into<String>) -> Self {
        Self {
            kind: FixKind::ReplaceIdentifier,
            new_identifier: Some(new_identifier.into()),
            documentation_url: None,
        }
    }

    pub fn replace_attribute(new_identifier: impl Into<String>) -> Self {
        Self {
            kind: FixKind::ReplaceAttribute,
            new_identifier: Some(new_identifier.into()),
            documentation_url: None,
        }
    }

    pub fn explain_only() -> Self {
        Self {
            kind: FixKind::ExplainOnly,
            new_identifier: None,
            documentation_url: None,
        }
    }

    pub fn with_documentation_url(mut self, url: impl Into<String>) -> Self {
        self.documentation_url = Some(url.into());
        self
    }

    pub fn to_properties(&self) -> BTreeMap<String, String> {
        let mut properties = BTreeMap::new();
        properties.insert(FIX_KIND_KEY.to_string(), self.kind.as_str().to_string());
        if let Some(identifier) = &self.new_identifier {
            properties.insert(NEW_IDENTIFIER_KEY.to_string(), identifier.clone());
        }
        if let Some(url) = &self.documentation_url {
            properties.insert(DOCUMENTATION_URL_KEY.to_string(), url.clone());
        }
        properties
    }

    /// Reads and validates the bag of diagnostic `id`.
    pub fn from_properties(id: &str, properties: &BTreeMap<String, String>) -> Result<Self, AnalyzerError> {
        let kind_text = properties
            .get(FIX_KIND_KEY)
            .ok_or_else(|| AnalyzerError::MissingProperty {
                id: id.to_string(),
                key: FIX_KIND_KEY,
            })?;
        let kind = kind_text.parse::<FixKind>().map_err(|_| AnalyzerError::InvalidProperty {
            id: id.to_string(),
            key: FIX_KIND_KEY,
            value: kind_text.clone(),
        })?;

        let new_identifier = properties.get(NEW_IDENTIFIER_KEY).cloned();
        let documentation_url = properties.get(DOCUMENTATION_URL_KEY).cloned();

        let allowed = allowed_kinds(id);
        if !allowed.is_empty() && !allowed.contains(&kind) {
            return Err(AnalyzerError::InvalidProperty {
                id: id.to_string(),
                key: FIX_KIND_KEY,
                value: kind_text.clone(),
            });
        }

        if kind.requires_identifier() && new_identifier.as_deref().map_or(true, str::is_empty) {
            return Err(AnalyzerError::MissingProperty {
                id: id.to_string(),
                key: NEW_IDENTIFIER_KEY,
            });
        }
        if !kind.requires_identifier() {
            if let Some(value) = &new_identifier {
                return Err(AnalyzerError::InvalidProperty {
                    id: id.to_string(),
                    key: NEW_IDENTIFIER_KEY,
                    value: value.clone(),
                });
            }
        }

        if id.starts_with("UA0013_") {
            if let Some(value) = &documentation_url {
                return Err(AnalyzerError::InvalidProperty {
                    id: id.to_string(),
                    key: DOCUMENTATION_URL_KEY,
                    value: value.clone(),
                });
            }
        }
        if id == crate::analyzer::INTEROP_API_ID && documentation_url.is_none() {
            return Err(AnalyzerError::MissingProperty {
                id: id.to_string(),
                key: DOCUMENTATION_URL_KEY,
            });
        }

        Ok(Self {
            kind,
            new_identifier,
            documentation_url,
        })
    }
}

fn allowed_kinds(id: &str) -> &'static [FixKind] {
    use crate::analyzer::{API_ALERT_BASE_ID, ATTRIBUTE_UPGRADE_ID, INTEROP_API_ID, TYPE_UPGRADE_ID};

    if id == TYPE_UPGRADE_ID {
        &[FixKind::ReplaceIdentifier, FixKind::ExplainOnly]
    } else if id == ATTRIBUTE_UPGRADE_ID {
        &[FixKind::ReplaceAttribute, FixKind::ExplainOnly]
    } else if id == INTEROP_API_ID || id.starts_with(API_ALERT_BASE_ID) {
        &[FixKind::ExplainOnly]
    } else {
        &[]
    }
}
