//! API alert tables (`*.apitargets`).
//!
//! A table is a JSON array of rules. Each rule names one or more target
//! APIs and the message to show when one of them is referenced:
//!
//! ```json
//! [
//!   {
//!     "Id": "HtmlHelper",
//!     "TargetSyntaxes": [
//!       { "FullName": "System.Web.Mvc.HtmlHelper", "SyntaxType": "Type", "AlertOnAmbiguousMatch": true },
//!     ],
//!     "Message": "HtmlHelper should be replaced with IHtmlHelper.",
//!   },
//! ]
//! ```
//!
//! Trailing commas are accepted.

use crate::error::AnalyzerError;
use crate::name_matcher::NameMatcher;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

const DEFAULT_TARGETS: &str = include_str!("../resources/default.apitargets");

/// File extension of additional alert tables.
pub const API_TARGETS_EXTENSION: &str = "apitargets";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetSyntaxType {
    Namespace,
    Type,
    Member,
}

impl FromStr for TargetSyntaxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "namespace" => Ok(TargetSyntaxType::Namespace),
            "type" => Ok(TargetSyntaxType::Type),
            "member" => Ok(TargetSyntaxType::Member),
            other => Err(format!(
                "unknown syntax type '{}', expected Namespace, Type or Member",
                other
            )),
        }
    }
}

// Enum names are read case-insensitively.
impl<'de> Deserialize<'de> for TargetSyntaxType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetSyntax {
    pub full_name: String,
    pub syntax_type: TargetSyntaxType,
    #[serde(default)]
    pub alert_on_ambiguous_match: bool,
}

impl TargetSyntax {
    pub fn new(full_name: impl Into<String>, syntax_type: TargetSyntaxType, alert_on_ambiguous_match: bool) -> Self {
        Self {
            full_name: full_name.into(),
            syntax_type,
            alert_on_ambiguous_match,
        }
    }

    /// Last dotted segment.
    pub fn simple_name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map(|(_, name)| name)
            .unwrap_or(&self.full_name)
    }

    pub fn name_matcher(&self) -> NameMatcher {
        match self.syntax_type {
            TargetSyntaxType::Member => NameMatcher::for_member_full_name(&self.full_name),
            TargetSyntaxType::Namespace | TargetSyntaxType::Type => NameMatcher::for_type(&self.full_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetSyntaxMessage {
    pub id: String,
    pub target_syntaxes: Vec<TargetSyntax>,
    pub message: String,
}

/// Parses one alert table.
pub fn parse_api_targets(path: &Path, text: &str) -> Result<Vec<TargetSyntaxMessage>, AnalyzerError> {
    let cleaned = strip_trailing_commas(text);
    let messages: Vec<TargetSyntaxMessage> =
        serde_json::from_str(&cleaned).map_err(|e| AnalyzerError::MappingFile {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

    for message in &messages {
        if message.id.trim().is_empty() {
            return Err(AnalyzerError::MappingFile {
                path: path.to_path_buf(),
                details: "rule without an Id".to_string(),
            });
        }
        if let Some(empty) = message.target_syntaxes.iter().find(|t| t.full_name.trim().is_empty()) {
            return Err(AnalyzerError::MappingFile {
                path: path.to_path_buf(),
                details: format!("rule {} has a target without a FullName ({:?})", message.id, empty.syntax_type),
            });
        }
    }

    Ok(messages)
}

/// The embedded default table.
pub fn load_default_api_targets() -> Vec<TargetSyntaxMessage> {
    match parse_api_targets(Path::new("default.apitargets"), DEFAULT_TARGETS) {
        Ok(messages) => messages,
        Err(e) => {
            warn!(error = %e, "Embedded API target table is invalid");
            Vec::new()
        }
    }
}

/// Default table plus every `*.apitargets` file among `additional`.
pub fn load_api_targets<'a, I>(additional: I) -> Vec<TargetSyntaxMessage>
where
    I: IntoIterator<Item = (&'a Path, &'a str)>,
{
    let mut messages = load_default_api_targets();
    messages.extend(load_additional_api_targets(additional));
    messages
}

/// Rules from the `*.apitargets` files among `additional` only.
///
/// Files that fail to parse are logged and skipped.
pub fn load_additional_api_targets<'a, I>(additional: I) -> Vec<TargetSyntaxMessage>
where
    I: IntoIterator<Item = (&'a Path, &'a str)>,
{
    let mut messages = Vec::new();
    for (path, text) in additional {
        if !has_extension(path, API_TARGETS_EXTENSION) {
            continue;
        }
        match parse_api_targets(path, text) {
            Ok(mut extra) => {
                debug!(path = %path.display(), rules = extra.len(), "Loaded API targets");
                messages.append(&mut extra);
            }
            Err(e) => warn!(error = %e, "Skipping API target file"),
        }
    }
    messages
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Drops commas that directly precede `]` or `}` outside string literals.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if !matches!(next, Some(']') | Some('}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_trailing_commas() {
        let text = r#"[
            {
                "Id": "HttpContext",
                "TargetSyntaxes": [
                    { "FullName": "System.Web.HttpContext", "SyntaxType": "Type", "AlertOnAmbiguousMatch": false, },
                    { "FullName": "System.Web.HttpContext.Current", "SyntaxType": "Member", },
                ],
                "Message": "Use IHttpContextAccessor, not \"HttpContext.Current\",",
            },
        ]"#;

        let messages = parse_api_targets(Path::new("a.apitargets"), text).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "HttpContext");
        assert_eq!(messages[0].message, "Use IHttpContextAccessor, not \"HttpContext.Current\",");
        assert_eq!(messages[0].target_syntaxes[1].syntax_type, TargetSyntaxType::Member);
        assert!(!messages[0].target_syntaxes[1].alert_on_ambiguous_match);
        assert_eq!(messages[0].target_syntaxes[1].simple_name(), "Current");
        assert!(messages[0].target_syntaxes[1].name_matcher().is_member());
    }

    #[test]
    fn test_syntax_type_is_case_insensitive() {
        let text = r#"[
            {
                "Id": "Remoting",
                "TargetSyntaxes": [
                    { "FullName": "System.Runtime.Remoting", "SyntaxType": "namespace" },
                    { "FullName": "System.Runtime.Remoting.RemotingServices", "SyntaxType": "TYPE" },
                    { "FullName": "System.AppDomain.CreateDomain", "SyntaxType": "member" },
                ],
                "Message": "Remoting is not supported",
            },
        ]"#;

        let messages = parse_api_targets(Path::new("lower.apitargets"), text).unwrap();
        let kinds: Vec<_> = messages[0].target_syntaxes.iter().map(|t| t.syntax_type).collect();
        assert_eq!(
            kinds,
            vec![TargetSyntaxType::Namespace, TargetSyntaxType::Type, TargetSyntaxType::Member]
        );
    }

    #[test]
    fn test_unknown_syntax_type_is_error() {
        let text = r#"[{ "Id": "X", "TargetSyntaxes": [{ "FullName": "A.B", "SyntaxType": "Field" }], "Message": "m" }]"#;
        let err = parse_api_targets(Path::new("bad.apitargets"), text).unwrap_err();
        assert!(matches!(err, AnalyzerError::MappingFile { .. }));
    }

    #[test]
    fn test_invalid_table_is_error() {
        let err = parse_api_targets(Path::new("bad.apitargets"), "{ not json").unwrap_err();
        assert!(matches!(err, AnalyzerError::MappingFile { .. }));

        let err = parse_api_targets(
            Path::new("bad.apitargets"),
            r#"[{ "Id": "", "TargetSyntaxes": [], "Message": "m" }]"#,
        )
        .unwrap_err();
        assert!(matches!(err, AnalyzerError::MappingFile { .. }));
    }

    #[test]
    fn test_unknown_syntax_type_method_is_error() {
        let text = r#"[{ "Id": "X", "TargetSyntaxes": [{ "FullName": "A.B", "SyntaxType": "Method" }], "Message": "m" }]"#;
        assert!(parse_api_targets(Path::new("x.apitargets"), text).is_err());
    }

    #[test]
    fn test_defaults_load() {
        let defaults = load_default_api_targets();
        assert!(!defaults.is_empty());
        assert!(defaults
            .iter()
            .flat_map(|m| &m.target_syntaxes)
            .any(|t| t.full_name == "System.Web.Mvc.HtmlHelper"));
    }

    #[test]
    fn test_additional_files_union_and_skip_invalid() {
        let extra = r#"[{ "Id": "Custom", "TargetSyntaxes": [{ "FullName": "Contoso.Legacy", "SyntaxType": "Namespace" }], "Message": "m" }]"#;
        let files = [
            (Path::new("custom.apitargets"), extra),
            (Path::new("broken.apitargets"), "[{"),
            (Path::new("ignored.typemap"), extra),
        ];
        let all = load_api_targets(files.iter().map(|(p, t)| (*p, *t)));
        let defaults = load_default_api_targets();
        assert_eq!(all.len(), defaults.len() + 1);
        assert_eq!(all.last().map(|m| m.id.as_str()), Some("Custom"));
    }
}
