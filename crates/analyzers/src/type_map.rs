//! Type rename tables (`*.typemap`).
//!
//! One mapping per line: the old fully qualified name, whitespace, and the
//! new fully qualified name. A line with only the old name marks a type
//! removed without replacement. `#` starts a comment line.

use crate::error::AnalyzerError;
use crate::target_syntax::has_extension;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

const WEB_TYPEMAP: &str = include_str!("../resources/web.typemap");
const WINDOWS_TYPEMAP: &str = include_str!("../resources/windows.typemap");

pub const TYPEMAP_EXTENSION: &str = "typemap";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    pub old_name: String,
    pub new_name: Option<String>,
}

impl TypeMapping {
    pub fn new(old_name: impl Into<String>, new_name: Option<String>) -> Self {
        Self {
            old_name: old_name.into(),
            new_name,
        }
    }

    /// Last segment of the old name.
    pub fn simple_name(&self) -> &str {
        self.old_name
            .rsplit_once('.')
            .map(|(_, name)| name)
            .unwrap_or(&self.old_name)
    }

    pub fn new_simple_name(&self) -> Option<&str> {
        let new_name = self.new_name.as_deref()?;
        Some(new_name.rsplit_once('.').map(|(_, name)| name).unwrap_or(new_name))
    }

    pub fn new_namespace(&self) -> Option<&str> {
        self.new_name.as_deref()?.rsplit_once('.').map(|(ns, _)| ns)
    }

    pub fn is_attribute(&self) -> bool {
        self.simple_name().ends_with("Attribute")
    }
}

pub fn parse_type_map(path: &Path, text: &str) -> Result<Vec<TypeMapping>, AnalyzerError> {
    let mut mappings = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let columns: Vec<&str> = line.split_whitespace().collect();
        let mapping = match columns.as_slice() {
            [old] => TypeMapping::new(*old, None),
            [old, new] => TypeMapping::new(*old, Some(new.to_string())),
            _ => {
                return Err(AnalyzerError::MappingFile {
                    path: path.to_path_buf(),
                    details: format!("line {}: expected one or two columns, found {}", index + 1, columns.len()),
                })
            }
        };
        mappings.push(mapping);
    }

    Ok(mappings)
}

/// Mappings keyed by old name; later tables override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    mappings: BTreeMap<String, TypeMapping>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embedded web and Windows tables.
    pub fn with_defaults() -> Self {
        let mut map = Self::new();
        for (name, text) in [("web.typemap", WEB_TYPEMAP), ("windows.typemap", WINDOWS_TYPEMAP)] {
            match parse_type_map(Path::new(name), text) {
                Ok(mappings) => map.extend(mappings),
                Err(e) => warn!(error = %e, "Embedded type map is invalid"),
            }
        }
        map
    }

    /// Defaults plus every `*.typemap` among `additional`.
    pub fn load<'a, I>(additional: I) -> Self
    where
        I: IntoIterator<Item = (&'a Path, &'a str)>,
    {
        let mut map = Self::with_defaults();
        for (path, text) in additional {
            if !has_extension(path, TYPEMAP_EXTENSION) {
                continue;
            }
            match parse_type_map(path, text) {
                Ok(mappings) => {
                    debug!(path = %path.display(), mappings = mappings.len(), "Loaded type map");
                    map.extend(mappings);
                }
                Err(e) => warn!(error = %e, "Skipping type map"),
            }
        }
        map
    }

    pub fn extend(&mut self, mappings: impl IntoIterator<Item = TypeMapping>) {
        for mapping in mappings {
            self.mappings.insert(mapping.old_name.clone(), mapping);
        }
    }

    pub fn get(&self, old_name: &str) -> Option<&TypeMapping> {
        self.mappings.get(old_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeMapping> {
        self.mappings.values()
    }

    /// Attribute mappings only.
    pub fn attributes(&self) -> impl Iterator<Item = &TypeMapping> {
        self.iter().filter(|m| m.is_attribute())
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
