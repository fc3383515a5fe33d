//! The unit of analysis: source trees, additional files and the symbol
//! table they bind against.

use crate::error::AnalyzerError;
use crate::semantic::{SemanticModel, SymbolTable};
use crate::syntax::SyntaxTree;
use std::path::{Path, PathBuf};

/// Non-source file handed to analyzers (`*.apitargets`, `*.typemap`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalText {
    pub path: PathBuf,
    pub text: String,
}

impl AdditionalText {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Compilation {
    trees: Vec<SyntaxTree>,
    additional_files: Vec<AdditionalText>,
    references: SymbolTable,
    symbols: SymbolTable,
}

impl Compilation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and adds a C# or Visual Basic source file.
    pub fn add_source(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Result<(), AnalyzerError> {
        let tree = SyntaxTree::parse(path, text)?;
        self.add_tree(tree);
        Ok(())
    }

    pub fn add_tree(&mut self, tree: SyntaxTree) {
        for declaration in tree.declarations() {
            self.symbols.add_type(&declaration.full_name());
        }
        for namespace in tree.namespaces() {
            self.symbols.add_namespace(&namespace.name);
        }
        self.trees.push(tree);
    }

    pub fn add_additional_file(&mut self, file: AdditionalText) {
        self.additional_files.push(file);
    }

    /// Referenced API surface the sources bind against.
    pub fn with_references(mut self, references: SymbolTable) -> Self {
        self.symbols.merge(&references);
        self.references = references;
        self
    }

    pub fn trees(&self) -> &[SyntaxTree] {
        &self.trees
    }

    pub fn tree(&self, path: &Path) -> Option<&SyntaxTree> {
        self.trees.iter().find(|t| t.path() == path)
    }

    pub fn additional_files(&self) -> &[AdditionalText] {
        &self.additional_files
    }

    /// `(path, text)` pairs for the table loaders.
    pub fn additional_texts(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.additional_files
            .iter()
            .map(|f| (f.path.as_path(), f.text.as_str()))
    }

    pub fn references(&self) -> &SymbolTable {
        &self.references
    }

    /// References plus the types declared in the sources.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn semantic_model<'a>(&'a self, tree: &'a SyntaxTree) -> SemanticModel<'a> {
        SemanticModel::new(tree, &self.symbols)
    }
}
