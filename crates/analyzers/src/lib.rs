//! Source analyzers and code fixes for code that references APIs removed
//! or renamed by an upgrade.

pub mod analyzer;
pub mod compilation;
pub mod diagnostic;
pub mod driver;
pub mod error;
pub mod fix;
pub mod name_matcher;
pub mod semantic;
pub mod syntax;
pub mod target_syntax;
pub mod type_map;

pub use analyzer::{
    Analyzer, ApiAlertAnalyzer, AttributeUpgradeAnalyzer, InteropApiAnalyzer, NodeAnalyzer, NodeContext,
    TypeUpgradeAnalyzer, API_ALERT_BASE_ID, ATTRIBUTE_UPGRADE_ID, INTEROP_API_ID, TYPE_UPGRADE_ID,
};
pub use compilation::{AdditionalText, Compilation};
pub use diagnostic::{Diagnostic, DiagnosticDescriptor, FixHint, FixKind, Location, Severity};
pub use driver::AnalysisDriver;
pub use error::AnalyzerError;
pub use fix::{BatchFixer, CodeFixer, FixResult, TextEdit};
pub use name_matcher::NameMatcher;
pub use semantic::{SemanticModel, Symbol, SymbolKind, SymbolResolution, SymbolTable};
pub use syntax::{Language, NameContext, NameNode, SyntaxTree, TextSpan};
pub use target_syntax::{TargetSyntax, TargetSyntaxMessage, TargetSyntaxType};
pub use type_map::{TypeMap, TypeMapping};
