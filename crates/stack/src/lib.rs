//! Project classification and target framework selection.
//!
//! Component identifiers read a project and report the technologies it is
//! built on as a [`ProjectComponents`] set. The selector combines those
//! components with the project's current and dependency frameworks to pick
//! the framework to upgrade to.

pub mod comparer;
pub mod components;
pub mod error;
pub mod identifier;
pub mod selector;

pub use comparer::TargetFrameworkMonikerComparer;
pub use components::{ComponentParseError, ProjectComponents};
pub use error::TfmError;
pub use identifier::{
    ComponentIdentifier, CompositeComponentIdentifier, OldStyleComponentIdentifier,
    PackageComponentIdentifier, SdkStyleComponentIdentifier, WindowsComponentIdentifier,
};
pub use selector::{
    FilterState, SelectorOptions, TargetFrameworkSelector, TargetFrameworkSelectorFilter,
};
