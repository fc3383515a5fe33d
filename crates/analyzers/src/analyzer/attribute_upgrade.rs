use super::type_upgrade::{MappingMode, MappingNodeAnalyzer};
use super::{Analyzer, NodeAnalyzer, ATTRIBUTE_UPGRADE_ID, UPGRADE_CATEGORY};
use crate::compilation::Compilation;
use crate::diagnostic::{DiagnosticDescriptor, Severity};
use crate::type_map::TypeMap;
use tracing::debug;

/// Reports attributes with a replacement in the `*.typemap` tables.
///
/// Only attribute usages (`[Authorize]`, `<Authorize>`) are considered;
/// other references to attribute types go through [`super::TypeUpgradeAnalyzer`].
#[derive(Debug, Default)]
pub struct AttributeUpgradeAnalyzer;

impl AttributeUpgradeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub(super) fn descriptor() -> DiagnosticDescriptor {
        DiagnosticDescriptor::new(
            ATTRIBUTE_UPGRADE_ID,
            "Attributes should be upgraded",
            UPGRADE_CATEGORY,
            Severity::Warning,
        )
    }
}

impl Analyzer for AttributeUpgradeAnalyzer {
    fn name(&self) -> &'static str {
        "attribute-upgrade"
    }

    fn descriptors(&self) -> Vec<DiagnosticDescriptor> {
        vec![Self::descriptor()]
    }

    fn start(&self, compilation: &Compilation) -> Option<Box<dyn NodeAnalyzer>> {
        let map = TypeMap::load(compilation.additional_texts());
        let attributes: Vec<_> = map.attributes().cloned().collect();
        if attributes.is_empty() {
            debug!("No attribute mappings, skipping");
            return None;
        }
        debug!(mappings = attributes.len(), "Attribute mappings loaded");
        Some(Box::new(MappingNodeAnalyzer::new(attributes, MappingMode::Attributes)))
    }
}
