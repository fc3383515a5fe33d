//! Target framework selection.
//!
//! The selector starts from `netstandard2.0` and runs an ordered list of
//! filters over a shared [`FilterState`]. Each filter may raise the
//! tentative framework; the last one guarantees the result is never below
//! what the project already targets.

mod filters;

pub use filters::{
    DependencyFilter, ExecutableAndWebFilter, NetStandardBaselineFilter, NoDowngradeFilter,
    WindowsDesktopFilter,
};

use crate::components::ProjectComponents;
use crate::error::TfmError;
use dotport_core::DotportConfig;
use dotport_msbuild::{ProjectFile, TargetFrameworkMoniker, TfmVersion};
use std::sync::Arc;
use tracing::{debug, info};

/// Frameworks the selector can switch to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOptions {
    /// Framework for executables and web apps, from the configured support level.
    pub app_base: TargetFrameworkMoniker,
    /// Platform version used for WinRT and WinUI projects.
    pub windows_sdk_version: TfmVersion,
}

impl SelectorOptions {
    pub fn from_config(config: &DotportConfig) -> Result<Self, TfmError> {
        let base = config.app_tfm_base();
        let app_base = TargetFrameworkMoniker::parse(base).map_err(|e| TfmError::InvalidSetting {
            setting: "app framework",
            value: base.to_string(),
            reason: e.to_string(),
        })?;
        if !app_base.supports_platform() {
            return Err(TfmError::InvalidSetting {
                setting: "app framework",
                value: base.to_string(),
                reason: "must be .NET 5 or later".to_string(),
            });
        }

        let windows_sdk_version = TfmVersion::parse_dotted(&config.windows_sdk_version).ok_or_else(|| {
            TfmError::InvalidSetting {
                setting: "Windows SDK version",
                value: config.windows_sdk_version.clone(),
                reason: "expected a dotted version such as 10.0.19041.0".to_string(),
            }
        })?;

        Ok(Self {
            app_base: app_base.without_platform(),
            windows_sdk_version,
        })
    }
}

/// Mutable state threaded through the filters.
pub struct FilterState<'a> {
    pub project: &'a dyn ProjectFile,
    pub components: ProjectComponents,
    /// Current frameworks of the project's references.
    pub dependencies: &'a [TargetFrameworkMoniker],
    pub options: &'a SelectorOptions,
    /// Tentative result.
    pub tfm: TargetFrameworkMoniker,
}

pub trait TargetFrameworkSelectorFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn process(&self, state: &mut FilterState<'_>) -> Result<(), TfmError>;
}

pub struct TargetFrameworkSelector {
    filters: Vec<Arc<dyn TargetFrameworkSelectorFilter>>,
    options: SelectorOptions,
}

impl TargetFrameworkSelector {
    pub fn new(filters: Vec<Arc<dyn TargetFrameworkSelectorFilter>>, options: SelectorOptions) -> Self {
        Self { filters, options }
    }

    pub fn with_defaults(options: SelectorOptions) -> Self {
        Self::new(
            vec![
                Arc::new(NetStandardBaselineFilter),
                Arc::new(ExecutableAndWebFilter),
                Arc::new(WindowsDesktopFilter),
                Arc::new(DependencyFilter),
                Arc::new(NoDowngradeFilter),
            ],
            options,
        )
    }

    pub fn options(&self) -> &SelectorOptions {
        &self.options
    }

    pub fn filters(&self) -> &[Arc<dyn TargetFrameworkSelectorFilter>] {
        &self.filters
    }

    /// Recommended upgrade target for `project`.
    pub fn select(
        &self,
        project: &dyn ProjectFile,
        components: ProjectComponents,
        dependencies: &[TargetFrameworkMoniker],
    ) -> Result<TargetFrameworkMoniker, TfmError> {
        let mut state = FilterState {
            project,
            components,
            dependencies,
            options: &self.options,
            tfm: TargetFrameworkMoniker::net_standard20(),
        };

        for filter in &self.filters {
            filter.process(&mut state)?;
            debug!(filter = filter.name(), tfm = %state.tfm, "Applied selector filter");
        }

        info!(
            project = %project.file_path().display(),
            tfm = %state.tfm,
            "Selected target framework"
        );
        Ok(state.tfm)
    }
}
