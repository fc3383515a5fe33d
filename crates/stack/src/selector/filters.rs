use super::{FilterState, TargetFrameworkSelectorFilter};
use crate::comparer::TargetFrameworkMonikerComparer;
use crate::components::ProjectComponents;
use crate::error::TfmError;
use dotport_msbuild::{ProjectOutputType, TargetFrameworkMoniker};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

const WINDOWS_PLATFORM: &str = "windows";

/// Keeps a project that already targets .NET Standard on its highest
/// standard version instead of the `netstandard2.0` floor.
pub struct NetStandardBaselineFilter;

impl TargetFrameworkSelectorFilter for NetStandardBaselineFilter {
    fn name(&self) -> &'static str {
        "netstandard-baseline"
    }

    fn process(&self, state: &mut FilterState<'_>) -> Result<(), TfmError> {
        let highest = state
            .project
            .target_frameworks()
            .iter()
            .filter(|tfm| tfm.is_net_standard())
            .max_by_key(|tfm| tfm.version());

        if let Some(current) = highest {
            if TargetFrameworkMonikerComparer::compare_tfms(&state.tfm, current) == Ordering::Less {
                debug!(tfm = %current, "Keeping current .NET Standard version");
                state.tfm = current.clone();
            }
        }
        Ok(())
    }
}

/// Web components and executables need an app framework, not a library one.
pub struct ExecutableAndWebFilter;

impl TargetFrameworkSelectorFilter for ExecutableAndWebFilter {
    fn name(&self) -> &'static str {
        "executable-and-web"
    }

    fn process(&self, state: &mut FilterState<'_>) -> Result<(), TfmError> {
        let executable = state.project.output_type().is_executable();
        if state.components.is_web() || executable {
            debug!(
                components = %state.components,
                output_type = %state.project.output_type(),
                tfm = %state.options.app_base,
                "Switching to app framework"
            );
            state.tfm = state.options.app_base.clone();
        }
        Ok(())
    }
}

/// Desktop and WinUI projects target the `windows` platform. WinRT and WinUI
/// additionally pin the Windows SDK platform version.
pub struct WindowsDesktopFilter;

impl TargetFrameworkSelectorFilter for WindowsDesktopFilter {
    fn name(&self) -> &'static str {
        "windows-desktop"
    }

    fn process(&self, state: &mut FilterState<'_>) -> Result<(), TfmError> {
        let desktop = state
            .components
            .intersects(ProjectComponents::WINDOWS_DESKTOP | ProjectComponents::WIN_UI)
            || state.project.output_type() == ProjectOutputType::WinExe;
        if !desktop {
            return Ok(());
        }

        let sdk_version = state
            .components
            .intersects(ProjectComponents::WIN_RT | ProjectComponents::WIN_UI)
            .then_some(state.options.windows_sdk_version);

        let windows = state.options.app_base.with_platform(WINDOWS_PLATFORM, sdk_version);
        debug!(tfm = %windows, "Targeting Windows platform");
        state.tfm = windows;
        Ok(())
    }
}

/// Raises the target until every .NET Core or .NET Standard dependency can
/// be consumed. Dependencies are folded with [`TargetFrameworkMonikerComparer::merge`]
/// so the result does not depend on reference order; a platform conflict
/// falls back to the dependency's framework.
pub struct DependencyFilter;

impl TargetFrameworkSelectorFilter for DependencyFilter {
    fn name(&self) -> &'static str {
        "dependencies"
    }

    fn process(&self, state: &mut FilterState<'_>) -> Result<(), TfmError> {
        let candidates = state
            .dependencies
            .iter()
            .filter(|dep| dep.is_net_core() || dep.is_net_standard());

        for dependency in candidates {
            if TargetFrameworkMonikerComparer::is_compatible(&state.tfm, dependency) {
                continue;
            }

            let escalated = match TargetFrameworkMonikerComparer::merge(&state.tfm, dependency) {
                Ok(merged) => merged,
                Err(err) => {
                    warn!(
                        tfm = %state.tfm,
                        dependency = %dependency,
                        error = %err,
                        "Dependency platform conflicts, using the dependency's framework"
                    );
                    dependency.clone()
                }
            };
            info!(from = %state.tfm, to = %escalated, dependency = %dependency, "Escalating for dependency");
            state.tfm = escalated;
        }
        Ok(())
    }
}

/// Never recommends a framework below the one the project already targets.
/// .NET Framework targets are what is being upgraded away from and are
/// not considered.
pub struct NoDowngradeFilter;

impl NoDowngradeFilter {
    fn highest_modern(targets: &[TargetFrameworkMoniker]) -> Option<&TargetFrameworkMoniker> {
        targets
            .iter()
            .filter(|tfm| tfm.is_net_core() || tfm.is_net_standard())
            .reduce(|best, next| {
                if TargetFrameworkMonikerComparer::compare_tfms(best, next) == Ordering::Less {
                    next
                } else {
                    best
                }
            })
    }
}

impl TargetFrameworkSelectorFilter for NoDowngradeFilter {
    fn name(&self) -> &'static str {
        "no-downgrade"
    }

    fn process(&self, state: &mut FilterState<'_>) -> Result<(), TfmError> {
        let Some(current) = Self::highest_modern(state.project.target_frameworks()) else {
            return Ok(());
        };

        if TargetFrameworkMonikerComparer::compare_tfms(&state.tfm, current) != Ordering::Less {
            return Ok(());
        }

        let kept = TargetFrameworkMonikerComparer::merge(&state.tfm, current).unwrap_or_else(|err| {
            warn!(tfm = %state.tfm, current = %current, error = %err, "Keeping current framework");
            current.clone()
        });
        debug!(from = %state.tfm, to = %kept, "Refusing to downgrade");
        state.tfm = kept;
        Ok(())
    }
}
