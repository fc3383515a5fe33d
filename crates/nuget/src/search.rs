//! Newer-version search across ordered package sources.

use crate::error::{NuGetError, RegistryError};
use crate::reference::NuGetReferenceExt;
use crate::source::{NuGetV3Source, PackageSource};
use crate::version::NuGetVersion;
use backon::{ExponentialBuilder, Retryable};
use dotport_core::{require_non_empty, CancellationToken, DotportConfig};
use dotport_msbuild::NuGetReference;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Exponential backoff for one source: `max_attempts` tries in total, the
/// delay starting at `base_delay` and doubling each retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &DotportConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            base_delay: config.retry_base_delay(),
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_factor(2.0)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// Versions found for a package and the source that answered.
#[derive(Debug, Clone)]
pub struct SourceVersions {
    pub source: String,
    pub versions: Vec<NuGetVersion>,
}

pub struct PackageSearcher {
    sources: Vec<Arc<dyn PackageSource>>,
    policy: RetryPolicy,
}

impl PackageSearcher {
    pub fn new(sources: Vec<Arc<dyn PackageSource>>, policy: RetryPolicy) -> Self {
        Self { sources, policy }
    }

    /// One [`NuGetV3Source`] per configured package source.
    pub fn from_config(config: &DotportConfig) -> Result<Self, RegistryError> {
        let sources = config
            .package_sources
            .iter()
            .map(|url| {
                NuGetV3Source::new(url.clone(), config.request_timeout())
                    .map(|s| Arc::new(s) as Arc<dyn PackageSource>)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(sources, RetryPolicy::from_config(config)))
    }

    pub fn sources(&self) -> &[Arc<dyn PackageSource>] {
        &self.sources
    }

    async fn query_source(
        &self,
        source: &dyn PackageSource,
        package_id: &str,
        token: &CancellationToken,
    ) -> Result<Vec<NuGetVersion>, RegistryError> {
        let attempt = move || async move {
            if token.is_cancelled() {
                return Err(RegistryError::Cancelled);
            }
            source.get_versions(package_id).await
        };

        attempt
            .retry(self.policy.backoff())
            .sleep(tokio::time::sleep)
            .when(RegistryError::is_transient)
            .notify(|err, delay| {
                warn!(
                    source = %source.name(),
                    package = %package_id,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after transient error: {}",
                    err
                );
            })
            .await
    }

    /// Asks each source in order and returns the first successful answer.
    /// A failing source is logged and skipped; `None` means no source knows
    /// the package.
    pub async fn get_versions(
        &self,
        package_id: &str,
        token: &CancellationToken,
    ) -> Result<Option<SourceVersions>, NuGetError> {
        require_non_empty("package_id", package_id)?;

        for source in &self.sources {
            token.check()?;
            match self.query_source(source.as_ref(), package_id, token).await {
                Ok(versions) => {
                    debug!(
                        source = %source.name(),
                        package = %package_id,
                        count = versions.len(),
                        "Found package versions"
                    );
                    return Ok(Some(SourceVersions {
                        source: source.name().to_string(),
                        versions,
                    }));
                }
                Err(RegistryError::Cancelled) => return Err(NuGetError::Cancelled),
                Err(RegistryError::NotFound { .. }) => {
                    debug!(source = %source.name(), package = %package_id, "Package not on source");
                }
                Err(e) => {
                    warn!(source = %source.name(), package = %package_id, "Skipping package source: {}", e);
                }
            }
        }

        info!(package = %package_id, "No package source returned versions");
        Ok(None)
    }

    /// Versions above the reference's resolved version, ascending. A
    /// reference without a resolvable version has no lower bound.
    pub async fn get_newer_versions(
        &self,
        reference: &NuGetReference,
        include_prerelease: bool,
        token: &CancellationToken,
    ) -> Result<Vec<NuGetVersion>, NuGetError> {
        let current = reference.try_get_version();
        let Some(found) = self.get_versions(&reference.name, token).await? else {
            return Ok(Vec::new());
        };

        let mut newer: Vec<NuGetVersion> = found
            .versions
            .into_iter()
            .filter(|v| include_prerelease || !v.is_prerelease())
            .filter(|v| current.as_ref().map(|c| v > c).unwrap_or(true))
            .collect();
        newer.sort();
        newer.dedup();
        Ok(newer)
    }

    pub async fn get_latest_version(
        &self,
        reference: &NuGetReference,
        include_prerelease: bool,
        token: &CancellationToken,
    ) -> Result<Option<NuGetVersion>, NuGetError> {
        Ok(self
            .get_newer_versions(reference, include_prerelease, token)
            .await?
            .pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_config() {
        let config = DotportConfig {
            max_retries: 5,
            retry_base_delay_ms: 250,
            ..Default::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_from_config_builds_one_source_per_url() {
        let config = DotportConfig {
            package_sources: vec![
                "https://api.nuget.org/v3-flatcontainer/".to_string(),
                "https://pkgs.example.com/nuget/v3/flat2/".to_string(),
            ],
            ..Default::default()
        };
        let searcher = PackageSearcher::from_config(&config).unwrap();
        let names: Vec<&str> = searcher.sources().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["api.nuget.org", "pkgs.example.com"]);
    }
}
