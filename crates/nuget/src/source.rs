//! Package sources the version search queries.

use crate::error::RegistryError;
use crate::version::NuGetVersion;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// A feed that can list the published versions of a package.
#[async_trait]
pub trait PackageSource: Send + Sync {
    fn name(&self) -> &str;

    /// All published versions of `package_id`, unordered.
    async fn get_versions(&self, package_id: &str) -> Result<Vec<NuGetVersion>, RegistryError>;
}

#[derive(Debug, Deserialize)]
struct FlatContainerIndex {
    versions: Vec<String>,
}

/// NuGet v3 flat container (`{base}/{id-lower}/index.json`).
pub struct NuGetV3Source {
    name: String,
    base_url: String,
    http_client: Client,
}

impl NuGetV3Source {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RegistryError> {
        let base_url = base_url.into();
        let name = reqwest::Url::parse(&base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| base_url.clone());

        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dotport/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::Http {
                source_name: name.clone(),
                message: format!("Failed to build HTTP client: {}", e),
                status_code: None,
            })?;

        Ok(Self {
            name,
            base_url,
            http_client,
        })
    }

    fn index_url(&self, package_id: &str) -> String {
        format!(
            "{}/{}/index.json",
            self.base_url.trim_end_matches('/'),
            package_id.to_lowercase()
        )
    }

    fn classify_status(&self, status: StatusCode, package_id: &str) -> RegistryError {
        if status == StatusCode::NOT_FOUND {
            return RegistryError::NotFound {
                source_name: self.name.clone(),
                package: package_id.to_string(),
            };
        }
        if status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
            || status.is_server_error()
        {
            return RegistryError::Transient {
                source_name: self.name.clone(),
                message: format!("HTTP {}", status),
            };
        }
        RegistryError::Http {
            source_name: self.name.clone(),
            message: format!("HTTP {}", status),
            status_code: Some(status.as_u16()),
        }
    }
}

#[async_trait]
impl PackageSource for NuGetV3Source {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_versions(&self, package_id: &str) -> Result<Vec<NuGetVersion>, RegistryError> {
        let url = self.index_url(package_id);
        debug!(source = %self.name, url = %url, "Querying package versions");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                RegistryError::Transient {
                    source_name: self.name.clone(),
                    message: e.to_string(),
                }
            } else {
                RegistryError::Http {
                    source_name: self.name.clone(),
                    message: e.to_string(),
                    status_code: e.status().map(|s| s.as_u16()),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.classify_status(status, package_id));
        }

        let index: FlatContainerIndex = response.json().await.map_err(|e| RegistryError::Parse {
            source_name: self.name.clone(),
            message: e.to_string(),
        })?;

        let versions: Vec<NuGetVersion> = index
            .versions
            .iter()
            .filter_map(|v| {
                let parsed = NuGetVersion::try_parse(v);
                if parsed.is_none() {
                    warn!(source = %self.name, package = %package_id, version = %v, "Skipping unparsable version");
                }
                parsed
            })
            .collect();

        Ok(versions)
    }
}
