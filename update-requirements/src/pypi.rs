use crate::config::{DEFAULT_INDEX_URL, DEFAULT_TIMEOUT_SECS};
use crate::error::LookupError;
use crate::resolver::VersionLookup;
use requirements_core::Version;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Client for querying the PyPI JSON API
#[derive(Debug, Clone)]
pub struct PyPiClient {
    client: reqwest::Client,
    base_url: String,
    include_prerelease: bool,
}

/// PyPI JSON API response structure
#[derive(Debug, Deserialize)]
struct PyPiResponse {
    info: PyPiInfo,
    #[serde(default)]
    releases: HashMap<String, Vec<PyPiRelease>>,
}

#[derive(Debug, Deserialize)]
struct PyPiInfo {
    version: String,
}

#[derive(Debug, Deserialize)]
struct PyPiRelease {
    #[serde(default)]
    yanked: bool,
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("update-requirements/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

impl PyPiClient {
    pub fn new(include_prerelease: bool) -> Self {
        Self {
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            base_url: DEFAULT_INDEX_URL.to_string(),
            include_prerelease,
        }
    }

    pub fn with_index_url(mut self, url: &str) -> Self {
        // Remove trailing slash if present
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Fetch the version to pin `name` to. `Ok(None)` means the index has
    /// no such package.
    pub async fn get_latest(&self, name: &str) -> Result<Option<Version>, LookupError> {
        let url = format!("{}/{name}/json", self.base_url);
        tracing::debug!("requesting package info from {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| LookupError::Request {
                name: name.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(LookupError::Status {
                name: name.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| LookupError::Request {
                name: name.to_string(),
                source,
            })?;

        let pypi_data: PyPiResponse =
            serde_json::from_str(&body).map_err(|source| LookupError::Decode {
                name: name.to_string(),
                source,
            })?;

        let current = Version::from_str(&pypi_data.info.version).map_err(|_| {
            LookupError::InvalidVersion {
                name: name.to_string(),
                version: pypi_data.info.version.clone(),
            }
        })?;

        // Skip releases with no files or only yanked files
        let mut versions: Vec<Version> = pypi_data
            .releases
            .iter()
            .filter(|(_, files)| !files.is_empty() && !files.iter().all(|f| f.yanked))
            .filter_map(|(version, _)| Version::from_str(version).ok())
            .collect();
        versions.sort();

        let latest = self.pick_latest(current, &versions);
        tracing::debug!("latest version of {name} is {latest}");

        Ok(Some(latest))
    }

    /// Choose between the index's current release and the release list.
    /// With pre-releases allowed the newest release wins; otherwise a
    /// pre-release current version falls back to the newest stable release.
    fn pick_latest(&self, current: Version, versions: &[Version]) -> Version {
        if self.include_prerelease {
            return versions
                .last()
                .filter(|newest| **newest > current)
                .cloned()
                .unwrap_or(current);
        }

        if current.is_prerelease() {
            return versions
                .iter()
                .rev()
                .find(|v| !v.is_prerelease())
                .cloned()
                .unwrap_or(current);
        }

        current
    }
}

impl VersionLookup for PyPiClient {
    async fn latest_version(&self, name: &str) -> Result<Option<Version>, LookupError> {
        self.get_latest(name).await
    }
}
