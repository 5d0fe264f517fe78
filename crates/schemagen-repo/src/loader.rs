//! Chart values loading from HTTP chart repositories

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::archive::{ValuesFile, extract_values_file, verify_digest};
use crate::error::{RepoError, Result};
use crate::getter::Getters;
use crate::index::{ChartEntry, ChartIndex};

/// Default bound on a whole load operation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Loader settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderOptions {
    /// Upper bound for index lookup, download and extraction together (seconds)
    #[serde(serialize_with = "as_secs", deserialize_with = "from_secs")]
    pub timeout: Duration,

    /// Reject archives whose sha256 differs from the index digest
    pub verify_digest: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            verify_digest: true,
        }
    }
}

fn as_secs<S: Serializer>(timeout: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(timeout.as_secs_f64())
}

fn from_secs<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

/// A chart version resolved from a repository index
#[derive(Debug, Clone)]
pub struct ResolvedChart {
    pub entry: ChartEntry,
    /// Absolute archive URL
    pub url: Url,
}

/// Loads chart values files through a table of getters
#[derive(Debug, Clone)]
pub struct ChartLoader {
    getters: Getters,
    options: LoaderOptions,
}

impl ChartLoader {
    pub fn new(getters: Getters, options: LoaderOptions) -> Self {
        Self { getters, options }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Fetch and parse `<repo>/index.yaml`
    pub async fn fetch_index(&self, repo_url: &str) -> Result<ChartIndex> {
        let index_url = index_url(repo_url)?;
        tracing::info!(url = %index_url, "fetching repository index");
        let data = self.getters.get(&index_url).await?;
        ChartIndex::from_bytes(&data)
    }

    /// Resolve a chart version to its entry and absolute archive URL
    pub async fn resolve_chart(
        &self,
        repo_url: &str,
        chart: &str,
        version: &str,
    ) -> Result<ResolvedChart> {
        let index = self.fetch_index(repo_url).await?;
        let entry = index.select(chart, version, repo_url)?.clone();

        let location = entry
            .download_url()
            .ok_or_else(|| RepoError::MissingChartUrl {
                name: format!("{}@{}", entry.name, entry.version),
            })?;
        let url = repository_base(repo_url)?
            .join(location)
            .map_err(|e| RepoError::InvalidChartUrl {
                url: location.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(chart, version = %entry.version, url = %url, "resolved chart");
        Ok(ResolvedChart { entry, url })
    }

    /// Absolute URL of a chart archive
    pub async fn find_chart_url(&self, repo_url: &str, chart: &str, version: &str) -> Result<Url> {
        Ok(self.resolve_chart(repo_url, chart, version).await?.url)
    }

    /// Fetch a chart and read its values file
    ///
    /// Bounded by [`LoaderOptions::timeout`]; returns [`RepoError::Cancelled`]
    /// as soon as `cancel` fires.
    pub async fn load_values(
        &self,
        repo_url: &str,
        chart: &str,
        version: &str,
        cancel: &CancellationToken,
    ) -> Result<ValuesFile> {
        let timeout = self.options.timeout;
        let work = tokio::time::timeout(timeout, self.fetch_values(repo_url, chart, version));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(chart, "chart load cancelled");
                Err(RepoError::Cancelled)
            }
            result = work => match result {
                Ok(values) => values,
                Err(_) => Err(RepoError::Timeout { timeout }),
            },
        }
    }

    async fn fetch_values(&self, repo_url: &str, chart: &str, version: &str) -> Result<ValuesFile> {
        let resolved = self.resolve_chart(repo_url, chart, version).await?;

        tracing::info!(url = %resolved.url, "downloading chart");
        let data = self.getters.get(&resolved.url).await?;

        if self.options.verify_digest {
            if let Some(expected) = &resolved.entry.digest {
                verify_digest(&resolved.entry.name, &data, expected)?;
            }
        }

        extract_values_file(&data, chart)
    }
}

fn parse_repository_url(repo_url: &str) -> Result<Url> {
    Url::parse(repo_url.trim()).map_err(|e| RepoError::InvalidRepositoryUrl {
        url: repo_url.to_string(),
        reason: e.to_string(),
    })
}

/// Repository URL with a trailing slash, so relative chart URLs resolve below it
fn repository_base(repo_url: &str) -> Result<Url> {
    let url = parse_repository_url(repo_url)?;
    if url.path().ends_with('/') {
        Ok(url)
    } else {
        parse_repository_url(&format!("{}/", url))
    }
}

fn index_url(repo_url: &str) -> Result<Url> {
    repository_base(repo_url)?
        .join("index.yaml")
        .map_err(|e| RepoError::InvalidRepositoryUrl {
            url: repo_url.to_string(),
            reason: e.to_string(),
        })
}
