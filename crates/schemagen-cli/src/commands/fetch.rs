//! Fetch command - values file of a chart in a remote repository

use std::time::Duration;

use crate::error::{CliError, Result};
use schemagen_repo::{
    ChartLoader, Credentials, Getters, HttpGetter, LoaderOptions, ScopedCredentials,
};
use tokio_util::sync::CancellationToken;

pub struct FetchOptions {
    pub timeout: Duration,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Download `chart` from `repo` and return its values file
///
/// Ctrl-C cancels the download.
pub fn run(repo: &str, chart: &str, version: &str, options: FetchOptions) -> Result<Vec<u8>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::internal(format!("cannot start async runtime: {}", e)))?;

    runtime.block_on(fetch(repo, chart, version, options))
}

async fn fetch(repo: &str, chart: &str, version: &str, options: FetchOptions) -> Result<Vec<u8>> {
    let mut credentials = ScopedCredentials::default();
    if let (Some(username), Some(password)) = (options.username, options.password) {
        credentials.add(repo, Credentials::basic(username, password));
    }

    let getters = Getters::new().with_http(HttpGetter::new(credentials)?);
    let loader = ChartLoader::new(
        getters,
        LoaderOptions {
            timeout: options.timeout,
            ..Default::default()
        },
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling fetch");
            interrupt.cancel();
        }
    });

    let values = loader.load_values(repo, chart, version, &cancel).await?;
    tracing::debug!(chart, file = %values.name, bytes = values.data.len(), "fetched values file");

    Ok(values.data)
}
