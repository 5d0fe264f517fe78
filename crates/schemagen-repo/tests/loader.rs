//! ChartLoader tests against an in-memory getter

mod common;

use async_trait::async_trait;
use schemagen_repo::archive::compute_digest;
use schemagen_repo::{ChartLoader, Getter, Getters, LoaderOptions, RepoError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use common::{NGINX_VALUES, chart_archive, nginx_index};

const REPO: &str = "mem://charts.example.com/stable";

/// Serves fixed bodies by URL and records every request
#[derive(Default, Clone)]
struct MemoryGetter {
    files: Arc<HashMap<String, Vec<u8>>>,
    requests: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl MemoryGetter {
    fn new(files: Vec<(&str, Vec<u8>)>) -> Self {
        Self {
            files: Arc::new(
                files
                    .into_iter()
                    .map(|(url, data)| (url.to_string(), data))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Getter for MemoryGetter {
    async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.files
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| RepoError::HttpError {
                status: 404,
                message: format!("Request to {} failed", url),
            })
    }
}

fn loader(getter: MemoryGetter) -> ChartLoader {
    ChartLoader::new(
        Getters::new().with(&["mem"], getter),
        LoaderOptions::default(),
    )
}

fn standard_repo() -> MemoryGetter {
    MemoryGetter::new(vec![
        (
            "mem://charts.example.com/stable/index.yaml",
            nginx_index(None).into_bytes(),
        ),
        (
            "mem://charts.example.com/stable/nginx-1.1.0.tgz",
            chart_archive(&[
                ("nginx/Chart.yaml", "name: nginx\nversion: 1.1.0\n"),
                ("nginx/values.yaml", NGINX_VALUES),
            ]),
        ),
        (
            "mem://charts.example.com/stable/charts/nginx-1.0.0.tgz",
            chart_archive(&[("nginx/values.yml", "replicaCount: 2\n")]),
        ),
    ])
}

#[tokio::test]
async fn test_find_chart_url_resolves_relative_urls() {
    let loader = loader(standard_repo());

    let latest = loader.find_chart_url(REPO, "nginx", "").await.unwrap();
    assert_eq!(latest.as_str(), "mem://charts.example.com/stable/nginx-1.1.0.tgz");

    let pinned = loader.find_chart_url(REPO, "nginx", "1.0.0").await.unwrap();
    assert_eq!(
        pinned.as_str(),
        "mem://charts.example.com/stable/charts/nginx-1.0.0.tgz"
    );

    let constrained = loader.find_chart_url(REPO, "nginx", "<1.1").await.unwrap();
    assert_eq!(constrained, pinned);
}

#[tokio::test]
async fn test_load_values() {
    let getter = standard_repo();
    let loader = loader(getter.clone());

    let values = loader
        .load_values(REPO, "nginx", "", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(values.name, "values.yaml");
    assert_eq!(values.data, NGINX_VALUES.as_bytes());
    assert_eq!(
        getter.requests(),
        vec![
            "mem://charts.example.com/stable/index.yaml",
            "mem://charts.example.com/stable/nginx-1.1.0.tgz",
        ]
    );
}

#[tokio::test]
async fn test_load_values_yml() {
    let values = loader(standard_repo())
        .load_values(REPO, "nginx", "1.0.0", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(values.name, "values.yml");
    assert_eq!(values.data, b"replicaCount: 2\n");
}

#[tokio::test]
async fn test_missing_values_file_is_not_found() {
    let getter = MemoryGetter::new(vec![
        (
            "mem://charts.example.com/stable/index.yaml",
            nginx_index(None).into_bytes(),
        ),
        (
            "mem://charts.example.com/stable/nginx-1.1.0.tgz",
            chart_archive(&[("nginx/Chart.yaml", "name: nginx\n")]),
        ),
    ]);

    let err = loader(getter)
        .load_values(REPO, "nginx", "", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "{err:?}");
}

#[tokio::test]
async fn test_missing_archive_is_network_error_not_not_found() {
    let getter = MemoryGetter::new(vec![(
        "mem://charts.example.com/stable/index.yaml",
        nginx_index(None).into_bytes(),
    )]);

    let err = loader(getter)
        .load_values(REPO, "nginx", "", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::HttpError { status: 404, .. }), "{err:?}");
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_unknown_chart_and_version() {
    let loader = loader(standard_repo());

    let err = loader.find_chart_url(REPO, "redis", "").await.unwrap_err();
    assert!(matches!(err, RepoError::ChartNotFound { .. }));

    let err = loader.find_chart_url(REPO, "nginx", "9.9.9").await.unwrap_err();
    assert!(matches!(err, RepoError::VersionNotFound { .. }));
    assert!(err.is_lookup());
}

#[tokio::test]
async fn test_digest_mismatch_is_rejected() {
    let archive = chart_archive(&[("nginx/values.yaml", NGINX_VALUES)]);
    let getter = MemoryGetter::new(vec![
        (
            "mem://charts.example.com/stable/index.yaml",
            nginx_index(Some("sha256:0123456789abcdef")).into_bytes(),
        ),
        ("mem://charts.example.com/stable/nginx-1.1.0.tgz", archive),
    ]);

    let err = loader(getter)
        .load_values(REPO, "nginx", "", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::IntegrityCheckFailed { .. }), "{err:?}");
}

#[tokio::test]
async fn test_matching_digest_is_accepted() {
    let archive = chart_archive(&[("nginx/values.yaml", NGINX_VALUES)]);
    let digest = compute_digest(&archive);
    let getter = MemoryGetter::new(vec![
        (
            "mem://charts.example.com/stable/index.yaml",
            nginx_index(Some(&digest)).into_bytes(),
        ),
        ("mem://charts.example.com/stable/nginx-1.1.0.tgz", archive),
    ]);

    let values = loader(getter)
        .load_values(REPO, "nginx", "", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(values.data, NGINX_VALUES.as_bytes());
}

#[tokio::test]
async fn test_cancelled_load_returns_cancelled() {
    let loader = loader(standard_repo().slow(Duration::from_secs(30)));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = loader
        .load_values(REPO, "nginx", "", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Cancelled), "{err:?}");
}

#[tokio::test]
async fn test_already_cancelled_token_wins() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let getter = standard_repo();
    let err = loader(getter.clone())
        .load_values(REPO, "nginx", "", &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::Cancelled));
    assert!(getter.requests().is_empty());
}

#[tokio::test]
async fn test_timeout() {
    let loader = ChartLoader::new(
        Getters::new().with(&["mem"], standard_repo().slow(Duration::from_secs(30))),
        LoaderOptions {
            timeout: Duration::from_millis(50),
            ..Default::default()
        },
    );

    let err = loader
        .load_values(REPO, "nginx", "", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(
        matches!(err, RepoError::Timeout { timeout } if timeout == Duration::from_millis(50)),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_unsupported_scheme() {
    let err = loader(standard_repo())
        .find_chart_url("ftp://charts.example.com", "nginx", "")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::UnsupportedScheme { .. }));
}
