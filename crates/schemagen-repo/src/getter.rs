//! Scheme-dispatched fetchers
//!
//! A [`Getters`] table maps URL schemes to [`Getter`] implementations and is
//! handed to the loader explicitly. The HTTP getter follows redirects by
//! hand so credentials never travel to another origin.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use crate::error::{RepoError, Result};

/// Maximum number of redirects followed for one request
pub const MAX_REDIRECTS: u32 = 10;

/// Fetches the full body behind a URL
#[async_trait]
pub trait Getter: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Scheme to getter table
#[derive(Clone, Default)]
pub struct Getters {
    by_scheme: HashMap<String, Arc<dyn Getter>>,
}

impl std::fmt::Debug for Getters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<_> = self.by_scheme.keys().collect();
        schemes.sort();
        f.debug_struct("Getters").field("schemes", &schemes).finish()
    }
}

impl Getters {
    pub fn new() -> Self {
        Self::default()
    }

    /// `http` and `https` served by an [`HttpGetter`] without credentials
    pub fn http() -> Result<Self> {
        Ok(Self::new().with_http(HttpGetter::public()?))
    }

    /// Register `getter` for `http` and `https`
    pub fn with_http(self, getter: HttpGetter) -> Self {
        let getter: Arc<dyn Getter> = Arc::new(getter);
        self.with_shared(&["http", "https"], getter)
    }

    /// Register a getter for one or more schemes
    pub fn with(self, schemes: &[&str], getter: impl Getter + 'static) -> Self {
        self.with_shared(schemes, Arc::new(getter))
    }

    fn with_shared(mut self, schemes: &[&str], getter: Arc<dyn Getter>) -> Self {
        for scheme in schemes {
            self.by_scheme
                .insert(scheme.to_ascii_lowercase(), Arc::clone(&getter));
        }
        self
    }

    /// Getter responsible for a URL
    pub fn for_url(&self, url: &Url) -> Result<&dyn Getter> {
        self.by_scheme
            .get(url.scheme())
            .map(|g| g.as_ref())
            .ok_or_else(|| RepoError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
                url: url.to_string(),
            })
    }

    /// Fetch a URL with the matching getter
    pub async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        self.for_url(url)?.get(url).await
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.by_scheme.keys().map(String::as_str)
    }
}

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Credentials for a chart repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Basic authentication (username/password)
    Basic { username: String, password: String },

    /// Bearer token authentication
    Bearer { token: String },
}

impl Credentials {
    /// Create basic auth credentials
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create bearer token credentials
    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials::Bearer {
            token: token.into(),
        }
    }

    /// Authorization header value
    pub fn auth_header(&self) -> String {
        match self {
            Credentials::Basic { username, password } => {
                let encoded = base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    format!("{}:{}", username, password),
                );
                format!("Basic {}", encoded)
            }
            Credentials::Bearer { token } => format!("Bearer {}", token),
        }
    }
}

/// Scoped credentials - maps URL prefixes to credentials
#[derive(Debug, Clone, Default)]
pub struct ScopedCredentials {
    scopes: HashMap<String, Credentials>,
}

impl ScopedCredentials {
    /// Add credentials for a URL scope
    pub fn add(&mut self, url_prefix: &str, credentials: Credentials) {
        let prefix = url_prefix.trim_end_matches('/').to_string();
        self.scopes.insert(prefix, credentials);
    }

    /// Get credentials for a URL (by longest matching prefix)
    pub fn for_url(&self, url: &str) -> Option<&Credentials> {
        self.scopes
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, creds)| creds)
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Check if two URLs are same-origin
    pub fn same_origin(url1: &Url, url2: &Url) -> bool {
        url1.scheme() == url2.scheme()
            && url1.host() == url2.host()
            && url1.port_or_known_default() == url2.port_or_known_default()
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// reqwest-based getter with manual redirect handling
#[derive(Debug, Clone)]
pub struct HttpGetter {
    client: reqwest::Client,
    credentials: ScopedCredentials,
}

impl HttpGetter {
    pub fn new(credentials: ScopedCredentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("schemagen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepoError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Create without credentials (public repos)
    pub fn public() -> Result<Self> {
        Self::new(ScopedCredentials::default())
    }

    async fn send(&self, url: &Url) -> Result<reqwest::Response> {
        let mut current = url.clone();
        let mut redirects = 0;

        loop {
            let mut request = self.client.get(current.as_str());

            if ScopedCredentials::same_origin(url, &current) {
                if let Some(creds) = self.credentials.for_url(current.as_str()) {
                    request = request.header(reqwest::header::AUTHORIZATION, creds.auth_header());
                }
            } else if !self.credentials.is_empty() {
                tracing::warn!(
                    "Cross-origin redirect from {} to {} - credentials not forwarded",
                    url,
                    current
                );
            }

            tracing::debug!(url = %current, "GET");
            let response = request.send().await?;
            let status = response.status();

            if status.is_redirection() {
                redirects += 1;
                if redirects > MAX_REDIRECTS {
                    return Err(RepoError::NetworkError {
                        message: format!("Too many redirects (max {})", MAX_REDIRECTS),
                    });
                }

                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| RepoError::NetworkError {
                        message: "Redirect without Location header".to_string(),
                    })?;

                current = current.join(location).map_err(|e| RepoError::NetworkError {
                    message: format!(
                        "Invalid redirect location '{}' from {}: {}",
                        location, current, e
                    ),
                })?;
                continue;
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(RepoError::AuthRequired {
                    url: current.to_string(),
                });
            }
            if status == reqwest::StatusCode::FORBIDDEN {
                return Err(RepoError::AuthFailed {
                    message: format!("Access denied to {}", current),
                });
            }
            if !status.is_success() {
                return Err(RepoError::HttpError {
                    status: status.as_u16(),
                    message: format!("Request to {} failed", current),
                });
            }

            return Ok(response);
        }
    }
}

#[async_trait]
impl Getter for HttpGetter {
    async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self.send(url).await?;
        let bytes = response.bytes().await.map_err(|e| RepoError::NetworkError {
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}
