//! Schemagen Repository Access
//!
//! Fetches a chart's `values.yaml` from a Helm-style HTTP chart repository:
//!
//! - **Index lookup**: `index.yaml` parsing and version selection (latest,
//!   exact or semver constraint)
//! - **Getters**: an explicit scheme → fetcher table, HTTP by default
//! - **Archive reading**: the top-level values file of a `.tgz` chart
//!
//! ## Example
//!
//! ```rust,no_run
//! use schemagen_repo::{ChartLoader, Getters, LoaderOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = ChartLoader::new(Getters::http()?, LoaderOptions::default());
//! let values = loader
//!     .load_values("https://charts.bitnami.com/bitnami", "nginx", "", &CancellationToken::new())
//!     .await?;
//! println!("{}", String::from_utf8_lossy(&values.data));
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Notes
//!
//! - Credentials are NEVER sent after cross-origin redirects
//! - Archives are checked against the index sha256 digest when one is published

pub mod archive;
pub mod error;
pub mod getter;
pub mod index;
pub mod loader;

pub use archive::{VALUES_FILE_NAMES, ValuesFile, extract_values_file};
pub use error::{RepoError, Result};
pub use getter::{Credentials, Getter, Getters, HttpGetter, ScopedCredentials};
pub use index::{ChartEntry, ChartIndex};
pub use loader::{ChartLoader, LoaderOptions, ResolvedChart};
