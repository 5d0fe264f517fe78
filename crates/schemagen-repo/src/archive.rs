//! Chart archive handling
//!
//! Charts are gzip'd tarballs whose first path component is the chart
//! directory. Only the chart's own values file is read; subcharts under
//! `charts/` are ignored.

use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Component, Path};
use tar::Archive;

use crate::error::{RepoError, Result};

/// Values file names, in order of preference
pub const VALUES_FILE_NAMES: [&str; 2] = ["values.yaml", "values.yml"];

/// A values file read from a chart archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesFile {
    /// File name inside the chart directory
    pub name: String,
    /// Raw content
    pub data: Vec<u8>,
}

/// Read the top-level values file of a chart archive
pub fn extract_values_file(data: &[u8], chart: &str) -> Result<ValuesFile> {
    let decoder = GzDecoder::new(data);
    let mut archive = Archive::new(decoder);

    let mut found: HashMap<&'static str, Vec<u8>> = HashMap::new();
    for entry in archive.entries().map_err(invalid_archive)? {
        let mut entry = entry.map_err(invalid_archive)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path().map_err(invalid_archive)?.into_owned();
        let Some(name) = chart_file_name(&path) else {
            continue;
        };

        let mut content = Vec::new();
        entry.read_to_end(&mut content).map_err(invalid_archive)?;
        found.insert(name, content);
    }

    VALUES_FILE_NAMES
        .iter()
        .find_map(|name| {
            found.remove(name).map(|data| ValuesFile {
                name: (*name).to_string(),
                data,
            })
        })
        .ok_or_else(|| RepoError::ValuesNotFound {
            chart: chart.to_string(),
        })
}

/// `<chart>/values.yaml` → `values.yaml`, anything deeper or elsewhere → None
fn chart_file_name(path: &Path) -> Option<&'static str> {
    let mut parts = path.components().filter(|c| !matches!(c, Component::CurDir));

    match parts.next()? {
        Component::Normal(_) => {}
        _ => return None,
    }
    let file = match parts.next()? {
        Component::Normal(file) => file.to_str()?,
        _ => return None,
    };
    if parts.next().is_some() {
        return None;
    }

    VALUES_FILE_NAMES.iter().copied().find(|name| *name == file)
}

fn invalid_archive(e: std::io::Error) -> RepoError {
    RepoError::InvalidArchive {
        message: e.to_string(),
    }
}

/// Compute SHA256 digest of data
pub fn compute_digest(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("sha256:{}", hex::encode(result))
}

/// Check if two digests match (supports various formats)
pub fn digest_matches(expected: &str, actual: &str) -> bool {
    let normalize = |digest: &str| {
        digest
            .trim()
            .to_lowercase()
            .replace("sha256:", "")
            .replace("sha256-", "")
    };
    normalize(expected) == normalize(actual)
}

/// Verify an archive against the digest published in the index
pub fn verify_digest(name: &str, data: &[u8], expected: &str) -> Result<()> {
    let actual = compute_digest(data);
    if digest_matches(expected, &actual) {
        Ok(())
    } else {
        Err(RepoError::IntegrityCheckFailed {
            name: name.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}
