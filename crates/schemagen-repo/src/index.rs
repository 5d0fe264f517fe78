//! Chart repository index
//!
//! Helm-compatible `index.yaml` with chart version selection

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{RepoError, Result};

/// Repository index (Helm-compatible)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartIndex {
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Charts indexed by name
    #[serde(default)]
    pub entries: HashMap<String, Vec<ChartEntry>>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl ChartIndex {
    /// Parse index from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RepoError::IndexParseError {
            message: e.to_string(),
        })
    }

    /// Parse index from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let yaml = std::str::from_utf8(bytes).map_err(|e| RepoError::IndexParseError {
            message: format!("Invalid UTF-8: {}", e),
        })?;
        Self::from_yaml(yaml)
    }

    /// Get all versions of a chart
    pub fn get(&self, name: &str) -> Option<&Vec<ChartEntry>> {
        self.entries.get(name)
    }

    /// Get the latest version of a chart
    ///
    /// Pre-releases are only picked when no stable version exists.
    pub fn get_latest(&self, name: &str) -> Option<&ChartEntry> {
        let versions = self.entries.get(name)?;
        versions
            .iter()
            .filter(|e| e.parsed_version().is_some_and(|v| v.pre.is_empty()))
            .max_by(|a, b| compare_versions(a, b))
            .or_else(|| versions.iter().max_by(|a, b| compare_versions(a, b)))
    }

    /// Get a specific version of a chart
    pub fn get_version(&self, name: &str, version: &str) -> Option<&ChartEntry> {
        let wanted = version.trim_start_matches('v');
        self.entries
            .get(name)?
            .iter()
            .find(|e| e.version == version || e.version.trim_start_matches('v') == wanted)
    }

    /// Find versions matching a semver constraint
    pub fn find_matching(&self, name: &str, constraint: &str) -> Result<Vec<&ChartEntry>> {
        let entries = self
            .entries
            .get(name)
            .ok_or_else(|| RepoError::ChartNotFound {
                name: name.to_string(),
                repo: "unknown".to_string(),
            })?;

        let req = parse_constraint(constraint).ok_or_else(|| RepoError::VersionNotFound {
            name: name.to_string(),
            version: constraint.to_string(),
            repo: "unknown".to_string(),
        })?;

        Ok(entries
            .iter()
            .filter(|e| e.parsed_version().is_some_and(|v| req.matches(&v)))
            .collect())
    }

    /// Find the highest version matching a constraint
    pub fn find_best_match(&self, name: &str, constraint: &str) -> Result<&ChartEntry> {
        self.find_matching(name, constraint)?
            .into_iter()
            .max_by(|a, b| compare_versions(a, b))
            .ok_or_else(|| RepoError::VersionNotFound {
                name: name.to_string(),
                version: constraint.to_string(),
                repo: "unknown".to_string(),
            })
    }

    /// Pick the chart version a user asked for
    ///
    /// An empty version selects the latest release, an exact version string
    /// selects that entry, anything else is treated as a semver constraint.
    pub fn select(&self, name: &str, version: &str, repo: &str) -> Result<&ChartEntry> {
        if !self.entries.contains_key(name) {
            return Err(RepoError::ChartNotFound {
                name: name.to_string(),
                repo: repo.to_string(),
            });
        }

        let version = version.trim();
        let entry = if version.is_empty() {
            self.get_latest(name)
        } else if let Some(exact) = self.get_version(name, version) {
            Some(exact)
        } else {
            self.find_best_match(name, version).ok()
        };

        entry.ok_or_else(|| RepoError::VersionNotFound {
            name: name.to_string(),
            version: if version.is_empty() {
                "latest".to_string()
            } else {
                version.to_string()
            },
            repo: repo.to_string(),
        })
    }
}

/// Chart entry in the index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    /// Chart name
    pub name: String,

    /// Chart version (semver)
    pub version: String,

    /// URLs to download the chart archive
    #[serde(default)]
    pub urls: Vec<String>,

    /// SHA256 digest of the archive
    #[serde(default)]
    pub digest: Option<String>,
}

impl ChartEntry {
    /// Get the primary download URL
    pub fn download_url(&self) -> Option<&str> {
        self.urls.first().map(|s| s.as_str())
    }

    /// Parse version as semver
    pub fn parsed_version(&self) -> Option<Version> {
        Version::parse(self.version.trim_start_matches('v')).ok()
    }
}

fn compare_versions(a: &ChartEntry, b: &ChartEntry) -> Ordering {
    match (a.parsed_version(), b.parsed_version()) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.version.cmp(&b.version),
    }
}

/// Parse a version constraint, accepting Helm's space separated form
/// (`>=1.0.0 <2.0.0`) as well as the comma separated one
///
/// A version without an operator is an exact match (`14.1.0` is
/// `=14.1.0`, `14.0` is `=14.0`), not a caret requirement.
fn parse_constraint(constraint: &str) -> Option<VersionReq> {
    let is_op = |c: char| matches!(c, '<' | '>' | '=' | '~' | '^');

    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op = String::new();
    for token in constraint.split([' ', ',']).filter(|t| !t.is_empty()) {
        let split = token.find(|c| !is_op(c)).unwrap_or(token.len());
        let (op, version) = token.split_at(split);
        pending_op.push_str(op);
        if version.is_empty() {
            continue;
        }

        let version = version.trim_start_matches('v');
        if pending_op.is_empty() && !is_wildcard(version) {
            pending_op.push('=');
        }
        comparators.push(format!("{}{}", pending_op, version));
        pending_op.clear();
    }

    if comparators.is_empty() {
        return None;
    }
    VersionReq::parse(&comparators.join(", ")).ok()
}

/// `1.x`, `1.2.*` and friends
fn is_wildcard(version: &str) -> bool {
    version
        .split('.')
        .any(|part| matches!(part, "x" | "X" | "*"))
}
