//! Shared helpers for repository tests

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;

/// Build a gzip'd chart tarball from (path, content) pairs
pub fn chart_archive(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Index listing `nginx` 1.0.0 and 1.1.0 with relative URLs
pub fn nginx_index(digest_110: Option<&str>) -> String {
    let digest = digest_110
        .map(|d| format!("      digest: \"{}\"\n", d))
        .unwrap_or_default();
    format!(
        r#"apiVersion: v1
entries:
  nginx:
    - name: nginx
      version: "1.1.0"
      urls:
        - nginx-1.1.0.tgz
{digest}    - name: nginx
      version: "1.0.0"
      urls:
        - charts/nginx-1.0.0.tgz
"#
    )
}

pub const NGINX_VALUES: &str = "# Number of replicas\nreplicaCount: 1\n";
