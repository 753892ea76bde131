//! YAML manifest reader.
//!
//! The umbrella manifest looks like:
//!
//! ```yaml
//! name: "aws-iot-device-sdk-embedded-c"
//! version: "202012.00"
//! dependencies:
//!   - name: "coreMQTT"
//!     version: "v1.0.1"
//!     repository:
//!       type: "git"
//!       url: "https://github.com/FreeRTOS/coreMQTT.git"
//!       path: "libraries/standard/coreMQTT"
//! ```
//!
//! Versions are compared as text, exactly as written: an unquoted
//! `version: 202012.00` reads as `"202012.00"`, not as a number.

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use csdk_release_core::{Manifest, ManifestEntry, ManifestProvider, ProviderError, ProviderResult};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RawManifest {
    version: String,
    #[serde(default)]
    dependencies: Vec<RawDependency>,
}

#[derive(Debug, Deserialize)]
struct RawDependency {
    name: String,
    version: String,
    #[serde(default)]
    repository: Option<RawRepository>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    #[serde(default)]
    url: Option<String>,
}

/// Parse manifest YAML text.
pub fn parse_manifest(text: &str) -> ProviderResult<Manifest> {
    let raw: RawManifest =
        serde_yaml::from_str(text).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    Ok(Manifest {
        version: raw.version,
        dependencies: raw
            .dependencies
            .into_iter()
            .map(|dep| ManifestEntry {
                name: dep.name,
                version: dep.version,
                repository_url: dep.repository.and_then(|r| r.url),
            })
            .collect(),
    })
}

/// Reads manifests from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct YamlManifestReader;

impl YamlManifestReader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ManifestProvider for YamlManifestReader {
    async fn read_manifest(&self, path: &Path) -> ProviderResult<Manifest> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProviderError::NotFound(path.display().to_string()),
            _ => ProviderError::Request(format!("cannot read {}: {e}", path.display())),
        })?;
        let manifest = parse_manifest(&text)?;
        debug!(
            path = %path.display(),
            version = %manifest.version,
            dependencies = manifest.dependencies.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
name: "aws-iot-device-sdk-embedded-c"
version: "202012.00"
description: "Embedded C SDK"
dependencies:
  - name: "coreMQTT"
    version: "v1.0.1"
    repository:
      type: "git"
      url: "https://github.com/FreeRTOS/coreMQTT.git"
      path: "libraries/standard/coreMQTT"
  - name: "coreJSON"
    version: "v2.0.0"
license: "MIT"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(MANIFEST).expect("parse");
        assert_eq!(manifest.version, "202012.00");
        assert_eq!(manifest.dependencies.len(), 2);
        assert_eq!(manifest.dependencies[0].name, "coreMQTT");
        assert_eq!(
            manifest.dependencies[0].repository_url.as_deref(),
            Some("https://github.com/FreeRTOS/coreMQTT.git")
        );
        assert_eq!(manifest.dependencies[1].repository_url, None);
    }

    #[test]
    fn test_unquoted_versions_keep_their_text() {
        let manifest = parse_manifest(
            "version: 202012.00\ndependencies:\n  - name: coreJSON\n    version: 1.10\n",
        )
        .expect("parse");
        assert_eq!(manifest.version, "202012.00");
        assert_eq!(manifest.dependencies[0].version, "1.10");
    }

    #[test]
    fn test_missing_dependency_version_is_malformed() {
        let err = parse_manifest("version: \"1\"\ndependencies:\n  - name: coreMQTT\n").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn test_non_scalar_version_is_malformed() {
        let err = parse_manifest("version: [1, 2]\n").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }
}
