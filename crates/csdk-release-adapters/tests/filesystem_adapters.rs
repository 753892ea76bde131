//! Manifest reader and document locator against real directory trees.

use std::fs;
use std::path::Path;

use csdk_release_adapters::{FsDocumentLocator, YamlManifestReader};
use csdk_release_core::{DocumentLocator, ManifestProvider, ProviderError};

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, body).expect("write");
}

#[tokio::test]
async fn reads_manifest_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        "manifest.yml",
        "version: \"202012.00\"\ndependencies:\n  - name: coreJSON\n    version: \"v2.0.0\"\n",
    );

    let manifest = YamlManifestReader::new()
        .read_manifest(&dir.path().join("manifest.yml"))
        .await
        .expect("read manifest");
    assert_eq!(manifest.version, "202012.00");
    assert_eq!(manifest.entries_for("corejson").len(), 1);
}

#[tokio::test]
async fn missing_manifest_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = YamlManifestReader::new()
        .read_manifest(&dir.path().join("manifest.yml"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn locates_documents_recursively_and_skips_git() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "README.md", "# sdk");
    write(root, "CHANGELOG.md", "## 202012.00");
    write(root, "libraries/standard/coreMQTT/README.md", "# coreMQTT");
    write(root, "libraries/standard/coreMQTT/docs/notes.md", "notes");
    write(root, ".git/README.md", "not a doc");

    let found = FsDocumentLocator::new()
        .locate(root, &["README.md", "CHANGELOG.md"])
        .await
        .expect("locate");

    assert_eq!(
        found,
        vec![
            root.join("CHANGELOG.md"),
            root.join("README.md"),
            root.join("libraries/standard/coreMQTT/README.md"),
        ]
    );
}

#[tokio::test]
async fn locating_in_missing_directory_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = FsDocumentLocator::new()
        .locate(&dir.path().join("libraries/aws"), &["README.md"])
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}
