//! Filesystem document locator.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csdk_release_core::{DocumentLocator, ProviderError, ProviderResult};
use walkdir::{DirEntry, WalkDir};

/// Walks a directory tree for files with given names.
///
/// `.git` directories are skipped. Symlinks are not followed.
#[derive(Debug, Clone, Default)]
pub struct FsDocumentLocator;

impl FsDocumentLocator {
    pub fn new() -> Self {
        Self
    }
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == ".git"
}

/// Blocking walk; sorted output.
pub fn find_documents(dir: &Path, file_names: &[String]) -> ProviderResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ProviderError::NotFound(format!("directory {}", dir.display())));
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_entry(|e| !is_git_dir(e)) {
        let entry = entry.map_err(|e| ProviderError::Request(format!("walking {}: {e}", dir.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| file_names.iter().any(|wanted| wanted == name));
        if matches {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

#[async_trait]
impl DocumentLocator for FsDocumentLocator {
    async fn locate(&self, dir: &Path, file_names: &[&str]) -> ProviderResult<Vec<PathBuf>> {
        let dir = dir.to_path_buf();
        let names: Vec<String> = file_names.iter().map(|s| s.to_string()).collect();
        tokio::task::spawn_blocking(move || find_documents(&dir, &names))
            .await
            .map_err(|e| ProviderError::Request(format!("document search aborted: {e}")))?
    }
}
