//! Provider adapters for CSDK release verification.
//!
//! - [`github::GithubClient`]: branches, commits, pull requests, check runs
//! - [`jenkins::JenkinsClient`]: umbrella pipeline builds
//! - [`routing::RoutingCiProvider`]: sends each job to the system that owns it
//! - [`manifest::YamlManifestReader`]: `manifest.yml`
//! - [`docs::FsDocumentLocator`]: README/CHANGELOG discovery on disk
//!
//! Credentials are held as [`Secret`] and only exposed when building a request.

pub mod docs;
pub mod github;
mod http;
pub mod jenkins;
pub mod manifest;
pub mod routing;
pub mod secret;

pub use docs::FsDocumentLocator;
pub use github::{repo_slug_from_url, GithubClient, GithubConfig};
pub use jenkins::{JenkinsClient, JenkinsConfig};
pub use manifest::{parse_manifest, YamlManifestReader};
pub use routing::RoutingCiProvider;
pub use secret::Secret;
