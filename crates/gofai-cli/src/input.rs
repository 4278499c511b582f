//! Fixture loading
//!
//! Selectors, references, projects and contexts are read as JSON or YAML,
//! chosen by file extension. Resolver configuration is TOML.

use anyhow::Context;
use gofai_resolve::{MemoryProject, ProjectData, ResolverConfig};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Document syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON (default)
    Json,
    /// YAML (`.yaml` / `.yml`)
    Yaml,
}

impl Format {
    /// Format implied by the file extension
    #[must_use]
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }
}

/// Parse a document already in memory
///
/// # Errors
/// Fails when the text does not deserialize as `T`.
pub fn parse<T: DeserializeOwned>(path: &Path, text: &str) -> anyhow::Result<T> {
    match Format::of(path) {
        Format::Json => serde_json::from_str(text)
            .with_context(|| format!("{} is not valid JSON for this input", path.display())),
        Format::Yaml => serde_yaml::from_str(text)
            .with_context(|| format!("{} is not valid YAML for this input", path.display())),
    }
}

/// Read and parse a document
///
/// # Errors
/// Fails on I/O errors or malformed content.
pub fn load<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    parse(path, &text)
}

/// Read a project file
///
/// # Errors
/// Fails on I/O errors, malformed content or invalid entity records.
pub fn load_project(path: &Path) -> anyhow::Result<MemoryProject> {
    let data: ProjectData = load(path)?;
    let project = MemoryProject::from_data(data)
        .with_context(|| format!("invalid project {}", path.display()))?;
    tracing::debug!(path = %path.display(), entities = project.entity_count(), "project loaded");
    Ok(project)
}

/// Read resolver configuration, or use defaults when no file is given
///
/// # Errors
/// Fails on I/O errors or invalid configuration.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ResolverConfig> {
    let Some(path) = path else {
        return Ok(ResolverConfig::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    ResolverConfig::from_toml_str(&text)
        .with_context(|| format!("invalid configuration {}", path.display()))
}
