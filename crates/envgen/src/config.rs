// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Project configuration parsing for envgen.yaml files.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::plugin::PluginSpec;
use crate::schema::VariableSchema;
use crate::tree::{FileTree, OsFileTree};
use crate::workspace::DiscoveryOptions;
use crate::{ENVGEN_FILENAME, ENVGEN_LOCAL_FILENAME, Error, Result};

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

/// API version for config files.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "envgen/v0")]
    V0,
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ApiVersion,
}

/// The `workspace:` field, either a plain switch or discovery options.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum WorkspaceSetting {
    Enabled(bool),
    Options(DiscoveryOptions),
}

impl Default for WorkspaceSetting {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

impl WorkspaceSetting {
    /// Discovery options when this project is a workspace root.
    pub fn discovery(&self) -> Option<DiscoveryOptions> {
        match self {
            Self::Enabled(true) => Some(DiscoveryOptions::default()),
            Self::Enabled(false) => None,
            Self::Options(options) => Some(options.clone()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }
}

/// A project declared by an envgen.yaml file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// API version identifier.
    #[serde(default)]
    pub api: ApiVersion,

    /// Project name, unique within a workspace.
    /// Defaults to the name of the directory holding the file.
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Directory that generated artifacts are written relative to.
    /// Relative paths are resolved against this file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Workspace project whose variables `from:` entries read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,

    /// Variables in declaration order.
    #[serde(default)]
    pub variables: IndexMap<String, VariableSchema>,

    /// Generators, run in the order listed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<PluginSpec>,

    #[serde(default)]
    pub workspace: WorkspaceSetting,

    /// Override files, later files win.
    /// Can use absolute paths, home-relative (~/) paths, or relative paths.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<String>,

    /// Path to the file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl ProjectConfig {
    /// Create an empty config with the given project name.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a variable, keeping declaration order.
    pub fn variable<S: Into<String>>(mut self, name: S, schema: VariableSchema) -> Self {
        self.variables.insert(name.into(), schema);
        self
    }

    pub fn plugin(mut self, plugin: PluginSpec) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Parse config from YAML string.
    pub fn from_yaml<S: Into<String>>(yaml: S) -> Result<Self> {
        let yaml = yaml.into();

        // Stage 1: Parse to get API version
        let value: serde_yaml::Value =
            serde_yaml::from_str(&yaml).map_err(|e| Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(|e| Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        // Stage 2: Deserialize based on version
        match with_version.api {
            ApiVersion::V0 => serde_yaml::from_value(value).map_err(|e| Error::InvalidYaml {
                error: e,
                yaml_content: yaml,
            }),
        }
    }

    /// Load config from file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_from(&OsFileTree, path.as_ref())
    }

    /// Load config through a [`FileTree`].
    pub fn load_from(tree: &dyn FileTree, path: &Path) -> Result<Self> {
        let yaml = tree.read_to_string(path).map_err(|e| Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;

        let mut config = Self::from_yaml(yaml)?;
        config.source_path = Some(path.to_path_buf());
        if config.name.is_empty() {
            if let Some(dir_name) = config.config_dir().and_then(directory_name) {
                config.name = dir_name;
            }
        }
        tracing::debug!(project = %config.name, path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Check that the config is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("project name must not be empty".to_string()));
        }

        for (name, schema) in &self.variables {
            if !is_variable_name(name) {
                return Err(Error::InvalidConfig(format!(
                    "{name:?} is not a valid variable name (use letters, digits and underscores)"
                )));
            }

            if let Some(default) = &schema.default {
                if default.kind() != schema.kind {
                    return Err(Error::InvalidConfig(format!(
                        "default for {name} is a {} but the variable is declared as {}",
                        default.kind(),
                        schema.kind
                    )));
                }
            }

            for rule in &schema.rules {
                if !rule.check.applies_to(schema.kind) {
                    return Err(Error::InvalidConfig(format!(
                        "rule '{}' cannot be used on {name} of type {}",
                        rule.check, schema.kind
                    )));
                }
                if let crate::schema::Check::Pattern(pattern) = &rule.check {
                    regex::Regex::new(pattern).map_err(|e| {
                        Error::InvalidConfig(format!("invalid pattern for {name}: {e}"))
                    })?;
                }
            }

            if schema.from.is_some() && self.base.is_none() {
                return Err(Error::InvalidConfig(format!(
                    "{name} reads from a base project but no 'base' is declared"
                )));
            }
        }

        if let WorkspaceSetting::Options(options) = &self.workspace {
            options.validate()?;
        }

        for plugin in &self.plugins {
            plugin.validate()?;
        }

        Ok(())
    }

    /// Directory containing the config file.
    pub fn config_dir(&self) -> Option<&Path> {
        self.source_path
            .as_deref()
            .and_then(Path::parent)
            .map(|dir| {
                if dir.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    dir
                }
            })
    }

    /// Directory generated artifacts are written relative to.
    pub fn root_dir(&self) -> PathBuf {
        let base = self
            .config_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        match &self.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => base.join(root),
            None => base,
        }
    }

    /// Path of the local override file next to this config.
    pub fn local_override_path(&self) -> Option<PathBuf> {
        self.config_dir().map(|dir| dir.join(ENVGEN_LOCAL_FILENAME))
    }

    /// Resolve `overrides:` entries to paths.
    pub fn resolve_overrides(&self) -> Result<Vec<PathBuf>> {
        let base_dir = self.config_dir();

        let mut resolved = Vec::new();
        for entry in &self.overrides {
            let path = if entry.starts_with('~') {
                // Home-relative path
                let home = dirs::home_dir().ok_or_else(|| {
                    Error::InvalidConfig("Cannot resolve ~ without HOME".to_string())
                })?;
                let rel_path = entry.strip_prefix("~/").unwrap_or(entry);
                home.join(rel_path)
            } else if Path::new(entry).is_absolute() {
                PathBuf::from(entry)
            } else {
                // Relative path - resolve relative to this config's directory
                let base = base_dir.ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "Cannot resolve relative override '{entry}' without source_path"
                    ))
                })?;
                base.join(entry)
            };
            resolved.push(path);
        }

        Ok(resolved)
    }
}

fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Resolve starting path, preferring $PWD to preserve symlinks.
fn resolve_start_path(start_path: &Path) -> PathBuf {
    if start_path.is_absolute() {
        start_path.to_owned()
    } else {
        match std::env::var("PWD").ok() {
            Some(pwd) => PathBuf::from(pwd).join(start_path),
            None => std::env::current_dir()
                .unwrap_or_default()
                .join(start_path),
        }
    }
}

/// Name of `dir`, looking through `.` to the real directory.
fn directory_name(dir: &Path) -> Option<String> {
    let name = match dir.file_name() {
        Some(name) => name.to_os_string(),
        None => dunce::canonicalize(dir).ok()?.file_name()?.to_os_string(),
    };
    name.into_string().ok()
}

/// Locate the config for `start`.
///
/// A file path is returned as-is. For a directory, walks up parents until a
/// directory containing envgen.yaml is found.
pub fn find_project_config<P: AsRef<Path>>(start: P) -> Result<PathBuf> {
    let start = resolve_start_path(start.as_ref());
    let start = dunce::canonicalize(&start).map_err(|_| Error::NotFoundAtPath(start.clone()))?;

    if start.is_file() {
        return Ok(start);
    }

    let mut current = start.clone();
    loop {
        let candidate = current.join(ENVGEN_FILENAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(Error::NotFoundInTree(start));
        }
    }
}
