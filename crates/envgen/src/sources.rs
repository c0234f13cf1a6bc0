// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Raw value sources consulted during resolution.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;

use indexmap::IndexMap;

use crate::config::ProjectConfig;
use crate::schema::Value;
use crate::tree::FileTree;
use crate::{Error, Result, dotenv};

#[cfg(test)]
#[path = "./sources_test.rs"]
mod sources_test;

/// Values available to the resolver, apart from schema defaults and
/// base-project references.
///
/// Overrides take precedence over the environment. Within the overrides,
/// later layers replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct ValueSources {
    overrides: IndexMap<String, Value>,
    environment: HashMap<String, String>,
}

impl ValueSources {
    /// No values at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    pub fn from_process_env() -> Self {
        Self::new().with_os_environment(std::env::vars_os())
    }

    /// Add environment entries given as OS strings, skipping any that are
    /// not valid unicode.
    pub fn with_os_environment<I>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let vars = vars.into_iter().filter_map(|(key, value)| {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (key, _) => {
                    tracing::debug!(key = ?key, "skipping non-unicode environment variable");
                    None
                }
            }
        });
        self.with_environment(vars)
    }

    /// Add environment entries, replacing existing keys.
    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a single override value.
    pub fn with_override<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Layer a set of override values on top of the existing ones.
    pub fn with_overrides(mut self, layer: IndexMap<String, Value>) -> Self {
        self.overrides.extend(layer);
        self
    }

    /// Layer an imported key/string map on top of the existing overrides.
    pub fn with_imported<I, K, V>(mut self, imported: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.overrides.extend(
            imported
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into()))),
        );
        self
    }

    /// Layer the contents of an override file.
    pub fn with_override_file(self, tree: &dyn FileTree, path: &Path) -> Result<Self> {
        let layer = load_override_file(tree, path)?;
        tracing::debug!(path = %path.display(), count = layer.len(), "loaded override file");
        Ok(self.with_overrides(layer))
    }

    /// Sources for one project: these sources plus the project's listed
    /// override files and its local override file, if present.
    pub fn for_project(&self, tree: &dyn FileTree, config: &ProjectConfig) -> Result<Self> {
        let mut sources = self.clone();
        for path in config.resolve_overrides()? {
            sources = sources.with_override_file(tree, &path)?;
        }
        if let Some(local) = config.local_override_path() {
            if tree.is_file(&local) {
                sources = sources.with_override_file(tree, &local)?;
            }
        }
        Ok(sources)
    }

    pub fn override_value(&self, name: &str) -> Option<&Value> {
        self.overrides.get(name)
    }

    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.environment.get(name).map(String::as_str)
    }
}

/// Read an override file.
///
/// `.yaml`/`.yml` and `.json` files hold a flat mapping of name to value.
/// Anything else is read as `.env` syntax.
pub fn load_override_file(tree: &dyn FileTree, path: &Path) -> Result<IndexMap<String, Value>> {
    let content = tree.read_to_string(path).map_err(|e| Error::ReadFailed {
        path: path.to_path_buf(),
        error: e,
    })?;
    if content.trim().is_empty() {
        return Ok(IndexMap::new());
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&content).map_err(|e| Error::InvalidYaml {
            error: e,
            yaml_content: content.clone(),
        }),
        Some("json") => serde_json::from_str(&content).map_err(|e| Error::InvalidJson {
            origin: path.display().to_string(),
            error: e,
        }),
        _ => Ok(dotenv::parse(&content)?
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()),
    }
}
