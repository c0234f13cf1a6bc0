// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Generator plugins and the pipeline that runs them.
//!
//! Plugins are declared in envgen.yaml as `{name, options}` entries:
//!
//! ```yaml
//! plugins:
//!   - name: file
//!     options:
//!       formats: [env, json]
//!   - name: typescript
//!     options:
//!       output_path: src/env.ts
//!       export_mode: static
//! ```
//!
//! Each entry becomes a [`Generator`]. Generators defined outside this crate
//! implement the same trait and are added with [`Pipeline::with_generator`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ProjectConfig;
use crate::resolve::ResolvedVariables;
use crate::{Error, Result};

pub mod file;
pub mod typescript;

pub use file::{FileEmitter, FileFormat, FileOptions};
pub use typescript::{ExportMode, TypescriptEmitter, TypescriptOptions, ValidatorStyle};

#[cfg(test)]
#[path = "./pipeline_test.rs"]
mod pipeline_test;

/// A generated output file, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub content: String,
}

impl Artifact {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(path: P, content: S) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Inputs handed to every generator of a pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct GenerateContext<'a> {
    pub config: &'a ProjectConfig,
    pub variables: &'a ResolvedVariables,
    /// Directory artifact paths are relative to.
    pub root: &'a Path,
}

/// Turns resolved variables into artifacts.
pub trait Generator {
    /// Name reported alongside failures.
    fn name(&self) -> &str;

    fn generate(&self, ctx: &GenerateContext<'_>) -> Result<Vec<Artifact>>;
}

/// A built-in plugin as declared in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "RawPlugin", into = "RawPlugin")]
pub enum PluginSpec {
    File(FileOptions),
    Typescript(TypescriptOptions),
}

/// On-disk shape of a plugin entry.
#[derive(Deserialize, Serialize)]
struct RawPlugin {
    name: String,
    #[serde(default, skip_serializing_if = "serde_yaml::Value::is_null")]
    options: serde_yaml::Value,
}

impl TryFrom<RawPlugin> for PluginSpec {
    type Error = String;

    fn try_from(raw: RawPlugin) -> std::result::Result<Self, Self::Error> {
        let options = match raw.options {
            serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
            other => other,
        };
        let invalid = |e: serde_yaml::Error| format!("invalid options for plugin {:?}: {e}", raw.name);
        match raw.name.as_str() {
            file::NAME => serde_yaml::from_value(options).map(Self::File).map_err(invalid),
            typescript::NAME => serde_yaml::from_value(options)
                .map(Self::Typescript)
                .map_err(invalid),
            other => Err(format!(
                "unknown plugin {other:?} (expected {:?} or {:?})",
                file::NAME,
                typescript::NAME
            )),
        }
    }
}

impl From<PluginSpec> for RawPlugin {
    fn from(spec: PluginSpec) -> Self {
        let name = spec.name().to_string();
        let options = match spec {
            PluginSpec::File(options) => serde_yaml::to_value(options),
            PluginSpec::Typescript(options) => serde_yaml::to_value(options),
        };
        Self {
            name,
            options: options.unwrap_or_default(),
        }
    }
}

impl PluginSpec {
    pub fn name(&self) -> &'static str {
        match self {
            Self::File(_) => file::NAME,
            Self::Typescript(_) => typescript::NAME,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::File(options) => options.validate(),
            Self::Typescript(options) => options.validate(),
        }
    }

    /// Instantiate the generator for this entry.
    pub fn build(&self) -> Box<dyn Generator> {
        match self {
            Self::File(options) => Box::new(FileEmitter::new(options.clone())),
            Self::Typescript(options) => Box::new(TypescriptEmitter::new(options.clone())),
        }
    }
}

/// Outcome of running a pipeline for one project.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub project: String,
    /// Artifacts of every plugin that succeeded, in plugin order.
    pub artifacts: Vec<Artifact>,
    /// One `PluginExecution` error per failed plugin.
    pub failures: Vec<Error>,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The artifacts, or every failure bundled into `PluginsFailed`.
    pub fn into_result(self) -> Result<Vec<Artifact>> {
        if self.failures.is_empty() {
            Ok(self.artifacts)
        } else {
            Err(Error::PluginsFailed {
                failures: self.failures,
            })
        }
    }
}

/// An ordered list of generators.
#[derive(Default)]
pub struct Pipeline {
    generators: Vec<Box<dyn Generator>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("generators", &self.names())
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pipeline declared by a project's `plugins:` list.
    pub fn for_project(config: &ProjectConfig) -> Self {
        Self {
            generators: config.plugins.iter().map(PluginSpec::build).collect(),
        }
    }

    pub fn with_generator<G: Generator + 'static>(mut self, generator: G) -> Self {
        self.generators.push(Box::new(generator));
        self
    }

    pub fn push(&mut self, generator: Box<dyn Generator>) {
        self.generators.push(generator);
    }

    pub fn names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Run every generator once, in order.
    ///
    /// A failing generator does not stop the ones after it.
    pub fn run(&self, config: &ProjectConfig, variables: &ResolvedVariables) -> PipelineReport {
        let root = config.root_dir();
        let ctx = GenerateContext {
            config,
            variables,
            root: &root,
        };
        let mut report = PipelineReport {
            project: config.name.clone(),
            ..Default::default()
        };

        for generator in &self.generators {
            match generator.generate(&ctx) {
                Ok(artifacts) => {
                    tracing::info!(
                        project = %config.name,
                        plugin = generator.name(),
                        artifacts = artifacts.len(),
                        "plugin finished"
                    );
                    report.artifacts.extend(artifacts);
                }
                Err(error) => {
                    tracing::warn!(
                        project = %config.name,
                        plugin = generator.name(),
                        %error,
                        "plugin failed"
                    );
                    report.failures.push(Error::PluginExecution {
                        plugin: generator.name().to_string(),
                        source: Box::new(error),
                    });
                }
            }
        }

        report
    }
}

/// Write artifacts below `root`, creating directories as needed.
///
/// Returns the written paths.
pub fn write_artifacts(root: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = root.join(&artifact.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::WriteFailed {
                path: parent.to_path_buf(),
                error: e,
            })?;
        }
        std::fs::write(&path, &artifact.content).map_err(|e| Error::WriteFailed {
            path: path.clone(),
            error: e,
        })?;
        tracing::debug!(path = %path.display(), "wrote artifact");
        written.push(path);
    }
    Ok(written)
}
