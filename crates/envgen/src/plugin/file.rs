// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Writes resolved variables as `.env`, JSON or YAML files.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Artifact, GenerateContext, Generator};
use crate::dotenv;
use crate::schema::Value;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./file_test.rs"]
mod file_test;

pub const NAME: &str = "file";

/// Replacement for sensitive values when masking is enabled.
pub const MASK: &str = "********";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Env,
    Json,
    Yaml,
}

impl FileFormat {
    /// File name used when no stem is configured.
    fn default_filename(self) -> &'static str {
        match self {
            Self::Env => ".env",
            Self::Json => "env.json",
            Self::Yaml => "env.yaml",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    fn filename(self, stem: Option<&str>) -> String {
        match stem {
            Some(stem) => format!("{stem}.{}", self.extension()),
            None => self.default_filename().to_string(),
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileOptions {
    pub formats: Vec<FileFormat>,

    /// Relative to the project root.
    pub output_dir: PathBuf,

    /// Stem shared by every output file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    pub mask_sensitive: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            formats: vec![FileFormat::Env],
            output_dir: PathBuf::from("."),
            filename: None,
            mask_sensitive: false,
        }
    }
}

impl FileOptions {
    pub fn validate(&self) -> Result<()> {
        if self.formats.is_empty() {
            return Err(Error::InvalidConfig(
                "file plugin needs at least one format".to_string(),
            ));
        }
        for (i, format) in self.formats.iter().enumerate() {
            if self.formats[..i].contains(format) {
                return Err(Error::InvalidConfig(format!(
                    "file plugin lists format '{format}' more than once"
                )));
            }
        }
        if let Some(stem) = &self.filename {
            if stem.is_empty() || stem.contains(['/', '\\']) {
                return Err(Error::InvalidConfig(format!(
                    "file plugin filename {stem:?} must be a plain file stem"
                )));
            }
        }
        Ok(())
    }

    /// Output path of `format`, relative to the project root.
    pub fn path_for(&self, format: FileFormat) -> PathBuf {
        let filename = format.filename(self.filename.as_deref());
        if self.output_dir.as_os_str().is_empty() || self.output_dir == Path::new(".") {
            PathBuf::from(filename)
        } else {
            self.output_dir.join(filename)
        }
    }
}

/// The `file` plugin.
#[derive(Debug, Clone, Default)]
pub struct FileEmitter {
    options: FileOptions,
}

impl FileEmitter {
    pub fn new(options: FileOptions) -> Self {
        Self { options }
    }

    fn values(&self, ctx: &GenerateContext<'_>) -> IndexMap<String, Value> {
        ctx.variables
            .iter()
            .map(|(name, value)| {
                let sensitive = ctx
                    .config
                    .variables
                    .get(name)
                    .is_some_and(|schema| schema.sensitive);
                let value = if sensitive && self.options.mask_sensitive {
                    Value::from(MASK)
                } else {
                    value.clone()
                };
                (name.to_string(), value)
            })
            .collect()
    }

    fn render(format: FileFormat, values: &IndexMap<String, Value>) -> Result<String> {
        match format {
            FileFormat::Env => Ok(dotenv::render(
                values.iter().map(|(k, v)| (k.as_str(), v.to_string())),
            )),
            FileFormat::Json => serde_json::to_string_pretty(values)
                .map(|json| json + "\n")
                .map_err(|e| Error::Serialize {
                    format: "json".to_string(),
                    message: e.to_string(),
                }),
            FileFormat::Yaml if values.is_empty() => Ok("{}\n".to_string()),
            FileFormat::Yaml => serde_yaml::to_string(values).map_err(|e| Error::Serialize {
                format: "yaml".to_string(),
                message: e.to_string(),
            }),
        }
    }
}

impl Generator for FileEmitter {
    fn name(&self) -> &str {
        NAME
    }

    fn generate(&self, ctx: &GenerateContext<'_>) -> Result<Vec<Artifact>> {
        self.options.validate()?;
        let values = self.values(ctx);
        self.options
            .formats
            .iter()
            .map(|format| {
                let content = Self::render(*format, &values)?;
                Ok(Artifact::new(self.options.path_for(*format), content))
            })
            .collect()
    }
}
