// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for envgen operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::schema::VariableType;

/// Convenience Result type with envgen Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during envgen operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// No envgen.yaml found in directory tree
    #[error("No envgen.yaml found in {0:?} or any parent directory")]
    #[diagnostic(
        code(envgen::not_found_in_tree),
        help("Create an envgen.yaml file with 'envgen init' or specify a path with -f")
    )]
    NotFoundInTree(PathBuf),

    /// envgen.yaml not found at specified path
    #[error("envgen.yaml not found at {0:?}")]
    #[diagnostic(code(envgen::not_found_at_path))]
    NotFoundAtPath(PathBuf),

    /// Invalid YAML in a config or override file
    #[error("Invalid YAML: {error}")]
    #[diagnostic(
        code(envgen::invalid_yaml),
        help("Check YAML syntax and ensure 'api: envgen/v0' is present")
    )]
    InvalidYaml {
        #[source]
        error: serde_yaml::Error,
        yaml_content: String,
    },

    /// Invalid JSON in an override file or adapter payload
    #[error("Invalid JSON from {origin}: {error}")]
    #[diagnostic(code(envgen::invalid_json))]
    InvalidJson {
        origin: String,
        #[source]
        error: serde_json::Error,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(envgen::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to write file
    #[error("Failed to write file: {path:?}")]
    #[diagnostic(code(envgen::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Malformed line in a .env document
    #[error("Invalid .env syntax on line {line}: {message}")]
    #[diagnostic(code(envgen::parse_env), help("Lines must look like KEY=value"))]
    ParseEnv { line: usize, message: String },

    /// The project configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(envgen::invalid_config))]
    InvalidConfig(String),

    /// A required variable has no value in any source
    #[error("Missing required variable: {name}")]
    #[diagnostic(
        code(envgen::missing_required_variable),
        help("Set {name} in the environment, in an override file, or give it a default")
    )]
    MissingRequiredVariable { name: String },

    /// A raw value could not be converted to the declared type
    #[error("Cannot convert {value:?} to {expected} for variable {name}")]
    #[diagnostic(
        code(envgen::type_coercion),
        help("{}", coercion_help(*expected))
    )]
    TypeCoercion {
        name: String,
        value: String,
        expected: VariableType,
    },

    /// A validation rule rejected a value
    #[error("Validation failed for {name}: {message}")]
    #[diagnostic(code(envgen::validation))]
    Validation { name: String, message: String },

    /// A cross-project reference could not be satisfied
    #[error("Unresolved dependency: project {project:?} does not provide {variable}")]
    #[diagnostic(
        code(envgen::unresolved_dependency),
        help("Make sure project {project:?} is part of the workspace, resolves successfully and declares {variable}")
    )]
    UnresolvedDependency { project: String, variable: String },

    /// Two workspace projects share a name
    #[error("Duplicate project name {name:?} in {second:?} (first declared in {first:?})")]
    #[diagnostic(code(envgen::duplicate_project))]
    DuplicateProject {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A generator plugin failed
    #[error("Plugin {plugin:?} failed")]
    #[diagnostic(code(envgen::plugin_execution))]
    PluginExecution {
        plugin: String,
        #[source]
        source: Box<Error>,
    },

    /// One or more plugins failed during a pipeline run
    #[error("{} plugin(s) failed", .failures.len())]
    #[diagnostic(code(envgen::plugins_failed))]
    PluginsFailed {
        #[related]
        failures: Vec<Error>,
    },

    /// A generator could not render its output
    #[error("Failed to render {format} output: {message}")]
    #[diagnostic(code(envgen::serialize))]
    Serialize { format: String, message: String },

    /// An adapter was used where its medium is unavailable
    #[error("{medium} is not available: {message}")]
    #[diagnostic(
        code(envgen::capability_unavailable),
        help("Check is_supported() before importing or exporting")
    )]
    CapabilityUnavailable { medium: String, message: String },

    /// The remote endpoint answered with a failure status
    #[error("HTTP {status} from {url}")]
    #[diagnostic(code(envgen::http_status))]
    HttpStatus { url: String, status: u16 },

    /// HTTP error passthrough
    #[error(transparent)]
    #[diagnostic(code(envgen::http_error))]
    Http(#[from] reqwest::Error),

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(envgen::io_error))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The variable this error is about, if any.
    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredVariable { name }
            | Self::TypeCoercion { name, .. }
            | Self::Validation { name, .. } => Some(name),
            Self::UnresolvedDependency { variable, .. } => Some(variable),
            _ => None,
        }
    }
}

fn coercion_help(expected: VariableType) -> String {
    match expected {
        VariableType::Boolean => "Booleans accept true, 1, false or 0".to_string(),
        VariableType::Number => "Numbers must parse as a finite decimal value".to_string(),
        VariableType::Array => "Arrays are written as comma separated values".to_string(),
        VariableType::String => "Provide a string value".to_string(),
    }
}
