// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! envgen - Typed Environment Variable Generator
//!
//! This crate provides the core library for declaring environment variables
//! with a typed schema (`envgen.yaml`), resolving them against overrides and
//! the process environment, and generating artifacts from the result.
//!
//! # Overview
//!
//! Each project declares its variables once. Resolution picks a value per
//! variable from, in order: override files, the environment, the project's
//! `base` project (for `from:` variables) and finally the declared default.
//! Values are coerced to the declared type, transformed and validated.
//! Resolved projects are then fed through a pipeline of generator plugins
//! that write `.env`, JSON, YAML or TypeScript files.
//!
//! A project with `workspace: true` is a workspace root. Every project found
//! below it is resolved together so that projects can share variables.
//!
//! # Example
//!
//! ```yaml
//! # envgen.yaml
//! api: envgen/v0
//! name: server
//!
//! variables:
//!   PORT:
//!     type: number
//!     default: 8080
//!     validate:
//!       - min: 1
//!       - max: 65535
//!   HOST:
//!     required: true
//!   API_KEY:
//!     sensitive: true
//!
//! plugins:
//!   - name: file
//!     options:
//!       formats: [env, json]
//!       mask_sensitive: true
//!   - name: typescript
//! ```

pub mod adapter;
pub mod config;
pub mod dotenv;
pub mod error;
pub mod plugin;
pub mod resolve;
pub mod schema;
pub mod sources;
pub mod tree;
pub mod workspace;

pub use adapter::{ConfigAdapter, FileAdapter, HttpAdapter, VariableMap};
pub use config::{ApiVersion, ProjectConfig, WorkspaceSetting, find_project_config};
pub use error::{Error, Result};
pub use plugin::{
    Artifact, GenerateContext, Generator, Pipeline, PipelineReport, PluginSpec, write_artifacts,
};
pub use resolve::{
    DependencyLookup, Origin, ResolvedVariables, Resolver, coerce_text, resolve_variables,
};
pub use schema::{Check, Rule, Transform, Value, VariableSchema, VariableType, Verdict};
pub use sources::{ValueSources, load_override_file};
pub use tree::{FileTree, MemoryFileTree, OsFileTree};
pub use workspace::{
    DiscoveryOptions, ProjectFailure, Workspace, WorkspaceProject, WorkspaceReport,
    discover_projects, load_workspace,
};

/// Well-known filename for project configs.
pub const ENVGEN_FILENAME: &str = "envgen.yaml";

/// Well-known filename for local overrides.
pub const ENVGEN_LOCAL_FILENAME: &str = "envgen.local.yaml";
