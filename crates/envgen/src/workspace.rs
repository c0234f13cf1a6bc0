// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Workspace discovery and cross-project resolution.
//!
//! A workspace root is an envgen.yaml with `workspace:` enabled. Every
//! directory below it holding an envgen.yaml is a member project, and the
//! root project itself is a member too. Projects that declare a `base` can
//! read variables from that base project with `from:`.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::ProjectConfig;
use crate::resolve::{DependencyLookup, ResolvedVariables, Resolver};
use crate::schema::Value;
use crate::sources::ValueSources;
use crate::tree::FileTree;
use crate::{ENVGEN_FILENAME, Error, Result};

#[cfg(test)]
#[path = "./workspace_test.rs"]
mod workspace_test;

/// Directory names skipped by default during discovery.
pub const DEFAULT_IGNORE: &[&str] = &["node_modules", ".git", "target", "dist", "build"];

/// Options for walking a workspace.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryOptions {
    /// Glob patterns matched against directory names.
    pub ignore: Vec<String>,

    /// How many directory levels below the root to search (None = unlimited).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
            max_depth: None,
        }
    }
}

impl DiscoveryOptions {
    pub fn validate(&self) -> Result<()> {
        self.patterns().map(|_| ())
    }

    fn patterns(&self) -> Result<Vec<glob::Pattern>> {
        self.ignore
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|e| {
                    Error::InvalidConfig(format!("invalid ignore pattern {pattern:?}: {e}"))
                })
            })
            .collect()
    }
}

/// Find every envgen.yaml at or below `root`, sorted by path.
pub fn discover_projects(
    tree: &dyn FileTree,
    root: &Path,
    options: &DiscoveryOptions,
) -> Result<Vec<PathBuf>> {
    let patterns = options.patterns()?;
    let mut found = Vec::new();

    let root_config = root.join(ENVGEN_FILENAME);
    if tree.is_file(&root_config) {
        found.push(root_config);
    }

    let entries = tree.read_dir(root).map_err(|e| Error::ReadFailed {
        path: root.to_path_buf(),
        error: e,
    })?;
    walk(tree, entries, 1, options.max_depth, &patterns, &mut found);

    found.sort();
    Ok(found)
}

fn walk(
    tree: &dyn FileTree,
    entries: Vec<crate::tree::TreeEntry>,
    depth: usize,
    max_depth: Option<usize>,
    ignore: &[glob::Pattern],
    found: &mut Vec<PathBuf>,
) {
    if max_depth.is_some_and(|max| depth > max) {
        return;
    }

    for entry in entries.into_iter().filter(|e| e.is_dir) {
        let Some(name) = entry.file_name() else {
            continue;
        };
        if ignore.iter().any(|pattern| pattern.matches(name)) {
            tracing::trace!(dir = %entry.path.display(), "skipping ignored directory");
            continue;
        }

        let config = entry.path.join(ENVGEN_FILENAME);
        if tree.is_file(&config) {
            found.push(config);
        }

        match tree.read_dir(&entry.path) {
            Ok(children) => walk(tree, children, depth + 1, max_depth, ignore, found),
            Err(error) => {
                tracing::warn!(dir = %entry.path.display(), %error, "cannot read directory");
            }
        }
    }
}

/// A member project after successful resolution.
#[derive(Debug, Clone)]
pub struct WorkspaceProject {
    pub config: ProjectConfig,
    pub resolved: ResolvedVariables,
}

/// Resolved projects keyed by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    root: PathBuf,
    projects: IndexMap<String, WorkspaceProject>,
}

impl Workspace {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            projects: IndexMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add a resolved project, making it available to later `from:` lookups.
    pub fn register(&mut self, config: ProjectConfig, resolved: ResolvedVariables) -> Result<()> {
        if let Some(existing) = self.projects.get(&config.name) {
            return Err(Error::DuplicateProject {
                name: config.name.clone(),
                first: existing.config.source_path.clone().unwrap_or_default(),
                second: config.source_path.clone().unwrap_or_default(),
            });
        }
        tracing::debug!(project = %config.name, variables = resolved.len(), "registered project");
        self.projects
            .insert(config.name.clone(), WorkspaceProject { config, resolved });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&WorkspaceProject> {
        self.projects.get(name)
    }

    pub fn projects(&self) -> impl Iterator<Item = &WorkspaceProject> {
        self.projects.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// The value of `variable` in the registered project `project`.
    pub fn lookup(&self, project: &str, variable: &str) -> Result<&Value> {
        self.projects
            .get(project)
            .and_then(|p| p.resolved.get(variable))
            .ok_or_else(|| Error::UnresolvedDependency {
                project: project.to_string(),
                variable: variable.to_string(),
            })
    }
}

impl DependencyLookup for Workspace {
    fn lookup(&self, project: &str, variable: &str) -> Result<&Value> {
        Workspace::lookup(self, project, variable)
    }
}

/// A member project that could not be loaded or resolved.
#[derive(Debug)]
pub struct ProjectFailure {
    pub path: PathBuf,
    /// Known once the config parsed.
    pub project: Option<String>,
    pub error: Error,
}

/// Result of loading a workspace: what resolved and what did not.
#[derive(Debug)]
pub struct WorkspaceReport {
    pub workspace: Workspace,
    pub failures: Vec<ProjectFailure>,
}

impl WorkspaceReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Load, resolve and register every project of the workspace rooted at
/// `root_config`.
///
/// A root config without `workspace:` enabled gives a workspace holding only
/// that project. Failures of single projects are collected in the report;
/// only an unreadable or invalid root config fails the whole call.
///
/// `environment` is shared by all projects; each project layers its own
/// override files on top of it.
pub fn load_workspace(
    tree: &dyn FileTree,
    root_config: &Path,
    environment: &ValueSources,
) -> Result<WorkspaceReport> {
    let root = ProjectConfig::load_from(tree, root_config)?;
    root.validate()?;
    let root_dir = root_config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut failures = Vec::new();
    let mut configs: IndexMap<String, ProjectConfig> = IndexMap::new();

    let mut member_paths = match root.workspace.discovery() {
        Some(options) => discover_projects(tree, &root_dir, &options)?,
        None => Vec::new(),
    };
    if !member_paths.iter().any(|p| p == root_config) {
        member_paths.insert(0, root_config.to_path_buf());
    }
    tracing::info!(
        root = %root_dir.display(),
        projects = member_paths.len(),
        "discovered projects"
    );

    for path in member_paths {
        let loaded = if path == root_config {
            Ok(root.clone())
        } else {
            ProjectConfig::load_from(tree, &path).and_then(|config| {
                config.validate()?;
                Ok(config)
            })
        };

        let config = match loaded {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to load project");
                failures.push(ProjectFailure {
                    path,
                    project: None,
                    error,
                });
                continue;
            }
        };

        if let Some(first) = configs.get(&config.name) {
            let error = Error::DuplicateProject {
                name: config.name.clone(),
                first: first.source_path.clone().unwrap_or_default(),
                second: path.clone(),
            };
            tracing::warn!(path = %path.display(), %error, "skipping project");
            failures.push(ProjectFailure {
                path,
                project: Some(config.name),
                error,
            });
            continue;
        }
        configs.insert(config.name.clone(), config);
    }

    let mut workspace = Workspace::new(root_dir);
    let (independent, dependent): (Vec<_>, Vec<_>) = configs
        .into_values()
        .partition(|config| config.base.is_none());

    for config in independent.into_iter().chain(dependent) {
        let path = config.source_path.clone().unwrap_or_default();
        let resolved = environment.for_project(tree, &config).and_then(|sources| {
            Resolver::new(&sources)
                .with_dependencies(&workspace)
                .resolve(&config)
        });

        let registered = resolved.and_then(|resolved| {
            tracing::info!(project = %config.name, variables = resolved.len(), "resolved project");
            workspace.register(config.clone(), resolved)
        });

        if let Err(error) = registered {
            tracing::warn!(project = %config.name, %error, "failed to resolve project");
            failures.push(ProjectFailure {
                path,
                project: Some(config.name),
                error,
            });
        }
    }

    Ok(WorkspaceReport {
        workspace,
        failures,
    })
}
