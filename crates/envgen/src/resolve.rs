// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Resolution of declared variables into typed values.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::config::ProjectConfig;
use crate::schema::{Value, VariableSchema, VariableType, Verdict};
use crate::sources::ValueSources;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./resolve_test.rs"]
mod resolve_test;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Override,
    Environment,
    Base,
    Default,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Override => "override",
            Self::Environment => "environment",
            Self::Base => "base",
            Self::Default => "default",
        };
        f.write_str(name)
    }
}

/// Final typed values of one project, in declaration order.
///
/// Optional variables with no value are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedVariables {
    values: IndexMap<String, Value>,
    origins: IndexMap<String, Origin>,
}

impl ResolvedVariables {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn origin(&self, name: &str) -> Option<Origin> {
        self.origins.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Values rendered the way they appear in a `.env` file.
    pub fn to_string_map(&self) -> IndexMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    fn insert(&mut self, name: &str, value: Value, origin: Origin) {
        self.values.insert(name.to_string(), value);
        self.origins.insert(name.to_string(), origin);
    }
}

impl Serialize for ResolvedVariables {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// Read access to variables resolved in other projects.
pub trait DependencyLookup {
    /// The value of `variable` in the resolved project `project`.
    fn lookup(&self, project: &str, variable: &str) -> Result<&Value>;
}

/// Lookup used outside a workspace; every reference is unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependencies;

impl DependencyLookup for NoDependencies {
    fn lookup(&self, project: &str, variable: &str) -> Result<&Value> {
        Err(Error::UnresolvedDependency {
            project: project.to_string(),
            variable: variable.to_string(),
        })
    }
}

enum Candidate<'v> {
    Text(&'v str),
    Typed(&'v Value),
}

/// Resolves a project's variables against a set of sources.
///
/// Precedence: overrides, then the environment, then the base project
/// (for `from:` variables), then the declared default.
pub struct Resolver<'a> {
    sources: &'a ValueSources,
    dependencies: &'a dyn DependencyLookup,
}

impl<'a> Resolver<'a> {
    pub fn new(sources: &'a ValueSources) -> Self {
        Self {
            sources,
            dependencies: &NoDependencies,
        }
    }

    /// Use `dependencies` to satisfy `from:` references.
    pub fn with_dependencies(mut self, dependencies: &'a dyn DependencyLookup) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Resolve every variable in declaration order, stopping at the first
    /// failure.
    pub fn resolve(&self, config: &ProjectConfig) -> Result<ResolvedVariables> {
        let mut resolved = ResolvedVariables::default();
        for (name, schema) in &config.variables {
            if let Some((value, origin)) = self.resolve_one(config, name, schema)? {
                tracing::debug!(project = %config.name, variable = %name, %origin, "resolved variable");
                resolved.insert(name, value, origin);
            } else {
                tracing::debug!(project = %config.name, variable = %name, "optional variable unset");
            }
        }
        Ok(resolved)
    }

    fn candidate(
        &self,
        config: &ProjectConfig,
        schema: &VariableSchema,
        name: &str,
    ) -> Result<Option<(Candidate<'_>, Origin)>> {
        if let Some(value) = self.sources.override_value(name) {
            return Ok(Some((Candidate::Typed(value), Origin::Override)));
        }
        if let Some(text) = self.sources.env_value(name) {
            return Ok(Some((Candidate::Text(text), Origin::Environment)));
        }
        if let Some(variable) = &schema.from {
            let project = config.base.as_deref().unwrap_or_default();
            let value = self.dependencies.lookup(project, variable)?;
            return Ok(Some((Candidate::Typed(value), Origin::Base)));
        }
        Ok(None)
    }

    fn resolve_one(
        &self,
        config: &ProjectConfig,
        name: &str,
        schema: &VariableSchema,
    ) -> Result<Option<(Value, Origin)>> {
        let (value, origin) = match self.candidate(config, schema, name)? {
            Some((candidate, origin)) => (coerce(name, candidate, schema.kind)?, origin),
            None => match &schema.default {
                Some(default) if default.kind() != schema.kind => {
                    return Err(Error::TypeCoercion {
                        name: name.to_string(),
                        value: default.to_string(),
                        expected: schema.kind,
                    });
                }
                Some(default) => (default.clone(), Origin::Default),
                None if schema.required => {
                    return Err(Error::MissingRequiredVariable {
                        name: name.to_string(),
                    });
                }
                None => return Ok(None),
            },
        };

        let value = schema.apply_transforms(value);
        match schema.check(&value) {
            Verdict::Accept => Ok(Some((value, origin))),
            Verdict::Reject(message) => Err(Error::Validation {
                name: name.to_string(),
                message: message
                    .unwrap_or_else(|| format!("value '{value}' was rejected by its validator")),
            }),
        }
    }
}

/// Resolve `config` against `sources` outside of any workspace.
pub fn resolve_variables(config: &ProjectConfig, sources: &ValueSources) -> Result<ResolvedVariables> {
    Resolver::new(sources).resolve(config)
}

fn coerce(name: &str, candidate: Candidate<'_>, kind: VariableType) -> Result<Value> {
    let mismatch = |value: String| Error::TypeCoercion {
        name: name.to_string(),
        value,
        expected: kind,
    };

    match candidate {
        Candidate::Text(text) => coerce_text(text, kind).ok_or_else(|| mismatch(text.to_string())),
        Candidate::Typed(value) if value.kind() == kind => Ok(value.clone()),
        Candidate::Typed(Value::String(text)) => {
            coerce_text(text, kind).ok_or_else(|| mismatch(text.clone()))
        }
        Candidate::Typed(value)
            if kind == VariableType::String
                && matches!(value, Value::Number(_) | Value::Boolean(_)) =>
        {
            Ok(Value::String(value.to_string()))
        }
        Candidate::Typed(value) => Err(mismatch(value.to_string())),
    }
}

/// Convert an environment string to `kind`.
pub fn coerce_text(text: &str, kind: VariableType) -> Option<Value> {
    match kind {
        VariableType::String => Some(Value::String(text.to_string())),
        VariableType::Number => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number),
        VariableType::Boolean => match text {
            "true" | "1" => Some(Value::Boolean(true)),
            "false" | "0" => Some(Value::Boolean(false)),
            _ => None,
        },
        VariableType::Array => {
            if text.trim().is_empty() {
                Some(Value::Array(Vec::new()))
            } else {
                Some(Value::Array(
                    text.split(',').map(|item| item.trim().to_string()).collect(),
                ))
            }
        }
    }
}
