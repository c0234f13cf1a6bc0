// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `envgen show` command.

use clap::Args;
use colored::Colorize;
use indexmap::IndexMap;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

const MASK: &str = "********";

/// Display resolved variables and where they came from
#[derive(Debug, Args)]
pub struct CmdShow {
    #[clap(flatten)]
    project: crate::ProjectFlags,

    /// Show a workspace project other than the selected one
    #[clap(short = 'p', long = "project")]
    name: Option<String>,

    /// Print sensitive values instead of masking them
    #[clap(long)]
    reveal: bool,

    /// Output format: table, yaml, json
    #[clap(long, default_value = "table")]
    format: String,
}

#[derive(Serialize)]
struct ShownVariable {
    value: Option<serde_json::Value>,
    #[serde(rename = "type")]
    kind: envgen::VariableType,
    origin: Option<envgen::Origin>,
    sensitive: bool,
}

#[derive(Serialize)]
struct ShownProject<'a> {
    project: &'a str,
    variables: IndexMap<String, ShownVariable>,
}

impl CmdShow {
    pub async fn run(&mut self) -> Result<i32> {
        let (config_path, report) = self.project.load()?;
        let project = crate::select_project(report, &config_path, self.name.as_deref())?;

        if self.format == "yaml" {
            self.show_yaml(&project)?;
        } else if self.format == "json" {
            self.show_json(&project)?;
        } else {
            self.show_table(&project);
        }

        Ok(0)
    }

    fn display_value(&self, schema: &envgen::VariableSchema, value: &envgen::Value) -> String {
        if schema.sensitive && !self.reveal {
            MASK.to_string()
        } else {
            value.to_string()
        }
    }

    fn shown(&self, project: &envgen::WorkspaceProject) -> Result<IndexMap<String, ShownVariable>> {
        let mut shown = IndexMap::new();
        for (name, schema) in &project.config.variables {
            let value = match project.resolved.get(name) {
                Some(_) if schema.sensitive && !self.reveal => Some(serde_json::Value::from(MASK)),
                Some(value) => Some(serde_json::to_value(value).into_diagnostic()?),
                None => None,
            };
            shown.insert(
                name.clone(),
                ShownVariable {
                    value,
                    kind: schema.kind,
                    origin: project.resolved.origin(name),
                    sensitive: schema.sensitive,
                },
            );
        }
        Ok(shown)
    }

    fn show_table(&self, project: &envgen::WorkspaceProject) {
        let config = &project.config;
        println!("{} {}", "Project:".bold(), config.name.cyan());
        if let Some(path) = &config.source_path {
            println!("  {}", path.display().to_string().dimmed());
        }
        if let Some(desc) = &config.description {
            println!("  {}", desc.dimmed());
        }
        println!();

        if config.variables.is_empty() {
            println!("  {}", "(no variables)".dimmed());
            return;
        }

        let width = config.variables.keys().map(String::len).max().unwrap_or(0);
        for (name, schema) in &config.variables {
            let padded = format!("{name:width$}");
            match project.resolved.get(name) {
                Some(value) => {
                    let origin = project
                        .resolved
                        .origin(name)
                        .map(|o| o.to_string())
                        .unwrap_or_default();
                    println!(
                        "  {} = {}  {}",
                        padded.cyan(),
                        self.display_value(schema, value).green(),
                        format!("[{} from {origin}]", schema.kind).dimmed()
                    );
                }
                None => {
                    println!("  {} {}", padded.cyan(), "(unset)".yellow());
                }
            }
        }

        println!();
        println!(
            "Total: {} of {} variable(s) set",
            project.resolved.len(),
            config.variables.len()
        );
    }

    fn show_yaml(&self, project: &envgen::WorkspaceProject) -> Result<()> {
        let shown = self.shown(project)?;
        println!("# Project: {}", project.config.name);
        print!("{}", serde_yaml::to_string(&shown).into_diagnostic()?);
        Ok(())
    }

    fn show_json(&self, project: &envgen::WorkspaceProject) -> Result<()> {
        let shown = self.shown(project)?;
        let document = ShownProject {
            project: &project.config.name,
            variables: shown,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&document).into_diagnostic()?
        );
        Ok(())
    }
}
