// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `envgen generate` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Run the plugin pipeline of every project
#[derive(Debug, Args)]
pub struct CmdGenerate {
    #[clap(flatten)]
    project: crate::ProjectFlags,

    /// List the artifacts instead of writing them
    #[clap(long)]
    dry_run: bool,
}

impl CmdGenerate {
    pub async fn run(&mut self) -> Result<i32> {
        let (_, report) = self.project.load()?;
        let mut failed = report.failures.len();

        for project in report.workspace.projects() {
            let config = &project.config;
            let pipeline = envgen::Pipeline::for_project(config);
            if pipeline.is_empty() {
                tracing::info!(project = %config.name, "no plugins configured");
                continue;
            }

            let result = pipeline.run(config, &project.resolved);
            let root = config.root_dir();
            println!("{} {}", "▸".cyan(), config.name.bold());

            if self.dry_run {
                for artifact in &result.artifacts {
                    println!(
                        "  {} {}",
                        "would write".dimmed(),
                        root.join(&artifact.path).display()
                    );
                }
            } else {
                for path in envgen::write_artifacts(&root, &result.artifacts)? {
                    println!("  {} {}", "wrote".green(), path.display());
                }
            }

            for error in &result.failures {
                eprintln!("  {} {}", "✗".red(), error);
                if let envgen::Error::PluginExecution { source, .. } = error {
                    eprintln!("    {}", source);
                }
            }
            if !result.is_success() {
                failed += 1;
            }
        }

        for failure in &report.failures {
            crate::print_failure(failure);
        }

        if failed > 0 {
            eprintln!();
            eprintln!("{failed} project(s) failed");
            return Ok(1);
        }
        Ok(0)
    }
}
