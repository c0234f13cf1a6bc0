// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Resolve every project and report what fails.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Resolve every project and report failures
#[derive(Debug, Args)]
pub struct CmdCheck {
    #[clap(flatten)]
    project: crate::ProjectFlags,
}

impl CmdCheck {
    pub async fn run(&mut self) -> Result<i32> {
        let (_, report) = self.project.load()?;

        for project in report.workspace.projects() {
            let config = &project.config;
            println!(
                "{} {} ({} of {} variable(s) set)",
                "✓".green(),
                config.name.bold(),
                project.resolved.len(),
                config.variables.len()
            );
        }

        for failure in &report.failures {
            crate::print_failure(failure);
        }

        if report.is_success() {
            println!();
            println!("All {} project(s) resolved", report.workspace.len());
            return Ok(0);
        }

        eprintln!();
        eprintln!(
            "{} of {} project(s) failed",
            report.failures.len(),
            report.failures.len() + report.workspace.len()
        );
        Ok(1)
    }
}
