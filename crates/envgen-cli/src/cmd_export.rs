// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `envgen export` command.

use clap::Args;
use miette::Result;

/// Send resolved variables through an adapter
#[derive(Debug, Args)]
pub struct CmdExport {
    #[clap(flatten)]
    project: crate::ProjectFlags,

    #[clap(flatten)]
    medium: crate::AdapterFlags,

    /// Export a workspace project other than the selected one
    #[clap(short = 'p', long = "project")]
    name: Option<String>,
}

impl CmdExport {
    pub async fn run(&mut self) -> Result<i32> {
        let (config_path, report) = self.project.load()?;
        let project = crate::select_project(report, &config_path, self.name.as_deref())?;

        let values = project.resolved.to_string_map();
        let adapter = self.medium.adapter();
        adapter.export_config(&values).await?;

        eprintln!(
            "Exported {} variable(s) of {} via {}",
            values.len(),
            project.config.name,
            adapter.medium()
        );
        Ok(0)
    }
}
