// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `envgen import` command.

use std::path::PathBuf;

use clap::Args;
use miette::Result;

/// Fetch variables through an adapter and write them as .env
#[derive(Debug, Args)]
pub struct CmdImport {
    #[clap(flatten)]
    medium: crate::AdapterFlags,

    /// Write to PATH instead of stdout
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl CmdImport {
    pub async fn run(&mut self) -> Result<i32> {
        let adapter = self.medium.adapter();
        if !adapter.is_supported() {
            tracing::warn!(medium = adapter.medium(), "adapter reports it is unsupported");
        }

        let values = adapter.import_config().await?;
        let content = envgen::dotenv::render(values.iter().map(|(k, v)| (k.as_str(), v.clone())));

        match &self.output {
            Some(path) => {
                std::fs::write(path, content)
                    .map_err(|e| miette::miette!("Failed to write {:?}: {}", path, e))?;
                eprintln!("Imported {} variable(s) into {:?}", values.len(), path);
            }
            None => print!("{content}"),
        }

        Ok(0)
    }
}
