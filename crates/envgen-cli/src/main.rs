// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! envgen - Typed Environment Variable Generator CLI

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use miette::Result;

mod cmd_check;
mod cmd_export;
mod cmd_generate;
mod cmd_import;
mod cmd_init;
mod cmd_show;

use cmd_check::CmdCheck;
use cmd_export::CmdExport;
use cmd_generate::CmdGenerate;
use cmd_import::CmdImport;
use cmd_init::CmdInit;
use cmd_show::CmdShow;

#[derive(Parser)]
#[clap(
    name = "envgen",
    about = "Typed Environment Variable Generator",
    version,
    long_about = "Declare environment variables once, validate them and generate typed artifacts"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

/// Selects the project to work on and extra override files.
#[derive(Args, Clone, Debug)]
pub struct ProjectFlags {
    /// Project directory or config file (searches parent directories)
    #[clap(short = 'f', long, env = "ENVGEN_FILE", default_value = ".")]
    pub file: PathBuf,

    /// Additional override file, layered below the project's own overrides
    #[clap(
        long = "override",
        env = "ENVGEN_OVERRIDE",
        value_delimiter = ':'
    )]
    pub overrides: Vec<PathBuf>,
}

impl ProjectFlags {
    pub fn config_path(&self) -> Result<PathBuf> {
        Ok(envgen::find_project_config(&self.file)?)
    }

    /// The process environment plus any override files given on the command line.
    pub fn sources(&self) -> Result<envgen::ValueSources> {
        let mut sources = envgen::ValueSources::from_process_env();
        for path in &self.overrides {
            sources = sources.with_override_file(&envgen::OsFileTree, path)?;
        }
        Ok(sources)
    }

    /// Load and resolve the workspace the selected project belongs to.
    pub fn load(&self) -> Result<(PathBuf, envgen::WorkspaceReport)> {
        let config_path = self.config_path()?;
        let sources = self.sources()?;
        let report = envgen::load_workspace(&envgen::OsFileTree, &config_path, &sources)?;
        Ok((config_path, report))
    }
}

/// Picks the project `name`, or the one declared by `config_path`.
///
/// Fails with the project's own error when it did not resolve.
pub fn select_project(
    report: envgen::WorkspaceReport,
    config_path: &Path,
    name: Option<&str>,
) -> Result<envgen::WorkspaceProject> {
    let found = report.workspace.projects().find(|p| match name {
        Some(name) => p.config.name == name,
        None => p.config.source_path.as_deref() == Some(config_path),
    });
    if let Some(project) = found {
        return Ok(project.clone());
    }

    let failure = report.failures.into_iter().find(|f| match name {
        Some(name) => f.project.as_deref() == Some(name),
        None => f.path == config_path,
    });
    match (failure, name) {
        (Some(failure), _) => Err(failure.error.into()),
        (None, Some(name)) => Err(miette::miette!("No project named {name:?} in the workspace")),
        (None, None) => Err(miette::miette!(
            "No project loaded from {}",
            config_path.display()
        )),
    }
}

/// Print a project that failed to load or resolve.
pub fn print_failure(failure: &envgen::ProjectFailure) {
    let label = failure
        .project
        .clone()
        .unwrap_or_else(|| failure.path.display().to_string());
    eprintln!("{} {}", "✗".red(), label.bold());
    eprintln!("  {}", failure.error);
    if let Some(variable) = failure.error.variable() {
        eprintln!("  {} {}", "variable:".dimmed(), variable);
    }
}

/// Chooses the medium for import and export.
#[derive(Args, Clone, Debug)]
#[clap(group(clap::ArgGroup::new("medium").required(true).args(["url", "source_file"])))]
pub struct AdapterFlags {
    /// HTTP(S) endpoint serving a JSON object of strings
    #[clap(long)]
    pub url: Option<String>,

    /// .env file to read or write
    #[clap(long = "env-file")]
    pub source_file: Option<PathBuf>,

    /// Request timeout in seconds for --url
    #[clap(long, env = "ENVGEN_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,
}

impl AdapterFlags {
    pub fn adapter(&self) -> Box<dyn envgen::ConfigAdapter> {
        match (&self.url, &self.source_file) {
            (Some(url), _) => Box::new(
                envgen::HttpAdapter::new(url.clone())
                    .with_timeout(Duration::from_secs(self.timeout)),
            ),
            (None, Some(path)) => Box::new(envgen::FileAdapter::new().with_path(path.clone())),
            (None, None) => Box::new(envgen::FileAdapter::new()),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create a new envgen.yaml file
    Init(CmdInit),

    /// Display resolved variables and where they came from
    Show(CmdShow),

    /// Resolve every project and report failures
    Check(CmdCheck),

    /// Run the plugin pipeline of every project
    Generate(CmdGenerate),

    /// Fetch variables through an adapter and write them as .env
    Import(CmdImport),

    /// Send resolved variables through an adapter
    Export(CmdExport),
}

impl Opt {
    async fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        // Dispatch to command
        match self.cmd {
            Command::Init(mut cmd) => cmd.run().await,
            Command::Show(mut cmd) => cmd.run().await,
            Command::Check(mut cmd) => cmd.run().await,
            Command::Generate(mut cmd) => cmd.run().await,
            Command::Import(mut cmd) => cmd.run().await,
            Command::Export(mut cmd) => cmd.run().await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run().await?;
    std::process::exit(code);
}
