// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `envgen init` command.

use clap::Args;
use miette::Result;
use std::path::PathBuf;

#[cfg(test)]
#[path = "./cmd_init_test.rs"]
mod cmd_init_test;

/// Create a new envgen.yaml file
#[derive(Debug, Args)]
pub struct CmdInit {
    /// Directory to create file in
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Project name (defaults to the directory name)
    #[clap(long)]
    name: Option<String>,

    /// Make the project a workspace root
    #[clap(long)]
    workspace: bool,

    /// Template to use: minimal, standard, full
    #[clap(long, default_value = "standard")]
    template: String,
}

impl CmdInit {
    pub async fn run(&mut self) -> Result<i32> {
        let config_path = self.path.join(envgen::ENVGEN_FILENAME);

        // Check if file already exists
        if config_path.exists() {
            return Err(miette::miette!(
                "envgen.yaml already exists at {:?}",
                config_path
            ));
        }

        // Generate template based on option
        let content = match self.template.as_str() {
            "minimal" => self.generate_minimal_template(),
            "full" => self.generate_full_template(),
            _ => self.generate_standard_template(),
        };

        // Validate what we are about to write
        envgen::ProjectConfig::from_yaml(content.as_str())?.validate()?;

        std::fs::create_dir_all(&self.path)
            .map_err(|e| miette::miette!("Failed to create {:?}: {}", self.path, e))?;
        std::fs::write(&config_path, content)
            .map_err(|e| miette::miette!("Failed to write envgen.yaml: {}", e))?;

        println!("Created envgen.yaml at {:?}", config_path);
        println!();
        println!("Next steps:");
        println!("  1. Declare your variables");
        println!("  2. Run 'envgen check' to validate them against your environment");
        println!("  3. Run 'envgen generate' to write the configured artifacts");

        Ok(0)
    }

    fn project_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .ok()
                .map(|cwd| cwd.join(&self.path))
                .and_then(|p| dir_name(&p))
                .unwrap_or_else(|| "app".to_string())
        })
    }

    fn generate_minimal_template(&self) -> String {
        format!(
            "api: envgen/v0\n\
            name: {}\n\
            workspace: {}\n\
            \n\
            variables: {{}}\n",
            self.project_name(),
            self.workspace
        )
    }

    fn generate_standard_template(&self) -> String {
        format!(
            "# envgen project configuration\n\
            \n\
            api: envgen/v0\n\
            name: {}\n\
            \n\
            # Optional: Human-readable description\n\
            # description: \"My service\"\n\
            \n\
            # When true, every envgen.yaml below this directory joins the workspace\n\
            workspace: {}\n\
            \n\
            # Variables, resolved in this order\n\
            variables:\n\
            \x20 NODE_ENV:\n\
            \x20   default: development\n\
            \x20   validate:\n\
            \x20     - one_of: [development, test, production]\n\
            \x20 PORT:\n\
            \x20   type: number\n\
            \x20   default: 3000\n\
            \n\
            # Generators, run in order\n\
            plugins:\n\
            \x20 - name: file\n\
            \x20   options:\n\
            \x20     formats: [env]\n",
            self.project_name(),
            self.workspace
        )
    }

    fn generate_full_template(&self) -> String {
        format!(
            "# envgen project configuration\n\
            # Full example with all fields documented\n\
            \n\
            api: envgen/v0\n\
            name: {}\n\
            description: \"Full example project\"\n\
            \n\
            # Artifacts are written relative to this directory\n\
            # root: .\n\
            \n\
            # Project whose variables can be read with 'from:'\n\
            # base: shared\n\
            \n\
            workspace: {}\n\
            # workspace:\n\
            #   ignore: [node_modules, .git, target, dist, build]\n\
            #   max_depth: 4\n\
            \n\
            # Override files, later files win (envgen.local.yaml is always last)\n\
            # overrides:\n\
            #   - ~/.config/envgen/defaults.env\n\
            #   - ./staging.yaml\n\
            \n\
            variables:\n\
            \x20 NODE_ENV:\n\
            \x20   description: Runtime mode\n\
            \x20   default: development\n\
            \x20   transform: [trim, lowercase]\n\
            \x20   validate:\n\
            \x20     - one_of: [development, test, production]\n\
            \x20 PORT:\n\
            \x20   type: number\n\
            \x20   default: 3000\n\
            \x20   validate:\n\
            \x20     - min: 1\n\
            \x20     - max: 65535\n\
            \x20       message: PORT must be a valid TCP port\n\
            \x20 DEBUG:\n\
            \x20   type: boolean\n\
            \x20   default: false\n\
            \x20 ALLOWED_ORIGINS:\n\
            \x20   type: array\n\
            \x20   default: [\"http://localhost:3000\"]\n\
            \x20 API_KEY:\n\
            \x20   description: Key for the upstream API\n\
            \x20   required: false\n\
            \x20   sensitive: true\n\
            \x20   validate:\n\
            \x20     - min_length: 16\n\
            \x20 # DATABASE_URL:\n\
            \x20 #   from: DATABASE_URL\n\
            \n\
            plugins:\n\
            \x20 - name: file\n\
            \x20   options:\n\
            \x20     formats: [env, json]\n\
            \x20     output_dir: .\n\
            \x20     mask_sensitive: false\n\
            \x20 - name: typescript\n\
            \x20   options:\n\
            \x20     output_path: src/env.ts\n\
            \x20     validator_style: zod\n\
            \x20     export_mode: process.env\n\
            \x20     export_name: env\n",
            self.project_name(),
            self.workspace
        )
    }
}

fn dir_name(path: &std::path::Path) -> Option<String> {
    let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}
