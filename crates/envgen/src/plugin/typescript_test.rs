// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use rstest::{fixture, rstest};

use super::*;
use crate::config::ProjectConfig;
use crate::resolve::{ResolvedVariables, resolve_variables};
use crate::schema::Rule;
use crate::sources::ValueSources;

#[fixture]
fn project() -> (ProjectConfig, ResolvedVariables) {
    let config = ProjectConfig::new("server")
        .variable(
            "PORT",
            VariableSchema::number()
                .with_default(8080)
                .describe("Port to listen on")
                .rule(Rule::new(Check::Min(1.0)))
                .rule(Rule::new(Check::Max(65535.0))),
        )
        .variable("HOST", VariableSchema::string().required())
        .variable("API_KEY", VariableSchema::string().sensitive().required())
        .variable("DEBUG", VariableSchema::boolean())
        .variable(
            "STAGE",
            VariableSchema::string()
                .with_default("dev")
                .rule(Rule::new(Check::OneOf(vec!["dev".into(), "prod".into()]))),
        );
    let sources =
        ValueSources::new().with_environment([("HOST", "example.com"), ("API_KEY", "s3cret")]);
    let resolved = resolve_variables(&config, &sources).expect("Should resolve");
    (config, resolved)
}

fn render(options: TypescriptOptions, project: &(ProjectConfig, ResolvedVariables)) -> String {
    let ctx = GenerateContext {
        config: &project.0,
        variables: &project.1,
        root: Path::new("."),
    };
    TypescriptEmitter::new(options).render(&ctx)
}

#[rstest]
fn test_zod_process_env(project: (ProjectConfig, ResolvedVariables)) {
    let out = render(TypescriptOptions::default(), &project);

    assert!(out.starts_with("// Generated by envgen for project \"server\". Do not edit by hand.\n"));
    assert!(out.contains("import { z } from \"zod\";"));
    assert!(out.contains("export const envSchema = z.object({"));
    assert!(out.contains(
        "  PORT: z.coerce.number().min(1).max(65535).default(8080).describe(\"Port to listen on\"),"
    ));
    assert!(out.contains("  HOST: z.string(),"));
    assert!(out.contains("  /** Sensitive value. */\n  API_KEY: z.string(),"));
    assert!(out.contains("  DEBUG: z.enum([\"true\", \"1\", \"false\", \"0\"])"));
    assert!(out.contains(".optional(),"));
    assert!(out.contains("  STAGE: z.enum([\"dev\", \"prod\"]).default(\"dev\"),"));
    assert!(out.contains("export type Env = z.infer<typeof envSchema>;"));
    assert!(out.contains("export const env: Env = envSchema.parse(process.env);"));
    assert!(!out.contains("s3cret"));
    assert!(!out.contains("example.com"));
}

#[rstest]
fn test_zod_static_inlines_non_sensitive(project: (ProjectConfig, ResolvedVariables)) {
    let options = TypescriptOptions {
        export_mode: ExportMode::Static,
        ..Default::default()
    };
    let out = render(options, &project);

    assert!(out.contains("  PORT: z.number().min(1).max(65535).default(8080)"));
    assert!(out.contains("envSchema.parse({\n"));
    assert!(out.contains("  PORT: 8080,\n"));
    assert!(out.contains("  HOST: \"example.com\",\n"));
    assert!(out.contains("  STAGE: \"dev\",\n"));
    assert!(out.contains("  API_KEY: process.env.API_KEY,\n"));
    assert!(!out.contains("s3cret"));
    // unset optional variables are left out of the literal
    assert!(!out.contains("  DEBUG: undefined"));
}

#[rstest]
fn test_plain_process_env(project: (ProjectConfig, ResolvedVariables)) {
    let options = TypescriptOptions {
        validator_style: ValidatorStyle::None,
        ..Default::default()
    };
    let out = render(options, &project);

    assert!(!out.contains("zod"));
    assert!(out.contains("export interface Env {"));
    assert!(out.contains("  /** Port to listen on */\n  PORT: number;"));
    assert!(out.contains("  HOST: string;"));
    assert!(out.contains("  DEBUG?: boolean;"));
    assert!(out.contains("function required(name: string): string {"));
    assert!(out.contains("function toBoolean(value: string): boolean {"));
    assert!(!out.contains("function toArray"));
    assert!(out.contains("  PORT: Number((process.env.PORT ?? \"8080\")),"));
    assert!(out.contains("  HOST: required(\"HOST\"),"));
    assert!(out.contains(
        "  DEBUG: process.env.DEBUG === undefined ? undefined : toBoolean(process.env.DEBUG),"
    ));
    assert!(out.contains("export const env: Env = {"));
}

#[rstest]
fn test_plain_static(project: (ProjectConfig, ResolvedVariables)) {
    let options = TypescriptOptions {
        validator_style: ValidatorStyle::None,
        export_mode: ExportMode::Static,
        export_name: "config".to_string(),
        ..Default::default()
    };
    let out = render(options, &project);

    assert!(out.contains("export interface Config {"));
    assert!(out.contains("export const config: Config = {"));
    assert!(out.contains("  PORT: 8080,"));
    assert!(out.contains("  API_KEY: required(\"API_KEY\"),"));
    assert!(!out.contains("s3cret"));
}

#[rstest]
fn test_array_variable() {
    let config = ProjectConfig::new("p").variable(
        "TAGS",
        VariableSchema::array()
            .with_default(vec!["a".to_string(), "b".to_string()])
            .rule(Rule::new(Check::MaxLength(3)).with_message("too many tags")),
    );
    let resolved = resolve_variables(&config, &ValueSources::new()).unwrap();
    let project = (config, resolved);

    let out = render(TypescriptOptions::default(), &project);
    assert!(out.contains(".pipe(z.array(z.string()).max(3, { message: \"too many tags\" }))"));
    assert!(out.contains(".default(\"a,b\")"));

    let options = TypescriptOptions {
        export_mode: ExportMode::Static,
        ..Default::default()
    };
    let out = render(options, &project);
    assert!(out.contains("  TAGS: [\"a\", \"b\"],"));
}

#[rstest]
fn test_description_is_escaped() {
    let config = ProjectConfig::new("p").variable(
        "NAME",
        VariableSchema::string().describe("ends */ early \"quoted\""),
    );
    let project = (config, ResolvedVariables::default());
    let out = render(TypescriptOptions::default(), &project);
    assert!(out.contains("/** ends *\\/ early \"quoted\" */"));
    assert!(out.contains(".describe(\"ends */ early \\\"quoted\\\"\")"));
}

#[rstest]
fn test_generate_uses_output_path(project: (ProjectConfig, ResolvedVariables)) {
    let options = TypescriptOptions {
        output_path: PathBuf::from("src/env.ts"),
        ..Default::default()
    };
    let ctx = GenerateContext {
        config: &project.0,
        variables: &project.1,
        root: Path::new("."),
    };
    let artifacts = TypescriptEmitter::new(options).generate(&ctx).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].path, PathBuf::from("src/env.ts"));
}

#[rstest]
#[case("env", true)]
#[case("$config", true)]
#[case("_private", true)]
#[case("1env", false)]
#[case("my-env", false)]
#[case("", false)]
fn test_export_name_validation(#[case] name: &str, #[case] valid: bool) {
    let options = TypescriptOptions {
        export_name: name.to_string(),
        ..Default::default()
    };
    assert_eq!(options.validate().is_ok(), valid);
}

#[rstest]
fn test_options_from_yaml() {
    let options: TypescriptOptions =
        serde_yaml::from_str("export_mode: static\nvalidator_style: none\n").unwrap();
    assert_eq!(options.export_mode, ExportMode::Static);
    assert_eq!(options.validator_style, ValidatorStyle::None);
    assert_eq!(options.output_path, PathBuf::from("env.ts"));

    let options: TypescriptOptions = serde_yaml::from_str("export_mode: process.env\n").unwrap();
    assert_eq!(options.export_mode, ExportMode::ProcessEnv);
}
