// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

use std::cell::Cell;
use std::rc::Rc;

use rstest::rstest;

use super::*;
use crate::schema::VariableSchema;

struct Failing;

impl Generator for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn generate(&self, _ctx: &GenerateContext<'_>) -> Result<Vec<Artifact>> {
        Err(Error::Serialize {
            format: "test".to_string(),
            message: "boom".to_string(),
        })
    }
}

struct Counting {
    calls: Rc<Cell<usize>>,
}

impl Generator for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn generate(&self, ctx: &GenerateContext<'_>) -> Result<Vec<Artifact>> {
        self.calls.set(self.calls.get() + 1);
        Ok(vec![Artifact::new(
            "count.txt",
            format!("{}\n", ctx.variables.len()),
        )])
    }
}

struct RootEcho;

impl Generator for RootEcho {
    fn name(&self) -> &str {
        "root-echo"
    }

    fn generate(&self, ctx: &GenerateContext<'_>) -> Result<Vec<Artifact>> {
        Ok(vec![Artifact::new("root.txt", ctx.root.display().to_string())])
    }
}

fn resolved() -> (ProjectConfig, ResolvedVariables) {
    let config =
        ProjectConfig::new("demo").variable("PORT", VariableSchema::number().with_default(1));
    let variables = crate::resolve::resolve_variables(&config, &Default::default())
        .expect("Should resolve");
    (config, variables)
}

#[rstest]
fn test_failure_does_not_stop_later_plugins() {
    let (config, variables) = resolved();
    let calls = Rc::new(Cell::new(0));
    let pipeline = Pipeline::new().with_generator(Failing).with_generator(Counting {
        calls: calls.clone(),
    });

    let report = pipeline.run(&config, &variables);

    assert_eq!(calls.get(), 1);
    assert_eq!(report.project, "demo");
    assert_eq!(report.artifacts, vec![Artifact::new("count.txt", "1\n")]);
    assert_eq!(report.failures.len(), 1);
    match &report.failures[0] {
        Error::PluginExecution { plugin, .. } => assert_eq!(plugin, "failing"),
        other => panic!("Expected PluginExecution, got: {other:?}"),
    }
    assert!(!report.is_success());
    match report.into_result() {
        Err(Error::PluginsFailed { failures }) => assert_eq!(failures.len(), 1),
        other => panic!("Expected PluginsFailed, got: {other:?}"),
    }
}

#[rstest]
fn test_each_plugin_runs_once_in_order() {
    let (config, variables) = resolved();
    let calls = Rc::new(Cell::new(0));
    let pipeline = Pipeline::for_project(&config.clone().plugin(PluginSpec::File(FileOptions::default())))
        .with_generator(Counting {
            calls: calls.clone(),
        });
    assert_eq!(pipeline.names(), vec!["file", "counting"]);

    let report = pipeline.run(&config, &variables);
    assert_eq!(calls.get(), 1);
    let paths: Vec<_> = report.artifacts.iter().map(|a| a.path.clone()).collect();
    assert_eq!(paths, vec![PathBuf::from(".env"), PathBuf::from("count.txt")]);
    assert!(report.into_result().is_ok());
}

#[rstest]
fn test_empty_pipeline() {
    let (config, variables) = resolved();
    let pipeline = Pipeline::for_project(&config);
    assert!(pipeline.is_empty());
    let report = pipeline.run(&config, &variables);
    assert!(report.is_success());
    assert!(report.artifacts.is_empty());
}

#[rstest]
fn test_plugin_specs_from_yaml() {
    let yaml = r#"
- name: file
  options:
    formats: [env, json]
- name: typescript
- name: typescript
  options:
    export_mode: static
"#;
    let specs: Vec<PluginSpec> = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(specs.len(), 3);
    match &specs[0] {
        PluginSpec::File(options) => {
            assert_eq!(options.formats, vec![FileFormat::Env, FileFormat::Json])
        }
        other => panic!("Expected file plugin, got: {other:?}"),
    }
    assert_eq!(specs[1], PluginSpec::Typescript(TypescriptOptions::default()));
    match &specs[2] {
        PluginSpec::Typescript(options) => assert_eq!(options.export_mode, ExportMode::Static),
        other => panic!("Expected typescript plugin, got: {other:?}"),
    }
}

#[rstest]
#[case("- name: webpack\n", "unknown plugin")]
#[case("- name: file\n  options:\n    formats: [toml]\n", "invalid options")]
#[case("- name: file\n  options:\n    colour: red\n", "invalid options")]
fn test_invalid_plugin_specs(#[case] yaml: &str, #[case] expected: &str) {
    let err = serde_yaml::from_str::<Vec<PluginSpec>>(yaml).expect_err("Should fail");
    assert!(err.to_string().contains(expected), "{err}");
}

#[rstest]
fn test_plugin_spec_round_trip_keeps_name() {
    let spec = PluginSpec::Typescript(TypescriptOptions::default());
    let yaml = serde_yaml::to_string(&spec).unwrap();
    assert!(yaml.contains("name: typescript"), "{yaml}");
    let parsed: PluginSpec = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, spec);
}

#[rstest]
fn test_write_artifacts_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = vec![
        Artifact::new(".env", "PORT=1\n"),
        Artifact::new("src/generated/env.ts", "export {};\n"),
    ];
    let written = write_artifacts(dir.path(), &artifacts).unwrap();

    assert_eq!(written.len(), 2);
    assert_eq!(
        std::fs::read_to_string(dir.path().join(".env")).unwrap(),
        "PORT=1\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("src/generated/env.ts")).unwrap(),
        "export {};\n"
    );
}

#[rstest]
#[case(None, "/repo/app")]
#[case(Some("dist"), "/repo/app/dist")]
fn test_context_carries_project_root(#[case] root: Option<&str>, #[case] expected: &str) {
    let (mut config, variables) = resolved();
    config.source_path = Some(PathBuf::from("/repo/app/envgen.yaml"));
    config.root = root.map(PathBuf::from);

    let report = Pipeline::new().with_generator(RootEcho).run(&config, &variables);
    assert_eq!(report.artifacts, vec![Artifact::new("root.txt", expected)]);
}
