// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

use rstest::{fixture, rstest};

use super::*;
use crate::resolve::Origin;
use crate::schema::VariableSchema;
use crate::tree::MemoryFileTree;

#[fixture]
fn monorepo() -> MemoryFileTree {
    MemoryFileTree::new()
        .file(
            "/ws/envgen.yaml",
            "name: root\nworkspace: true\nvariables:\n  LOG_LEVEL:\n    default: info\n",
        )
        .file(
            "/ws/shared/envgen.yaml",
            "name: shared\nvariables:\n  DATABASE_URL:\n    default: postgres://db/app\n",
        )
        .file(
            // sorts before "shared" but depends on it
            "/ws/api/envgen.yaml",
            concat!(
                "name: api\n",
                "base: shared\n",
                "variables:\n",
                "  DATABASE_URL:\n",
                "    from: DATABASE_URL\n",
                "  PORT:\n",
                "    type: number\n",
                "    default: 3000\n",
            ),
        )
        .file("/ws/node_modules/pkg/envgen.yaml", "name: vendored\n")
        .file("/ws/apps/web/envgen.yaml", "name: web\n")
}

#[rstest]
fn test_discover_sorted_and_ignored(monorepo: MemoryFileTree) {
    let found = discover_projects(&monorepo, Path::new("/ws"), &DiscoveryOptions::default())
        .expect("Should discover");
    assert_eq!(
        found,
        vec![
            PathBuf::from("/ws/api/envgen.yaml"),
            PathBuf::from("/ws/apps/web/envgen.yaml"),
            PathBuf::from("/ws/envgen.yaml"),
            PathBuf::from("/ws/shared/envgen.yaml"),
        ]
    );
}

#[rstest]
#[case(Some(0), 1)]
#[case(Some(1), 3)]
#[case(Some(2), 4)]
#[case(None, 4)]
fn test_discover_max_depth(monorepo: MemoryFileTree, #[case] depth: Option<usize>, #[case] expected: usize) {
    let options = DiscoveryOptions {
        max_depth: depth,
        ..Default::default()
    };
    let found = discover_projects(&monorepo, Path::new("/ws"), &options).unwrap();
    assert_eq!(found.len(), expected, "{found:?}");
}

#[rstest]
fn test_discover_custom_ignore_globs(monorepo: MemoryFileTree) {
    let options = DiscoveryOptions {
        ignore: vec!["app*".to_string(), "node_modules".to_string()],
        max_depth: None,
    };
    let found = discover_projects(&monorepo, Path::new("/ws"), &options).unwrap();
    assert!(!found.contains(&PathBuf::from("/ws/apps/web/envgen.yaml")));
    assert!(found.contains(&PathBuf::from("/ws/api/envgen.yaml")));
}

#[rstest]
fn test_invalid_ignore_pattern() {
    let options = DiscoveryOptions {
        ignore: vec!["[".to_string()],
        max_depth: None,
    };
    assert!(matches!(options.validate(), Err(Error::InvalidConfig(_))));
}

#[rstest]
fn test_load_workspace_resolves_base_first(monorepo: MemoryFileTree) {
    let report = load_workspace(&monorepo, Path::new("/ws/envgen.yaml"), &ValueSources::new())
        .expect("Should load");
    assert!(report.is_success(), "{:?}", report.failures);

    let workspace = &report.workspace;
    assert_eq!(workspace.len(), 4);
    // independent projects in discovery order, then dependents
    assert_eq!(
        workspace.names().collect::<Vec<_>>(),
        vec!["web", "root", "shared", "api"]
    );

    let api = workspace.get("api").unwrap();
    assert_eq!(
        api.resolved.get("DATABASE_URL"),
        Some(&Value::from("postgres://db/app"))
    );
    assert_eq!(api.resolved.origin("DATABASE_URL"), Some(Origin::Base));
    assert_eq!(
        workspace.lookup("api", "PORT").unwrap(),
        &Value::Number(3000.0)
    );
}

#[rstest]
fn test_environment_beats_base(monorepo: MemoryFileTree) {
    let env = ValueSources::new().with_environment([("DATABASE_URL", "postgres://local")]);
    let report = load_workspace(&monorepo, Path::new("/ws/envgen.yaml"), &env).unwrap();
    let api = report.workspace.get("api").unwrap();
    assert_eq!(
        api.resolved.get("DATABASE_URL"),
        Some(&Value::from("postgres://local"))
    );
    assert_eq!(api.resolved.origin("DATABASE_URL"), Some(Origin::Environment));
}

#[rstest]
fn test_lookup_before_and_after_registration() {
    let shared = ProjectConfig::new("shared")
        .variable("DATABASE_URL", VariableSchema::string().with_default("pg://x"));
    let resolved = crate::resolve::resolve_variables(&shared, &ValueSources::new()).unwrap();

    let mut workspace = Workspace::new("/ws");
    assert!(matches!(
        workspace.lookup("shared", "DATABASE_URL"),
        Err(Error::UnresolvedDependency { .. })
    ));

    workspace.register(shared, resolved).unwrap();
    assert_eq!(
        workspace.lookup("shared", "DATABASE_URL").unwrap(),
        &Value::from("pg://x")
    );
    assert!(matches!(
        workspace.lookup("shared", "MISSING"),
        Err(Error::UnresolvedDependency { .. })
    ));
}

#[rstest]
fn test_failures_do_not_stop_siblings() {
    let tree = MemoryFileTree::new()
        .file("/ws/envgen.yaml", "name: root\nworkspace: true\n")
        .file("/ws/broken/envgen.yaml", "name: [unclosed\n")
        .file(
            "/ws/needs/envgen.yaml",
            "name: needs\nvariables:\n  TOKEN:\n    required: true\n",
        )
        .file("/ws/ok/envgen.yaml", "name: ok\n");

    let report = load_workspace(&tree, Path::new("/ws/envgen.yaml"), &ValueSources::new()).unwrap();
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].path, PathBuf::from("/ws/broken/envgen.yaml"));
    assert!(report.failures[0].project.is_none());
    assert!(matches!(report.failures[0].error, Error::InvalidYaml { .. }));
    assert_eq!(report.failures[1].project.as_deref(), Some("needs"));
    assert!(matches!(
        report.failures[1].error,
        Error::MissingRequiredVariable { .. }
    ));

    assert!(report.workspace.get("ok").is_some());
    assert!(report.workspace.get("root").is_some());
}

#[rstest]
fn test_duplicate_project_names() {
    let tree = MemoryFileTree::new()
        .file("/ws/envgen.yaml", "name: root\nworkspace: true\n")
        .file("/ws/a/envgen.yaml", "name: app\n")
        .file("/ws/b/envgen.yaml", "name: app\n");

    let report = load_workspace(&tree, Path::new("/ws/envgen.yaml"), &ValueSources::new()).unwrap();
    assert_eq!(report.failures.len(), 1);
    match &report.failures[0].error {
        Error::DuplicateProject { name, first, second } => {
            assert_eq!(name, "app");
            assert_eq!(first, &PathBuf::from("/ws/a/envgen.yaml"));
            assert_eq!(second, &PathBuf::from("/ws/b/envgen.yaml"));
        }
        other => panic!("Expected DuplicateProject, got: {other:?}"),
    }
}

#[rstest]
fn test_unregistered_base_is_reported() {
    let tree = MemoryFileTree::new()
        .file("/ws/envgen.yaml", "name: root\nworkspace: true\n")
        .file(
            "/ws/api/envgen.yaml",
            "name: api\nbase: nowhere\nvariables:\n  URL:\n    from: URL\n",
        );

    let report = load_workspace(&tree, Path::new("/ws/envgen.yaml"), &ValueSources::new()).unwrap();
    assert_eq!(report.failures.len(), 1);
    match &report.failures[0].error {
        Error::UnresolvedDependency { project, variable } => {
            assert_eq!(project, "nowhere");
            assert_eq!(variable, "URL");
        }
        other => panic!("Expected UnresolvedDependency, got: {other:?}"),
    }
}

#[rstest]
fn test_single_project_without_workspace() {
    let tree = MemoryFileTree::new()
        .file("/p/envgen.yaml", "name: solo\n")
        .file("/p/child/envgen.yaml", "name: child\n");
    let report = load_workspace(&tree, Path::new("/p/envgen.yaml"), &ValueSources::new()).unwrap();
    assert_eq!(report.workspace.names().collect::<Vec<_>>(), vec!["solo"]);
}

#[rstest]
fn test_project_local_overrides() {
    let tree = MemoryFileTree::new()
        .file(
            "/ws/envgen.yaml",
            "name: root\nworkspace: true\nvariables:\n  MODE:\n    default: prod\n",
        )
        .file("/ws/envgen.local.yaml", "MODE: dev\n")
        .file(
            "/ws/svc/envgen.yaml",
            "name: svc\nvariables:\n  MODE:\n    default: prod\n",
        );
    let report = load_workspace(&tree, Path::new("/ws/envgen.yaml"), &ValueSources::new()).unwrap();
    let root = report.workspace.get("root").unwrap();
    let svc = report.workspace.get("svc").unwrap();
    assert_eq!(root.resolved.get("MODE"), Some(&Value::from("dev")));
    assert_eq!(svc.resolved.get("MODE"), Some(&Value::from("prod")));
}

#[rstest]
fn test_workspace_setting_with_options() {
    let config = ProjectConfig::from_yaml("name: root\nworkspace:\n  max_depth: 2\n").unwrap();
    let options = config.workspace.discovery().unwrap();
    assert_eq!(options.max_depth, Some(2));
    assert_eq!(options.ignore, DiscoveryOptions::default().ignore);
}

#[rstest]
fn test_relative_root_config_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("envgen.yaml"), "workspace: true
").unwrap();
    std::fs::create_dir(dir.path().join("app")).unwrap();
    std::fs::write(dir.path().join("app/envgen.yaml"), "api: envgen/v0
").unwrap();
    let root_name = dunce::canonicalize(dir.path())
        .unwrap()
        .file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .unwrap();

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let result = load_workspace(
        &crate::tree::OsFileTree,
        Path::new("envgen.yaml"),
        &ValueSources::new(),
    );
    std::env::set_current_dir(previous).unwrap();

    let report = result.expect("Should load from a relative path");
    assert!(report.is_success());
    let mut names = report.workspace.names().map(String::from).collect::<Vec<_>>();
    names.sort();
    let mut expected = vec!["app".to_string(), root_name];
    expected.sort();
    assert_eq!(names, expected);
}
