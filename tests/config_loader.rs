// tests/config_loader.rs

use std::io::Write;

use tempfile::NamedTempFile;
use taskgraph::config::{DepSpec, load_and_validate, load_from_path};
use taskgraph::errors::TaskGraphError;
use taskgraph::types::ExecutionMode;

fn pipeline_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn loads_a_valid_pipeline() {
    let file = pipeline_file(
        r#"
[config]
mode = "sequential"
root = "report"

[task.fetch]
value = { string = "string", number = 1 }
delay_ms = 100

[task.report]
deps = { first = "fetch", nested = { inner = "fetch" } }

[task.broken]
fail = "boom"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.config.mode, ExecutionMode::Sequential);
    assert_eq!(cfg.config.root.as_deref(), Some("report"));
    assert_eq!(cfg.task.len(), 3);
    assert_eq!(cfg.task["fetch"].delay_ms, Some(100));
    assert_eq!(cfg.task["broken"].fail.as_deref(), Some("boom"));
    assert_eq!(
        cfg.task["report"].deps["first"],
        DepSpec::Task("fetch".to_string())
    );

    let mut sinks = cfg.sinks();
    sinks.sort();
    assert_eq!(sinks, vec!["broken", "report"]);
}

#[test]
fn dag_cycle_returns_structured_error() {
    let file = pipeline_file(
        r#"
[task.A]
deps = { b = "B" }

[task.B]
deps = { nested = { a = "A" } }
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskGraphError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        Err(e) => panic!("Expected DagCycle error, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_returns_config_error() {
    let file = pipeline_file(
        r#"
[task.A]
deps = { missing = "NonExistent" }
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskGraphError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn self_dependency_returns_config_error() {
    let file = pipeline_file(
        r#"
[task.A]
deps = { me = { again = "A" } }
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskGraphError::ConfigError(msg)) => assert!(msg.contains("cannot depend on itself")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn empty_pipeline_is_rejected() {
    let file = pipeline_file("[config]\nmode = \"concurrent\"\n");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskGraphError::ConfigError(_))
    ));
}

#[test]
fn unknown_root_is_rejected() {
    let file = pipeline_file(
        r#"
[config]
root = "ghost"

[task.A]
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskGraphError::ConfigError(msg)) => assert!(msg.contains("ghost")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn invalid_mode_is_a_toml_error() {
    let file = pipeline_file(
        r#"
[config]
mode = "parallel"

[task.A]
"#,
    );

    assert!(matches!(
        load_from_path(file.path()),
        Err(TaskGraphError::TomlError(_))
    ));
}

#[test]
fn misspelled_keys_are_rejected() {
    for contents in [
        "[task.a]\ndep = { x = \"b\" }\n\n[task.b]\n",
        "[config]\nroots = \"a\"\n\n[task.a]\n",
        "[tasks.a]\nvalue = 1\n",
    ] {
        let file = pipeline_file(contents);
        match load_from_path(file.path()) {
            Err(TaskGraphError::TomlError(err)) => {
                assert!(err.to_string().contains("unknown field"), "{err}");
            }
            other => panic!("Expected TomlError for {contents:?}, got: {other:?}"),
        }
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Taskgraph.toml");

    assert!(matches!(
        load_and_validate(&path),
        Err(TaskGraphError::IoError(_))
    ));
}
