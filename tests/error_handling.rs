// tests/error_handling.rs

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use paver::errors::PaverError;
use paver::fs::RealFileSystem;
use paver::workspace::load_workspace;

fn write_manifest(root: &Path, dir: &str, file: &str, contents: &str) {
    let pkg = root.join(dir);
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join(file), contents).unwrap();
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let dir = TempDir::new().unwrap();
    write_manifest(dir.path(), "a", "manifest.toml", "package = \"A\"\ndeps = [\"B\"]\n");
    write_manifest(dir.path(), "b", "manifest.toml", "package = \"B\"\ndeps = [\"A\"]\n");

    let tracker = load_workspace(&RealFileSystem, dir.path())
        .unwrap()
        .into_tracker()
        .unwrap();

    match tracker.validate() {
        Err(PaverError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_unknown_node() {
    let dir = TempDir::new().unwrap();
    write_manifest(dir.path(), "a", "manifest.yaml", "package: A\ndeps: [NonExistent]\n");

    let result = load_workspace(&RealFileSystem, dir.path())
        .unwrap()
        .into_tracker();

    match result {
        Err(PaverError::UnknownNode(msg)) => assert!(msg.contains("NonExistent")),
        Err(e) => panic!("Expected UnknownNode, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_duplicate_package_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_manifest(dir.path(), "one", "manifest.yaml", "package: same\n");
    write_manifest(dir.path(), "two", "manifest.yml", "package: same\n");

    let result = load_workspace(&RealFileSystem, dir.path())
        .unwrap()
        .into_tracker();

    match result {
        Err(PaverError::DuplicateNode(msg)) => assert!(msg.contains("same")),
        Err(e) => panic!("Expected DuplicateNode, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_invalid_toml_returns_manifest_error() {
    let dir = TempDir::new().unwrap();
    write_manifest(dir.path(), "bad", "manifest.toml", "package = \n");

    match load_workspace(&RealFileSystem, dir.path()) {
        Err(PaverError::ManifestError { path, .. }) => {
            assert!(path.ends_with("bad/manifest.toml"));
        }
        Err(e) => panic!("Expected ManifestError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_empty_package_name_returns_manifest_error() {
    let dir = TempDir::new().unwrap();
    write_manifest(dir.path(), "blank", "manifest.yaml", "package: \"  \"\n");

    match load_workspace(&RealFileSystem, dir.path()) {
        Err(PaverError::ManifestError { message, .. }) => assert!(message.contains("package")),
        Err(e) => panic!("Expected ManifestError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_task_failure_message_names_task_and_reason() {
    let err = PaverError::TaskFailed {
        task: "\"core\"".to_string(),
        reason: "exit code 3".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("core"));
    assert!(msg.contains("exit code 3"));
}
