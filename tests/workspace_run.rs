// tests/workspace_run.rs

#![cfg(unix)]

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use paver::cli::CliArgs;
use paver::errors::PaverError;
use paver::run;
use paver::workspace::{Manifest, ScriptFailure};
use paver_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Write `<root>/<dir>/manifest.yaml` and each `(name, body)` script next to it.
fn add_package(root: &Path, dir: &str, manifest: &str, scripts: &[(&str, &str)]) {
    let pkg = root.join(dir);
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("manifest.yaml"), manifest).unwrap();
    for (name, body) in scripts {
        fs::write(pkg.join(name), body).unwrap();
    }
}

fn args(workdir: &Path, workers: usize) -> CliArgs {
    CliArgs {
        workers,
        workdir: workdir.to_path_buf(),
        log_level: None,
        dry_run: false,
    }
}

fn order_log(dir: &TempDir) -> PathBuf {
    dir.path().join("order.log")
}

#[tokio::test]
async fn packages_run_in_dependency_order() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let ws = dir.path().join("ws");
    let log = order_log(&dir);
    let append = |name: &str| format!("echo {name} >> {}\n", log.display());

    add_package(
        &ws,
        "core",
        "package: core\nscripts: [build.sh]\n",
        &[("build.sh", append("core").as_str())],
    );
    add_package(
        &ws,
        "util",
        "package: util\ndeps: [core]\nscripts: [build.sh]\n",
        &[("build.sh", append("util").as_str())],
    );
    add_package(
        &ws,
        "app",
        "package: app\ndeps: [core, util]\nscripts: [build.sh, test.sh]\n",
        &[("build.sh", append("app-build").as_str()), ("test.sh", append("app-test").as_str())],
    );

    let report = with_timeout(run(args(&ws, 2))).await?.expect("a run report");

    assert_eq!(report.completed, vec!["core", "util", "app"]);
    let order = fs::read_to_string(&log)?;
    assert_eq!(order.lines().collect::<Vec<_>>(), vec!["core", "util", "app-build", "app-test"]);
    Ok(())
}

#[tokio::test]
async fn failing_script_fails_the_run_and_skips_dependents() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let ws = dir.path().join("ws");
    let log = order_log(&dir);

    add_package(
        &ws,
        "core",
        "package: core\nscripts: [ok.sh, bad.sh, never.sh]\n",
        &[
            ("ok.sh", format!("echo ok >> {}\n", log.display()).as_str()),
            ("bad.sh", "echo broken >&2\nexit 3\n"),
            ("never.sh", format!("echo never >> {}\n", log.display()).as_str()),
        ],
    );
    add_package(
        &ws,
        "app",
        "package: app\ndeps: [core]\nscripts: [build.sh]\n",
        &[("build.sh", format!("echo app >> {}\n", log.display()).as_str())],
    );

    match with_timeout(run(args(&ws, 2))).await {
        Err(PaverError::TaskFailed { task, reason }) => {
            assert!(task.contains("core"));
            assert!(reason.contains("bad.sh"));
            assert!(reason.contains("broken"));
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }

    assert_eq!(fs::read_to_string(&log)?, "ok\n");
    Ok(())
}

#[tokio::test]
async fn script_failure_carries_completed_outputs() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let pkg = dir.path().join("core");
    fs::create_dir_all(&pkg)?;
    fs::write(pkg.join("first.sh"), "echo first\n")?;
    fs::write(pkg.join("second.sh"), "exit 7\n")?;

    let mut manifest = Manifest {
        name: "core".to_string(),
        deps: vec![],
        scripts: vec!["first.sh".into(), "second.sh".into()],
    };
    manifest.resolve_scripts(&pkg);

    let err = with_timeout(manifest.run_scripts()).await.unwrap_err();
    let failure = err.downcast_ref::<ScriptFailure>().expect("a ScriptFailure");

    assert_eq!(failure.exit_code, Some(7));
    assert_eq!(failure.completed.len(), 1);
    assert_eq!(failure.completed[0].stdout, "first\n");
    Ok(())
}

#[tokio::test]
async fn dependency_cycle_is_rejected() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    add_package(dir.path(), "a", "package: a\ndeps: [b]\n", &[]);
    add_package(dir.path(), "b", "package: b\ndeps: [a]\n", &[]);

    let result = with_timeout(run(args(dir.path(), 2))).await;
    assert!(matches!(result, Err(PaverError::DagCycle(_))));
    Ok(())
}

#[tokio::test]
async fn zero_workers_is_a_config_error() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    add_package(dir.path(), "a", "package: a\n", &[]);

    let result = with_timeout(run(args(dir.path(), 0))).await;
    assert!(matches!(result, Err(PaverError::ConfigError(_))));
    Ok(())
}

#[tokio::test]
async fn missing_workspace_is_a_config_error() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let result = with_timeout(run(args(&dir.path().join("nope"), 2))).await;
    assert!(matches!(result, Err(PaverError::ConfigError(_))));
    Ok(())
}

#[tokio::test]
async fn dry_run_executes_nothing() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let ws = dir.path().join("ws");
    let log = order_log(&dir);
    add_package(
        &ws,
        "core",
        "package: core\nscripts: [build.sh]\n",
        &[("build.sh", format!("echo core >> {}\n", log.display()).as_str())],
    );

    let mut dry = args(&ws, 2);
    dry.dry_run = true;

    let report = with_timeout(run(dry)).await?;
    assert!(report.is_none());
    assert!(!log.exists());
    Ok(())
}
