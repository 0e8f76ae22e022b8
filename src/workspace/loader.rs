// src/workspace/loader.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dag::NodeStatusTracker;
use crate::errors::{PaverError, Result};
use crate::fs::FileSystem;
use crate::workspace::manifest::{DependencyEdge, Manifest, ManifestFormat};

/// Manifest file names looked up in each package directory, in priority order.
pub const MANIFEST_FILE_NAMES: [&str; 3] = ["manifest.yaml", "manifest.yml", "manifest.toml"];

/// Packages and dependency edges discovered in a workspace directory.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub root: PathBuf,
    pub packages: Vec<Manifest>,
    pub edges: Vec<DependencyEdge>,
}

impl Workspace {
    /// Load the packages into a fresh status tracker.
    ///
    /// Unknown dependency names and duplicate package names are rejected
    /// here; cycles are left to `validate`.
    pub fn into_tracker(self) -> Result<NodeStatusTracker<Manifest>> {
        let mut tracker = NodeStatusTracker::new();
        tracker.load(self.packages, self.edges)?;
        Ok(tracker)
    }
}

/// Scan `root`: every immediate subdirectory is a package holding one
/// manifest. Other entries are ignored. Directories are visited in sorted
/// order so results are deterministic.
pub fn load_workspace(fs: &dyn FileSystem, root: &Path) -> Result<Workspace> {
    let mut entries = fs.read_dir(root).map_err(|err| {
        PaverError::ConfigError(format!("cannot read workspace directory {root:?}: {err:#}"))
    })?;
    entries.sort();

    let mut workspace = Workspace {
        root: root.to_path_buf(),
        ..Workspace::default()
    };

    for dir in entries.into_iter().filter(|p| fs.is_dir(p)) {
        let manifest = load_package(fs, &dir)?;
        debug!(
            package = %manifest.name,
            deps = ?manifest.deps,
            scripts = manifest.scripts.len(),
            "loaded package manifest"
        );

        workspace.edges.extend(manifest.dependency_edges());
        workspace.packages.push(manifest);
    }

    if workspace.packages.is_empty() {
        return Err(PaverError::ConfigError(format!(
            "workspace {root:?} contains no packages"
        )));
    }

    info!(
        root = ?root,
        packages = workspace.packages.len(),
        edges = workspace.edges.len(),
        "workspace loaded"
    );
    Ok(workspace)
}

/// Read and parse the manifest in `dir`, resolving its script paths.
pub fn load_package(fs: &dyn FileSystem, dir: &Path) -> Result<Manifest> {
    let path = find_manifest(fs, dir).ok_or_else(|| PaverError::ManifestError {
        path: dir.to_path_buf(),
        message: format!("no manifest found (expected one of {MANIFEST_FILE_NAMES:?})"),
    })?;

    let contents = fs.read_to_string(&path).map_err(|err| PaverError::ManifestError {
        path: path.clone(),
        message: format!("{err:#}"),
    })?;

    let format = ManifestFormat::from_path(&path).unwrap_or(ManifestFormat::Yaml);
    let mut manifest = Manifest::parse(&contents, format).map_err(|err| PaverError::ManifestError {
        path: path.clone(),
        message: err.to_string(),
    })?;

    if manifest.name.trim().is_empty() {
        return Err(PaverError::ManifestError {
            path,
            message: "`package` must not be empty".to_string(),
        });
    }

    manifest.resolve_scripts(dir);
    Ok(manifest)
}

fn find_manifest(fs: &dyn FileSystem, dir: &Path) -> Option<PathBuf> {
    MANIFEST_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| fs.is_file(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn sample_fs() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("ws/core/manifest.yaml", "package: core\nscripts: [build.sh]\n");
        fs.add_file("ws/core/build.sh", "echo core\n");
        fs.add_file(
            "ws/app/manifest.yaml",
            "package: app\ndeps: [core, util]\nscripts: [build.sh, test.sh]\n",
        );
        fs.add_file("ws/util/manifest.toml", "package = \"util\"\n");
        fs.add_file("ws/README.md", "not a package");
        fs
    }

    #[test]
    fn loads_packages_in_sorted_order() {
        let ws = load_workspace(&sample_fs(), Path::new("ws")).unwrap();

        let names: Vec<_> = ws.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["app", "core", "util"]);

        let app = &ws.packages[0];
        assert_eq!(
            app.scripts,
            vec![PathBuf::from("ws/app/build.sh"), PathBuf::from("ws/app/test.sh")]
        );

        let edges: Vec<_> = ws
            .edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        assert_eq!(edges, vec![("core", "app"), ("util", "app")]);
    }

    #[test]
    fn workspace_becomes_tracker_with_roots_pending() {
        let tracker = load_workspace(&sample_fs(), Path::new("ws"))
            .unwrap()
            .into_tracker()
            .unwrap();

        assert_eq!(tracker.total_nodes(), 3);
        assert_eq!(tracker.graph().roots(), &["core".to_string(), "util".to_string()]);
        assert_eq!(tracker.counts().pending, 2);
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let fs = sample_fs();
        fs.add_dir("ws/empty");

        match load_workspace(&fs, Path::new("ws")) {
            Err(PaverError::ManifestError { path, message }) => {
                assert_eq!(path, PathBuf::from("ws/empty"));
                assert!(message.contains("no manifest"));
            }
            other => panic!("expected ManifestError, got {other:?}"),
        }
    }

    #[test]
    fn malformed_manifest_names_the_file() {
        let fs = MockFileSystem::new();
        fs.add_file("ws/bad/manifest.yaml", "package: [oops");

        match load_workspace(&fs, Path::new("ws")) {
            Err(PaverError::ManifestError { path, .. }) => {
                assert_eq!(path, PathBuf::from("ws/bad/manifest.yaml"));
            }
            other => panic!("expected ManifestError, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_root_is_a_config_error() {
        let fs = MockFileSystem::new();
        assert!(matches!(
            load_workspace(&fs, Path::new("nowhere")),
            Err(PaverError::ConfigError(_))
        ));
    }

    #[test]
    fn empty_workspace_is_rejected() {
        let fs = MockFileSystem::new();
        fs.add_dir("ws");
        assert!(matches!(
            load_workspace(&fs, Path::new("ws")),
            Err(PaverError::ConfigError(_))
        ));
    }

    #[test]
    fn unknown_dependency_fails_at_load() {
        let fs = MockFileSystem::new();
        fs.add_file("ws/app/manifest.yaml", "package: app\ndeps: [ghost]\n");

        let err = load_workspace(&fs, Path::new("ws"))
            .unwrap()
            .into_tracker()
            .unwrap_err();
        match err {
            PaverError::UnknownNode(msg) => assert!(msg.contains("ghost")),
            other => panic!("expected UnknownNode, got {other:?}"),
        }
    }
}
