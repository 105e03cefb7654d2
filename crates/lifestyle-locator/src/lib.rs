//! Locates model artifacts anywhere under a project tree and copies them into
//! the directory the server loads from.
//!
//! ```rust,ignore
//! use lifestyle_locator::Locator;
//!
//! let report = Locator::new("/srv/project").run()?;
//! println!("copied {} files", report.copied());
//! ```
//!
//! Sources are copied, never moved, and the destination directory is never
//! scanned, so running twice just overwrites the same files.

use std::fs;
use std::path::{Path, PathBuf};

use lifestyle_config::ARTIFACT_FILES;
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the destination directory under the scan root.
pub const MODELS_DIR: &str = "models";

/// Errors raised while scanning or copying.
#[derive(Error, Debug)]
pub enum LocateError {
    /// A filesystem operation failed.
    #[error("{op} '{path}': {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl LocateError {
    fn io(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io { op, path: path.display().to_string(), source }
    }
}

/// Result of copying one matched file.
#[derive(Debug)]
pub enum CopyOutcome {
    Copied { name: String, source: PathBuf },
    Failed { name: String, source: PathBuf, error: LocateError },
}

/// Summary of one locator run.
#[derive(Debug, Default)]
pub struct LocateReport {
    /// `true` when the destination directory had to be created.
    pub created_dest: bool,
    pub outcomes: Vec<CopyOutcome>,
}

impl LocateReport {
    /// Number of files successfully copied.
    pub fn copied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CopyOutcome::Copied { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.copied()
    }
}

/// Scans a root directory for artifact files.
#[derive(Debug, Clone)]
pub struct Locator {
    root: PathBuf,
    dest: PathBuf,
    names: Vec<String>,
}

impl Locator {
    /// Looks for the three service artifacts and copies them into `<root>/models`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            dest: root.join(MODELS_DIR),
            root,
            names: ARTIFACT_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Overrides the file names to look for.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Creates the destination if needed, then walks the tree copying matches.
    ///
    /// Only failing to create the destination or to read the root aborts the
    /// run; per-file copy failures are recorded in the report.
    pub fn run(&self) -> Result<LocateReport, LocateError> {
        let mut report = LocateReport::default();

        if !self.dest.is_dir() {
            fs::create_dir_all(&self.dest)
                .map_err(|e| LocateError::io("Failed to create", &self.dest, e))?;
            report.created_dest = true;
        }

        let dest = fs::canonicalize(&self.dest)
            .map_err(|e| LocateError::io("Failed to resolve", &self.dest, e))?;
        let entries = read_dir_sorted(&self.root)?;
        self.visit(entries, &dest, &mut report);

        Ok(report)
    }

    fn visit(&self, entries: Vec<fs::DirEntry>, dest: &Path, report: &mut LocateReport) {
        for entry in entries {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                if fs::canonicalize(&path).is_ok_and(|p| p == dest) {
                    debug!("Skipping destination directory {}", path.display());
                    continue;
                }
                match read_dir_sorted(&path) {
                    Ok(children) => self.visit(children, dest, report),
                    Err(e) => warn!("{}", e),
                }
                continue;
            }

            // Symlinked files count, symlinked directories are not followed.
            let is_file = file_type.is_file() || (file_type.is_symlink() && path.is_file());
            if !is_file {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if self.names.iter().any(|n| *n == name) {
                report.outcomes.push(self.copy(name, path));
            }
        }
    }

    fn copy(&self, name: String, source: PathBuf) -> CopyOutcome {
        let target = self.dest.join(&name);
        match fs::copy(&source, &target) {
            Ok(_) => CopyOutcome::Copied { name, source },
            Err(e) => CopyOutcome::Failed {
                error: LocateError::io("Failed to copy", &source, e),
                name,
                source,
            },
        }
    }
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<fs::DirEntry>, LocateError> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|e| LocateError::io("Failed to read", dir, e))?
        .flatten()
        .collect();
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn seed(root: &Path) {
        touch(&root.join("training/exports/xgb_model.json"), "model");
        touch(&root.join("training/exports/meta/selected_features.json"), "[\"bmi\"]");
        touch(&root.join("notebooks/best_threshold.json"), "0.4");
        touch(&root.join("notebooks/unrelated.json"), "{}");
    }

    #[test]
    fn copies_all_artifacts_from_any_depth() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());

        let report = Locator::new(dir.path()).run().unwrap();

        assert!(report.created_dest);
        assert_eq!(report.copied(), 3);
        assert_eq!(report.failed(), 0);

        let models = dir.path().join(MODELS_DIR);
        assert_eq!(fs::read_to_string(models.join("xgb_model.json")).unwrap(), "model");
        assert_eq!(fs::read_to_string(models.join("best_threshold.json")).unwrap(), "0.4");
        assert!(models.join("selected_features.json").is_file());
        assert!(!models.join("unrelated.json").exists());
    }

    #[test]
    fn sources_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());

        Locator::new(dir.path()).run().unwrap();

        assert!(dir.path().join("training/exports/xgb_model.json").is_file());
        assert!(dir.path().join("notebooks/best_threshold.json").is_file());
    }

    #[test]
    fn second_run_overwrites_without_rescanning_models() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let locator = Locator::new(dir.path());

        locator.run().unwrap();
        touch(&dir.path().join("training/exports/xgb_model.json"), "retrained");
        let report = locator.run().unwrap();

        assert!(!report.created_dest);
        assert_eq!(report.copied(), 3);
        let sources: Vec<_> = report
            .outcomes
            .iter()
            .filter_map(|o| match o {
                CopyOutcome::Copied { source, .. } => Some(source.clone()),
                CopyOutcome::Failed { .. } => None,
            })
            .collect();
        assert!(sources.iter().all(|s| !s.starts_with(locator.dest())));

        let copied = fs::read_to_string(locator.dest().join("xgb_model.json")).unwrap();
        assert_eq!(copied, "retrained");
    }

    #[test]
    fn failed_copy_is_reported_and_scan_continues() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        // A directory where the model file should go makes that one copy fail.
        fs::create_dir_all(dir.path().join("models/xgb_model.json")).unwrap();

        let report = Locator::new(dir.path())
            .with_names(["xgb_model.json", "best_threshold.json"])
            .run()
            .unwrap();

        assert_eq!(report.copied(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.outcomes.iter().any(|o| matches!(
            o,
            CopyOutcome::Failed { name, error: LocateError::Io { op: "Failed to copy", .. }, .. }
                if name == "xgb_model.json"
        )));
        let threshold = fs::read_to_string(dir.path().join("models/best_threshold.json")).unwrap();
        assert_eq!(threshold, "0.4");
    }

    #[test]
    fn empty_tree_reports_nothing_copied() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("README.md"), "nothing here");

        let report = Locator::new(dir.path()).run().unwrap();

        assert_eq!(report.copied(), 0);
        assert!(report.outcomes.is_empty());
        assert!(dir.path().join(MODELS_DIR).is_dir());
    }

    #[test]
    fn custom_names() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());

        let report = Locator::new(dir.path()).with_names(["unrelated.json"]).run().unwrap();

        assert_eq!(report.copied(), 1);
        assert!(dir.path().join("models/unrelated.json").is_file());
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("does-not-exist");
        let locator = Locator::new(&root);
        // Destination creation makes the root exist, so point it elsewhere.
        let err = Locator { dest: dir.path().join("out"), ..locator }.run().unwrap_err();
        assert!(matches!(err, LocateError::Io { op: "Failed to read", .. }));
    }
}
