//! Transient raster bookkeeping.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};

use crate::error::{Result, SheetError};

/// Outcome of [`ArtifactStore::cleanup`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failures: Vec<PathBuf>,
}

/// Tracks every temporary file written during a run so none outlive it.
#[derive(Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
    owns_dir: bool,
    files: Vec<PathBuf>,
    cleaned: bool,
}

impl ArtifactStore {
    /// Use `work_dir` when given, otherwise a fresh hidden directory next to
    /// `output`.
    pub fn create(work_dir: Option<&Path>, output: &Path) -> Result<Self> {
        let dir = match work_dir {
            Some(dir) => dir.to_path_buf(),
            None => {
                let parent = output
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or(Path::new("."));
                parent.join(unique_name())
            }
        };
        let owns_dir = !dir.exists();
        fs::create_dir_all(&dir).map_err(|source| SheetError::io(&dir, source))?;
        debug!("Work directory {}", dir.display());
        Ok(Self {
            dir,
            owns_dir,
            files: Vec::new(),
            cleaned: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserve a path for `name` inside the work directory.
    pub fn register(&mut self, name: &str) -> PathBuf {
        let path = self.dir.join(name);
        self.files.push(path.clone());
        path
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Delete every registered file, then the directory if this store made it.
    pub fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        if self.cleaned {
            return report;
        }
        self.cleaned = true;

        for path in self.files.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Deleted temporary file {}", path.display());
                    report.removed += 1;
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!("Could not delete temporary file {}: {err}", path.display());
                    report.failures.push(path);
                }
            }
        }

        if self.owns_dir {
            if let Err(err) = fs::remove_dir(&self.dir) {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!("Could not delete work directory {}: {err}", self.dir.display());
                    report.failures.push(self.dir.clone());
                }
            }
        }
        report
    }
}

impl Drop for ArtifactStore {
    fn drop(&mut self) {
        if !self.cleaned {
            self.cleanup();
        }
    }
}

fn unique_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!(".cardsheet-{}-{nanos}", std::process::id())
}
