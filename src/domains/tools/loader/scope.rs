//! Scoped search path used while a manifest is being imported.
//!
//! A manifest may refer to helper programs next to it. Its directory is
//! pushed onto the search path only for the duration of its own import and
//! popped when the guard drops, whether the import succeeded or not, so one
//! unit's local references never resolve against another unit's directory.

use std::path::{Component, Path, PathBuf};

/// Ordered list of directories used to resolve relative references.
#[derive(Debug, Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `dir` resolvable until the returned guard is dropped.
    ///
    /// If the directory is already on the path nothing is pushed and nothing
    /// will be popped.
    pub fn scope(&mut self, dir: &Path) -> ImportScope<'_> {
        let pushed = if self.dirs.iter().any(|d| d == dir) {
            false
        } else {
            self.dirs.insert(0, dir.to_path_buf());
            true
        };
        ImportScope {
            path: self,
            dir: dir.to_path_buf(),
            pushed,
        }
    }

    /// Directories currently on the path, most recent first.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Resolve a relative reference against the path.
    ///
    /// Absolute references are returned as-is if they exist.
    pub fn resolve(&self, reference: &Path) -> Option<PathBuf> {
        if reference.is_absolute() {
            return reference.exists().then(|| reference.to_path_buf());
        }
        self.dirs
            .iter()
            .map(|dir| dir.join(reference))
            .find(|candidate| candidate.exists())
    }
}

/// Guard returned by [`SearchPath::scope`].
#[derive(Debug)]
pub struct ImportScope<'a> {
    path: &'a mut SearchPath,
    dir: PathBuf,
    pushed: bool,
}

impl ImportScope<'_> {
    /// The directory this scope made resolvable.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a program reference from a manifest.
    ///
    /// Returns `Ok(None)` for bare names (`python3`, `curl`), which are left
    /// to `PATH` lookup at spawn time. Local references (`./run.sh`,
    /// `bin/tool`) must exist on the search path.
    pub fn resolve_program(&self, program: &str) -> Result<Option<PathBuf>, String> {
        let reference = Path::new(program);
        if !is_local_reference(reference) {
            return Ok(None);
        }
        self.path
            .resolve(reference)
            .map(Some)
            .ok_or_else(|| format!("cannot resolve '{}' from {}", program, self.dir.display()))
    }
}

impl Drop for ImportScope<'_> {
    fn drop(&mut self) {
        if !self.pushed {
            return;
        }
        if let Some(pos) = self.path.dirs.iter().position(|d| d == &self.dir) {
            self.path.dirs.remove(pos);
        }
    }
}

fn is_local_reference(reference: &Path) -> bool {
    reference.is_absolute()
        || reference.components().count() > 1
        || matches!(
            reference.components().next(),
            Some(Component::CurDir | Component::ParentDir)
        )
}
