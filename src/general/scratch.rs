use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::result::{DistResult, ScratchErr};

pub const SCRATCH_PREFIX: &str = "slicedist-";

/// Local staging directory owned by exactly one distribute call.
///
/// The directory name carries a random suffix and is created atomically, so
/// concurrent calls never share one. Call [`ScratchArea::release`] on every
/// exit path; dropping without release still removes the directory, silently.
#[derive(Debug)]
pub struct ScratchArea {
    dir: TempDir,
}

impl ScratchArea {
    pub fn acquire(root: impl AsRef<Path>) -> DistResult<Self> {
        let root = root.as_ref();
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(root)
            .map_err(|err| ScratchErr::Acquire {
                root: root.to_owned(),
                err,
            })?;
        tracing::debug!("acquired scratch area {:?}", dir.path());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Regular files directly under the scratch area, sorted by name.
    pub fn list_files(&self) -> DistResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(self.path()).min_depth(1).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Removes the directory and everything in it.
    pub fn release(self) -> Result<(), ScratchErr> {
        let path = self.dir.path().to_owned();
        match self.dir.close() {
            Ok(()) => {
                tracing::debug!("released scratch area {:?}", path);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("failed to release scratch area {:?}: {}", path, err);
                Err(ScratchErr::Release { path, err })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_acquire_and_release() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchArea::acquire(root.path()).unwrap();
        let path = scratch.path().to_owned();
        assert!(path.is_dir());
        assert!(path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with(SCRATCH_PREFIX));

        fs::write(path.join("a.slice"), b"a").unwrap();
        scratch.release().unwrap();
        assert!(!path.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_distinct_names() {
        let root = tempfile::tempdir().unwrap();
        let a = ScratchArea::acquire(root.path()).unwrap();
        let b = ScratchArea::acquire(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
        a.release().unwrap();
        assert!(b.path().is_dir());
        b.release().unwrap();
    }

    #[test]
    fn test_list_files_sorted_skips_dirs() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchArea::acquire(root.path()).unwrap();
        fs::write(scratch.path().join("b"), b"b").unwrap();
        fs::write(scratch.path().join("a"), b"a").unwrap();
        fs::create_dir(scratch.path().join("nested")).unwrap();
        fs::write(scratch.path().join("nested").join("c"), b"c").unwrap();

        let names: Vec<_> = scratch
            .list_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        scratch.release().unwrap();
    }

    #[test]
    fn test_release_failure_reported() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchArea::acquire(root.path()).unwrap();
        fs::remove_dir_all(scratch.path()).unwrap();
        assert!(matches!(
            scratch.release(),
            Err(ScratchErr::Release { .. })
        ));
    }

    #[test]
    fn test_acquire_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let err = ScratchArea::acquire(root.path().join("missing")).unwrap_err();
        assert!(matches!(
            err,
            crate::result::DistError::ScratchErr(ScratchErr::Acquire { .. })
        ));
    }

    #[test]
    fn test_drop_removes_dir() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let scratch = ScratchArea::acquire(root.path()).unwrap();
            scratch.path().to_owned()
        };
        assert!(!path.exists());
    }
}
