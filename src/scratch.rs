// Scratch space for the downloaded image. Only what the run created is
// removed afterwards; a directory that was already there is left in place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scratch directory holding the downloaded image between fetch and upload.
///
/// Cleanup happens exactly once: by `remove`, or on drop if `remove` was
/// never reached. A directory this guard created is deleted recursively; a
/// pre-existing one only loses the scratch file.
#[derive(Debug)]
pub struct ScratchDir {
    dir: PathBuf,
    file: PathBuf,
    owns_dir: bool,
    removed: bool,
}

impl ScratchDir {
    /// Create `dir` (and parents) if needed. An existing directory is reused.
    pub fn create(dir: impl Into<PathBuf>, file_name: &str) -> io::Result<Self> {
        let dir = dir.into();
        let owns_dir = !dir.is_dir();
        fs::create_dir_all(&dir)?;
        let file = dir.join(file_name);
        debug!(path = %file.display(), owns_dir, "scratch directory ready");
        Ok(ScratchDir {
            dir,
            file,
            owns_dir,
            removed: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self) -> &Path {
        &self.file
    }

    /// Clean up now. Anything already gone counts as success.
    pub fn remove(mut self) -> io::Result<()> {
        self.removed = true;
        self.cleanup()
    }

    fn cleanup(&self) -> io::Result<()> {
        let result = if self.owns_dir {
            fs::remove_dir_all(&self.dir)
        } else {
            fs::remove_file(&self.file)
        };
        match result {
            Ok(()) => {
                debug!(dir = %self.dir.display(), "scratch cleaned up");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Err(e) = self.cleanup() {
            warn!(dir = %self.dir.display(), error = %e, "failed to clean up scratch space");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_deletes_created_directory_and_contents() {
        let base = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create(base.path().join("images"), "comic.png").unwrap();
        fs::write(scratch.file_path(), b"PNG").unwrap();
        let dir = scratch.dir().to_path_buf();
        assert!(dir.is_dir());

        scratch.remove().unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn drop_cleans_up_when_remove_is_skipped() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("nested").join("images");
        {
            let scratch = ScratchDir::create(&dir, "comic.png").unwrap();
            fs::write(scratch.file_path(), b"PNG").unwrap();
        }
        assert!(!dir.exists());
    }

    #[test]
    fn existing_directory_keeps_unrelated_files() {
        let base = tempfile::tempdir().unwrap();
        let keep = base.path().join("important.txt");
        fs::write(&keep, b"user data").unwrap();

        let scratch = ScratchDir::create(base.path(), "comic.png").unwrap();
        fs::write(scratch.file_path(), b"PNG").unwrap();
        let file = scratch.file_path().to_path_buf();
        scratch.remove().unwrap();

        assert!(base.path().is_dir());
        assert_eq!(fs::read(&keep).unwrap(), b"user data");
        assert!(!file.exists());
    }

    #[test]
    fn missing_scratch_file_is_fine_to_remove() {
        let base = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create(base.path(), "comic.png").unwrap();
        assert!(scratch.remove().is_ok());

        let scratch = ScratchDir::create(base.path().join("images"), "comic.png").unwrap();
        fs::remove_dir_all(scratch.dir()).unwrap();
        assert!(scratch.remove().is_ok());
    }
}
