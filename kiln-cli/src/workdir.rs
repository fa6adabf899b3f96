//  WORKDIR.rs
//    by the kiln authors
//
//  Created:
//    17 Mar 2026, 10:12:55
//  Last edited:
//    02 Sep 2026, 16:48:21
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the WorkDir, the temporary directory that holds the build
//!   context and receives the outputs of one build.
//

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::errors::BuildError;


/***** TESTS *****/





/***** CONSTANTS *****/
/// The directory the WorkDir is created in. Some engines (and Docker Desktop) only allow bind mounts from certain places.
pub const WORKDIR_PARENT: &str = "/tmp";





/***** LIBRARY *****/
/// An exclusively owned temporary directory that is removed when dropped.
#[derive(Debug)]
pub struct WorkDir {
    /// The path to the directory.
    path : PathBuf,
    /// The handle that actually owns it. Only `None` while dropping.
    dir  : Option<TempDir>,
}

impl WorkDir {
    /// Creates a new, empty WorkDir under `/tmp`.
    ///
    /// # Errors
    /// This function errors if the directory could not be created.
    pub fn new() -> Result<Self, BuildError> {
        let dir: TempDir = match tempfile::Builder::new().prefix("kiln-").tempdir_in(WORKDIR_PARENT) {
            Ok(dir)  => dir,
            Err(err) => { return Err(BuildError::WorkDirCreateError{ err }); },
        };
        debug!("Created work directory '{}'", dir.path().display());

        Ok(Self {
            path : dir.path().into(),
            dir  : Some(dir),
        })
    }



    /// Returns the path of the directory.
    #[inline]
    pub fn path(&self) -> &Path { &self.path }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        debug!("Removing work directory '{}'", self.path.display());
        if let Some(dir) = self.dir.take() {
            if let Err(err) = dir.close() { warn!("Failed to remove work directory '{}': {}", self.path.display(), err); }
        }
    }
}
