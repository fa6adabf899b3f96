//  UTILS.rs
//    by the kiln authors
//
//  Created:
//    18 Mar 2026, 09:33:40
//  Last edited:
//    13 Oct 2026, 15:02:11
//  Auto updated?
//    Yes
//
//  Description:
//!   Small helpers for finding the files that go into the build context.
//

use std::path::{Path, PathBuf};

use specifications::container::DRIVER_NAME;

use crate::errors::BuildError;


/***** TESTS *****/





/***** LIBRARY *****/
/// Collects the directories inputs are searched in, in order.
///
/// # Arguments
/// - `spec_dir`: The directory of the build file. Always searched first.
/// - `extra`: Directories given on the command line.
/// - `spec_paths`: The `search_paths` of the build file. Relative ones are relative to `spec_dir`.
///
/// # Returns
/// The list of directories to search.
pub fn search_dirs(spec_dir: &Path, extra: &[PathBuf], spec_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::with_capacity(1 + extra.len() + spec_paths.len());
    dirs.push(spec_dir.into());
    dirs.extend(extra.iter().cloned());
    dirs.extend(spec_paths.iter().map(|p| spec_dir.join(p)));
    dirs
}



/// Finds the first directory that contains a file with the given name.
///
/// # Errors
/// This function errors with `MissingInput` if none of the directories contain the file.
pub fn locate(name: &str, dirs: &[PathBuf]) -> Result<PathBuf, BuildError> {
    for dir in dirs {
        let path: PathBuf = dir.join(name);
        if path.is_file() {
            debug!("Found '{}' at '{}'", name, path.display());
            return Ok(path);
        }
    }
    Err(BuildError::MissingInput{ name: name.into(), searched: dirs.to_vec() })
}



/// Finds the driver executable to copy into the image.
///
/// # Arguments
/// - `driver`: If given, the path to use. Otherwise, we look next to our own executable and then on the PATH.
///
/// # Errors
/// This function errors with `MissingInput` if the driver could not be found.
pub fn locate_driver(driver: Option<&Path>) -> Result<PathBuf, BuildError> {
    if let Some(driver) = driver {
        if driver.is_file() { return Ok(driver.into()); }
        return Err(BuildError::MissingInput{ name: DRIVER_NAME.into(), searched: vec![ driver.into() ] });
    }

    let mut searched: Vec<PathBuf> = vec![];
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling: PathBuf = dir.join(DRIVER_NAME);
            if sibling.is_file() { return Ok(sibling); }
            searched.push(dir.into());
        }
    }
    match which::which(DRIVER_NAME) {
        Ok(path) => Ok(path),
        Err(_)   => {
            searched.push(PathBuf::from("$PATH"));
            Err(BuildError::MissingInput{ name: DRIVER_NAME.into(), searched })
        },
    }
}
