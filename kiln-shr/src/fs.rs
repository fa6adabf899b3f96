//  FS.rs
//    by the kiln authors
//
//  Created:
//    03 Mar 2026, 09:41:37
//  Last edited:
//    02 Sep 2026, 10:18:55
//  Auto updated?
//    Yes
//
//  Description:
//!   Filesystem helpers shared by the host and the container side. All
//!   copies preserve the permission bits of what they copy, since the
//!   artifacts (and the driver executable) must keep their mode.
//

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};
use std::fs::{self, Metadata, Permissions};
use std::path::{Path, PathBuf};

use fs_extra::dir::CopyOptions;
use log::debug;


/***** TESTS *****/





/***** ERRORS *****/
/// Defines errors that may occur while copying files around.
#[derive(Debug)]
pub enum FsError {
    /// The source of a copy does not exist.
    SourceNotFound{ path: PathBuf },
    /// Failed to read the metadata of the source.
    MetadataError{ path: PathBuf, err: std::io::Error },
    /// Failed to create the parent directory of a destination.
    DirCreateError{ path: PathBuf, err: std::io::Error },
    /// Failed to copy a file.
    FileCopyError{ source: PathBuf, target: PathBuf, err: std::io::Error },
    /// Failed to set the permissions of a copied file.
    PermissionsError{ path: PathBuf, err: std::io::Error },
    /// Failed to remove a previous version of a destination directory.
    DirRemoveError{ path: PathBuf, err: std::io::Error },
    /// Failed to copy a directory.
    DirCopyError{ source: PathBuf, target: PathBuf, err: fs_extra::error::Error },
}

impl Display for FsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use FsError::*;
        match self {
            SourceNotFound{ path }              => write!(f, "Source '{}' does not exist", path.display()),
            MetadataError{ path, err }          => write!(f, "Could not read metadata of '{}': {}", path.display(), err),
            DirCreateError{ path, err }         => write!(f, "Could not create directory '{}': {}", path.display(), err),
            FileCopyError{ source, target, err } => write!(f, "Could not copy file '{}' to '{}': {}", source.display(), target.display(), err),
            PermissionsError{ path, err }       => write!(f, "Could not set permissions of '{}': {}", path.display(), err),
            DirRemoveError{ path, err }         => write!(f, "Could not remove existing directory '{}': {}", path.display(), err),
            DirCopyError{ source, target, err } => write!(f, "Could not copy directory '{}' to '{}': {}", source.display(), target.display(), err),
        }
    }
}

impl Error for FsError {}





/***** LIBRARY *****/
/// Copies a single file, preserving its permission bits. The destination is overwritten if it exists.
///
/// # Arguments
/// - `source`: The file to copy.
/// - `target`: The path to copy it to. Its parent directory is created if needed.
///
/// # Errors
/// This function errors if the source does not exist or any of the filesystem operations fail.
pub fn copy_file(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<(), FsError> {
    let source : &Path = source.as_ref();
    let target : &Path = target.as_ref();
    debug!("Copying file '{}' to '{}'...", source.display(), target.display());

    let meta: Metadata = match fs::metadata(source) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => { return Err(FsError::SourceNotFound{ path: source.into() }); },
        Err(err) => { return Err(FsError::MetadataError{ path: source.into(), err }); },
    };

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(err) = fs::create_dir_all(parent) { return Err(FsError::DirCreateError{ path: parent.into(), err }); }
        }
    }

    if let Err(err) = fs::copy(source, target) {
        return Err(FsError::FileCopyError{ source: source.into(), target: target.into(), err });
    }
    let perms: Permissions = meta.permissions();
    if let Err(err) = fs::set_permissions(target, perms) {
        return Err(FsError::PermissionsError{ path: target.into(), err });
    }

    Ok(())
}



/// Copies a file or a whole directory tree, preserving file permission bits. An existing destination directory is replaced.
///
/// # Arguments
/// - `source`: The file or directory to copy.
/// - `target`: The path the file or directory should end up at (not its parent).
///
/// # Errors
/// This function errors if the source does not exist or any of the filesystem operations fail.
pub fn copy_path(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<(), FsError> {
    let source : &Path = source.as_ref();
    let target : &Path = target.as_ref();
    if !source.is_dir() { return copy_file(source, target); }
    debug!("Copying directory '{}' to '{}'...", source.display(), target.display());

    if target.is_dir() {
        if let Err(err) = fs::remove_dir_all(target) { return Err(FsError::DirRemoveError{ path: target.into(), err }); }
    }
    if let Err(err) = fs::create_dir_all(target) { return Err(FsError::DirCreateError{ path: target.into(), err }); }

    let mut options: CopyOptions = CopyOptions::new();
    options.content_only = true;
    options.overwrite    = true;
    match fs_extra::dir::copy(source, target, &options) {
        Ok(_)    => Ok(()),
        Err(err) => Err(FsError::DirCopyError{ source: source.into(), target: target.into(), err }),
    }
}



/// Returns whether the given path is a non-empty file or a directory with at least one entry.
pub fn is_nonempty(path: impl AsRef<Path>) -> bool {
    let path: &Path = path.as_ref();
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => fs::read_dir(path).map(|mut entries| entries.next().is_some()).unwrap_or(false),
        Ok(meta)                  => meta.len() > 0,
        Err(_)                    => false,
    }
}
