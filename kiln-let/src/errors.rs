//  ERRORS.rs
//    by the kiln authors
//
//  Created:
//    09 Mar 2026, 14:02:11
//  Last edited:
//    11 Oct 2026, 10:37:29
//  Auto updated?
//    Yes
//
//  Description:
//!   Collects errors for the kilnlet driver.
//

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};
use std::path::PathBuf;

use kiln_shr::fs::FsError;
use specifications::build::BuildSpecError;

use crate::stages::Stage;


/***** TESTS *****/





/***** ERRORS *****/
/// Generic, top-level errors for the kilnlet executable.
#[derive(Debug)]
pub enum LetError {
    /// Could not load the BuildSpec handed to us.
    BuildFileError{ path: PathBuf, err: BuildSpecError },
    /// Could not resolve the work directory.
    WorkdirError{ path: PathBuf, err: std::io::Error },
    /// One of the stages failed.
    PipelineError{ err: StageError },
}

impl LetError {
    /// Returns the process exit code that represents this error.
    #[inline]
    pub fn exit_code(&self) -> i32 {
        match self {
            LetError::PipelineError{ err } => err.exit_code(),
            _                              => 1,
        }
    }
}

impl Display for LetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use LetError::*;
        match self {
            BuildFileError{ path, err } => write!(f, "Could not load build file '{}': {}", path.display(), err),
            WorkdirError{ path, err }   => write!(f, "Could not enter work directory '{}': {}", path.display(), err),
            PipelineError{ err }        => write!(f, "{}: {}", err.stage(), err),
        }
    }
}

impl Error for LetError {}



/// Describes what went wrong in a single step of a stage.
#[derive(Debug)]
pub enum StepError {
    /// Could not launch an external tool.
    LaunchError{ command: String, err: std::io::Error },
    /// An external tool returned a non-zero exit code (or was killed, if there is no code).
    ToolFailed{ command: String, code: Option<i32> },
    /// A path that should exist after a step does not.
    MissingPath{ path: PathBuf },
    /// Could not open a file for appending.
    FileOpenError{ path: PathBuf, err: std::io::Error },
    /// Could not write to a file.
    FileWriteError{ path: PathBuf, err: std::io::Error },
    /// Could not create a directory.
    DirCreateError{ path: PathBuf, err: std::io::Error },
    /// Could not copy a file or directory.
    CopyError{ err: FsError },
}

impl Display for StepError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use StepError::*;
        match self {
            LaunchError{ command, err }    => write!(f, "Could not run '{}': {}", command, err),
            ToolFailed{ command, code }    => match code {
                Some(code) => write!(f, "Command '{}' returned non-zero exit code {}", command, code),
                None       => write!(f, "Command '{}' was terminated by a signal", command),
            },
            MissingPath{ path }            => write!(f, "Expected '{}' to exist, but it does not", path.display()),
            FileOpenError{ path, err }     => write!(f, "Could not open file '{}': {}", path.display(), err),
            FileWriteError{ path, err }    => write!(f, "Could not write to file '{}': {}", path.display(), err),
            DirCreateError{ path, err }    => write!(f, "Could not create directory '{}': {}", path.display(), err),
            CopyError{ err }               => write!(f, "{}", err),
        }
    }
}

impl Error for StepError {}



/// Collects the ways in which the pipeline stages may fail. Every variant belongs to exactly one Stage.
#[derive(Debug)]
pub enum StageError {
    /// Could not download (or verify) the source archive.
    FetchFailed{ url: String, err: FetchError },
    /// Could not unpack the source archive.
    UnpackFailed{ archive: PathBuf, err: StepError },
    /// Could not apply one of the patches. `index` is zero-based.
    PatchFailed{ index: usize, patch: String, err: StepError },
    /// Could not configure the source tree.
    ConfigureFailed{ err: StepError },
    /// The compile (or a post-build tool) failed. `code` is forwarded as our own exit code.
    CompileFailed{ code: i32, err: StepError },
    /// Could not place an output in the result directory.
    ExportFailed{ output: String, err: StepError },
}

impl StageError {
    /// Returns the stage this error occurred in.
    pub fn stage(&self) -> Stage {
        use StageError::*;
        match self {
            FetchFailed{ .. }     => Stage::Fetch,
            UnpackFailed{ .. }    => Stage::Unpack,
            PatchFailed{ .. }     => Stage::Patch,
            ConfigureFailed{ .. } => Stage::Configure,
            CompileFailed{ .. }   => Stage::Compile,
            ExportFailed{ .. }    => Stage::Export,
        }
    }

    /// Returns the process exit code that represents this error.
    #[inline]
    pub fn exit_code(&self) -> i32 {
        match self {
            StageError::CompileFailed{ code, .. } => *code,
            _                                     => 1,
        }
    }
}

impl Display for StageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use StageError::*;
        match self {
            FetchFailed{ url, err }            => write!(f, "Could not fetch '{}': {}", url, err),
            UnpackFailed{ archive, err }       => write!(f, "Could not unpack '{}': {}", archive.display(), err),
            PatchFailed{ index, patch, err }   => write!(f, "Could not apply patch #{} '{}': {}", index + 1, patch, err),
            ConfigureFailed{ err }             => write!(f, "Could not configure source tree: {}", err),
            CompileFailed{ err, .. }           => write!(f, "Could not compile source tree: {}", err),
            ExportFailed{ output, err }        => write!(f, "Could not export output '{}': {}", output, err),
        }
    }
}

impl Error for StageError {}



/// Errors that occur while downloading the source archive.
#[derive(Debug)]
pub enum FetchError {
    /// Could not send the request.
    RequestError{ err: reqwest::Error },
    /// The server answered with something other than 200 OK.
    StatusError{ status: reqwest::StatusCode },
    /// The connection broke mid-download.
    DownloadError{ err: reqwest::Error },
    /// Could not create the target file.
    FileCreateError{ path: PathBuf, err: std::io::Error },
    /// Could not write a chunk to the target file.
    FileWriteError{ path: PathBuf, err: std::io::Error },
    /// Could not read the downloaded file back for hashing.
    FileReadError{ path: PathBuf, err: std::io::Error },
    /// The archive does not have the pinned digest.
    ChecksumMismatch{ expected: String, got: String },
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use FetchError::*;
        match self {
            RequestError{ err }            => write!(f, "Could not send request: {}", err),
            StatusError{ status }          => write!(f, "Server responded with {} (expected {})", status, reqwest::StatusCode::OK),
            DownloadError{ err }           => write!(f, "Could not download response body: {}", err),
            FileCreateError{ path, err }   => write!(f, "Could not create file '{}': {}", path.display(), err),
            FileWriteError{ path, err }    => write!(f, "Could not write to file '{}': {}", path.display(), err),
            FileReadError{ path, err }     => write!(f, "Could not read file '{}': {}", path.display(), err),
            ChecksumMismatch{ expected, got } => write!(f, "Checksum mismatch: expected sha256 '{}', got '{}'", expected, got),
        }
    }
}

impl Error for FetchError {}
