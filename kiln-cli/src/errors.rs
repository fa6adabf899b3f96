//  ERRORS.rs
//    by the kiln authors
//
//  Created:
//    16 Mar 2026, 09:50:12
//  Last edited:
//    13 Oct 2026, 14:22:37
//  Auto updated?
//    Yes
//
//  Description:
//!   Contains the errors of the `kiln` orchestrator.
//

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};
use std::path::PathBuf;

use kiln_shr::debug::PrettyListFormatter;
use kiln_shr::fs::FsError;
use specifications::build::BuildSpecError;


/***** TESTS *****/





/***** ERRORS *****/
/// Errors that relate to rendering the container recipe.
#[derive(Debug)]
pub enum RecipeError {
    /// Could not write to the recipe string.
    RecipeStrWriteError{ err: std::fmt::Error },
}

impl Display for RecipeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use RecipeError::*;
        match self {
            RecipeStrWriteError{ err } => write!(f, "Could not write to the recipe string: {}", err),
        }
    }
}

impl Error for RecipeError {}



/// Errors that relate to a single orchestrated build.
#[derive(Debug)]
pub enum BuildError {
    /// Could not resolve the build file's directory.
    BuildFileCanonicalizeError{ path: PathBuf, err: std::io::Error },
    /// Could not load the build file.
    BuildFileError{ path: PathBuf, err: BuildSpecError },

    /// None of the candidate engines could be found.
    EngineNotFound{ candidates: Vec<String> },
    /// The engine the user asked for could not be found.
    EngineOverrideNotFound{ engine: String, err: which::Error },
    /// Could not resolve the engine executable to its canonical path.
    EngineCanonicalizeError{ path: PathBuf, err: std::io::Error },

    /// Could not create the work directory.
    WorkDirCreateError{ err: std::io::Error },
    /// An input file was not found in any of the search locations.
    MissingInput{ name: String, searched: Vec<PathBuf> },
    /// Could not copy an input file into the work directory.
    InputCopyError{ name: String, err: FsError },
    /// Could not write the build file into the work directory.
    BuildFileWriteError{ err: BuildSpecError },
    /// Could not render the recipe.
    RecipeRenderError{ err: RecipeError },
    /// Could not write the recipe into the work directory.
    RecipeWriteError{ path: PathBuf, err: std::io::Error },

    /// Could not launch the container engine.
    EngineLaunchError{ command: String, err: std::io::Error },
    /// The engine failed to build the image.
    ImageBuildFailed{ command: String, code: i32 },
    /// The container failed (or the engine failed to run it).
    ContainerRunFailed{ command: String, code: i32 },

    /// A declared output is missing or empty after the container exited.
    ArtifactMissing{ name: String, path: PathBuf },
    /// Could not copy an output to its destination.
    ArtifactCopyError{ name: String, err: FsError },

    /// The run was interrupted.
    Cancelled,
}

impl BuildError {
    /// Returns a short label for the part of the run this error occurred in.
    pub fn stage(&self) -> &'static str {
        use BuildError::*;
        match self {
            BuildFileCanonicalizeError{ .. } |
            BuildFileError{ .. } => "load",

            EngineNotFound{ .. }          |
            EngineOverrideNotFound{ .. }  |
            EngineCanonicalizeError{ .. } => "engine",

            WorkDirCreateError{ .. }  |
            MissingInput{ .. }        |
            InputCopyError{ .. }      |
            BuildFileWriteError{ .. } |
            RecipeRenderError{ .. }   |
            RecipeWriteError{ .. }    => "context",

            EngineLaunchError{ .. } => "engine",
            ImageBuildFailed{ .. }  => "image",
            ContainerRunFailed{ .. } => "run",

            ArtifactMissing{ .. }   |
            ArtifactCopyError{ .. } => "export",

            Cancelled => "interrupt",
        }
    }
}

impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use BuildError::*;
        match self {
            BuildFileCanonicalizeError{ path, err } => write!(f, "Could not resolve build file '{}': {}", path.display(), err),
            BuildFileError{ path, err }             => write!(f, "Could not load build file '{}': {}", path.display(), err),

            EngineNotFound{ candidates }            => write!(f, "No container engine found on PATH (tried {})", PrettyListFormatter::new(candidates.iter(), "or")),
            EngineOverrideNotFound{ engine, err }   => write!(f, "Could not find container engine '{}': {}", engine, err),
            EngineCanonicalizeError{ path, err }    => write!(f, "Could not resolve container engine '{}': {}", path.display(), err),

            WorkDirCreateError{ err }               => write!(f, "Could not create work directory: {}", err),
            MissingInput{ name, searched }          => write!(f, "Could not find '{}' in {}", name, PrettyListFormatter::new(searched.iter().map(|p| format!("'{}'", p.display())), "and")),
            InputCopyError{ name, err }             => write!(f, "Could not copy '{}' into the work directory: {}", name, err),
            BuildFileWriteError{ err }              => write!(f, "Could not write build file into the work directory: {}", err),
            RecipeRenderError{ err }                => write!(f, "Could not render recipe: {}", err),
            RecipeWriteError{ path, err }           => write!(f, "Could not write recipe '{}': {}", path.display(), err),

            EngineLaunchError{ command, err }       => write!(f, "Could not run command '{}': {}", command, err),
            ImageBuildFailed{ command, code }       => write!(f, "Command '{}' returned non-zero exit code {}", command, code),
            ContainerRunFailed{ command, code }     => write!(f, "Command '{}' returned non-zero exit code {}", command, code),

            ArtifactMissing{ name, path }           => write!(f, "Output '{}' is missing or empty (expected '{}')", name, path.display()),
            ArtifactCopyError{ name, err }          => write!(f, "Could not copy output '{}': {}", name, err),

            Cancelled                               => write!(f, "Build was interrupted"),
        }
    }
}

impl Error for BuildError {}
