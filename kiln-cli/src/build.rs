//  BUILD.rs
//    by the kiln authors
//
//  Created:
//    19 Mar 2026, 10:02:48
//  Last edited:
//    14 Oct 2026, 11:37:05
//  Auto updated?
//    Yes
//
//  Description:
//!   Orchestrates one build: prepares the build context in a fresh
//!   WorkDir, builds the image, runs the container with the WorkDir
//!   mounted and copies the declared outputs to their destinations.
//

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use console::style;
use nix::unistd::{getgid, getuid};
use tokio::process::Child;
use tokio_util::sync::CancellationToken;

use kiln_shr::fs::{copy_file, copy_path, is_nonempty};
use specifications::build::{BuildSpec, OutputArtifactSet};
use specifications::container::{image_tag, DRIVER_NAME, RECIPE_FILE, SPEC_FILE};

use crate::engine::{exit_code, ContainerHandle, Engine};
use crate::errors::BuildError;
use crate::recipe::render;
use crate::spec::BuildOptions;
use crate::utils::{locate, locate_driver, search_dirs};
use crate::workdir::WorkDir;


/***** TESTS *****/





/***** LIBRARY *****/
/// Everything resolved before a build starts.
#[derive(Debug)]
pub struct Orchestrator {
    /// The engine to build and run with.
    engine         : Engine,
    /// The driver executable to copy into the image.
    driver         : PathBuf,
    /// The directories to search inputs in, in order.
    search_dirs    : Vec<PathBuf>,
    /// Whether to leave the container alone after a failure.
    keep_container : bool,
    /// The UID of the build user in the container.
    uid            : u32,
    /// The GID of the build user in the container.
    gid            : u32,
}

impl Orchestrator {
    /// Constructor for the Orchestrator, which resolves the engine, the driver and the input search locations.
    ///
    /// # Arguments
    /// - `spec`: The BuildSpec that will be built.
    /// - `spec_dir`: The directory of the build file.
    /// - `options`: The BuildOptions given by the user.
    ///
    /// # Errors
    /// This function errors if no engine or driver could be found.
    pub fn new(spec: &BuildSpec, spec_dir: &Path, options: &BuildOptions) -> Result<Self, BuildError> {
        let engine: Engine = Engine::resolve(options.engine.as_deref())?;
        let driver: PathBuf = locate_driver(options.driver.as_deref())?;
        Ok(Self {
            engine,
            driver,
            search_dirs    : search_dirs(spec_dir, &options.search_dirs, &spec.search_paths),
            keep_container : options.keep_container,
            uid            : getuid().as_raw(),
            gid            : getgid().as_raw(),
        })
    }



    /// Runs the build.
    ///
    /// # Arguments
    /// - `spec`: The BuildSpec to build.
    /// - `spec_dir`: The directory of the build file. Relative destinations are resolved against it.
    /// - `cancel`: A token that, when cancelled, stops the build (removing the container if it is running).
    ///
    /// # Returns
    /// The OutputArtifactSet mapping every declared output to where it was copied.
    ///
    /// # Errors
    /// This function errors if any step fails, or if it was cancelled. The work directory is removed in every case.
    pub async fn run(&self, spec: &BuildSpec, spec_dir: &Path, cancel: CancellationToken) -> Result<OutputArtifactSet, BuildError> {
        let workdir: WorkDir = WorkDir::new()?;
        self.prepare(spec, workdir.path())?;

        if cancel.is_cancelled() { return Err(BuildError::Cancelled); }
        println!("Building image {}...", style(image_tag(&spec.name)).bold().cyan());
        self.build_image(spec, workdir.path(), &cancel).await?;

        if cancel.is_cancelled() { return Err(BuildError::Cancelled); }
        let handle: ContainerHandle = ContainerHandle::new(&spec.name);
        println!("Running container {}...", style(&handle.name).bold().cyan());
        self.run_container(&handle, workdir.path(), &cancel).await?;

        export(spec, spec_dir, workdir.path())
    }



    /// Fills the work directory with everything the image needs.
    fn prepare(&self, spec: &BuildSpec, workdir: &Path) -> Result<(), BuildError> {
        for name in spec.patches.iter().chain(spec.files.iter()) {
            let source: PathBuf = locate(name, &self.search_dirs)?;
            if let Err(err) = copy_file(&source, workdir.join(name)) {
                return Err(BuildError::InputCopyError{ name: name.clone(), err });
            }
        }
        if let Err(err) = copy_file(&self.driver, workdir.join(DRIVER_NAME)) {
            return Err(BuildError::InputCopyError{ name: DRIVER_NAME.into(), err });
        }
        if let Err(err) = spec.to_path(workdir.join(SPEC_FILE)) {
            return Err(BuildError::BuildFileWriteError{ err });
        }

        let recipe: String = match render(spec, self.uid, self.gid) {
            Ok(recipe) => recipe,
            Err(err)   => { return Err(BuildError::RecipeRenderError{ err }); },
        };
        let path: PathBuf = workdir.join(RECIPE_FILE);
        if let Err(err) = fs::write(&path, recipe) {
            return Err(BuildError::RecipeWriteError{ path, err });
        }
        debug!("Prepared build context in '{}'", workdir.display());
        Ok(())
    }

    /// Builds the image from the work directory.
    async fn build_image(&self, spec: &BuildSpec, workdir: &Path, cancel: &CancellationToken) -> Result<(), BuildError> {
        let args: Vec<String> = self.engine.build_args(&image_tag(&spec.name));
        let command: String = self.engine.format_command(&args);
        let mut child: Child = match self.engine.command(&args, Some(workdir)).spawn() {
            Ok(child) => child,
            Err(err)  => { return Err(BuildError::EngineLaunchError{ command, err }); },
        };

        let status: ExitStatus = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => status,
                Err(err)   => { return Err(BuildError::EngineLaunchError{ command, err }); },
            },
            _ = cancel.cancelled() => {
                warn!("Interrupted while building the image");
                if let Err(err) = child.kill().await { warn!("Failed to stop '{}': {}", command, err); }
                return Err(BuildError::Cancelled);
            },
        };
        if !status.success() {
            return Err(BuildError::ImageBuildFailed{ command, code: exit_code(status) });
        }
        Ok(())
    }

    /// Runs the container, and makes sure it is gone afterwards.
    async fn run_container(&self, handle: &ContainerHandle, workdir: &Path, cancel: &CancellationToken) -> Result<(), BuildError> {
        let args: Vec<String> = self.engine.run_args(handle, workdir, !self.keep_container);
        let command: String = self.engine.format_command(&args);
        let mut child: Child = match self.engine.command(&args, None).spawn() {
            Ok(child) => child,
            Err(err)  => { return Err(BuildError::EngineLaunchError{ command, err }); },
        };

        let status: ExitStatus = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => status,
                Err(err)   => {
                    if !self.keep_container { self.engine.teardown(handle).await; }
                    return Err(BuildError::EngineLaunchError{ command, err });
                },
            },
            _ = cancel.cancelled() => {
                warn!("Interrupted while running container '{}'", handle);
                if let Err(err) = child.kill().await { warn!("Failed to stop '{}': {}", command, err); }
                self.engine.teardown(handle).await;
                return Err(BuildError::Cancelled);
            },
        };

        if !status.success() {
            if !self.keep_container { self.engine.teardown(handle).await; }
            return Err(BuildError::ContainerRunFailed{ command, code: exit_code(status) });
        }
        // Without `--rm` the engine leaves the container around
        if self.keep_container { self.engine.teardown(handle).await; }
        Ok(())
    }
}



/// Runs one build from start to finish.
///
/// # Arguments
/// - `spec`: The BuildSpec to build.
/// - `spec_dir`: The directory of the build file.
/// - `options`: The BuildOptions given by the user.
/// - `cancel`: A token that, when cancelled, stops the build.
///
/// # Returns
/// The OutputArtifactSet mapping every declared output to where it was copied.
///
/// # Errors
/// This function errors if anything about the build fails or it was cancelled.
pub async fn run(spec: &BuildSpec, spec_dir: &Path, options: &BuildOptions, cancel: CancellationToken) -> Result<OutputArtifactSet, BuildError> {
    if cancel.is_cancelled() { return Err(BuildError::Cancelled); }
    let orchestrator: Orchestrator = Orchestrator::new(spec, spec_dir, options)?;
    orchestrator.run(spec, spec_dir, cancel).await
}



/// Copies every declared output from the work directory to its destination.
///
/// # Errors
/// This function errors if an output is missing or empty, or could not be copied.
fn export(spec: &BuildSpec, spec_dir: &Path, workdir: &Path) -> Result<OutputArtifactSet, BuildError> {
    // Check everything first, so a missing output does not leave half the destinations overwritten
    for output in &spec.outputs {
        let path: PathBuf = workdir.join(&output.result);
        if !is_nonempty(&path) {
            return Err(BuildError::ArtifactMissing{ name: output.name.clone(), path });
        }
    }

    let mut res: OutputArtifactSet = OutputArtifactSet::new();
    for output in &spec.outputs {
        let dest: PathBuf = spec_dir.join(&output.destination);
        if let Err(err) = copy_path(workdir.join(&output.result), &dest) {
            return Err(BuildError::ArtifactCopyError{ name: output.name.clone(), err });
        }
        println!("Exported {} to '{}'", style(&output.name).bold().green(), dest.display());
        res.insert(output.name.clone(), dest);
    }
    Ok(res)
}
