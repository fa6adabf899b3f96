//  ENGINE.rs
//    by the kiln authors
//
//  Created:
//    17 Mar 2026, 13:21:09
//  Last edited:
//    14 Oct 2026, 09:58:44
//  Auto updated?
//    Yes
//
//  Description:
//!   Resolves the container engine and describes how to talk to it.
//!   Engine differences are captured once, at resolve time, in a
//!   Capabilities table; nothing else branches on the engine's name.
//

use std::ffi::OsStr;
use std::fmt::{Display, Formatter, Result as FResult};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use specifications::container::{image_tag, IMAGE_PREFIX, RESULT_DIR};

use crate::errors::BuildError;


/***** TESTS *****/





/***** CONSTANTS *****/
/// The engines we look for, in order of preference. Podman goes first because `docker` is often a shim for it.
pub const CANDIDATES: [&str; 2] = [ "podman", "docker" ];





/***** LIBRARY *****/
/// Describes which engine-specific arguments to pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Capabilities {
    /// Whether to run with `--userns=keep-id`, so the container user maps onto the host user.
    pub keep_id_userns : bool,
    /// Whether to append `:Z` to the bind mount, so SELinux lets the container write to it.
    pub volume_relabel : bool,
}

impl Capabilities {
    /// Returns the capabilities of the engine with the given (canonical) executable name. Unknown engines are assumed to be Docker-compatible.
    pub fn for_engine(name: &str) -> Self {
        if name.starts_with("podman") {
            Self{ keep_id_userns: true, volume_relabel: true }
        } else {
            Self{ keep_id_userns: false, volume_relabel: true }
        }
    }
}



/// The result of tearing down a container.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Teardown {
    /// The container existed and is now gone.
    Removed,
    /// There was no container to remove.
    AlreadyGone,
    /// The engine could not remove the container.
    Failed,
}



/// Identifies the image and the container of one build.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContainerHandle {
    /// The tag of the image.
    pub image : String,
    /// The name of the container.
    pub name  : String,
}

impl ContainerHandle {
    /// Creates a new handle for the build with the given name, with a random container name suffix.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name: &str = name.as_ref();
        Self {
            image : image_tag(name),
            name  : format!("{}{}-{:08x}", IMAGE_PREFIX, name, rand::random::<u32>()),
        }
    }
}

impl Display for ContainerHandle {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult { write!(f, "{}", self.name) }
}



/// A resolved container engine.
#[derive(Clone, Debug)]
pub struct Engine {
    /// The canonical path of the engine executable.
    pub path : PathBuf,
    /// What the engine supports.
    pub caps : Capabilities,
}

impl Engine {
    /// Resolves the engine to use, searching the process' PATH.
    ///
    /// # Arguments
    /// - `engine`: If given, the name or path of the engine to use instead of probing the candidates.
    ///
    /// # Returns
    /// A new Engine with its capabilities looked up.
    ///
    /// # Errors
    /// This function errors if the given engine (or none of the candidates) could be found.
    #[inline]
    pub fn resolve(engine: Option<&str>) -> Result<Self, BuildError> {
        Self::resolve_in(engine, &CANDIDATES, std::env::var_os("PATH"))
    }

    /// Resolves the engine to use, searching the given PATH.
    ///
    /// # Arguments
    /// - `engine`: If given, the name or path of the engine to use instead of probing the candidates.
    /// - `candidates`: The engine names to probe for, in order of preference.
    /// - `paths`: The PATH-like list of directories to search in.
    ///
    /// # Returns
    /// A new Engine with its capabilities looked up.
    ///
    /// # Errors
    /// This function errors if the given engine (or none of the candidates) could be found.
    pub fn resolve_in(engine: Option<&str>, candidates: &[&str], paths: Option<impl AsRef<OsStr>>) -> Result<Self, BuildError> {
        let paths: Option<&OsStr> = paths.as_ref().map(|p| p.as_ref());
        let cwd: PathBuf = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        let found: PathBuf = match engine {
            Some(engine) => match which::which_in(engine, paths, &cwd) {
                Ok(found) => found,
                Err(err)  => { return Err(BuildError::EngineOverrideNotFound{ engine: engine.into(), err }); },
            },
            None => match candidates.iter().find_map(|c| which::which_in(c, paths, &cwd).ok()) {
                Some(found) => found,
                None        => { return Err(BuildError::EngineNotFound{ candidates: candidates.iter().map(|c| c.to_string()).collect() }); },
            },
        };

        let path: PathBuf = match found.canonicalize() {
            Ok(path) => path,
            Err(err) => { return Err(BuildError::EngineCanonicalizeError{ path: found, err }); },
        };
        let name: String = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let caps: Capabilities = Capabilities::for_engine(&name);
        debug!("Using container engine '{}' ({:?})", path.display(), caps);
        Ok(Self{ path, caps })
    }



    /// Returns the name of the engine executable.
    #[inline]
    pub fn name(&self) -> String { self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default() }

    /// Returns the arguments that build the image in the current directory.
    pub fn build_args(&self, tag: &str) -> Vec<String> {
        vec![ "build".into(), "--rm=true".into(), format!("--tag={}", tag), ".".into() ]
    }

    /// Returns the arguments that run the image with the given work directory mounted as the result directory.
    ///
    /// # Arguments
    /// - `handle`: The ContainerHandle naming the image and container.
    /// - `workdir`: The host directory to mount.
    /// - `remove`: Whether the engine should remove the container when it exits.
    pub fn run_args(&self, handle: &ContainerHandle, workdir: &Path, remove: bool) -> Vec<String> {
        let mut args: Vec<String> = vec![ "run".into() ];
        if remove { args.push("--rm".into()); }
        if self.caps.keep_id_userns { args.push("--userns=keep-id".into()); }
        args.push("--name".into());
        args.push(handle.name.clone());
        args.push("--volume".into());
        args.push(format!("{}:{}{}", workdir.display(), RESULT_DIR, if self.caps.volume_relabel { ":Z" } else { "" }));
        args.push(handle.image.clone());
        args
    }

    /// Returns the arguments that forcefully remove the container.
    pub fn teardown_args(&self, handle: &ContainerHandle) -> Vec<String> {
        vec![ "rm".into(), "--force".into(), handle.name.clone() ]
    }



    /// Prepares a command for the engine with the given arguments. The output of the engine is passed through to ours.
    pub fn command(&self, args: &[String], cwd: Option<&Path>) -> Command {
        let mut cmd: Command = Command::new(&self.path);
        cmd.args(args);
        if let Some(cwd) = cwd { cmd.current_dir(cwd); }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
        cmd.kill_on_drop(true);
        cmd
    }

    /// Forcefully removes the container. Failures are only logged.
    ///
    /// # Returns
    /// What happened to the container. A container that no longer exists (e.g., because the engine already removed it) is not a failure.
    pub async fn teardown(&self, handle: &ContainerHandle) -> Teardown {
        let args: Vec<String> = self.teardown_args(handle);
        info!("Removing container '{}'...", handle);
        let mut cmd: Command = self.command(&args, None);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        match cmd.output().await {
            Ok(output) if output.status.success() => Teardown::Removed,
            Ok(output) => {
                let stderr: String = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if stderr.to_lowercase().contains("no such container") {
                    debug!("Container '{}' was already removed", handle);
                    Teardown::AlreadyGone
                } else {
                    warn!("Failed to remove container '{}': '{}' exited with {}: {}", handle, self.format_command(&args), output.status, stderr);
                    Teardown::Failed
                }
            },
            Err(err) => {
                warn!("Failed to remove container '{}': {}", handle, err);
                Teardown::Failed
            },
        }
    }

    /// Formats the engine command with the given arguments, for error messages.
    #[inline]
    pub fn format_command(&self, args: &[String]) -> String { format!("{} {}", self.path.display(), args.join(" ")) }
}



/// Returns the exit code in a status, or -1 if the process was killed by a signal.
#[inline]
pub fn exit_code(status: ExitStatus) -> i32 { status.code().unwrap_or(-1) }
