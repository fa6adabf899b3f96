//  EXEC.rs
//    by the kiln authors
//
//  Created:
//    10 Mar 2026, 10:05:47
//  Last edited:
//    11 Oct 2026, 10:21:03
//  Auto updated?
//    Yes
//
//  Description:
//!   Describes invocations of external tools and the Executor that runs
//!   them. The pipeline only ever talks to the Executor trait, so stages
//!   can be driven by a fake in tests.
//

use std::fmt::{Display, Formatter, Result as FResult};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_display() {
        let inv: Invocation = Invocation::new("make", "/usr/src/linux-6.8").arg("ARCH=arm64").arg("defconfig");
        assert_eq!(inv.to_string(), "make ARCH=arm64 defconfig");
        let inv: Invocation = Invocation::new("patch", "/usr/src/linux-6.8").arg("-p1").stdin("/usr/src/0001-logo.patch");
        assert_eq!(inv.to_string(), "patch -p1 < /usr/src/0001-logo.patch");
    }

    #[tokio::test]
    async fn system_executor_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let status = SystemExecutor.execute(&Invocation::new("sh", dir.path()).args([ "-c", "exit 3" ])).await.unwrap();
        assert_eq!(status.code(), Some(3));
        let status = SystemExecutor.execute(&Invocation::new("true", dir.path())).await.unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn system_executor_stdin_and_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("in.txt"), b"hello\n").unwrap();
        let inv: Invocation = Invocation::new("sh", dir.path())
            .args([ "-c", "cat > out.txt && printf '%s' \"$KBUILD_BUILD_USER\" > env.txt" ])
            .env("KBUILD_BUILD_USER", "kiln")
            .stdin(dir.path().join("in.txt"));
        assert!(SystemExecutor.execute(&inv).await.unwrap().success());
        assert_eq!(std::fs::read_to_string(dir.path().join("out.txt")).unwrap(), "hello\n");
        assert_eq!(std::fs::read_to_string(dir.path().join("env.txt")).unwrap(), "kiln");
    }
}





/***** LIBRARY *****/
/// One invocation of an external tool.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    /// The program to run.
    pub program : String,
    /// The arguments to pass.
    pub args    : Vec<String>,
    /// The working directory of the program.
    pub cwd     : PathBuf,
    /// Environment variables set on top of our own environment.
    pub env     : Vec<(String, String)>,
    /// If given, a file that is connected to the program's stdin.
    pub stdin   : Option<PathBuf>,
}

impl Invocation {
    /// Constructor for the Invocation.
    ///
    /// # Arguments
    /// - `program`: The program to run.
    /// - `cwd`: The directory to run it in.
    ///
    /// # Returns
    /// A new Invocation without arguments, extra environment or stdin.
    #[inline]
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program : program.into(),
            args    : vec![],
            cwd     : cwd.into(),
            env     : vec![],
            stdin   : None,
        }
    }

    /// Adds an argument.
    #[inline]
    pub fn arg(mut self, arg: impl Into<String>) -> Self { self.args.push(arg.into()); self }

    /// Adds multiple arguments.
    #[inline]
    pub fn args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self { self.args.extend(args.into_iter().map(|a| a.into())); self }

    /// Sets an environment variable.
    #[inline]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self { self.env.push((key.into(), value.into())); self }

    /// Connects a file to stdin.
    #[inline]
    pub fn stdin(mut self, path: impl Into<PathBuf>) -> Self { self.stdin = Some(path.into()); self }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "{}", self.program)?;
        for arg in &self.args { write!(f, " {}", arg)?; }
        if let Some(stdin) = &self.stdin { write!(f, " < {}", stdin.display())?; }
        Ok(())
    }
}



/// Runs Invocations to completion.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs the given invocation and waits for it to complete.
    ///
    /// # Arguments
    /// - `invocation`: The Invocation to run.
    ///
    /// # Returns
    /// The ExitStatus of the program.
    ///
    /// # Errors
    /// This function errors if the program could not be launched at all.
    async fn execute(&self, invocation: &Invocation) -> Result<ExitStatus, std::io::Error>;
}



/// The Executor that runs programs for real, passing their output through to ours.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemExecutor;

#[async_trait]
impl Executor for SystemExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ExitStatus, std::io::Error> {
        debug!("Running '{}' in '{}'...", invocation, invocation.cwd.display());

        let mut cmd: Command = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.current_dir(&invocation.cwd);
        cmd.envs(invocation.env.iter().map(|(k, v)| (k, v)));
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
        match &invocation.stdin {
            Some(path) => { cmd.stdin(Stdio::from(open_stdin(path)?)); },
            None       => { cmd.stdin(Stdio::null()); },
        }

        let status: ExitStatus = cmd.status().await?;
        debug!("'{}' exited with {}", invocation.program, status);
        Ok(status)
    }
}



/***** HELPER FUNCTIONS *****/
/// Opens the file to attach to a child's stdin.
#[inline]
fn open_stdin(path: &Path) -> Result<File, std::io::Error> {
    File::open(path).map_err(|err| std::io::Error::new(err.kind(), format!("could not open '{}': {}", path.display(), err)))
}
