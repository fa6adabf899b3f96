//  PIPELINE.rs
//    by the kiln authors
//
//  Created:
//    10 Mar 2026, 15:27:33
//  Last edited:
//    11 Oct 2026, 11:04:50
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the Driver, which walks a BuildSpec through the stages
//!   of the pipeline and stops at the first one that fails.
//

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use log::{debug, info};

use kiln_shr::debug::BlockFormatter;
use kiln_shr::fs::copy_path;
use specifications::build::{ArchiveKind, BuildSpec};

use crate::errors::{FetchError, StageError, StepError};
use crate::exec::{Executor, Invocation};
use crate::fetch::{sha256_file, Fetcher};
use crate::stages::Stage;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::os::unix::process::ExitStatusExt as _;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::fetch::HttpFetcher;

    const SPEC_YAML: &str = r#"
name: rpi-kernel
source:
  url: https://cdn.kernel.org/pub/linux/kernel/v6.x/linux-6.8.tar.xz
patches: [ 0001-first.patch, 0002-second.patch, 0003-third.patch ]
arch: arm64
cross_compile: aarch64-linux-gnu-
configure:
  defconfig: defconfig
  extra_targets: [ mod2noconfig ]
  overrides: [ CONFIG_SQUASHFS=y, CONFIG_EXT4_FS=y ]
compile:
  targets: [ Image.gz, dtbs ]
  reproducible:
    user: kiln
    host: docker
outputs:
  - name: image
    source: arch/arm64/boot/Image
    result: vmlinuz
    destination: vmlinuz
"#;

    /// Records every invocation and pretends it succeeded, unless its program matches `fail_on`.
    #[derive(Default)]
    struct FakeExecutor {
        log     : Mutex<Vec<Invocation>>,
        fail_on : Option<(&'static str, i32)>,
    }
    #[async_trait]
    impl Executor for FakeExecutor {
        async fn execute(&self, invocation: &Invocation) -> Result<ExitStatus, std::io::Error> {
            self.log.lock().unwrap().push(invocation.clone());
            if let Some((needle, code)) = self.fail_on {
                if invocation.to_string().contains(needle) { return Ok(ExitStatus::from_raw(code << 8)); }
            }
            Ok(ExitStatus::from_raw(0))
        }
    }

    /// Writes a fixed body, or fails with the given status.
    struct FakeFetcher(Option<reqwest::StatusCode>);
    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn fetch(&self, _url: &str, path: &Path) -> Result<(), FetchError> {
            match self.0 {
                Some(status) => Err(FetchError::StatusError{ status }),
                None         => { fs::write(path, b"archive").unwrap(); Ok(()) },
            }
        }
    }

    /// Prepares a workdir that looks like it does after unpacking.
    fn prepare(dir: &Path) -> (PathBuf, PathBuf) {
        let workdir = dir.join("src");
        let result  = dir.join("result");
        fs::create_dir_all(workdir.join("linux-6.8/arch/arm64/boot")).unwrap();
        fs::write(workdir.join("linux-6.8/arch/arm64/boot/Image"), b"kernel image").unwrap();
        fs::write(workdir.join("linux-6.8/.config"), b"CONFIG_A=y\n").unwrap();
        fs::create_dir_all(&result).unwrap();
        (workdir, result)
    }

    #[tokio::test]
    async fn fetch_not_found_stops_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let (workdir, result) = prepare(dir.path());
        let spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        let exec = FakeExecutor::default();
        let fetcher = FakeFetcher(Some(reqwest::StatusCode::NOT_FOUND));

        let err: StageError = Driver::new(&spec, &workdir, &result, 4, &exec, &fetcher).run().await.unwrap_err();
        assert_eq!(err.stage(), Stage::Fetch);
        assert!(exec.log.lock().unwrap().is_empty());
        assert!(!result.join("vmlinuz").exists());
    }

    #[tokio::test]
    async fn fetch_not_found_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let (workdir, result) = prepare(dir.path());
        let mut spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        spec.source.url = crate::fetch::tests::serve_once("404 Not Found", b"").await;
        let exec = FakeExecutor::default();
        let fetcher = HttpFetcher::new();

        match Driver::new(&spec, &workdir, &result, 4, &exec, &fetcher).run().await {
            Err(StageError::FetchFailed{ err: FetchError::StatusError{ status }, .. }) => assert_eq!(status, reqwest::StatusCode::NOT_FOUND),
            other => panic!("Expected FetchFailed, got {:?}", other),
        }
        assert!(exec.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn checksum_mismatch_is_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (workdir, result) = prepare(dir.path());
        let mut spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        spec.source.sha256 = Some("0".repeat(64));
        let exec = FakeExecutor::default();

        let err: StageError = Driver::new(&spec, &workdir, &result, 4, &exec, &FakeFetcher(None)).run().await.unwrap_err();
        assert!(matches!(err, StageError::FetchFailed{ err: FetchError::ChecksumMismatch{ .. }, .. }));
        assert!(exec.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (workdir, result) = prepare(dir.path());
        let spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        let exec = FakeExecutor::default();

        Driver::new(&spec, &workdir, &result, 4, &exec, &FakeFetcher(None)).run().await.unwrap();

        let log: Vec<String> = exec.log.lock().unwrap().iter().map(|i| i.to_string()).collect();
        let src = workdir.join("linux-6.8");
        assert_eq!(log, vec![
            "tar xf linux-6.8.tar.xz".to_string(),
            format!("patch -p1 < {}", workdir.join("0001-first.patch").display()),
            format!("patch -p1 < {}", workdir.join("0002-second.patch").display()),
            format!("patch -p1 < {}", workdir.join("0003-third.patch").display()),
            "make ARCH=arm64 defconfig".to_string(),
            "make ARCH=arm64 mod2noconfig".to_string(),
            "make ARCH=arm64 olddefconfig".to_string(),
            "make Image.gz dtbs -j4".to_string(),
        ]);
        let calls = exec.log.lock().unwrap();
        assert_eq!(calls[0].cwd, workdir);
        assert!(calls[1..].iter().all(|c| c.cwd == src));
        assert!(calls[7].env.contains(&("CROSS_COMPILE".to_string(), "aarch64-linux-gnu-".to_string())));
        assert!(calls[7].env.contains(&("KBUILD_BUILD_USER".to_string(), "kiln".to_string())));

        assert_eq!(fs::read_to_string(src.join(".config")).unwrap(), "CONFIG_A=y\nCONFIG_SQUASHFS=y\nCONFIG_EXT4_FS=y\n");
        assert_eq!(fs::read(result.join("vmlinuz")).unwrap(), b"kernel image");
    }

    #[tokio::test]
    async fn patch_failure_names_patch() {
        let dir = tempfile::tempdir().unwrap();
        let (workdir, result) = prepare(dir.path());
        let spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        let exec = FakeExecutor{ fail_on: Some(("0002-second.patch", 1)), ..Default::default() };

        match Driver::new(&spec, &workdir, &result, 4, &exec, &FakeFetcher(None)).run().await {
            Err(StageError::PatchFailed{ index, patch, .. }) => { assert_eq!(index, 1); assert_eq!(patch, "0002-second.patch"); },
            other => panic!("Expected PatchFailed, got {:?}", other),
        }
        // Nothing after the failing patch ran
        assert_eq!(exec.log.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn compile_failure_forwards_code() {
        let dir = tempfile::tempdir().unwrap();
        let (workdir, result) = prepare(dir.path());
        let spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        let exec = FakeExecutor{ fail_on: Some(("Image.gz", 2)), ..Default::default() };

        let err: StageError = Driver::new(&spec, &workdir, &result, 4, &exec, &FakeFetcher(None)).run().await.unwrap_err();
        assert_eq!(err.stage(), Stage::Compile);
        assert_eq!(err.exit_code(), 2);
        assert!(!result.join("vmlinuz").exists());
    }

    #[tokio::test]
    async fn missing_source_dir_is_unpack_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (workdir, result) = prepare(dir.path());
        let mut spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        spec.source.unpack_dir = Some("linux-6.9".into());

        let err: StageError = Driver::new(&spec, &workdir, &result, 4, &FakeExecutor::default(), &FakeFetcher(None)).run().await.unwrap_err();
        assert!(matches!(err, StageError::UnpackFailed{ err: StepError::MissingPath{ .. }, .. }));
    }

    #[tokio::test]
    async fn extractor_failure_is_unpack_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (workdir, result) = prepare(dir.path());
        let spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        let exec = FakeExecutor{ fail_on: Some(("tar xf", 2)), ..Default::default() };

        match Driver::new(&spec, &workdir, &result, 4, &exec, &FakeFetcher(None)).run().await {
            Err(StageError::UnpackFailed{ err: StepError::ToolFailed{ code, .. }, .. }) => assert_eq!(code, Some(2)),
            other => panic!("Expected UnpackFailed, got {:?}", other),
        }
        let log: Vec<String> = exec.log.lock().unwrap().iter().map(|i| i.to_string()).collect();
        assert_eq!(log, vec![ "tar xf linux-6.8.tar.xz".to_string() ]);
    }

    #[tokio::test]
    async fn configure_failure_stops_before_compile() {
        let dir = tempfile::tempdir().unwrap();
        let (workdir, result) = prepare(dir.path());
        let spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        let exec = FakeExecutor{ fail_on: Some(("defconfig", 2)), ..Default::default() };

        let err: StageError = Driver::new(&spec, &workdir, &result, 4, &exec, &FakeFetcher(None)).run().await.unwrap_err();
        assert_eq!(err.stage(), Stage::Configure);
        assert_eq!(err.exit_code(), 1);

        let log: Vec<String> = exec.log.lock().unwrap().iter().map(|i| i.to_string()).collect();
        assert_eq!(log.last().unwrap(), "make ARCH=arm64 defconfig");
        assert!(!log.iter().any(|c| c.contains("-j4")));
        assert_eq!(fs::read_to_string(workdir.join("linux-6.8/.config")).unwrap(), "CONFIG_A=y\n");
        assert!(!result.join("vmlinuz").exists());
    }

    #[tokio::test]
    async fn missing_output_is_export_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (workdir, result) = prepare(dir.path());
        let yaml: String = SPEC_YAML.replace("source: arch/arm64/boot/Image", "source: arch/arm64/boot/Image.gz");
        let spec: BuildSpec = BuildSpec::from_string(yaml).unwrap();

        match Driver::new(&spec, &workdir, &result, 4, &FakeExecutor::default(), &FakeFetcher(None)).run().await {
            Err(StageError::ExportFailed{ output, err: StepError::MissingPath{ .. } }) => assert_eq!(output, "image"),
            other => panic!("Expected ExportFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn modules_and_post_build() {
        let dir = tempfile::tempdir().unwrap();
        let (workdir, result) = prepare(dir.path());
        let yaml: String = SPEC_YAML.replace("  targets: [ Image.gz, dtbs ]\n", "  targets: [ Image.gz, dtbs ]\n  install_modules: true\n  post_build:\n    - program: ./scripts/sign\n      args: [ Image ]\n");
        let spec: BuildSpec = BuildSpec::from_string(yaml).unwrap();
        let exec = FakeExecutor::default();

        Driver::new(&spec, &workdir, &result, 4, &exec, &FakeFetcher(None)).run().await.unwrap();
        let log: Vec<String> = exec.log.lock().unwrap().iter().map(|i| i.to_string()).collect();
        assert_eq!(&log[7..], &[
            "make Image.gz dtbs -j4".to_string(),
            "./scripts/sign Image".to_string(),
            format!("make INSTALL_MOD_PATH={} modules_install -j4", result.display()),
        ]);
    }
}





/***** LIBRARY *****/
/// Runs one BuildSpec through all stages.
pub struct Driver<'a> {
    /// The build to run.
    spec       : &'a BuildSpec,
    /// The directory the archive is downloaded to and unpacked in, and where the patches live.
    workdir    : PathBuf,
    /// The directory the outputs are written to.
    result_dir : PathBuf,
    /// The parallelism passed to `make`.
    cpus       : usize,
    /// Runs the external tools.
    exec       : &'a dyn Executor,
    /// Downloads the archive.
    fetcher    : &'a dyn Fetcher,
}

impl<'a> Driver<'a> {
    /// Constructor for the Driver.
    ///
    /// # Arguments
    /// - `spec`: The BuildSpec to run.
    /// - `workdir`: The directory that contains the patches and input files, and in which the source is unpacked.
    /// - `result_dir`: The directory shared with the host, in which outputs are placed.
    /// - `cpus`: The number of parallel jobs to give `make`.
    /// - `exec`: The Executor to run external tools with.
    /// - `fetcher`: The Fetcher to download the source archive with.
    ///
    /// # Returns
    /// A new Driver that has not run any stage yet.
    pub fn new(spec: &'a BuildSpec, workdir: impl Into<PathBuf>, result_dir: impl Into<PathBuf>, cpus: usize, exec: &'a dyn Executor, fetcher: &'a dyn Fetcher) -> Self {
        Self {
            spec,
            workdir    : workdir.into(),
            result_dir : result_dir.into(),
            cpus       : cpus.max(1),
            exec,
            fetcher,
        }
    }



    /// Runs all stages in order, stopping at the first one that fails.
    ///
    /// # Errors
    /// This function errors with the StageError of the first failing stage. No later stage is run in that case.
    pub async fn run(&self) -> Result<(), StageError> {
        let mut stage: Option<Stage> = Some(Stage::first());
        while let Some(current) = stage {
            info!("Stage '{}'...", current);
            match current {
                Stage::Fetch     => self.fetch().await?,
                Stage::Unpack    => self.unpack().await?,
                Stage::Patch     => self.patch().await?,
                Stage::Configure => self.configure().await?,
                Stage::Compile   => self.compile().await?,
                Stage::Export    => self.export().await?,
            }
            stage = current.next();
        }
        info!("Build '{}' completed", self.spec.name);
        Ok(())
    }



    /// Downloads the archive and checks its digest if one is pinned.
    async fn fetch(&self) -> Result<(), StageError> {
        let url     : &str    = &self.spec.source.url;
        let archive : PathBuf = self.archive_path();
        if let Err(err) = self.fetcher.fetch(url, &archive).await {
            return Err(StageError::FetchFailed{ url: url.into(), err });
        }

        if let Some(expected) = &self.spec.source.sha256 {
            let got: String = match sha256_file(&archive).await {
                Ok(got)  => got,
                Err(err) => { return Err(StageError::FetchFailed{ url: url.into(), err }); },
            };
            if !got.eq_ignore_ascii_case(expected) {
                return Err(StageError::FetchFailed{ url: url.into(), err: FetchError::ChecksumMismatch{ expected: expected.clone(), got } });
            }
            debug!("Archive digest matches '{}'", expected);
        }
        Ok(())
    }

    /// Unpacks the archive and makes sure the source root appeared.
    async fn unpack(&self) -> Result<(), StageError> {
        let archive: PathBuf = self.archive_path();
        let name: &str = self.spec.source.archive_name();
        let kind: ArchiveKind = match ArchiveKind::from_name(name) {
            Some((kind, _)) => kind,
            None            => { return Err(StageError::UnpackFailed{ archive, err: StepError::MissingPath{ path: PathBuf::from(name) } }); },
        };

        let inv: Invocation = match kind {
            ArchiveKind::Tar => Invocation::new("tar", &self.workdir).args([ "xf", name ]),
            ArchiveKind::Zip => Invocation::new("unzip", &self.workdir).args([ "-q", name ]),
        };
        if let Err(err) = self.execute(&inv).await {
            return Err(StageError::UnpackFailed{ archive, err });
        }

        let srcdir: PathBuf = self.source_root();
        if !srcdir.is_dir() {
            return Err(StageError::UnpackFailed{ archive, err: StepError::MissingPath{ path: srcdir } });
        }
        Ok(())
    }

    /// Applies every patch, in order, from within the source root.
    async fn patch(&self) -> Result<(), StageError> {
        let srcdir: PathBuf = self.source_root();
        for (index, patch) in self.spec.patches.iter().enumerate() {
            info!("Applying patch {}/{} '{}'...", index + 1, self.spec.patches.len(), patch);
            let inv: Invocation = Invocation::new("patch", &srcdir).arg("-p1").stdin(self.workdir.join(patch));
            if let Err(err) = self.execute(&inv).await {
                return Err(StageError::PatchFailed{ index, patch: patch.clone(), err });
            }
        }
        Ok(())
    }

    /// Generates the default config, applies the extra config targets and overrides, then reconciles.
    async fn configure(&self) -> Result<(), StageError> {
        let srcdir : PathBuf = self.source_root();
        let arch   : String  = format!("ARCH={}", self.spec.arch.to_kernel());
        let config = &self.spec.configure;

        for target in std::iter::once(&config.defconfig).chain(config.extra_targets.iter()) {
            let inv: Invocation = Invocation::new("make", &srcdir).args([ arch.as_str(), target.as_str() ]);
            if let Err(err) = self.execute(&inv).await { return Err(StageError::ConfigureFailed{ err }); }
        }

        if !config.overrides.is_empty() {
            let path: PathBuf = srcdir.join(".config");
            let block: String = config.overrides.iter().fold(String::new(), |mut s, line| { s.push_str(line); s.push('\n'); s });
            debug!("Appending to '{}':\n{}", path.display(), BlockFormatter::new(block.trim_end()));
            if let Err(err) = append(&path, &block) { return Err(StageError::ConfigureFailed{ err }); }
        }

        if let Some(reconcile) = &config.reconcile {
            let inv: Invocation = Invocation::new("make", &srcdir).args([ arch.as_str(), reconcile.as_str() ]);
            if let Err(err) = self.execute(&inv).await { return Err(StageError::ConfigureFailed{ err }); }
        }
        Ok(())
    }

    /// Builds the targets, then runs the post-build tools.
    async fn compile(&self) -> Result<(), StageError> {
        let srcdir: PathBuf = self.source_root();

        let inv: Invocation = self.with_build_env(Invocation::new("make", &srcdir).args(self.spec.compile.targets.iter().map(String::as_str)).arg(format!("-j{}", self.cpus)));
        if let Err(err) = self.execute(&inv).await {
            return Err(StageError::CompileFailed{ code: forwarded_code(&err), err });
        }

        for tool in &self.spec.compile.post_build {
            let inv: Invocation = self.with_build_env(Invocation::new(&tool.program, &srcdir).args(tool.args.iter().map(String::as_str)));
            if let Err(err) = self.execute(&inv).await {
                return Err(StageError::CompileFailed{ code: forwarded_code(&err), err });
            }
        }
        Ok(())
    }

    /// Installs the modules if asked, then copies every output with a source into the result directory.
    async fn export(&self) -> Result<(), StageError> {
        let srcdir: PathBuf = self.source_root();
        if let Err(err) = fs::create_dir_all(&self.result_dir) {
            return Err(StageError::ExportFailed{ output: self.result_dir.display().to_string(), err: StepError::DirCreateError{ path: self.result_dir.clone(), err } });
        }

        if self.spec.compile.install_modules {
            let inv: Invocation = self.with_build_env(Invocation::new("make", &srcdir).args([ format!("INSTALL_MOD_PATH={}", self.result_dir.display()), "modules_install".into(), format!("-j{}", self.cpus) ]));
            if let Err(err) = self.execute(&inv).await {
                return Err(StageError::ExportFailed{ output: "modules_install".into(), err });
            }
        }

        for output in &self.spec.outputs {
            let source: &Path = match &output.source {
                Some(source) => source,
                None         => { continue; },
            };
            let from : PathBuf = srcdir.join(source);
            let to   : PathBuf = self.result_dir.join(&output.result);
            if !from.exists() {
                return Err(StageError::ExportFailed{ output: output.name.clone(), err: StepError::MissingPath{ path: from } });
            }
            info!("Exporting '{}' as '{}'...", output.name, output.result);
            if let Err(err) = copy_path(&from, &to) {
                return Err(StageError::ExportFailed{ output: output.name.clone(), err: StepError::CopyError{ err } });
            }
        }
        Ok(())
    }



    /// Runs the given invocation and turns a non-zero exit into a StepError.
    async fn execute(&self, inv: &Invocation) -> Result<(), StepError> {
        let status: ExitStatus = match self.exec.execute(inv).await {
            Ok(status) => status,
            Err(err)   => { return Err(StepError::LaunchError{ command: inv.to_string(), err }); },
        };
        if !status.success() {
            return Err(StepError::ToolFailed{ command: inv.to_string(), code: status.code() });
        }
        Ok(())
    }

    /// Adds `ARCH`, `CROSS_COMPILE` and the pinned build identity to the given invocation.
    fn with_build_env(&self, inv: Invocation) -> Invocation {
        let mut inv: Invocation = inv.env("ARCH", self.spec.arch.to_kernel());
        if !self.spec.cross_compile.is_empty() { inv = inv.env("CROSS_COMPILE", &self.spec.cross_compile); }
        for (key, value) in self.spec.compile.reproducible.env() {
            inv = inv.env(key, value);
        }
        inv
    }

    /// Returns where the archive is downloaded to.
    #[inline]
    fn archive_path(&self) -> PathBuf { self.workdir.join(self.spec.source.archive_name()) }

    /// Returns the root of the unpacked source tree.
    #[inline]
    fn source_root(&self) -> PathBuf {
        // `validate()` already guarantees a known archive kind
        self.workdir.join(self.spec.source.source_dir().unwrap_or_default())
    }
}





/***** HELPER FUNCTIONS *****/
/// Appends the given text to a file.
fn append(path: &Path, text: &str) -> Result<(), StepError> {
    let mut handle: fs::File = match OpenOptions::new().append(true).create(true).open(path) {
        Ok(handle) => handle,
        Err(err)   => { return Err(StepError::FileOpenError{ path: path.into(), err }); },
    };
    if let Err(err) = handle.write_all(text.as_bytes()) {
        return Err(StepError::FileWriteError{ path: path.into(), err });
    }
    Ok(())
}

/// Returns the exit code a failed compile step should be forwarded as.
#[inline]
fn forwarded_code(err: &StepError) -> i32 {
    match err {
        StepError::ToolFailed{ code: Some(code), .. } if *code != 0 => *code,
        _                                                           => 1,
    }
}
