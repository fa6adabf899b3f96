//  BUILD.rs
//    by the kiln authors
//
//  Created:
//    02 Mar 2026, 10:44:09
//  Last edited:
//    14 Oct 2026, 16:01:52
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the BuildSpec, the immutable description of a single
//!   kernel or bootloader build, and the OutputArtifactSet it produces.
//

use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::arch::Arch;
use crate::container::RESERVED_NAMES;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    /// A BuildSpec resembling the Raspberry Pi kernel build.
    const KERNEL_YAML: &str = r#"
name: rpi-kernel
source:
  url: https://cdn.kernel.org/pub/linux/kernel/v6.x/linux-6.8.tar.xz
base_image: debian:bookworm
packages: [ crossbuild-essential-arm64, bc, libssl-dev, bison, flex ]
patches:
  - 0001-Revert-add-index-to-the-ethernet-alias.patch
  - 0101-expose-UART0.patch
  - 0001-logo.patch
arch: arm64
cross_compile: aarch64-linux-gnu-
configure:
  defconfig: defconfig
  extra_targets: [ mod2noconfig ]
  overrides:
    - CONFIG_SQUASHFS=y
compile:
  targets: [ Image.gz, dtbs, modules ]
  install_modules: true
  reproducible:
    user: kiln
    host: docker
    timestamp: "Wed Mar  1 20:57:29 UTC 2017"
outputs:
  - name: image
    source: arch/arm64/boot/Image
    result: vmlinuz
    destination: vmlinuz
  - name: dtb-rpi3b
    source: arch/arm64/boot/dts/broadcom/bcm2837-rpi-3-b.dtb
    result: bcm2710-rpi-3-b.dtb
    destination: bcm2710-rpi-3-b.dtb
  - name: modules
    result: lib
    destination: lib
"#;

    /// A BuildSpec resembling the U-Boot build.
    const UBOOT_YAML: &str = r#"
name: uboot
source:
  url: https://github.com/u-boot/u-boot/archive/4eb7c5030d3f3c707c02a64dc8ea90de3da89928.zip
  unpack_dir: u-boot-4eb7c5030d3f3c707c02a64dc8ea90de3da89928
patches: [ 0001-uboot-quadra.patch ]
files: [ boot.cmd ]
arch: arm
cross_compile: aarch64-linux-gnu-
configure:
  defconfig: tanix_tx6_defconfig
  overrides: [ CONFIG_BOARD_LATE_INIT=n ]
  reconcile: null
compile:
  targets: [ u-boot.bin ]
  reproducible:
    source_date_epoch: 1676844210
  post_build:
    - program: ./tools/mkimage
      args: [ "-A", arm, "-O", linux, "-T", script, "-C", none, "-d", ../boot.cmd, boot.scr ]
outputs:
  - name: bootloader
    source: u-boot.bin
    result: u-boot.bin
    destination: u-boot.bin
  - name: boot-script
    source: boot.scr
    result: boot.scr
    destination: boot.scr
"#;

    #[test]
    fn buildspec_parse_kernel() {
        let spec: BuildSpec = BuildSpec::from_string(KERNEL_YAML).unwrap();
        assert_eq!(spec.name, "rpi-kernel");
        assert_eq!(spec.arch, Arch::aarch64);
        assert_eq!(spec.patches.len(), 3);
        assert_eq!(spec.patches[2], "0001-logo.patch");
        assert_eq!(spec.configure.reconcile.as_deref(), Some("olddefconfig"));
        assert!(spec.compile.install_modules);
        assert_eq!(spec.outputs[2].source, None);
        assert_eq!(spec.source.archive_name(), "linux-6.8.tar.xz");
        assert_eq!(spec.source.source_dir().unwrap(), "linux-6.8");
        assert_eq!(spec.source.archive_kind().unwrap(), ArchiveKind::Tar);
    }

    #[test]
    fn buildspec_parse_uboot() {
        let spec: BuildSpec = BuildSpec::from_string(UBOOT_YAML).unwrap();
        assert_eq!(spec.configure.reconcile, None);
        assert_eq!(spec.files, vec![ "boot.cmd".to_string() ]);
        assert_eq!(spec.source.archive_kind().unwrap(), ArchiveKind::Zip);
        assert_eq!(spec.source.source_dir().unwrap(), "u-boot-4eb7c5030d3f3c707c02a64dc8ea90de3da89928");
        assert_eq!(spec.compile.post_build[0].program, "./tools/mkimage");
        assert_eq!(spec.compile.reproducible.env(), vec![ ("SOURCE_DATE_EPOCH", "1676844210".to_string()) ]);
    }

    #[test]
    fn buildspec_roundtrip_through_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.yml");
        let spec: BuildSpec = BuildSpec::from_string(KERNEL_YAML).unwrap();
        spec.to_path(&path).unwrap();
        assert_eq!(BuildSpec::from_path(&path).unwrap(), spec);
    }

    #[test]
    fn buildspec_reject_duplicate_output() {
        let yaml: String = KERNEL_YAML.replace("name: dtb-rpi3b", "name: image");
        match BuildSpec::from_string(yaml) {
            Err(BuildSpecError::DuplicateOutput{ name }) => assert_eq!(name, "image"),
            other => panic!("Expected DuplicateOutput, got {:?}", other),
        }
    }

    #[test]
    fn buildspec_reject_nested_patch() {
        let yaml: String = KERNEL_YAML.replace("0101-expose-UART0.patch", "serial/0101-expose-UART0.patch");
        assert!(matches!(BuildSpec::from_string(yaml), Err(BuildSpecError::IllegalFilename{ what: "patch", .. })));
    }

    #[test]
    fn buildspec_reject_spaced_patch() {
        let yaml: String = KERNEL_YAML.replace("- 0001-logo.patch", "- \"my fix.patch\"");
        match BuildSpec::from_string(yaml) {
            Err(BuildSpecError::IllegalFilename{ what, name }) => { assert_eq!(what, "patch"); assert_eq!(name, "my fix.patch"); },
            other => panic!("Expected IllegalFilename, got {:?}", other),
        }

        let yaml: String = UBOOT_YAML.replace("files: [ boot.cmd ]", "files: [ \"boot.cmd\\nRUN true\" ]");
        assert!(matches!(BuildSpec::from_string(yaml), Err(BuildSpecError::IllegalFilename{ what: "input", .. })));
    }

    #[test]
    fn buildspec_reject_duplicate_destination() {
        let yaml: String = KERNEL_YAML.replace("destination: bcm2710-rpi-3-b.dtb", "destination: vmlinuz");
        match BuildSpec::from_string(yaml) {
            Err(BuildSpecError::DuplicateDestination{ path }) => assert_eq!(path, PathBuf::from("vmlinuz")),
            other => panic!("Expected DuplicateDestination, got {:?}", other),
        }
    }

    #[test]
    fn buildspec_reject_reserved_result() {
        let yaml: String = KERNEL_YAML.replace("result: vmlinuz", "result: Dockerfile");
        assert!(matches!(BuildSpec::from_string(yaml), Err(BuildSpecError::IllegalFilename{ what: "result", .. })));
    }

    #[test]
    fn buildspec_reject_bad_checksum() {
        let yaml: String = KERNEL_YAML.replace("linux-6.8.tar.xz\n", "linux-6.8.tar.xz\n  sha256: abc\n");
        assert!(matches!(BuildSpec::from_string(yaml), Err(BuildSpecError::IllegalChecksum{ .. })));
    }

    #[test]
    fn buildspec_reject_unknown_archive() {
        let yaml: String = KERNEL_YAML.replace("linux-6.8.tar.xz", "linux-6.8.rar");
        assert!(matches!(BuildSpec::from_string(yaml), Err(BuildSpecError::UnknownArchive{ .. })));
    }

    #[test]
    fn archive_kind_names() {
        assert_eq!(ArchiveKind::from_name("a.tar.gz"), Some((ArchiveKind::Tar, "a")));
        assert_eq!(ArchiveKind::from_name("a.tgz"), Some((ArchiveKind::Tar, "a")));
        assert_eq!(ArchiveKind::from_name("a.zip"), Some((ArchiveKind::Zip, "a")));
        assert_eq!(ArchiveKind::from_name("a.txt"), None);
    }
}





/***** ERRORS *****/
/// Collects errors relating to loading, validating and writing a BuildSpec.
#[derive(Debug)]
pub enum BuildSpecError {
    /// Could not open the target file
    FileOpenError{ path: PathBuf, err: std::io::Error },
    /// Could not parse the target file
    FileParseError{ err: serde_yaml::Error },
    /// Could not create the target file
    FileCreateError{ path: PathBuf, err: std::io::Error },
    /// Could not serialize the BuildSpec
    FileWriteError{ err: serde_yaml::Error },
    /// Could not write the serialized BuildSpec
    FileWriteIoError{ path: PathBuf, err: std::io::Error },

    /// The build name cannot be used as (part of) an image tag.
    IllegalName{ name: String },
    /// The source URL is not an HTTP(S) URL.
    IllegalUrl{ url: String },
    /// The source URL does not point to an archive type we can unpack.
    UnknownArchive{ name: String },
    /// The pinned checksum is not a hex-encoded SHA-256 digest.
    IllegalChecksum{ raw: String },
    /// A patch, input or result name is not a plain filename.
    IllegalFilename{ what: &'static str, name: String },
    /// The same filename is used twice in the build context.
    DuplicateFilename{ name: String },
    /// No outputs were declared.
    NoOutputs,
    /// The same output name is declared twice.
    DuplicateOutput{ name: String },
    /// The same result filename is declared twice.
    DuplicateResult{ name: String },
    /// Two outputs are exported to the same host path.
    DuplicateDestination{ path: PathBuf },
}

impl Display for BuildSpecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use BuildSpecError::*;
        match self {
            FileOpenError{ path, err }    => write!(f, "Could not open build file '{}': {}", path.display(), err),
            FileParseError{ err }         => write!(f, "Could not read & parse build file: {}", err),
            FileCreateError{ path, err }  => write!(f, "Could not create build file '{}': {}", path.display(), err),
            FileWriteError{ err }         => write!(f, "Could not serialize build file: {}", err),
            FileWriteIoError{ path, err } => write!(f, "Could not write build file '{}': {}", path.display(), err),

            IllegalName{ name }             => write!(f, "Build name '{}' is illegal; use only lowercase letters, digits, '-', '_' and '.'", name),
            IllegalUrl{ url }               => write!(f, "Source URL '{}' is not an http:// or https:// URL", url),
            UnknownArchive{ name }          => write!(f, "Source archive '{}' has an unknown extension (expected .tar, .tar.gz, .tgz, .tar.xz, .tar.bz2 or .zip)", name),
            IllegalChecksum{ raw }          => write!(f, "Checksum '{}' is not a hex-encoded SHA-256 digest", raw),
            IllegalFilename{ what, name }   => write!(f, "The {} name '{}' is not a plain filename (or is reserved)", what, name),
            DuplicateFilename{ name }       => write!(f, "Filename '{}' is used more than once in the build context", name),
            NoOutputs                       => write!(f, "No outputs declared; a build that produces nothing cannot succeed"),
            DuplicateOutput{ name }         => write!(f, "Output '{}' is declared more than once", name),
            DuplicateResult{ name }         => write!(f, "Result file '{}' is declared more than once", name),
            DuplicateDestination{ path }    => write!(f, "Destination '{}' is used by more than one output", path.display()),
        }
    }
}

impl Error for BuildSpecError {}





/***** HELPER FUNCTIONS *****/
/// Default base image for the build container.
#[inline]
fn default_base_image() -> String { "debian:bookworm".into() }

/// Default config-reconciliation target.
#[inline]
fn default_reconcile() -> Option<String> { Some("olddefconfig".into()) }

/// Returns whether the given name can be used as a single file in the build context.
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".."
        && !name.chars().any(|c| c == '/' || c.is_whitespace() || c.is_control())
        && !RESERVED_NAMES.contains(&name)
}





/***** AUXILLARY *****/
/// Defines the archive formats we know how to unpack.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArchiveKind {
    /// Any (optionally compressed) tarball; `tar` figures out the compression itself.
    Tar,
    /// A zip archive, as served by e.g. GitHub's archive endpoint.
    Zip,
}

impl ArchiveKind {
    /// Deduces the archive kind from a filename.
    ///
    /// # Arguments
    /// - `name`: The filename of the archive.
    ///
    /// # Returns
    /// The kind of the archive and the filename without the archive extension, or `None` if the extension is unknown.
    pub fn from_name(name: &str) -> Option<(Self, &str)> {
        for (ext, kind) in [ (".tar.xz", Self::Tar), (".tar.gz", Self::Tar), (".tar.bz2", Self::Tar), (".tgz", Self::Tar), (".tar", Self::Tar), (".zip", Self::Zip) ] {
            if let Some(stem) = name.strip_suffix(ext) {
                return Some((kind, stem));
            }
        }
        None
    }
}





/***** LIBRARY *****/
/// Maps every declared artifact name to the path it was copied to on the host.
pub type OutputArtifactSet = BTreeMap<String, PathBuf>;



/// Describes the pinned upstream source archive.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SourceSpec {
    /// The URL to download the archive from. Pin an exact release or revision, never a moving branch.
    pub url        : String,
    /// If given, the hex-encoded SHA-256 digest the downloaded archive must have.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256     : Option<String>,
    /// If given, the directory the archive unpacks to. Defaults to the archive's basename without its extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpack_dir : Option<String>,
}

impl SourceSpec {
    /// Returns the filename of the archive, i.e., the last segment of the URL's path.
    pub fn archive_name(&self) -> &str {
        let path: &str = self.url.split(['?', '#']).next().unwrap_or("");
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Returns the kind of the archive.
    ///
    /// # Errors
    /// This function errors if the archive has an unknown extension.
    pub fn archive_kind(&self) -> Result<ArchiveKind, BuildSpecError> {
        match ArchiveKind::from_name(self.archive_name()) {
            Some((kind, _)) => Ok(kind),
            None            => Err(BuildSpecError::UnknownArchive{ name: self.archive_name().into() }),
        }
    }

    /// Returns the name of the directory the archive unpacks to.
    ///
    /// # Errors
    /// This function errors if no directory was given and the archive has an unknown extension.
    pub fn source_dir(&self) -> Result<String, BuildSpecError> {
        if let Some(dir) = &self.unpack_dir { return Ok(dir.clone()); }
        match ArchiveKind::from_name(self.archive_name()) {
            Some((_, stem)) => Ok(stem.into()),
            None            => Err(BuildSpecError::UnknownArchive{ name: self.archive_name().into() }),
        }
    }
}



/// Describes how the source tree is configured.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ConfigureSpec {
    /// The default-configuration target (e.g., `defconfig` or `tanix_tx6_defconfig`).
    pub defconfig     : String,
    /// Additional configuration targets to run after the default one (e.g., `mod2noconfig`).
    #[serde(default)]
    pub extra_targets : Vec<String>,
    /// Configuration lines appended verbatim to `.config`; these win over upstream defaults.
    #[serde(default)]
    pub overrides     : Vec<String>,
    /// The config-reconciliation target run after appending the overrides. `null` skips reconciliation.
    #[serde(default = "default_reconcile")]
    pub reconcile     : Option<String>,
}



/// Pins the metadata the compiler embeds into the build, so that identical inputs give bit-identical outputs.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ReproducibleSpec {
    /// Value for `KBUILD_BUILD_USER`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user              : Option<String>,
    /// Value for `KBUILD_BUILD_HOST`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host              : Option<String>,
    /// Value for `KBUILD_BUILD_TIMESTAMP`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp         : Option<String>,
    /// Value for `SOURCE_DATE_EPOCH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_date_epoch : Option<u64>,
}

impl ReproducibleSpec {
    /// Returns the environment variables that pin the build identity.
    pub fn env(&self) -> Vec<(&'static str, String)> {
        let mut res: Vec<(&'static str, String)> = Vec::with_capacity(4);
        if let Some(user) = &self.user { res.push(("KBUILD_BUILD_USER", user.clone())); }
        if let Some(host) = &self.host { res.push(("KBUILD_BUILD_HOST", host.clone())); }
        if let Some(timestamp) = &self.timestamp { res.push(("KBUILD_BUILD_TIMESTAMP", timestamp.clone())); }
        if let Some(epoch) = self.source_date_epoch { res.push(("SOURCE_DATE_EPOCH", epoch.to_string())); }
        res
    }
}



/// An extra tool invocation run in the source root after the main compile (e.g., `mkimage` for a boot script).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ToolInvocation {
    /// The program to run.
    pub program : String,
    /// The arguments to pass to it.
    #[serde(default)]
    pub args    : Vec<String>,
}



/// Describes how the configured source tree is compiled.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CompileSpec {
    /// The make targets to build.
    #[serde(default)]
    pub targets         : Vec<String>,
    /// Whether to run `modules_install` into the result directory.
    #[serde(default)]
    pub install_modules : bool,
    /// The pinned build identity.
    #[serde(default)]
    pub reproducible    : ReproducibleSpec,
    /// Tools to run after the main compile, in order.
    #[serde(default)]
    pub post_build      : Vec<ToolInvocation>,
}



/// Maps one logical artifact from the source tree, via the shared result directory, to the host.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OutputMapping {
    /// The logical name of the artifact (e.g., `image` or `dtb-rpi4`).
    pub name        : String,
    /// The path relative to the source root the driver copies from. If omitted, the artifact is written into the result directory by the build itself (e.g., `modules_install`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source      : Option<PathBuf>,
    /// The filename in the shared result directory.
    pub result      : String,
    /// The destination on the host. Relative paths are relative to the build file's directory.
    pub destination : PathBuf,
}



/// The immutable description of one build.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BuildSpec {
    /// The name of the build. Used for the image tag and container names.
    pub name          : String,
    /// The pinned upstream source.
    pub source        : SourceSpec,
    /// The base image of the build container.
    #[serde(default = "default_base_image")]
    pub base_image    : String,
    /// The toolchain packages to install in the build container.
    #[serde(default)]
    pub packages      : Vec<String>,
    /// The patches to apply, in order. Later patches may depend on earlier ones.
    #[serde(default)]
    pub patches       : Vec<String>,
    /// Additional input files to copy next to the patches (e.g., a boot script source).
    #[serde(default)]
    pub files         : Vec<String>,
    /// Additional host directories to search patches and input files in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_paths  : Vec<PathBuf>,
    /// The architecture to build for.
    pub arch          : Arch,
    /// The cross-compilation toolchain prefix (e.g., `aarch64-linux-gnu-`).
    #[serde(default)]
    pub cross_compile : String,
    /// How to configure the tree.
    pub configure     : ConfigureSpec,
    /// How to compile the tree.
    #[serde(default)]
    pub compile       : CompileSpec,
    /// The artifacts this build must produce.
    pub outputs       : Vec<OutputMapping>,
}

impl BuildSpec {
    /// Constructor for the BuildSpec that reads and validates it from the given path.
    ///
    /// # Arguments
    /// - `path`: The path to the YAML file to read.
    ///
    /// # Returns
    /// A new, validated BuildSpec.
    ///
    /// # Errors
    /// This function errors if the file could not be read, did not parse or describes an invalid build.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BuildSpecError> {
        let path: &Path = path.as_ref();
        debug!("Loading build file '{}'...", path.display());

        let handle: File = match File::open(path) {
            Ok(handle) => handle,
            Err(err)   => { return Err(BuildSpecError::FileOpenError{ path: path.into(), err }); }
        };
        Self::from_reader(handle)
    }

    /// Constructor for the BuildSpec that reads and validates it from the given reader.
    ///
    /// # Errors
    /// This function errors if the reader's contents did not parse or describe an invalid build.
    pub fn from_reader(reader: impl Read) -> Result<Self, BuildSpecError> {
        let spec: Self = match serde_yaml::from_reader(reader) {
            Ok(spec) => spec,
            Err(err) => { return Err(BuildSpecError::FileParseError{ err }); }
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Constructor for the BuildSpec that parses and validates it from the given string.
    ///
    /// # Errors
    /// This function errors if the string did not parse or describes an invalid build.
    pub fn from_string(raw: impl AsRef<str>) -> Result<Self, BuildSpecError> {
        let spec: Self = match serde_yaml::from_str(raw.as_ref()) {
            Ok(spec) => spec,
            Err(err) => { return Err(BuildSpecError::FileParseError{ err }); }
        };
        spec.validate()?;
        Ok(spec)
    }



    /// Writes the BuildSpec as YAML to the given location.
    ///
    /// # Errors
    /// This function errors if the file could not be created or written.
    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), BuildSpecError> {
        let path: &Path = path.as_ref();
        let raw: String = match serde_yaml::to_string(self) {
            Ok(raw)  => raw,
            Err(err) => { return Err(BuildSpecError::FileWriteError{ err }); }
        };

        let mut handle: File = match File::create(path) {
            Ok(handle) => handle,
            Err(err)   => { return Err(BuildSpecError::FileCreateError{ path: path.into(), err }); }
        };
        if let Err(err) = handle.write_all(raw.as_bytes()) {
            return Err(BuildSpecError::FileWriteIoError{ path: path.into(), err });
        }
        Ok(())
    }



    /// Checks the invariants of a BuildSpec that serde cannot express.
    ///
    /// # Errors
    /// This function errors with the first violated invariant.
    pub fn validate(&self) -> Result<(), BuildSpecError> {
        // The name ends up in image tags, which are picky
        if self.name.is_empty() || !self.name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '.') {
            return Err(BuildSpecError::IllegalName{ name: self.name.clone() });
        }

        // The source must be something we can fetch and unpack
        if !self.source.url.starts_with("https://") && !self.source.url.starts_with("http://") {
            return Err(BuildSpecError::IllegalUrl{ url: self.source.url.clone() });
        }
        self.source.archive_kind()?;
        if let Some(sha256) = &self.source.sha256 {
            if sha256.len() != 64 || !sha256.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(BuildSpecError::IllegalChecksum{ raw: sha256.clone() });
            }
        }

        // Everything copied into the build context shares one flat directory
        let mut context: HashSet<&str> = HashSet::with_capacity(self.patches.len() + self.files.len());
        for (what, names) in [ ("patch", &self.patches), ("input", &self.files) ] {
            for name in names {
                if !is_plain_filename(name) { return Err(BuildSpecError::IllegalFilename{ what, name: name.clone() }); }
                if !context.insert(name) { return Err(BuildSpecError::DuplicateFilename{ name: name.clone() }); }
            }
        }

        // Outputs
        if self.outputs.is_empty() { return Err(BuildSpecError::NoOutputs); }
        let mut names   : HashSet<&str> = HashSet::with_capacity(self.outputs.len());
        let mut results : HashSet<&str> = HashSet::with_capacity(self.outputs.len());
        let mut dests   : HashSet<&Path> = HashSet::with_capacity(self.outputs.len());
        for output in &self.outputs {
            if !names.insert(&output.name) { return Err(BuildSpecError::DuplicateOutput{ name: output.name.clone() }); }
            if !is_plain_filename(&output.result) { return Err(BuildSpecError::IllegalFilename{ what: "result", name: output.result.clone() }); }
            if context.contains(output.result.as_str()) { return Err(BuildSpecError::DuplicateFilename{ name: output.result.clone() }); }
            if !results.insert(&output.result) { return Err(BuildSpecError::DuplicateResult{ name: output.result.clone() }); }
            if !dests.insert(&output.destination) { return Err(BuildSpecError::DuplicateDestination{ path: output.destination.clone() }); }
        }

        Ok(())
    }
}
