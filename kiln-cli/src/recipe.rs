//  RECIPE.rs
//    by the kiln authors
//
//  Created:
//    16 Mar 2026, 11:04:39
//  Last edited:
//    13 Oct 2026, 14:40:18
//  Auto updated?
//    Yes
//
//  Description:
//!   Renders the Dockerfile that builds the container the driver runs in.
//

use std::fmt::Write as _;

use specifications::build::BuildSpec;
use specifications::container::{BUILD_USER, DRIVER_NAME, DRIVER_PATH, SOURCE_DIR, SPEC_FILE};

use crate::errors::RecipeError;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    const SPEC_YAML: &str = r#"
name: rpi-kernel
source:
  url: https://cdn.kernel.org/pub/linux/kernel/v6.x/linux-6.8.tar.xz
base_image: debian:bookworm
packages: [ crossbuild-essential-arm64, bc, libssl-dev, bison, flex ]
patches: [ 0003-third.patch, 0001-first.patch, 0002-second.patch ]
files: [ boot.cmd ]
arch: arm64
configure:
  defconfig: defconfig
outputs:
  - name: image
    source: arch/arm64/boot/Image
    result: vmlinuz
    destination: vmlinuz
"#;

    #[test]
    fn render_full() {
        let spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        assert_eq!(render(&spec, 1000, 1000).unwrap(), "\
FROM debian:bookworm
RUN apt-get update && apt-get install -y crossbuild-essential-arm64 bc libssl-dev bison flex
COPY kilnlet /usr/bin/kilnlet
COPY build.yml /usr/src/build.yml
COPY 0003-third.patch /usr/src/0003-third.patch
COPY 0001-first.patch /usr/src/0001-first.patch
COPY 0002-second.patch /usr/src/0002-second.patch
COPY boot.cmd /usr/src/boot.cmd
RUN echo 'builduser:x:1000:1000:nobody:/:/bin/sh' >> /etc/passwd
RUN chown -R builduser: /usr/src
USER builduser
WORKDIR /usr/src
ENTRYPOINT [\"/usr/bin/kilnlet\", \"/usr/src/build.yml\"]
");
    }

    #[test]
    fn render_is_deterministic() {
        let spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        assert_eq!(render(&spec, 1000, 100).unwrap(), render(&spec, 1000, 100).unwrap());
    }

    #[test]
    fn render_uid_changes_only_user_line() {
        let spec: BuildSpec = BuildSpec::from_string(SPEC_YAML).unwrap();
        let a: String = render(&spec, 1000, 1000).unwrap();
        let b: String = render(&spec, 1234, 5678).unwrap();
        let diff: Vec<(&str, &str)> = a.lines().zip(b.lines()).filter(|(a, b)| a != b).collect();
        assert_eq!(a.lines().count(), b.lines().count());
        assert_eq!(diff, vec![ ("RUN echo 'builduser:x:1000:1000:nobody:/:/bin/sh' >> /etc/passwd", "RUN echo 'builduser:x:1234:5678:nobody:/:/bin/sh' >> /etc/passwd") ]);
    }

    #[test]
    fn render_without_packages() {
        let yaml: String = SPEC_YAML.replace("packages: [ crossbuild-essential-arm64, bc, libssl-dev, bison, flex ]\n", "");
        let spec: BuildSpec = BuildSpec::from_string(yaml).unwrap();
        let recipe: String = render(&spec, 0, 0).unwrap();
        assert!(!recipe.contains("apt-get"));
        assert!(recipe.starts_with("FROM debian:bookworm\nCOPY kilnlet /usr/bin/kilnlet\n"));
    }
}





/***** MACROS *****/
/// Wrapper around write! that returns RecipeErrors instead of standard format errors.
macro_rules! write_build {
    ($($e:expr),*) => {
        write!($($e),*).map_err(|err| RecipeError::RecipeStrWriteError{ err })
    }
}

/// Wrapper around writeln! that returns RecipeErrors instead of standard format errors.
macro_rules! writeln_build {
    ($($e:expr),*) => {
        writeln!($($e),*).map_err(|err| RecipeError::RecipeStrWriteError{ err })
    }
}





/***** LIBRARY *****/
/// Renders the Dockerfile for the given build.
///
/// The output only depends on its arguments. The UID and GID only appear in the line that registers the build user, so that the layers before it can be shared between users.
///
/// # Arguments
/// - `spec`: The BuildSpec to render the recipe for.
/// - `uid`: The UID of the host user, which the build user inside the container will get.
/// - `gid`: The GID of the host user, which the build user inside the container will get.
///
/// # Returns
/// The contents of the Dockerfile.
///
/// # Errors
/// This function only errors if we failed to write to the string buffer.
pub fn render(spec: &BuildSpec, uid: u32, gid: u32) -> Result<String, RecipeError> {
    let mut contents: String = String::new();

    // Base image and toolchain
    writeln_build!(contents, "FROM {}", spec.base_image)?;
    if !spec.packages.is_empty() {
        write_build!(contents, "RUN apt-get update && apt-get install -y")?;
        for package in &spec.packages {
            write_build!(contents, " {}", package)?;
        }
        writeln_build!(contents)?;
    }

    // Build context
    writeln_build!(contents, "COPY {} {}", DRIVER_NAME, DRIVER_PATH)?;
    writeln_build!(contents, "COPY {} {}/{}", SPEC_FILE, SOURCE_DIR, SPEC_FILE)?;
    for name in spec.patches.iter().chain(spec.files.iter()) {
        writeln_build!(contents, "COPY {} {}/{}", name, SOURCE_DIR, name)?;
    }

    // The unprivileged user, which maps onto the host user so the outputs are ours
    writeln_build!(contents, "RUN echo '{}:x:{}:{}:nobody:/:/bin/sh' >> /etc/passwd", BUILD_USER, uid, gid)?;
    writeln_build!(contents, "RUN chown -R {}: {}", BUILD_USER, SOURCE_DIR)?;
    writeln_build!(contents, "USER {}", BUILD_USER)?;
    writeln_build!(contents, "WORKDIR {}", SOURCE_DIR)?;

    writeln_build!(contents, "ENTRYPOINT [\"{}\", \"{}/{}\"]", DRIVER_PATH, SOURCE_DIR, SPEC_FILE)?;
    Ok(contents)
}
