//  CONTAINER.rs
//    by the kiln authors
//
//  Created:
//    02 Mar 2026, 10:31:18
//  Last edited:
//    30 Jul 2026, 11:02:45
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the filesystem contract between the host orchestrator and
//!   the in-container build driver. Both sides agree on these paths and
//!   filenames only; there is no other channel between them.
//


/***** CONSTANTS *****/
/// The absolute path inside the container where the host's work directory is bind-mounted. The driver writes its artifacts here.
pub const RESULT_DIR: &str = "/tmp/buildresult";

/// The directory inside the image where the build inputs are copied to and where the source is unpacked.
pub const SOURCE_DIR: &str = "/usr/src";

/// The filename of the driver executable, both in the build context and under `/usr/bin` in the image.
pub const DRIVER_NAME: &str = "kilnlet";

/// The absolute path of the driver executable inside the image.
pub const DRIVER_PATH: &str = "/usr/bin/kilnlet";

/// The filename of the serialized BuildSpec in the build context (and in `SOURCE_DIR` in the image).
pub const SPEC_FILE: &str = "build.yml";

/// The filename of the generated recipe in the build context.
pub const RECIPE_FILE: &str = "Dockerfile";

/// The name of the unprivileged user that runs the driver inside the container.
pub const BUILD_USER: &str = "builduser";

/// The prefix for image tags and container names.
pub const IMAGE_PREFIX: &str = "kiln-";

/// Filenames that are already taken in the build context, and that patches, inputs or results may therefore not use.
pub const RESERVED_NAMES: [&str; 3] = [ DRIVER_NAME, SPEC_FILE, RECIPE_FILE ];



/// Returns the image tag for a build with the given name.
///
/// # Arguments
/// - `name`: The name of the build as given in the BuildSpec.
///
/// # Returns
/// The tag to build the image under.
#[inline]
pub fn image_tag(name: impl AsRef<str>) -> String {
    format!("{}{}", IMAGE_PREFIX, name.as_ref())
}
