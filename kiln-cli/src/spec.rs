//  SPEC.rs
//    by the kiln authors
//
//  Created:
//    18 Mar 2026, 11:47:20
//  Last edited:
//    13 Oct 2026, 15:05:33
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the options that change how a build is orchestrated (but
//!   not what is built).
//

use std::path::PathBuf;


/***** LIBRARY *****/
/// The options given on the command line.
#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// The name or path of the engine to use instead of probing for one.
    pub engine         : Option<String>,
    /// If true, the container is not removed by the engine, and not torn down after a failure.
    pub keep_container : bool,
    /// The driver executable to copy into the image.
    pub driver         : Option<PathBuf>,
    /// Extra directories to search patches and input files in.
    pub search_dirs    : Vec<PathBuf>,
}
