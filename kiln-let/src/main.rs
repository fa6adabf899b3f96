//  MAIN.rs
//    by the kiln authors
//
//  Created:
//    09 Mar 2026, 13:28:44
//  Last edited:
//    11 Oct 2026, 11:10:02
//  Auto updated?
//    Yes
//
//  Description:
//!   Entrypoint to the in-container driver executable.
//

use std::path::PathBuf;
use std::process;

use clap::Parser;
use dotenvy::dotenv;
use log::{debug, error, LevelFilter};

use kiln_let::errors::LetError;
use kiln_let::exec::SystemExecutor;
use kiln_let::fetch::HttpFetcher;
use kiln_let::pipeline::Driver;
use specifications::build::BuildSpec;
use specifications::container::{RESULT_DIR, SOURCE_DIR};


/***** ARGUMENTS *****/
#[derive(Parser)]
#[clap(name = "kilnlet", version = env!("CARGO_PKG_VERSION"), about = "Builds a kernel or bootloader inside the kiln build container.")]
struct Opts {
    /// Prints debug info
    #[clap(short, long, action, env = "DEBUG")]
    debug      : bool,
    #[clap(short, long, default_value = SOURCE_DIR, env = "KILN_WORKDIR", help = "The directory with the patches and input files, in which the source is downloaded and unpacked.")]
    workdir    : PathBuf,
    #[clap(short, long, default_value = RESULT_DIR, env = "KILN_RESULT_DIR", help = "The directory (shared with the host) to write the outputs to.")]
    result_dir : PathBuf,
    #[clap(name = "BUILD_YML", help = "The build file describing what to build.")]
    file       : PathBuf,
}





/***** ENTRYPOINT *****/
#[tokio::main]
async fn main() {
    // Parse the arguments
    dotenv().ok();
    let Opts{ debug, workdir, result_dir, file } = Opts::parse();

    // Configure logger.
    let mut logger = env_logger::builder();
    logger.format_module_path(false);
    if debug {
        logger.filter_level(LevelFilter::Debug).init();
    } else {
        logger.filter_level(LevelFilter::Info).init();
    }
    debug!("KILNLET v{}", env!("CARGO_PKG_VERSION"));

    // Wrap actual execution, so we can always log errors.
    if let Err(err) = run(file, workdir, result_dir).await {
        error!("{}", err);
        process::exit(err.exit_code());
    }
}

/// Loads the BuildSpec and drives it through all stages.
///
/// # Arguments
/// - `file`: The path of the BuildSpec.
/// - `workdir`: The directory with the build inputs.
/// - `result_dir`: The directory to write the outputs to.
///
/// # Errors
/// This function errors if the BuildSpec could not be loaded or any stage failed.
async fn run(file: PathBuf, workdir: PathBuf, result_dir: PathBuf) -> Result<(), LetError> {
    let spec: BuildSpec = match BuildSpec::from_path(&file) {
        Ok(spec) => spec,
        Err(err) => { return Err(LetError::BuildFileError{ path: file, err }); },
    };
    let workdir: PathBuf = match workdir.canonicalize() {
        Ok(workdir) => workdir,
        Err(err)    => { return Err(LetError::WorkdirError{ path: workdir, err }); },
    };

    let cpus: usize = num_cpus::get();
    debug!("Building '{}' for {} in '{}' with {} jobs", spec.name, spec.arch, workdir.display(), cpus);

    let exec    : SystemExecutor = SystemExecutor;
    let fetcher : HttpFetcher    = HttpFetcher::new();
    let driver  : Driver         = Driver::new(&spec, workdir, result_dir, cpus, &exec, &fetcher);
    match driver.run().await {
        Ok(())   => Ok(()),
        Err(err) => Err(LetError::PipelineError{ err }),
    }
}
