//  MAIN.rs
//    by the kiln authors
//
//  Created:
//    16 Mar 2026, 09:38:57
//  Last edited:
//    14 Oct 2026, 11:52:30
//  Auto updated?
//    Yes
//
//  Description:
//!   Entrypoint to the `kiln` binary.
//

#[macro_use]
extern crate human_panic;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use console::style;
use dotenvy::dotenv;
use log::{debug, LevelFilter};
use tokio_util::sync::CancellationToken;

use kiln_cli::build;
use kiln_cli::errors::BuildError;
use kiln_cli::signals::cancel_on_signal;
use kiln_cli::spec::BuildOptions;
use specifications::build::{BuildSpec, OutputArtifactSet};


/***** ARGUMENTS *****/
#[derive(Parser)]
#[clap(name = "kiln", version = env!("CARGO_PKG_VERSION"), about = "Builds a kernel or bootloader reproducibly inside a disposable container.")]
struct Cli {
    #[clap(long, action, help = "Enable debug mode")]
    debug          : bool,
    #[clap(short, long, env = "KILN_ENGINE", help = "The container engine to use (a name on the PATH or a path). If omitted, looks for podman and then docker.")]
    engine         : Option<String>,
    #[clap(long, action, help = "Don't remove the build container after a failure (and don't let the engine remove it on exit).")]
    keep_container : bool,
    #[clap(long, help = "Path to the kilnlet executable to copy into the image (defaults to the one next to this executable, then the one on the PATH).")]
    driver         : Option<PathBuf>,
    #[clap(short, long = "search-dir", help = "Additional directory to search patches and input files in. May be given multiple times.")]
    search_dirs    : Vec<PathBuf>,
    #[clap(name = "FILE", default_value = "./kiln.yml", help = "Path to the build file.")]
    file           : PathBuf,
}





/***** ENTRYPOINT *****/
#[tokio::main]
async fn main() {
    // Parse the CLI arguments
    dotenv().ok();
    let cli = Cli::parse();

    // Prepare the logger
    let mut logger = env_logger::builder();
    logger.format_module_path(false);

    if cli.debug {
        logger.filter_level(LevelFilter::Debug).init();
    } else {
        logger.filter_level(LevelFilter::Warn).init();

        setup_panic!();
    }
    debug!("KILN v{}", env!("CARGO_PKG_VERSION"));

    // Stop the build on SIGINT/SIGTERM
    let cancel: CancellationToken = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    match run(cli, cancel).await {
        Ok(res) => {
            println!("Built {} output(s)", style(res.len()).bold().green());
            process::exit(0);
        },
        Err(err) => {
            eprintln!("{}: {}: {}", style("error").bold().red(), err.stage(), err);
            process::exit(1);
        },
    }
}

/// Loads the build file and runs the build.
///
/// # Arguments
/// - `cli`: The parsed command-line arguments.
/// - `cancel`: The token that is cancelled when we are interrupted.
///
/// # Errors
/// This function errors if the build file could not be loaded or the build failed.
async fn run(cli: Cli, cancel: CancellationToken) -> Result<OutputArtifactSet, BuildError> {
    let file: PathBuf = match cli.file.canonicalize() {
        Ok(file) => file,
        Err(err) => { return Err(BuildError::BuildFileCanonicalizeError{ path: cli.file, err }); },
    };
    let spec: BuildSpec = match BuildSpec::from_path(&file) {
        Ok(spec) => spec,
        Err(err) => { return Err(BuildError::BuildFileError{ path: file, err }); },
    };
    let spec_dir: &Path = file.parent().unwrap_or_else(|| Path::new("/"));

    let options: BuildOptions = BuildOptions {
        engine         : cli.engine,
        keep_container : cli.keep_container,
        driver         : cli.driver,
        search_dirs    : cli.search_dirs,
    };
    build::run(&spec, spec_dir, &options, cancel).await
}
