use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod density;
mod info;
mod run;

mod config;
mod profile;

pub use profile::Profile;

use mocktarget::pipeline::DEFAULT_NSIDE;

/// mocktarget - Mock target catalogs, truth tables and spectra
#[derive(Parser)]
#[command(name = "mocktarget")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read mocks, synthesize spectra and select targets
    Run {
        /// TOML run configuration
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "mocktarget-output")]
        output: PathBuf,

        /// Output profile (fast, balanced, max-compression)
        #[arg(short = 'p', long, default_value = "balanced", value_enum)]
        profile: Profile,

        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the configured cells (comma separated)
        #[arg(long, value_delimiter = ',')]
        healpixels: Option<Vec<i64>>,

        /// Skip spectrum synthesis
        #[arg(long)]
        no_spectra: bool,
    },

    /// Report the weighted target density of a mock catalog
    Density {
        /// Mock catalog path; `{VAR}` placeholders are expanded
        #[arg(value_name = "MOCKFILE")]
        mockfile: String,

        /// HEALPix resolution of the density cells
        #[arg(long, default_value_t = DEFAULT_NSIDE)]
        nside: u32,

        /// Completeness weight map (uniform when omitted)
        #[arg(long, value_name = "FILE")]
        pixweight: Option<PathBuf>,

        /// Print the density of every occupied cell
        #[arg(long)]
        per_pixel: bool,
    },

    /// Display information about an output file
    Info {
        /// Input Parquet file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            config,
            output,
            profile,
            seed,
            healpixels,
            no_spectra,
        } => run::run(
            &config,
            &output,
            profile,
            run::RunOverrides {
                seed,
                healpixels,
                no_spectra,
            },
        ),
        Commands::Density {
            mockfile,
            nside,
            pixweight,
            per_pixel,
        } => density::run(&mockfile, nside, pixweight, per_pixel),
        Commands::Info { file } => info::run(file),
    }
}
