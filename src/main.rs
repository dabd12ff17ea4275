#[macro_use]
extern crate log;

use clap::Parser;
use log::Level;

mod commands;
mod dispatch;
mod params;
mod utils;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// log debug messages too
    #[arg(long, short, action)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Calculate baselines, delays and uv coverage for a simulated run
    ///
    /// No recorded run is read. The parameters are handed to
    /// delays/CalcMvtUVonly.py, which does the actual calculation.
    Sim(commands::sim::SimArgs),
}

fn main() -> anyhow::Result<()> {
    // parse command line arguments
    let args = Args::parse();

    // init logging
    let level = if args.verbose {
        Level::Debug
    } else {
        Level::Info
    };
    simple_logger::init_with_level(level)?;

    match args.command {
        Commands::Sim(sim) => commands::sim::run(sim)?,
    };

    Ok(())
}
