use clap::Parser;
use rim_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible; --log selects the destination.
    if let Err(err) = logging::init(cli.log.as_deref()) {
        eprintln!("rim: could not initialize logging: {:#}", err);
        std::process::exit(1);
    }

    if let Err(err) = cli.run().await {
        eprintln!("rim error: {:#}", err);
        std::process::exit(1);
    }
}
