use anyhow::Result;
use clap::Parser;
use install_sweep::cli;
use tracing::error;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    match cli::dispatch(args) {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!("{:#}", err);
            eprintln!("error: {:#}", err);
            std::process::exit(1);
        }
    }
}
