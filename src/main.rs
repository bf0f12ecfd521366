mod cli;

use clap::Parser;

use cli::Cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    cli.run().inspect_err(|e| log::error!("Split failed: {e:#}"))
}
