use clap::Parser;
use dauscan::cli::Cli;
use dauscan::runtime::{boot, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    boot::init_logging();
    let cli = Cli::parse();
    let (sources, writer) = boot::boot(&cli).await?;
    run::run(&sources, &writer, chrono::Local::now().date_naive()).await
}
