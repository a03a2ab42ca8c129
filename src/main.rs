use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stillpoint_lib::run(stillpoint_lib::cli::Cli::parse()).await
}
