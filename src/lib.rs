pub mod cli;
pub mod db;
pub mod models;
pub mod settings;
pub mod stats;
pub mod store;
pub mod timer;
pub mod utils;

pub use models::SessionRecord;
pub use settings::TimerSettings;
pub use store::{JsonFileStore, MemoryStore, SessionStore, SqliteStore, StoreError};
pub use timer::{TimerController, TimerEvent, TimerSnapshot, TimerState, TimerStatus};

/// Entry point for the `stillpoint` binary.
pub async fn run(cli: cli::Cli) -> anyhow::Result<()> {
    utils::logging::init();
    log::info!("Stillpoint starting up...");
    cli::execute(cli).await
}
