pub mod actions;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod fetch;
pub mod list;
pub mod render;
pub mod types;

use clap::Parser;

use crate::commands::Cli;

pub use crate::actions::{build_item, RenderedItem};
pub use crate::debounce::QueryController;
pub use crate::fetch::search_sources;
pub use crate::render::{render_node, render_tokens};

/// Parse the command line and run the selected command on a single-threaded runtime.
pub fn run() -> anyhow::Result<()> {
    // Only log WARN and above in production to avoid leaking search text
    #[cfg(debug_assertions)]
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    #[cfg(not(debug_assertions))]
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    tracing::debug!("Searching {} vaults", config.endpoints.len());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(commands::dispatch(cli.command, config))
}
