pub mod bitbucket;
pub mod cli;
pub mod compass;
pub mod import;
pub mod load_config;
pub mod output;

pub use cli::{run, Cli, Commands};

use tracing_subscriber::EnvFilter;

/// Installs the stderr `fmt` subscriber used by both binaries. `RUST_LOG`
/// overrides the default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
