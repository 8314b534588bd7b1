use anyhow::Result;
use clap::Parser;
use snippet_runner::import::{format_report, run_import};
use snippet_runner::load_config::load_importer_config;
use snippet_runner::output::{render, OutputFormat};

/// Import Bitbucket Data Center repositories into Compass as components.
///
/// Configuration comes from the environment (or a `.env` file); set `DRY_RUN=1`
/// to preview without creating anything.
#[derive(Parser, Debug)]
#[clap(name = "bitbucket-import", version)]
struct Args {
    /// Print the full report as structured data instead of one line per repository
    #[clap(long, value_enum)]
    format: Option<OutputFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    snippet_runner::init_tracing();

    let args = Args::parse();
    let config = load_importer_config()?;
    let report = match run_import(&config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "[IMPORT] Import aborted");
            return Err(e);
        }
    };

    match args.format {
        Some(format) => println!("{}", render(&report, format)?),
        None => println!("{}", format_report(&report)),
    }
    Ok(())
}
