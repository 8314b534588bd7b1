///
/// This module implements the command line interface of the snippet runner: parsing,
/// dispatch to the core command surface, and printing results on stdout.
///
/// All snippet semantics (discovery, parsing, merging, execution) live in the
/// [`snippet-runner-core`] crate. This module only wires configuration to it.
///
/// ## Commands
/// - `list`: names of every snippet under `ATL_SNIPPET_PATH`
/// - `peek <name>`: operation signature, or its input JSON schema with `--schema`
/// - `help <name>`: the snippet's README.md, verbatim
/// - `run <name> <json>`: executes the snippet and prints the raw response
///
/// stdout carries only command output; logs go to stderr.
///
/// [`snippet-runner-core`]: ../../snippet_runner_core/
use crate::load_config::load_config;
use crate::output::{render, OutputFormat};
use anyhow::Result;
use clap::{Parser, Subcommand};
use snippet_runner_core::{GraphQLClient, RunnerConfig, SnippetCommands, SnippetLocator};

/// Run GraphQL snippets stored on disk against a remote endpoint.
#[derive(Parser, Debug)]
#[clap(
    name = "snippet-runner",
    version,
    about = "Run GraphQL snippets stored on disk against a remote endpoint",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available snippets
    List,
    /// Show the operation signature of a snippet
    Peek {
        /// Snippet name (its directory name)
        snippet: String,
        /// Print a JSON schema describing the snippet's variables
        #[clap(long)]
        schema: bool,
        /// Resolve custom input types through endpoint introspection (implies --schema)
        #[clap(long)]
        introspect: bool,
        #[clap(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Print the README.md of a snippet
    Help {
        /// Snippet name (its directory name)
        snippet: String,
    },
    /// Run a snippet with JSON arguments
    Run {
        /// Snippet name (its directory name)
        snippet: String,
        /// Variables as a JSON object, merged over the snippet's defaults
        #[clap(default_value = "{}")]
        arguments: String,
        #[clap(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

/// Async CLI entrypoint for main() and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");
    let config = load_config()?;
    run_with_config(cli, &config).await
}

/// Like [`run`], with configuration supplied by the caller.
pub async fn run_with_config(cli: Cli, config: &RunnerConfig) -> Result<()> {
    let client = GraphQLClient::new(config.client.clone());
    let commands = SnippetCommands::new(SnippetLocator::new(config.snippet_root.clone()), &client);

    let output = execute(cli.command, &commands).await?;
    if output.is_empty() || output.ends_with('\n') {
        print!("{output}");
    } else {
        println!("{output}");
    }
    Ok(())
}

/// Dispatches one command and returns what should be printed.
pub async fn execute(command: Commands, commands: &SnippetCommands<'_>) -> Result<String> {
    match command {
        Commands::List => {
            let names = commands.list()?;
            tracing::info!(command = "list", count = names.len(), "Listed snippets");
            Ok(names.join("\n"))
        }
        Commands::Peek {
            snippet,
            schema,
            introspect,
            format,
        } => {
            tracing::info!(command = "peek", %snippet, schema, introspect, "Peeking snippet");
            if introspect {
                render(&commands.resolved_input_schema(&snippet).await?, format)
            } else if schema {
                render(&commands.input_schema(&snippet)?, format)
            } else {
                render(&commands.peek(&snippet)?, format)
            }
        }
        Commands::Help { snippet } => {
            tracing::info!(command = "help", %snippet, "Reading snippet README");
            Ok(commands.help(&snippet)?)
        }
        Commands::Run {
            snippet,
            arguments,
            format,
        } => {
            tracing::info!(command = "run", %snippet, "Running snippet");
            match commands.run(&snippet, &arguments).await {
                Ok(response) => render(&response, format),
                Err(e) => {
                    tracing::error!(command = "run", %snippet, error = %e, "Snippet run failed");
                    Err(e.into())
                }
            }
        }
    }
}
