mod clear;
mod symbol;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use symbol::SymbolCommands;

#[derive(Parser)]
#[command(
    name = "gmscope",
    version,
    about = "GML code intelligence for GameMaker projects",
    long_about = "gmscope indexes the GML sources of a GameMaker project (scripts, objects, rooms, \
                  extensions) into a cached symbol table of definitions and references, and serves \
                  it to LLM agents over the Model Context Protocol."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and query the GML symbol index
    #[command(subcommand)]
    Symbol(SymbolCommands),
    /// Delete a project's index cache
    #[command(
        long_about = "Removes the .gml_index_cache.json file from the project root. \
                      The next build rescans every file."
    )]
    Clear {
        /// GameMaker project directory (defaults to GM_PROJECT_ROOT or the current directory)
        #[arg(long, value_name = "PROJECT_PATH")]
        project: Option<PathBuf>,
    },
    /// Start the Model Context Protocol (MCP) server on stdio
    Mcp {
        /// Project used when a tool call does not name one
        #[arg(long, value_name = "PROJECT_PATH")]
        project: Option<PathBuf>,
    },
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stdio belongs to the protocol when serving MCP
    let _guard = match &cli.command {
        Commands::Mcp { .. } => gmscope_core::logging::init_logging("mcp", false),
        _ => gmscope_core::logging::init_logging("cli", true),
    };

    match cli.command {
        Commands::Symbol(cmd) => symbol::run(cmd),
        Commands::Clear { project } => clear::run(project),
        Commands::Mcp { project } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(gmscope_mcp::stdio::run_stdio_server(project))
        }
    }
}
