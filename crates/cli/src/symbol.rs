use clap::Subcommand;
use gmscope_core::project::locate_project_root;
use gmscope_core::{GmlIndex, Symbol, SymbolFilter, SymbolKind, SymbolReference};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Subcommand)]
pub enum SymbolCommands {
    /// Build or refresh the symbol index
    Build {
        /// GameMaker project directory (defaults to GM_PROJECT_ROOT or the current directory)
        #[arg(long, value_name = "PROJECT_PATH")]
        project: Option<PathBuf>,
        /// Ignore the cache and rescan every file
        #[arg(long)]
        force: bool,
    },
    /// Show where a symbol is defined
    FindDefinition {
        /// Symbol name (case-sensitive)
        name: String,
        #[arg(long, value_name = "PROJECT_PATH")]
        project: Option<PathBuf>,
    },
    /// Show every usage of a symbol
    FindReferences {
        /// Symbol name (case-sensitive)
        name: String,
        #[arg(long, value_name = "PROJECT_PATH")]
        project: Option<PathBuf>,
        /// Maximum number of references to print
        #[arg(long, default_value_t = 50)]
        max: usize,
    },
    /// List defined symbols
    List {
        #[arg(long, value_name = "PROJECT_PATH")]
        project: Option<PathBuf>,
        /// Only symbols of this kind (function, constructor, enum, enum_member, macro, globalvar)
        #[arg(long)]
        kind: Option<SymbolKind>,
        /// Case-insensitive substring of the symbol name
        #[arg(long)]
        name: Option<String>,
        /// Case-insensitive substring of the file path
        #[arg(long)]
        file: Option<String>,
        /// Maximum number of symbols to print
        #[arg(long, default_value_t = 100)]
        max: usize,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the symbols defined in one file
    File {
        /// File path, absolute or relative to the project root
        path: PathBuf,
        #[arg(long, value_name = "PROJECT_PATH")]
        project: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct Definitions<'a> {
    symbol: &'a str,
    count: usize,
    definitions: &'a [Symbol],
}

#[derive(Serialize)]
struct References<'a> {
    symbol: &'a str,
    count: usize,
    total: usize,
    truncated: bool,
    references: &'a [SymbolReference],
}

#[derive(Serialize)]
struct SymbolList<'a> {
    count: usize,
    total: usize,
    truncated: bool,
    symbols: &'a [&'a Symbol],
}

#[derive(Serialize)]
struct FileSymbols<'a> {
    file: String,
    count: usize,
    symbols: &'a [&'a Symbol],
}

#[derive(Tabled)]
struct SymbolRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Line")]
    line: usize,
}

impl SymbolRow {
    fn new(symbol: &Symbol, root: &Path) -> Self {
        let path = &symbol.location.file_path;
        let file = path.strip_prefix(root).unwrap_or(path);
        Self {
            name: symbol.name.clone(),
            kind: symbol.kind.to_string(),
            file: file.display().to_string(),
            line: symbol.location.line,
        }
    }
}

fn open_index(project: Option<PathBuf>) -> Result<GmlIndex, Box<dyn std::error::Error>> {
    let root = locate_project_root(project.as_deref())?;
    Ok(GmlIndex::new(root))
}

fn print_json(out: &mut impl Write, value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn run(cmd: SymbolCommands) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cmd, &mut out)
}

pub(crate) fn execute(
    cmd: SymbolCommands,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        SymbolCommands::Build { project, force } => {
            let mut index = open_index(project)?;
            info!("Indexing GML sources under {}...", index.project_root().display());
            let report = index.build(force);
            info!("Index {}: {} symbols, {} references", report.status, report.symbols, report.references);
            print_json(out, &report)
        }
        SymbolCommands::FindDefinition { name, project } => {
            let mut index = open_index(project)?;
            let definitions = index.find_definition(&name);
            print_json(
                out,
                &Definitions {
                    symbol: &name,
                    count: definitions.len(),
                    definitions,
                },
            )
        }
        SymbolCommands::FindReferences { name, project, max } => {
            let mut index = open_index(project)?;
            let references = index.find_references(&name);
            let shown = &references[..references.len().min(max)];
            print_json(
                out,
                &References {
                    symbol: &name,
                    count: shown.len(),
                    total: references.len(),
                    truncated: shown.len() < references.len(),
                    references: shown,
                },
            )
        }
        SymbolCommands::List {
            project,
            kind,
            name,
            file,
            max,
            json,
        } => {
            let mut index = open_index(project)?;
            let root = index.project_root().to_path_buf();
            let filter = SymbolFilter { kind, name, file };
            let symbols = index.list_symbols(&filter);
            let shown = &symbols[..symbols.len().min(max)];

            if json {
                return print_json(
                    out,
                    &SymbolList {
                        count: shown.len(),
                        total: symbols.len(),
                        truncated: shown.len() < symbols.len(),
                        symbols: shown,
                    },
                );
            }

            if shown.is_empty() {
                writeln!(out, "No symbols found.")?;
            } else {
                let rows: Vec<SymbolRow> = shown.iter().map(|s| SymbolRow::new(s, &root)).collect();
                writeln!(out, "{}", Table::new(rows))?;
                if shown.len() < symbols.len() {
                    writeln!(out, "Showing {} of {} symbols.", shown.len(), symbols.len())?;
                }
            }
            Ok(())
        }
        SymbolCommands::File { path, project } => {
            let mut index = open_index(project)?;
            let symbols = index.get_symbols_in_file(&path);
            print_json(
                out,
                &FileSymbols {
                    file: path.display().to_string(),
                    count: symbols.len(),
                    symbols: &symbols,
                },
            )
        }
    }
}
