use gmscope_core::index::{GmlIndex, SymbolFilter};
use gmscope_core::project::locate_project_root;
use gmscope_core::{Symbol, SymbolKind, SymbolReference};
use rmcp::{
    ErrorData as McpError,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, InitializeResult, ServerCapabilities},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

pub mod stdio;

const DEFAULT_MAX_REFERENCES: usize = 50;
const DEFAULT_MAX_SYMBOLS: usize = 100;

type SharedIndex = Arc<Mutex<GmlIndex>>;

/// MCP front end for the GML symbol index.
///
/// Holds one index per resolved project root for the life of the server, so
/// repeated queries hit the in-memory state and the cache fast path.
#[derive(Clone)]
pub struct McpServer {
    pub(crate) tool_router: ToolRouter<Self>,
    default_root: Option<PathBuf>,
    indices: Arc<RwLock<HashMap<PathBuf, SharedIndex>>>,
}

#[derive(Deserialize, JsonSchema)]
pub struct BuildIndexArgs {
    /// Path to the GameMaker project (folder with the .yyp, or anything below it). Defaults to the server's project.
    pub project_root: Option<String>,
    /// If true, rebuild from scratch. If false, reuse the cache and rescan only changed files.
    #[serde(default)]
    pub force: bool,
}

#[derive(Deserialize, JsonSchema)]
pub struct FindDefinitionArgs {
    /// Name of the symbol to find.
    pub symbol_name: String,
    /// Path to the GameMaker project. Defaults to the server's project.
    pub project_root: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct FindReferencesArgs {
    /// Name of the symbol to find references for.
    pub symbol_name: String,
    /// Path to the GameMaker project. Defaults to the server's project.
    pub project_root: Option<String>,
    /// Maximum number of references to return (default: 50).
    pub max_results: Option<usize>,
}

#[derive(Deserialize, JsonSchema)]
pub struct ListSymbolsArgs {
    /// Path to the GameMaker project. Defaults to the server's project.
    pub project_root: Option<String>,
    /// Filter by symbol kind: function, constructor, enum, enum_member, macro, globalvar.
    pub kind: Option<String>,
    /// Filter symbols by name (case-insensitive substring match).
    pub name_filter: Option<String>,
    /// Filter symbols by file path (case-insensitive substring match).
    pub file_filter: Option<String>,
    /// Maximum number of symbols to return (default: 100).
    pub max_results: Option<usize>,
}

#[derive(Deserialize, JsonSchema)]
pub struct SymbolsInFileArgs {
    /// File to inspect, absolute or relative to the project root.
    pub file_path: String,
    /// Path to the GameMaker project. Defaults to the server's project.
    pub project_root: Option<String>,
}

#[derive(Serialize)]
struct DefinitionsResponse<'a> {
    symbol: &'a str,
    count: usize,
    definitions: &'a [Symbol],
}

#[derive(Serialize)]
struct ReferencesResponse<'a> {
    symbol: &'a str,
    count: usize,
    total: usize,
    truncated: bool,
    references: &'a [SymbolReference],
}

#[derive(Serialize)]
struct SymbolListResponse<'a> {
    count: usize,
    total: usize,
    truncated: bool,
    symbols: &'a [&'a Symbol],
}

#[derive(Serialize)]
struct FileSymbolsResponse<'a> {
    file: &'a str,
    count: usize,
    symbols: &'a [&'a Symbol],
}

fn internal(e: impl std::fmt::Display) -> McpError {
    McpError::internal_error(e.to_string(), None)
}

#[tool_router]
impl McpServer {
    pub fn new(default_root: Option<PathBuf>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            default_root,
            indices: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolves the project directory and returns its long-lived index.
    pub(crate) async fn index_for(&self, project_root: Option<String>) -> Result<SharedIndex, McpError> {
        let hint = project_root
            .map(PathBuf::from)
            .or_else(|| self.default_root.clone());
        let root = tokio::task::spawn_blocking(move || locate_project_root(hint.as_deref()))
            .await
            .map_err(internal)?
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        if let Some(index) = self.indices.read().await.get(&root) {
            return Ok(index.clone());
        }

        let mut indices = self.indices.write().await;
        let index = indices.entry(root.clone()).or_insert_with(|| {
            tracing::info!("Opening GML index for {}", root.display());
            Arc::new(Mutex::new(GmlIndex::new(root.clone())))
        });
        Ok(index.clone())
    }

    /// Runs `op` against the project's index on a blocking thread and wraps
    /// the JSON it produces as the tool result.
    pub(crate) async fn with_index<F>(
        &self,
        project_root: Option<String>,
        op: F,
    ) -> Result<CallToolResult, McpError>
    where
        F: FnOnce(&mut GmlIndex) -> serde_json::Result<serde_json::Value> + Send + 'static,
    {
        let index = self.index_for(project_root).await?;

        let value = tokio::task::spawn_blocking(move || {
            let mut guard = index
                .lock()
                .map_err(|_| McpError::internal_error("GML index lock poisoned", None))?;
            op(&mut guard).map_err(internal)
        })
        .await
        .map_err(internal)??;

        let json_str = serde_json::to_string_pretty(&value).map_err(internal)?;
        Ok(CallToolResult::success(vec![Content::text(json_str)]))
    }

    #[tool(
        description = "Build or rebuild the GML symbol index for code intelligence features. Reuses the on-disk cache and rescans only changed files unless force is true."
    )]
    pub async fn gm_build_index(
        &self,
        params: Parameters<BuildIndexArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let force = args.force;
        self.with_index(args.project_root, move |index| {
            serde_json::to_value(index.build(force))
        })
        .await
    }

    #[tool(description = "Find definition(s) of a GML symbol (function, constructor, enum, enum member, macro, globalvar).")]
    pub async fn gm_find_definition(
        &self,
        params: Parameters<FindDefinitionArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let name = args.symbol_name;
        self.with_index(args.project_root, move |index| {
            let definitions = index.find_definition(&name);
            serde_json::to_value(DefinitionsResponse {
                symbol: &name,
                count: definitions.len(),
                definitions,
            })
        })
        .await
    }

    #[tool(description = "Find all references to a GML symbol, including built-in functions with no definition in the project.")]
    pub async fn gm_find_references(
        &self,
        params: Parameters<FindReferencesArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let name = args.symbol_name;
        let max = args.max_results.unwrap_or(DEFAULT_MAX_REFERENCES);
        self.with_index(args.project_root, move |index| {
            let references = index.find_references(&name);
            let shown = &references[..references.len().min(max)];
            serde_json::to_value(ReferencesResponse {
                symbol: &name,
                count: shown.len(),
                total: references.len(),
                truncated: shown.len() < references.len(),
                references: shown,
            })
        })
        .await
    }

    #[tool(
        description = "List GML symbols in the project sorted by name, optionally filtered by kind, name substring and file path substring."
    )]
    pub async fn gm_list_symbols(
        &self,
        params: Parameters<ListSymbolsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let kind = args
            .kind
            .filter(|k| !k.trim().is_empty())
            .map(|k| k.parse::<SymbolKind>())
            .transpose()
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let filter = SymbolFilter {
            kind,
            name: args.name_filter,
            file: args.file_filter,
        };
        let max = args.max_results.unwrap_or(DEFAULT_MAX_SYMBOLS);

        self.with_index(args.project_root, move |index| {
            let symbols = index.list_symbols(&filter);
            let shown = &symbols[..symbols.len().min(max)];
            serde_json::to_value(SymbolListResponse {
                count: shown.len(),
                total: symbols.len(),
                truncated: shown.len() < symbols.len(),
                symbols: shown,
            })
        })
        .await
    }

    #[tool(description = "List the GML symbols defined in one file, in line order.")]
    pub async fn gm_symbols_in_file(
        &self,
        params: Parameters<SymbolsInFileArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let file = args.file_path;
        self.with_index(args.project_root, move |index| {
            let symbols = index.get_symbols_in_file(Path::new(&file));
            serde_json::to_value(FileSymbolsResponse {
                file: &file,
                count: symbols.len(),
                symbols: &symbols,
            })
        })
        .await
    }
}

#[tool_handler]
impl rmcp::ServerHandler for McpServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: rmcp::model::ProtocolVersion::V_2024_11_05,
            server_info: Implementation {
                name: "gmscope".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "GML code intelligence for GameMaker projects. Call gm_build_index once, then use \
                 gm_find_definition, gm_find_references, gm_list_symbols and gm_symbols_in_file."
                    .into(),
            ),
            ..Default::default()
        }
    }
}
