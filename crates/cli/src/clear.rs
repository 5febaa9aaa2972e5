use gmscope_core::GmlIndex;
use gmscope_core::project::locate_project_root;
use std::path::PathBuf;
use tracing::info;

pub fn run(project: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let root = locate_project_root(project.as_deref())?;
    let mut index = GmlIndex::new(root);

    info!("Clearing index cache for project at: {}...", index.project_root().display());
    if index.clear_cache()? {
        info!("Index cache removed.");
    } else {
        info!("No index cache at {}.", index.cache_path().display());
    }
    Ok(())
}
