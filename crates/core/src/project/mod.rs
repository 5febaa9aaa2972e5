pub mod discovery;
pub mod locate;
pub mod paths;

pub use discovery::{SOURCE_DIRS, SOURCE_EXTENSION, discover_source_files, is_source_path};
pub use locate::locate_project_root;
pub use paths::{key_to_path, relative_key, same_file};
