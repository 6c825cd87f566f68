// File persistence for generated artifacts
// Reads never fail the iteration: a missing artifact degrades to a sentinel
// string that flows into scoring instead

use std::fs;
use std::path::Path;
use tracing::debug;

/// Returned by `read` when an artifact does not exist or cannot be read
pub const NOT_FOUND_SENTINEL: &str = "File not found";

/// Storage for the generated library/main/test artifacts
pub trait FileStore: Send + Sync {
    /// Persist content under `dir/filename`, returning a status line
    fn save(&self, content: &str, filename: &str, dir: &Path) -> String;

    /// Read `dir/filename`, or the not-found sentinel when it is missing
    fn read(&self, filename: &str, dir: &Path) -> String;
}

/// Plain filesystem-backed store
#[derive(Debug, Clone, Default)]
pub struct LocalFileStore;

impl FileStore for LocalFileStore {
    fn save(&self, content: &str, filename: &str, dir: &Path) -> String {
        let path = dir.join(filename);
        if let Err(e) = fs::create_dir_all(dir) {
            return format!("Error saving file: {}", e);
        }
        match fs::write(&path, content) {
            Ok(()) => {
                debug!("Saved {} bytes to {}", content.len(), path.display());
                format!("Saved to {}", filename)
            }
            Err(e) => format!("Error saving file: {}", e),
        }
    }

    fn read(&self, filename: &str, dir: &Path) -> String {
        match fs::read_to_string(dir.join(filename)) {
            Ok(content) => content,
            Err(_) => NOT_FOUND_SENTINEL.to_string(),
        }
    }
}
