pub mod local;

use tokio::fs::File;

/// An opened upload ready to be streamed back.
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    pub file: File,
}
