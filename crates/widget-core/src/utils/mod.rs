//! Filesystem helpers used by module directory checks and widget discovery.
pub mod fs;

use std::path::Path;

pub use fs::{dir_has_entries, find_files, find_files_with_extensions};

/// File name without its extension, as UTF-8
pub fn file_stem<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}
