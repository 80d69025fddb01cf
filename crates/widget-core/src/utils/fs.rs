use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Find files recursively in a directory that match a predicate
pub fn find_files<P, F>(path: P, predicate: &F) -> io::Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
    F: Fn(&Path) -> bool + ?Sized,
{
    let mut result = Vec::new();

    if !path.as_ref().exists() {
        return Ok(result);
    }

    if path.as_ref().is_file() {
        if predicate(path.as_ref()) {
            result.push(path.as_ref().to_path_buf());
        }
        return Ok(result);
    }

    let mut entries = fs::read_dir(path)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let entry_path = entry.path();

        if entry_path.is_file() {
            if predicate(&entry_path) {
                result.push(entry_path);
            }
        } else if entry_path.is_dir() {
            let mut sub_results = find_files(&entry_path, predicate)?;
            result.append(&mut sub_results);
        }
    }

    Ok(result)
}

/// Find files whose extension is one of `extensions` (case-insensitive)
pub fn find_files_with_extensions<P: AsRef<Path>>(path: P, extensions: &[&str]) -> io::Result<Vec<PathBuf>> {
    let wanted: Vec<String> = extensions.iter().map(|ext| ext.to_lowercase()).collect();
    find_files(path, &move |p: &Path| match p.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            wanted.iter().any(|w| *w == ext)
        }
        None => false,
    })
}

/// True when `path` is a directory holding at least one entry
pub fn dir_has_entries<P: AsRef<Path>>(path: P) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
