use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::kernel::constants::WIDGET_TEMPLATE_EXTENSIONS;
use crate::kernel::error::{Error, Result};
use crate::utils::{file_stem, find_files_with_extensions};

/// Widget templates found under the widgets directory, keyed by file stem.
///
/// Rendering is left to the template engine; the catalog only resolves
/// names to files. When two files share a stem the first one in path order
/// wins and the other is logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetCatalog {
    templates: BTreeMap<String, PathBuf>,
}

impl WidgetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every `.hbs`/`.html` file below `dir`.
    pub fn scan(dir: &Path) -> Result<Self> {
        let files = find_files_with_extensions(dir, WIDGET_TEMPLATE_EXTENSIONS)
            .map_err(|e| Error::io(e, "scan widgets", dir.to_path_buf()))?;

        let mut catalog = Self::new();
        for path in files {
            let Some(name) = file_stem(&path) else {
                continue;
            };
            if let Some(existing) = catalog.templates.get(&name) {
                log::warn!(
                    "Widget '{}' at {} shadowed by {}",
                    name,
                    path.display(),
                    existing.display()
                );
                continue;
            }
            catalog.templates.insert(name, path);
        }
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.templates.get(name).map(PathBuf::as_path)
    }

    /// Template source for `name`
    pub async fn source(&self, name: &str) -> Result<Option<String>> {
        let Some(path) = self.get(name) else {
            return Ok(None);
        };
        tokio::fs::read_to_string(path)
            .await
            .map(Some)
            .map_err(|e| Error::io(e, "read widget", path.to_path_buf()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
