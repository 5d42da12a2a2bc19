use crate::filter::PathFilter;
use crate::output_formats::{FileIssue, IssueStage};
use log;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub name: String,
    pub full_path: PathBuf,
    /// Path below the module root, always `/`-separated.
    pub relative_path: String,
    /// Zero for direct children of the module root.
    pub depth: usize,
    pub is_dir: bool,
    pub size_bytes: Option<u64>,
}

impl DirectoryEntry {
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }
}

#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub entries: Vec<DirectoryEntry>,
    pub issues: Vec<FileIssue>,
}

impl WalkOutcome {
    pub fn files(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.iter().filter(|e| e.is_file())
    }
}

/// Depth-first, pre-order listing of a module tree with siblings sorted by
/// name. Excluded directories are pruned together with their subtree.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    filter: PathFilter,
}

impl TreeWalker {
    pub fn new(filter: PathFilter) -> Self {
        Self { filter }
    }

    pub fn walk(&self, root: &Path) -> WalkOutcome {
        log::info!("Walking module directory: {}", root.display());
        let mut outcome = WalkOutcome::default();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !self.filter.should_exclude(&name, entry.file_type().is_dir())
            });

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let at = e
                        .path()
                        .map_or_else(|| root.display().to_string(), |p| p.display().to_string());
                    log::warn!("Cannot list {}: {}. Skipping its contents.", at, e);
                    outcome.issues.push(FileIssue::new(
                        relative_display(root, e.path().unwrap_or(root)),
                        IssueStage::Walk,
                        e.to_string(),
                    ));
                    continue;
                }
            };

            let path = entry.path();
            let relative_path = relative_display(root, path);
            let is_dir = entry.file_type().is_dir();
            let size_bytes = if is_dir {
                None
            } else {
                match entry.metadata() {
                    Ok(meta) => Some(meta.len()),
                    Err(e) => {
                        log::warn!("Cannot stat {}: {}", path.display(), e);
                        outcome.issues.push(FileIssue::new(
                            relative_path.clone(),
                            IssueStage::Walk,
                            e.to_string(),
                        ));
                        Some(0)
                    }
                }
            };
            log::trace!("Walked path: {}", relative_path);

            outcome.entries.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                full_path: path.to_path_buf(),
                relative_path,
                depth: entry.depth().saturating_sub(1),
                is_dir,
                size_bytes,
            });
        }

        log::info!(
            "Directory walk complete. Kept {} entries ({} files).",
            outcome.entries.len(),
            outcome.files().count()
        );
        outcome
    }
}

/// `/`-joined path of `path` relative to `root`, falling back to the full path.
pub fn relative_display(root: &Path, path: &Path) -> String {
    let relative = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.join("/")
}
