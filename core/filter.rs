use crate::config::FilterConfig;
use log;
use std::collections::HashSet;
use std::path::Path;

/// Decides which entries of a module tree are collected.
///
/// Exclusion patterns come in two forms: a literal base name (`.git`,
/// `node_modules`) or `*<suffix>` (`*.pyc`). Extension checks apply to files
/// only, so directories are never dropped for lacking an allowed suffix.
#[derive(Debug, Clone)]
pub struct PathFilter {
    exact_names: HashSet<String>,
    suffixes: Vec<String>,
    extensions: HashSet<String>,
}

impl PathFilter {
    pub fn new(config: &FilterConfig) -> Self {
        let mut exact_names = HashSet::new();
        let mut suffixes = Vec::new();
        for pattern in &config.exclude {
            match pattern.strip_prefix('*') {
                Some(suffix) => suffixes.push(suffix.to_string()),
                None => {
                    exact_names.insert(pattern.clone());
                }
            }
        }
        Self {
            exact_names,
            suffixes,
            extensions: config.extensions.iter().cloned().collect(),
        }
    }

    pub fn should_exclude(&self, name: &str, is_dir: bool) -> bool {
        if self.exact_names.contains(name) {
            log::trace!("Excluded by name: {}", name);
            return true;
        }
        if self.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str())) {
            log::trace!("Excluded by suffix pattern: {}", name);
            return true;
        }
        if !is_dir && !self.extensions.contains(&dotted_extension(Path::new(name))) {
            log::trace!("Excluded by extension: {}", name);
            return true;
        }
        false
    }
}

/// The last `.suffix` of a file name, dot included; empty when there is none.
/// Dot files such as `.DS_Store` have no extension.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
