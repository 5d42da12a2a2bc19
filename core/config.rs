use crate::error::{AppError, Result};
use log;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILENAME: &str = "modextract.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_SPLIT_SIZE_MB: u64 = 10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default = "default_priority")]
    pub priority: Vec<PriorityRule>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Literal base names, or `*<suffix>` patterns matched against the end of the name.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Allowed file extensions, leading dot included.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
    #[serde(default = "default_markup_extension")]
    pub markup_extension: String,
    #[serde(default = "default_markup_roots")]
    pub markup_roots: Vec<String>,
    #[serde(default = "default_max_functions")]
    pub max_functions: usize,
    #[serde(default = "default_max_record_ids")]
    pub max_record_ids: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ManifestConfig {
    #[serde(default = "default_manifest_file")]
    pub file: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PriorityRule {
    pub pattern: String,
    pub rank: u32,
}

impl PriorityRule {
    pub fn new(pattern: impl Into<String>, rank: u32) -> Self {
        Self {
            pattern: pattern.into(),
            rank,
        }
    }
}

/// The tables shipped in `data/defaults.toml`. Every field is required there,
/// so parsing it never falls back to the `default_*` functions below.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuiltinDefaults {
    pub filter: FilterConfig,
    pub render: RenderConfig,
    pub manifest: ManifestConfig,
    pub priority: Vec<PriorityRule>,
}

static BUILTIN_DEFAULTS: Lazy<BuiltinDefaults> = Lazy::new(|| {
    let toml_content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/defaults.toml"));
    toml::from_str(toml_content).expect("Failed to parse embedded data/defaults.toml")
});

pub fn get_builtin_defaults() -> &'static BuiltinDefaults {
    &BUILTIN_DEFAULTS
}

fn default_exclude() -> Vec<String> {
    get_builtin_defaults().filter.exclude.clone()
}
fn default_extensions() -> Vec<String> {
    get_builtin_defaults().filter.extensions.clone()
}
fn default_source_extension() -> String {
    get_builtin_defaults().render.source_extension.clone()
}
fn default_markup_extension() -> String {
    get_builtin_defaults().render.markup_extension.clone()
}
fn default_markup_roots() -> Vec<String> {
    get_builtin_defaults().render.markup_roots.clone()
}
fn default_max_functions() -> usize {
    get_builtin_defaults().render.max_functions
}
fn default_max_record_ids() -> usize {
    get_builtin_defaults().render.max_record_ids
}
fn default_manifest_file() -> String {
    get_builtin_defaults().manifest.file.clone()
}
fn default_priority() -> Vec<PriorityRule> {
    get_builtin_defaults().priority.clone()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            render: RenderConfig::default(),
            manifest: ManifestConfig::default(),
            priority: default_priority(),
        }
    }
}
impl Default for FilterConfig {
    fn default() -> Self {
        get_builtin_defaults().filter.clone()
    }
}
impl Default for RenderConfig {
    fn default() -> Self {
        get_builtin_defaults().render.clone()
    }
}
impl Default for ManifestConfig {
    fn default() -> Self {
        get_builtin_defaults().manifest.clone()
    }
}

/// Expands a leading `~` the way a shell would.
pub fn expand_path(raw: &Path) -> PathBuf {
    let as_str = raw.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&as_str).as_ref())
}

impl Config {
    pub fn resolve_module_root(cli_module_path: &Path) -> Result<PathBuf> {
        let path_to_resolve = expand_path(cli_module_path);
        if !path_to_resolve.exists() {
            return Err(AppError::ModuleNotFound(path_to_resolve));
        }
        path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize module root '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })
    }

    pub fn resolve_config_path(
        cli_config_file: Option<&Path>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(raw) => {
                let path = expand_path(raw);
                if !path.is_file() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = env::current_dir()?.join(DEFAULT_CONFIG_FILENAME);
                if default_path.is_file() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        let config = toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let all_extensions = self.filter.extensions.iter().chain([
            &self.render.source_extension,
            &self.render.markup_extension,
        ]);
        for ext in all_extensions {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(AppError::Config(format!(
                    "Extension '{}' must start with a dot, e.g. '.py'",
                    ext
                )));
            }
        }
        if self.filter.exclude.iter().any(|p| p.is_empty() || p == "*") {
            return Err(AppError::Config(
                "Exclude patterns must not be empty or a bare '*'".to_string(),
            ));
        }
        if self.manifest.file.trim().is_empty() {
            return Err(AppError::Config("Manifest file name is empty".to_string()));
        }
        Ok(())
    }

    pub fn module_name(module_root: &Path) -> String {
        module_root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "module".to_string())
    }

    /// Artifact prefix for a module given as `requested` on the command line
    /// and resolved to `resolved`. The name as given wins, so a symlinked
    /// root keeps the link's name; `.` and `..` fall back to the resolved path.
    pub fn module_name_for(requested: &Path, resolved: &Path) -> String {
        match expand_path(requested).file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => Self::module_name(resolved),
        }
    }
}
