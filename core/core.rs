pub mod checksum;
pub mod config;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod output_formats;
pub mod priority;
pub mod render;
pub mod report;
pub mod scan;
pub mod walk;

pub use checksum::{CHECKSUM_ERROR, fingerprint};
pub use config::{
    Config, DEFAULT_CONFIG_FILENAME, DEFAULT_OUTPUT_DIR, DEFAULT_SPLIT_SIZE_MB, FilterConfig,
    ManifestConfig, PriorityRule, RenderConfig,
};
pub use error::{AppError, Result};
pub use filter::PathFilter;
pub use manifest::{ManifestInfo, load_manifest};
pub use output_formats::{
    ExtractionSummary, FileIndex, FileIssue, FileRecord, IssueStage, Statistics,
};
pub use priority::{PriorityResolver, UNRANKED};
pub use render::{ContentRenderer, RenderedSection};
pub use report::{Artifacts, ExtractionReport, Extractor, render_structure};
pub use walk::{DirectoryEntry, TreeWalker, WalkOutcome};
