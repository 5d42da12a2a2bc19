use crate::checksum::{CHECKSUM_ERROR, fingerprint};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::filter::{PathFilter, dotted_extension};
use crate::manifest::{ManifestInfo, load_manifest};
use crate::output_formats::{
    ExtractionSummary, FileIndex, FileIssue, FileRecord, IssueStage, Statistics, bytes_to_mb,
    write_json,
};
use crate::priority::PriorityResolver;
use crate::render::ContentRenderer;
use crate::walk::{DirectoryEntry, TreeWalker};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use log;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SUMMARY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Paths of the four files written by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub structure: PathBuf,
    pub content: PathBuf,
    pub summary: PathBuf,
    pub index: PathBuf,
}

impl Artifacts {
    fn for_module(output_dir: &Path, module_name: &str) -> Self {
        Self {
            structure: output_dir.join(format!("{}_structure.txt", module_name)),
            content: output_dir.join(format!("{}_content.txt", module_name)),
            summary: output_dir.join(format!("{}_summary.json", module_name)),
            index: output_dir.join(format!("{}_index.json", module_name)),
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [&self.structure, &self.content, &self.summary, &self.index]
    }
}

/// Everything accumulated by one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub module_name: String,
    pub generated_at: DateTime<Local>,
    pub manifest: ManifestInfo,
    /// In content-bundle order.
    pub records: Vec<FileRecord>,
    pub issues: Vec<FileIssue>,
    pub artifacts: Artifacts,
}

impl ExtractionReport {
    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }

    /// Files per extension in first-seen order; extensionless files count
    /// under `""`.
    pub fn file_types(&self) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        for record in &self.records {
            *counts.entry(record.extension.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Extension to (files, bytes), first-seen order.
    pub fn breakdown(&self) -> IndexMap<String, (usize, u64)> {
        let mut totals: IndexMap<String, (usize, u64)> = IndexMap::new();
        for record in &self.records {
            let slot = totals.entry(record.extension.clone()).or_insert((0, 0));
            slot.0 += 1;
            slot.1 += record.size_bytes;
        }
        totals
    }

    pub fn summary(&self) -> ExtractionSummary {
        let total_size_bytes = self.total_size();
        ExtractionSummary {
            module_name: self.module_name.clone(),
            extraction_date: self.generated_at.format(SUMMARY_TIME_FORMAT).to_string(),
            module_info: self.manifest.clone(),
            statistics: Statistics {
                total_files: self.records.len(),
                total_size_bytes,
                total_size_mb: bytes_to_mb(total_size_bytes),
                file_types: self.file_types(),
            },
            dependencies: self.manifest.dependencies(),
            version: self.manifest.version(),
            author: self.manifest.author(),
            category: self.manifest.category(),
            errors: self.issues.clone(),
        }
    }

    pub fn index(&self) -> FileIndex<'_> {
        FileIndex {
            module: &self.module_name,
            files: &self.records,
            total_files: self.records.len(),
            total_size: self.total_size(),
        }
    }
}

/// Drives one module through walk, ordering, rendering and the four
/// artifact writers.
#[derive(Debug)]
pub struct Extractor {
    module_root: PathBuf,
    module_name: String,
    output_dir: PathBuf,
    config: Config,
    resolver: PriorityResolver,
}

impl Extractor {
    /// Creates the output directory if needed. The priority table is compiled
    /// here so a bad pattern fails before anything is written.
    pub fn new(module_root: PathBuf, output_dir: PathBuf, config: Config) -> Result<Self> {
        let resolver = PriorityResolver::new(&config.priority)?;
        fs::create_dir_all(&output_dir).map_err(|e| AppError::DirCreation {
            path: output_dir.clone(),
            source: e,
        })?;
        let module_name = Config::module_name(&module_root);
        log::debug!(
            "Extractor ready for '{}' (root: {}, output: {})",
            module_name,
            module_root.display(),
            output_dir.display()
        );
        Ok(Self {
            module_root,
            module_name,
            output_dir,
            config,
            resolver,
        })
    }

    /// Overrides the artifact prefix, which otherwise is the root's last
    /// path component.
    pub fn with_module_name(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = module_name.into();
        self
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn extract(&self) -> Result<ExtractionReport> {
        let generated_at = Local::now();
        let stamp = generated_at.format(HEADER_TIME_FORMAT).to_string();
        let artifacts = Artifacts::for_module(&self.output_dir, &self.module_name);
        let mut issues = Vec::new();

        log::info!("Extracting module '{}'", self.module_name);
        let (manifest, manifest_issue) =
            load_manifest(&self.module_root, &self.config.manifest.file);
        issues.extend(manifest_issue);

        let walker = TreeWalker::new(PathFilter::new(&self.config.filter));
        let outcome = walker.walk(&self.module_root);
        issues.extend(outcome.issues.iter().cloned());

        let structure = render_structure(&self.module_name, &stamp, &outcome.entries);
        fs::write(&artifacts.structure, structure).map_err(|e| AppError::FileWrite {
            path: artifacts.structure.clone(),
            source: e,
        })?;
        log::info!("Wrote {}", artifacts.structure.display());

        let files = self.ordered_files(&outcome.entries);
        let records = self.write_content(&artifacts.content, &stamp, &files, &mut issues)?;
        log::info!(
            "Wrote {} ({} files)",
            artifacts.content.display(),
            records.len()
        );

        let report = ExtractionReport {
            module_name: self.module_name.clone(),
            generated_at,
            manifest,
            records,
            issues,
            artifacts,
        };

        write_json(&report.artifacts.summary, &report.summary())?;
        log::info!("Wrote {}", report.artifacts.summary.display());
        write_json(&report.artifacts.index, &report.index())?;
        log::info!("Wrote {}", report.artifacts.index.display());

        if !report.issues.is_empty() {
            log::warn!(
                "Extraction finished with {} recoverable issue(s)",
                report.issues.len()
            );
        }
        Ok(report)
    }

    /// Files only, stable-sorted by rank so walk order breaks ties.
    fn ordered_files<'a>(&self, entries: &'a [DirectoryEntry]) -> Vec<&'a DirectoryEntry> {
        let mut files: Vec<(u32, &DirectoryEntry)> = entries
            .iter()
            .filter(|e| e.is_file())
            .map(|e| (self.resolver.priority_of(&e.relative_path), e))
            .collect();
        files.sort_by_key(|(rank, _)| *rank);
        files.into_iter().map(|(_, e)| e).collect()
    }

    fn write_content(
        &self,
        content_path: &Path,
        stamp: &str,
        files: &[&DirectoryEntry],
        issues: &mut Vec<FileIssue>,
    ) -> Result<Vec<FileRecord>> {
        let write_err = |e: std::io::Error| AppError::FileWrite {
            path: content_path.to_path_buf(),
            source: e,
        };
        let file = File::create(content_path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        write!(
            writer,
            "# {} module content\n# Generated: {}\n# Total files: {}\n\n",
            self.module_name,
            stamp,
            files.len()
        )
        .map_err(write_err)?;

        let renderer = ContentRenderer::new(self.config.render.clone());
        let mut records = Vec::with_capacity(files.len());
        for entry in files {
            let size_bytes = entry.size_bytes.unwrap_or(0);
            let section = renderer.render(&entry.full_path, &entry.relative_path, size_bytes);
            writer
                .write_all(section.text.as_bytes())
                .map_err(write_err)?;
            if let Some(reason) = section.read_error {
                issues.push(FileIssue::new(
                    entry.relative_path.clone(),
                    IssueStage::Read,
                    reason,
                ));
            }

            let checksum = match fingerprint(&entry.full_path) {
                Ok(sum) => sum,
                Err(e) => {
                    log::warn!("Checksum failed for {}: {}", entry.relative_path, e);
                    issues.push(FileIssue::new(
                        entry.relative_path.clone(),
                        IssueStage::Checksum,
                        e.to_string(),
                    ));
                    CHECKSUM_ERROR.to_string()
                }
            };

            records.push(FileRecord {
                relative_path: entry.relative_path.clone(),
                size_bytes,
                extension: dotted_extension(&entry.full_path),
                checksum,
            });
        }
        writer.flush().map_err(write_err)?;
        Ok(records)
    }
}

/// Indented listing: two spaces per depth level, `name/` for directories and
/// `name (x.xKB)` for files.
pub fn render_structure(module_name: &str, stamp: &str, entries: &[DirectoryEntry]) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "# {} directory structure\n# Generated: {}\n\n",
        module_name, stamp
    );
    for entry in entries {
        let indent = "  ".repeat(entry.depth);
        if entry.is_dir {
            let _ = writeln!(out, "{}{}/", indent, entry.name);
        } else {
            let size_kb = entry.size_bytes.unwrap_or(0) as f64 / 1024.0;
            let _ = writeln!(out, "{}{} ({:.1}KB)", indent, entry.name, size_kb);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rel: &str, depth: usize, is_dir: bool, size: Option<u64>) -> DirectoryEntry {
        DirectoryEntry {
            name: rel.rsplit('/').next().unwrap().to_string(),
            full_path: PathBuf::from(rel),
            relative_path: rel.to_string(),
            depth,
            is_dir,
            size_bytes: size,
        }
    }

    fn record(path: &str, ext: &str, size: u64) -> FileRecord {
        FileRecord {
            relative_path: path.to_string(),
            size_bytes: size,
            extension: ext.to_string(),
            checksum: "00000000".to_string(),
        }
    }

    #[test]
    fn structure_listing_indents_by_depth() {
        let entries = vec![
            entry("__manifest__.py", 0, false, Some(512)),
            entry("models", 0, true, None),
            entry("models/sale.py", 1, false, Some(2048)),
            entry("static/src/js", 2, true, None),
        ];
        let out = render_structure("sale", "2024-01-02 03:04:05", &entries);
        assert_eq!(
            out,
            "# sale directory structure\n# Generated: 2024-01-02 03:04:05\n\n\
             __manifest__.py (0.5KB)\nmodels/\n  sale.py (2.0KB)\n    js/\n"
        );
    }

    #[test]
    fn report_aggregates_by_extension_in_first_seen_order() {
        let dir = tempfile::tempdir().unwrap();
        let report = ExtractionReport {
            module_name: "sale".to_string(),
            generated_at: Local::now(),
            manifest: ManifestInfo::default(),
            records: vec![
                record("__manifest__.py", ".py", 10),
                record("views/a.xml", ".xml", 5),
                record("models/b.py", ".py", 20),
                record("LICENSE", "", 1),
            ],
            issues: Vec::new(),
            artifacts: Artifacts::for_module(dir.path(), "sale"),
        };
        assert_eq!(report.total_size(), 36);
        let types: Vec<_> = report.file_types().into_iter().collect();
        assert_eq!(
            types,
            vec![
                (".py".to_string(), 2),
                (".xml".to_string(), 1),
                ("".to_string(), 1)
            ]
        );
        assert_eq!(report.breakdown()[".py"], (2, 30));

        let summary = report.summary();
        assert_eq!(summary.statistics.total_files, 4);
        assert_eq!(summary.statistics.total_size_bytes, 36);
        assert_eq!(summary.version, serde_json::json!("unknown"));
        let index = report.index();
        assert_eq!(index.total_files, 4);
        assert_eq!(index.total_size, 36);
    }

    #[test]
    fn artifacts_are_prefixed_with_module_name() {
        let artifacts = Artifacts::for_module(Path::new("out"), "stock");
        assert_eq!(artifacts.structure, PathBuf::from("out/stock_structure.txt"));
        assert_eq!(artifacts.index, PathBuf::from("out/stock_index.json"));
        assert_eq!(artifacts.all().len(), 4);
    }

    #[test]
    fn output_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        Extractor::new(dir.path().to_path_buf(), out.clone(), Config::default()).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn module_name_override_renames_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sale_v17");
        fs::create_dir_all(&root).unwrap();
        let out = dir.path().join("out");
        let report = Extractor::new(root, out.clone(), Config::default())
            .unwrap()
            .with_module_name("sale")
            .extract()
            .unwrap();
        assert_eq!(report.module_name, "sale");
        assert!(out.join("sale_index.json").is_file());
        assert!(!out.join("sale_v17_index.json").exists());
    }

    #[test]
    fn invalid_priority_pattern_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.priority.push(crate::config::PriorityRule::new("models/[*.py", 3));
        let result = Extractor::new(dir.path().to_path_buf(), dir.path().join("o"), config);
        assert!(matches!(result, Err(AppError::Glob(_))));
    }
}
