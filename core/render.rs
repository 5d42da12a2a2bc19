use crate::config::RenderConfig;
use crate::filter::dotted_extension;
use crate::scan::{DeclarationSummary, MarkupSummary, scan_declarations, scan_markup};
use log;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const SECTION_RULE_WIDTH: usize = 80;
pub const BINARY_MARKER: &str = "CONTENT: [Binary file - skipped]";
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStrategy {
    Declarations,
    Markup,
    Generic,
}

/// A rendered file section plus the read failure, if any, that it reports
/// inline.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSection {
    pub text: String,
    pub read_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContentRenderer {
    settings: RenderConfig,
}

impl ContentRenderer {
    pub fn new(settings: RenderConfig) -> Self {
        Self { settings }
    }

    pub fn strategy_for(&self, extension: &str) -> RenderStrategy {
        if extension == self.settings.source_extension {
            RenderStrategy::Declarations
        } else if extension == self.settings.markup_extension {
            RenderStrategy::Markup
        } else {
            RenderStrategy::Generic
        }
    }

    pub fn render(&self, path: &Path, relative_path: &str, size_bytes: u64) -> RenderedSection {
        let extension = dotted_extension(path);
        let rule = "=".repeat(SECTION_RULE_WIDTH);
        let mut text = String::new();
        let _ = writeln!(text, "\n{}", rule);
        let _ = writeln!(text, "FILE: {}", relative_path);
        let _ = writeln!(text, "SIZE: {} bytes", size_bytes);
        let _ = writeln!(text, "TYPE: {}", extension);

        let strategy = self.strategy_for(&extension);
        log::trace!("Rendering {} with {:?}", relative_path, strategy);
        let read_error = match strategy {
            RenderStrategy::Declarations => {
                self.render_annotated(&mut text, path, relative_path, |content, out| {
                    if let Some(summary) = scan_declarations(content, relative_path) {
                        self.write_declarations(out, &summary);
                    }
                })
            }
            RenderStrategy::Markup => {
                self.render_annotated(&mut text, path, relative_path, |content, out| {
                    if let Some(summary) = scan_markup(content, &self.settings.markup_roots) {
                        self.write_markup(out, &summary);
                    }
                })
            }
            RenderStrategy::Generic => render_generic(&mut text, path, relative_path),
        };

        let _ = writeln!(text, "\n{}", rule);
        RenderedSection { text, read_error }
    }

    /// Text that must decode as UTF-8; anything else is reported as a read
    /// error.
    fn render_annotated<F>(
        &self,
        text: &mut String,
        path: &Path,
        relative_path: &str,
        annotate: F,
    ) -> Option<String>
    where
        F: FnOnce(&str, &mut String),
    {
        let content = match read_text(path) {
            Ok(content) => content,
            Err(reason) => {
                log::warn!("Unable to read {}: {}", relative_path, reason);
                let _ = writeln!(text, "ERROR: Unable to read file - {}", reason);
                return Some(reason);
            }
        };
        annotate(&content, text);
        text.push_str("CONTENT:\n");
        text.push_str(&content);
        None
    }

    fn write_declarations(&self, out: &mut String, summary: &DeclarationSummary) {
        if summary.is_empty() {
            return;
        }
        out.push_str("PARSED_INFO:\n");
        if !summary.classes.is_empty() {
            let _ = writeln!(out, "  Classes: {}", summary.classes.join(", "));
        }
        if !summary.functions.is_empty() {
            let _ = writeln!(
                out,
                "  Functions: {}",
                truncated_list(&summary.functions, self.settings.max_functions)
            );
        }
    }

    fn write_markup(&self, out: &mut String, summary: &MarkupSummary) {
        if summary.is_empty() {
            return;
        }
        out.push_str("PARSED_INFO:\n");
        if summary.records() > 0 {
            let _ = writeln!(out, "  Records: {}", summary.records());
            let _ = writeln!(
                out,
                "  Record IDs: {}",
                truncated_list(&summary.record_ids, self.settings.max_record_ids)
            );
        }
        if summary.templates > 0 {
            let _ = writeln!(out, "  Templates: {}", summary.templates);
        }
    }
}

/// Content that does not decode as UTF-8 is replaced by the binary marker.
fn render_generic(text: &mut String, path: &Path, relative_path: &str) -> Option<String> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Unable to read {}: {}", relative_path, e);
            let _ = writeln!(text, "ERROR: Unable to read file - {}", e);
            return Some(e.to_string());
        }
    };
    match String::from_utf8(bytes) {
        Ok(content) => {
            text.push_str("CONTENT:\n");
            text.push_str(&content);
        }
        Err(_) => {
            log::debug!("Skipping binary content of {}", relative_path);
            text.push_str(BINARY_MARKER);
            text.push('\n');
        }
    }
    None
}

fn read_text(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| format!("content is not valid UTF-8 ({})", e.utf8_error()))
}

/// `a, b, c` limited to `limit` items, followed by `...` when items were cut.
fn truncated_list(items: &[String], limit: usize) -> String {
    let shown = items.iter().take(limit).map(String::as_str).collect::<Vec<_>>();
    let mut line = shown.join(", ");
    if items.len() > limit {
        line.push_str(ELLIPSIS);
    }
    line
}
