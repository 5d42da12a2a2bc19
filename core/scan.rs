//! Best-effort structural scans used to annotate rendered files.
//!
//! Scanners never fail loudly: anything they cannot make sense of yields
//! `None` and the caller falls back to plain content.

pub mod markup;
pub mod python;

pub use markup::{MarkupSummary, scan_markup};
pub use python::{DeclarationSummary, literal_eval, scan_declarations};
