use byte_unit::{Byte, UnitType};
use colored::*;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use modextract_core::ExtractionReport;

fn readable_size(bytes: u64) -> String {
    Byte::from_u64(bytes)
        .get_appropriate_unit(UnitType::Binary)
        .to_string()
}

/// Extension label shown in the breakdown table.
fn extension_label(extension: &str) -> &str {
    if extension.is_empty() {
        "(none)"
    } else {
        extension
    }
}

pub fn print_report(report: &ExtractionReport) {
    println!();
    println!(
        "{} Module '{}' extracted",
        "✅".green(),
        report.module_name.cyan().bold()
    );
    for path in report.artifacts.all() {
        println!("   {}", path.display().to_string().blue());
    }

    println!();
    println!("{}", " Extraction Summary ".green().bold().underline());
    println!(
        "{:<20} {}",
        "Total Files:".green(),
        report.records.len().to_string().cyan()
    );
    println!(
        "{:<20} {}",
        "Total Size:".green(),
        readable_size(report.total_size()).cyan()
    );

    let breakdown = report.breakdown();
    if breakdown.is_empty() {
        println!("\n{}", "(No files matched the extension filter)".yellow());
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Type").fg(Color::Green),
            Cell::new("Files").fg(Color::Green),
            Cell::new("Size").fg(Color::Green),
        ]);
        for (extension, (files, bytes)) in &breakdown {
            table.add_row(vec![
                Cell::new(extension_label(extension)).fg(Color::Cyan),
                Cell::new(files).set_alignment(CellAlignment::Right),
                Cell::new(readable_size(*bytes))
                    .set_alignment(CellAlignment::Right)
                    .fg(Color::DarkGrey),
            ]);
        }
        println!("{table}");
    }

    if !report.issues.is_empty() {
        println!(
            "{} {} file(s) had recoverable problems; see 'errors' in {}",
            "⚠".yellow(),
            report.issues.len(),
            report.artifacts.summary.display()
        );
    }
    println!();
}
