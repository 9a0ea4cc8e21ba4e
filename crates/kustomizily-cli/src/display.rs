//! Display formatting for CLI output

use std::path::Path;

use console::style;
use kustomizily_core::BuildSummary;

/// Directory as shown to the user, `.` for the output root
fn directory_label(name: &str) -> &str {
    if name.is_empty() { "." } else { name }
}

/// Print the per-directory summary to stderr
pub fn print_summary(summary: &BuildSummary, output: &Path, dry_run: bool) {
    for directory in &summary.directories {
        eprintln!(
            "  {} {} {}",
            style("→").blue(),
            style(directory_label(&directory.name)).cyan(),
            style(format!("({} files)", directory.files.len())).dim()
        );
    }

    let verb = if dry_run { "Would write" } else { "Wrote" };
    eprintln!(
        "{} {} {} files in {} directories to {}",
        style("✓").green().bold(),
        verb,
        summary.file_count(),
        summary.directories.len(),
        style(output.display()).dim()
    );

    if summary.skipped() > 0 {
        eprintln!(
            "  {} skipped {} document(s) without kind, apiVersion or name",
            style("!").yellow(),
            summary.skipped()
        );
    }
}
