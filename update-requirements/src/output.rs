use crate::error::UpdateError;
use crate::processor::FileReport;
use colored::Colorize;
use requirements_core::UpdateSeverity;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Where processed documents go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    /// Replace the source file
    InPlace,
}

impl Sink {
    pub fn new(inplace: bool) -> Self {
        if inplace { Sink::InPlace } else { Sink::Stdout }
    }

    pub fn emit(self, source: &Path, contents: &str) -> Result<(), UpdateError> {
        match self {
            Sink::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(contents.as_bytes())
                    .and_then(|()| stdout.flush())
                    .map_err(|e| UpdateError::write("<stdout>", e))
            }
            Sink::InPlace => {
                tracing::info!("updating {} in-place", source.display());
                write_atomic(source, contents).map_err(|e| UpdateError::write(source, e))
            }
        }
    }
}

/// Replace `path` with `contents` without ever leaving it truncated
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    write_atomic_with(path, |file| file.write_all(contents.as_bytes()))
}

/// Write through `fill` into a temp file next to `path`, then rename it over
/// `path`. If `fill` or any later step fails, `path` is untouched and the
/// temp file is removed when it drops.
pub fn write_atomic_with<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    fill(temp.as_file_mut())?;
    temp.as_file().sync_all()?;

    // NamedTempFile is created 0600; keep the original's mode
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Renders per-file change tables to stderr
pub struct ChangeRenderer {
    show_colors: bool,
}

impl ChangeRenderer {
    pub fn new(show_colors: bool) -> Self {
        Self { show_colors }
    }

    pub fn render(&self, report: &FileReport) {
        eprint!("{}", self.format(report));
    }

    /// Table of changed pins followed by lookup failures
    pub fn format(&self, report: &FileReport) -> String {
        let mut out = String::new();
        let path = report.path.display();

        if report.resolve.changes.is_empty() {
            out.push_str(&format!("{path}: no version changes\n"));
        } else {
            out.push_str(&format!("Updated {path}:\n"));

            let name_w = width(report.resolve.changes.iter().map(|c| c.name.len()));
            let from_w = width(report.resolve.changes.iter().map(|c| c.from.len()));
            let to_w = width(report.resolve.changes.iter().map(|c| c.to.len()));

            for change in &report.resolve.changes {
                let severity = self.format_severity(change.severity);
                let row = format!(
                    "  {:<name_w$}  {:>from_w$} → {:<to_w$}  {severity}",
                    change.name, change.from, change.to,
                );
                out.push_str(row.trim_end());
                out.push('\n');
            }
        }

        if !report.resolve.failures.is_empty() {
            out.push_str(&self.dim("Not updated:"));
            out.push('\n');
            for failure in &report.resolve.failures {
                out.push_str("  ");
                out.push_str(&self.dim(&format!("{}: {}", failure.name, failure.reason)));
                out.push('\n');
            }
        }

        out
    }

    /// Format severity with optional colors
    pub fn format_severity(&self, severity: Option<UpdateSeverity>) -> String {
        match severity {
            Some(UpdateSeverity::Major) => self.paint("MAJOR", |s| s.red()),
            Some(UpdateSeverity::Minor) => self.paint("minor", |s| s.yellow()),
            Some(UpdateSeverity::Patch) => self.paint("patch", |s| s.green()),
            None => String::new(),
        }
    }

    fn dim(&self, text: &str) -> String {
        self.paint(text, |s| s.dimmed())
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> colored::ColoredString) -> String {
        if self.show_colors {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}

fn width(lengths: impl Iterator<Item = usize>) -> usize {
    lengths.max().unwrap_or(0)
}
