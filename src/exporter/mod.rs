//! Report export.

use crate::errors::{GitHubError, GitHubResult};
use crate::stats::StatsTable;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Column headers of the CSV report.
pub const CSV_HEADER: [&str; 8] = [
    "username",
    "Pull Requests Created",
    "Pull Requests Reviewed",
    "Reviews on Pull Requests",
    "Additions",
    "Deletions",
    "Files Changed",
    "Total Commits",
];

/// Writes aggregated stats somewhere.
#[cfg_attr(test, mockall::automock)]
pub trait StatsExporter: Send + Sync {
    /// Writes `stats` to `path`, replacing any existing file.
    fn export(&self, stats: &StatsTable, path: &Path) -> GitHubResult<()>;
}

/// Comma-separated export, one row per user in username order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl CsvExporter {
    /// Creates a CSV exporter.
    pub fn new() -> Self {
        Self
    }

    /// Writes the report to any writer.
    pub fn write_to<W: Write>(&self, stats: &StatsTable, out: &mut W) -> std::io::Result<()> {
        write_record(out, CSV_HEADER.iter().copied())?;

        for user in stats.values() {
            let row = [
                user.username.clone(),
                user.pull_requests_created.to_string(),
                user.pull_requests_reviewed.to_string(),
                user.reviews_on_pull_requests.to_string(),
                user.additions.to_string(),
                user.deletions.to_string(),
                user.changed_files.to_string(),
                user.commits.to_string(),
            ];
            write_record(out, row.iter().map(String::as_str))?;
        }

        out.flush()
    }
}

impl StatsExporter for CsvExporter {
    fn export(&self, stats: &StatsTable, path: &Path) -> GitHubResult<()> {
        let file = File::create(path).map_err(|e| {
            GitHubError::export(format!("Failed to create {}", path.display()), e)
        })?;
        let mut out = BufWriter::new(file);

        self.write_to(stats, &mut out).map_err(|e| {
            GitHubError::export(format!("Failed to write {}", path.display()), e)
        })
    }
}

fn write_record<'a, W: Write>(
    out: &mut W,
    fields: impl IntoIterator<Item = &'a str>,
) -> std::io::Result<()> {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.write_all(b",")?;
        }
        out.write_all(quote(field).as_bytes())?;
    }
    out.write_all(b"\n")
}

fn quote(field: &str) -> Cow<'_, str> {
    let needs_quotes = field == "\\."
        || field.starts_with(char::is_whitespace)
        || field.contains(|c| matches!(c, ',' | '"' | '\r' | '\n'));

    if needs_quotes {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
