//! Terminal rendering of the license list.

use crate::controller::View;
use crate::error::AdminError;
use crate::models::LicenseRecord;
use std::fmt::Write as _;
use std::io::{BufRead, Write};

pub struct TerminalView {
    assume_yes: bool,
}

impl TerminalView {
    #[must_use]
    pub const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl View for TerminalView {
    fn show_loading(&self) {
        eprintln!("Loading...");
    }

    fn show_records(&self, records: &[LicenseRecord]) {
        print!("{}", render_table(records));
    }

    fn show_error(&self, error: &AdminError) {
        println!("{}", error.operator_message());
    }

    fn report_error(&self, error: &AdminError) {
        eprintln!("{}", error.operator_message());
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{prompt} [y/N]: ");
        let _ = std::io::stdout().flush();

        let mut input = String::new();
        if std::io::stdin().lock().read_line(&mut input).is_err() {
            return false;
        }

        matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Formats records as a fixed-width table, or `Empty` when there are none.
#[must_use]
pub fn render_table(records: &[LicenseRecord]) -> String {
    if records.is_empty() {
        return "Empty\n".to_string();
    }

    let email_width = records
        .iter()
        .map(|r| r.email.chars().count())
        .max()
        .unwrap_or(0)
        .max("EMAIL".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8} {:<email_width$} {:<8} CREATED",
        "ID", "EMAIL", "STATUS"
    );
    let _ = writeln!(out, "{:-<width$}", "", width = email_width + 40);

    for record in records {
        let created = record
            .created_at
            .map(|dt| {
                dt.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_default();

        let _ = writeln!(
            out,
            "{:<8} {:<email_width$} {:<8} {created}",
            record.id.as_str(),
            record.email,
            record.status_label(),
        );
    }

    let _ = writeln!(out, "{} record(s)", records.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;

    #[test]
    fn test_empty_table() {
        assert_eq!(render_table(&[]), "Empty\n");
    }

    #[test]
    fn test_table_rows() {
        let records = vec![
            LicenseRecord {
                id: RecordId::new("7"),
                email: "ana@example.com".to_string(),
                ativo: true,
                created_at: None,
            },
            LicenseRecord {
                id: RecordId::new("8"),
                email: "bob@example.com".to_string(),
                ativo: false,
                created_at: None,
            },
        ];

        let table = render_table(&records);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].starts_with("ID"));
        assert!(lines[2].contains("ana@example.com"));
        assert!(lines[2].contains("Active"));
        assert!(lines[3].contains("Inactive"));
        assert_eq!(lines[4], "2 record(s)");
    }

    #[test]
    fn test_assume_yes_skips_prompt() {
        assert!(TerminalView::new(true).confirm("Delete a@b.c?"));
    }
}
