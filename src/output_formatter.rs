use crate::errors::Result;
use crate::report::{FileRecord, RunSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// Defines the possible formats for the findings report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// A human-readable listing grouped by file, then by pattern.
    Text,
    /// JSON format, suitable for machine processing.
    Json,
    /// Comma-Separated Values, one row per occurrence.
    Csv,
}

impl OutputFormat {
    /// The file extension used for reports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Something that can persist the aggregated findings of a run.
pub trait ReportSink {
    fn write_report<W: Write>(&self, writer: &mut W, summary: &RunSummary) -> Result<()>;
}

/// Serializes run findings into one of the supported [`OutputFormat`]s.
pub struct OutputFormatter {
    format: OutputFormat,
    include_summary: bool,
    tool_name: String,
    tool_version: String,
}

impl OutputFormatter {
    /// Creates a new `OutputFormatter`.
    ///
    /// `include_summary` appends the totals to the text format; the JSON
    /// format always carries them and CSV never does.
    pub fn new(format: OutputFormat, include_summary: bool) -> Self {
        Self {
            format,
            include_summary,
            tool_name: env!("CARGO_PKG_NAME").to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn format_text(&self, summary: &RunSummary) -> String {
        let mut output = String::new();
        output.push_str("Deprecated pattern report\n");
        output.push_str(&format!("{}\n\n", "=".repeat(50)));

        for record in &summary.findings {
            output.push_str(&format!("File: {}\n", record.path.display()));
            output.push_str(&format!("{}\n", "-".repeat(30)));
            for hits in &record.hits {
                output.push_str(&format!(
                    "Pattern: {} ({} occurrences)\n",
                    hits.pattern,
                    hits.occurrences.len()
                ));
                for occ in &hits.occurrences {
                    output.push_str(&format!("  Line {}: {}\n", occ.line_number, occ.line));
                }
            }
            output.push('\n');
        }

        if self.include_summary {
            output.push_str(&self.format_summary(summary));
        }
        output
    }

    fn format_json(&self, summary: &RunSummary) -> Result<String> {
        #[derive(Serialize)]
        struct JsonOutput<'a> {
            tool: ToolInfo<'a>,
            generated_at: DateTime<Utc>,
            files_scanned: usize,
            files_matched: usize,
            total_occurrences: usize,
            findings: &'a [FileRecord],
        }

        #[derive(Serialize)]
        struct ToolInfo<'a> {
            name: &'a str,
            version: &'a str,
        }

        let output = JsonOutput {
            tool: ToolInfo {
                name: &self.tool_name,
                version: &self.tool_version,
            },
            generated_at: Utc::now(),
            files_scanned: summary.files_scanned,
            files_matched: summary.files_matched,
            total_occurrences: summary.total_occurrences,
            findings: &summary.findings,
        };

        Ok(serde_json::to_string_pretty(&output)?)
    }

    fn format_csv<W: Write>(&self, writer: &mut W, summary: &RunSummary) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["File", "Pattern", "Line", "Content"])?;

        for record in &summary.findings {
            let file = record.path.display().to_string();
            for hits in &record.hits {
                for occ in &hits.occurrences {
                    let line_number = occ.line_number.to_string();
                    wtr.write_record([
                        file.as_str(),
                        hits.pattern.as_str(),
                        line_number.as_str(),
                        occ.line.as_str(),
                    ])?;
                }
            }
        }

        wtr.flush()?;
        Ok(())
    }

    /// Totals plus the most common patterns.
    fn format_summary(&self, summary: &RunSummary) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} Summary {}\n", "=".repeat(20), "=".repeat(20)));
        out.push_str(&format!("Files scanned: {}\n", summary.files_scanned));
        out.push_str(&format!("Files with matches: {}\n", summary.files_matched));
        out.push_str(&format!("Total occurrences: {}\n", summary.total_occurrences));

        let totals = summary.pattern_totals();
        if !totals.is_empty() {
            out.push_str("\nTop patterns:\n");
            for (pattern, count) in totals.iter().take(10) {
                out.push_str(&format!("  {} - {} occurrences\n", pattern, count));
            }
        }
        out
    }
}

impl ReportSink for OutputFormatter {
    fn write_report<W: Write>(&self, writer: &mut W, summary: &RunSummary) -> Result<()> {
        match self.format {
            OutputFormat::Text => writer.write_all(self.format_text(summary).as_bytes())?,
            OutputFormat::Json => {
                writer.write_all(self.format_json(summary)?.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            OutputFormat::Csv => self.format_csv(writer, summary)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_summary() -> RunSummary {
        let mut summary = RunSummary::default();
        for _ in 0..4 {
            summary.record_scanned();
        }

        let mut a = FileRecord::new("src/guard.ts");
        a.push(".isOrgAdmin", 3, "  if (x.isOrgAdmin && y.isOrgOwner) {");
        a.push(".isOrgOwner", 3, "  if (x.isOrgAdmin && y.isOrgOwner) {");
        a.push(".isOrgAdmin", 9, "return u.isOrgAdmin;");
        summary.record(a);

        let mut b = FileRecord::new("functions/roles.py");
        b.push("'org_admin'", 1, "ROLE = 'org_admin', \"quoted\"");
        summary.record(b);

        summary
    }

    fn render(format: OutputFormat) -> String {
        let mut buf = Vec::new();
        OutputFormatter::new(format, true)
            .write_report(&mut buf, &create_test_summary())
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_format_groups_by_file_then_pattern() {
        let output = render(OutputFormat::Text);

        let guard = output.find("File: src/guard.ts").unwrap();
        let roles = output.find("File: functions/roles.py").unwrap();
        assert!(guard < roles);
        assert!(output.contains("Pattern: .isOrgAdmin (2 occurrences)\n  Line 3: if (x.isOrgAdmin && y.isOrgOwner) {\n  Line 9: return u.isOrgAdmin;\n"));
        assert!(output.contains("Pattern: .isOrgOwner (1 occurrences)"));
        assert!(output.contains("Total occurrences: 4"));
        assert!(output.contains("  .isOrgAdmin - 2 occurrences"));
    }

    #[test]
    fn test_json_format() {
        let output = render(OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["tool"]["name"], "rolesweep");
        assert_eq!(parsed["files_scanned"], 4);
        assert_eq!(parsed["files_matched"], 2);
        assert_eq!(parsed["total_occurrences"], 4);
        assert_eq!(parsed["findings"][0]["path"], "src/guard.ts");
        assert_eq!(parsed["findings"][0]["hits"][0]["pattern"], ".isOrgAdmin");
        assert_eq!(
            parsed["findings"][0]["hits"][0]["occurrences"][1]["line_number"],
            9
        );
    }

    #[test]
    fn test_csv_format() {
        let output = render(OutputFormat::Csv);

        let mut rdr = csv::Reader::from_reader(output.as_bytes());
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("File"));

        let records: Vec<_> = rdr
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[3].get(3), Some("ROLE = 'org_admin', \"quoted\""));
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(OutputFormat::Text.extension(), "txt");
        assert_eq!(OutputFormat::Json.extension(), "json");
        assert_eq!(OutputFormat::Csv.extension(), "csv");
    }
}
