use crate::error::{Error, Result};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Columns the completion model is asked to fill, in display order.
pub const TABLE_COLUMNS: [&str; 12] = [
    "Name",
    "Email",
    "Key Skill",
    "Total Experience",
    "Relevant Experience",
    "Location",
    "Notice Period",
    "Interviewer Name",
    "Interviewer Email",
    "Date",
    "Time",
    "Job Profile",
];

const MAX_CELL_WIDTH: usize = 32;

pub type CandidateRow = BTreeMap<String, String>;

/// Flat per-candidate summary built from the session transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateTable {
    pub columns: Vec<String>,
    pub rows: Vec<CandidateRow>,
}

fn cell_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Array(items) => items
            .iter()
            .map(cell_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

impl CandidateTable {
    /// Accepts a JSON array of row objects, or an object wrapping one under `candidates`.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let items = value
            .as_array()
            .or_else(|| value.get("candidates").and_then(|c| c.as_array()))
            .ok_or_else(|| {
                Error::Extraction("Candidate table response was not a JSON array".to_string())
            })?;

        let rows: Vec<CandidateRow> = items
            .iter()
            .filter_map(|item| item.as_object())
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.trim().to_string(), cell_text(v)))
                    .collect()
            })
            .collect();

        let mut columns: Vec<String> = TABLE_COLUMNS
            .iter()
            .filter(|col| rows.iter().any(|r| r.contains_key(**col)))
            .map(|col| col.to_string())
            .collect();

        let mut extras: Vec<String> = rows
            .iter()
            .flat_map(|r| r.keys())
            .filter(|k| !TABLE_COLUMNS.iter().any(|col| *col == k.as_str()))
            .cloned()
            .collect();
        extras.sort();
        extras.dedup();
        columns.extend(extras);

        Ok(Self { columns, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell<'a>(&'a self, row: &'a CandidateRow, column: &str) -> &'a str {
        row.get(column).map(String::as_str).unwrap_or("")
    }

    /// First non-empty `Job Profile` value, if any row carries one.
    pub fn first_job_profile(&self) -> Option<&str> {
        self.rows
            .iter()
            .filter_map(|r| r.get("Job Profile"))
            .map(|s| s.as_str())
            .find(|s| !s.is_empty())
    }

    /// Plain-text grid for the terminal. Long cells are cut at `MAX_CELL_WIDTH`.
    pub fn render_text(&self) -> String {
        let clip = |s: &str| -> String {
            if s.chars().count() > MAX_CELL_WIDTH {
                let mut cut: String = s.chars().take(MAX_CELL_WIDTH - 1).collect();
                cut.push('…');
                cut
            } else {
                s.to_string()
            }
        };

        let widths: Vec<usize> = self
            .columns
            .iter()
            .map(|col| {
                self.rows
                    .iter()
                    .map(|r| clip(self.cell(r, col)).chars().count())
                    .chain(std::iter::once(col.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let format_line = |cells: Vec<String>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![format_line(self.columns.clone())];
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in &self.rows {
            lines.push(format_line(
                self.columns.iter().map(|c| clip(self.cell(row, c))).collect(),
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skills_list_is_joined_and_columns_ordered() {
        let table = CandidateTable::from_json(&json!([
            {"Email": "a@x.com", "Name": "Asha", "Key Skill": ["Rust", "SQL"], "Portfolio": "gh/asha"},
            {"Name": "Ben", "Job Profile": "Data Engineer", "Total Experience": 4}
        ]))
        .unwrap();

        assert_eq!(
            table.columns,
            vec!["Name", "Email", "Key Skill", "Total Experience", "Job Profile", "Portfolio"]
        );
        assert_eq!(table.rows[0]["Key Skill"], "Rust, SQL");
        assert_eq!(table.rows[1]["Total Experience"], "4");
        assert_eq!(table.first_job_profile(), Some("Data Engineer"));
    }

    #[test]
    fn wrapped_candidates_object_is_accepted() {
        let table =
            CandidateTable::from_json(&json!({"candidates": [{"Name": "Asha"}]})).unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn scalar_is_rejected() {
        assert!(CandidateTable::from_json(&json!("nope")).is_err());
    }

    #[test]
    fn render_includes_header_and_rows() {
        let table = CandidateTable::from_json(&json!([{"Name": "Asha", "Email": "a@x.com"}]))
            .unwrap();
        let text = table.render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name | Email");
        assert_eq!(lines[2], "Asha | a@x.com");
    }
}
