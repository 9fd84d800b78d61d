use crate::error::Result;
use crate::models::candidate_table::CandidateTable;
use rust_xlsxwriter::*;
use std::path::Path;

pub struct ExportService;

impl ExportService {
    fn column_width(column: &str) -> f64 {
        match column {
            "Name" | "Email" | "Interviewer Name" | "Interviewer Email" | "Job Profile" => 28.0,
            "Key Skill" => 45.0,
            "Date" | "Time" => 14.0,
            _ => 18.0,
        }
    }
}

impl ExportService {
    /// Generate a styled XLSX workbook from the extracted candidate table.
    pub fn generate_candidate_table_xlsx(table: &CandidateTable) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Candidates")?;

        // ── Color palette ──
        let primary_color = Color::RGB(0x1E293B); // Slate 800
        let header_bg = Color::RGB(0x0F172A); // Slate 900
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC); // Slate 50
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0); // Slate 200

        // Row-number column followed by the table's own columns
        let columns: Vec<(&str, f64)> = std::iter::once(("#", 6.0))
            .chain(
                table
                    .columns
                    .iter()
                    .map(|c| (c.as_str(), Self::column_width(c))),
            )
            .collect();
        let last_col = (columns.len() - 1) as u16;

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        // ── Title row ──
        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);

        worksheet.set_row_height(0, 40)?;
        if last_col > 0 {
            worksheet.merge_range(0, 0, 0, last_col, "Candidate Details", &title_format)?;
        } else {
            worksheet.write_string_with_format(0, 0, "Candidate Details", &title_format)?;
        }

        // ── Subtitle row ──
        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);

        worksheet.set_row_height(1, 22)?;
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
        let subtitle_text = format!("Exported: {}  •  Candidates: {}", now, table.rows.len());
        if last_col > 0 {
            worksheet.merge_range(1, 0, 1, last_col, &subtitle_text, &subtitle_format)?;
        } else {
            worksheet.write_string_with_format(1, 0, &subtitle_text, &subtitle_format)?;
        }

        // ── Header row ──
        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let header_row = 2;
        worksheet.set_row_height(header_row, 30)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        // ── Data rows ──
        let data_start_row = 3;
        for (idx, row) in table.rows.iter().enumerate() {
            let row_num = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);

            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();
            let name_fmt = base_fmt.clone().set_bold();

            worksheet.set_row_height(row_num, 22)?;
            worksheet.write_number_with_format(row_num, 0, (idx + 1) as f64, &center_fmt)?;

            for (col_idx, column) in table.columns.iter().enumerate() {
                let value = table.cell(row, column);
                let value = if value.is_empty() { "—" } else { value };
                let fmt = match column.as_str() {
                    "Name" => &name_fmt,
                    "Key Skill" => &wrap_fmt,
                    "Date" | "Time" => &center_fmt,
                    _ => &base_fmt,
                };
                worksheet.write_string_with_format(row_num, (col_idx + 1) as u16, value, fmt)?;
            }
        }

        // Freeze panes (header stays visible while scrolling)
        worksheet.set_freeze_panes(3, 0)?;

        if !table.rows.is_empty() {
            worksheet.autofilter(
                header_row,
                0,
                data_start_row + table.rows.len() as u32 - 1,
                last_col,
            )?;
        }

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }

    pub async fn write_candidate_table_xlsx(table: &CandidateTable, path: &Path) -> Result<()> {
        let bytes = Self::generate_candidate_table_xlsx(table)?;
        tokio::fs::write(path, bytes).await?;
        tracing::info!(path = %path.display(), rows = table.rows.len(), "Candidate table exported");
        Ok(())
    }
}
