//! Calendar spreadsheet
//!
//! One sheet, one header row, one body row per calendar entry:
//!
//! ```text
//! | A        | B           | C       | D      | E          | F          | G      | H       | I        | J    | K       |
//! |----------|-------------|---------|--------|------------|------------|--------|---------|----------|------|---------|
//! | ERP-101  | Invoice fix | ERP     | no ... | 2024-03-10 | 2024-03-11 | Compl. | J. Doe  | J. Doe   | High | success |
//! ```
//!
//! The header row is bold white text on a green fill, centered and wrapped.
//! The body range `A2:<last column><last row>` gets thin black borders with
//! left/top alignment. Column widths come from the header layout.

use deploycal_core::{CalendarRow, Labels, RenderError};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::path::Path;
use tracing::{debug, info};

const SHEET_NAME: &str = "Sheet1";

/// One column of the header layout
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderColumn {
    /// Column letter(s), e.g. `"A"`
    pub column: String,
    pub name: String,
    /// Width in character units; `None` keeps the sheet default
    pub width: Option<f64>,
}

impl HeaderColumn {
    pub fn new(column: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            name: name.into(),
            width: None,
        }
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }
}

/// Standard A..K layout with localised titles
pub fn calendar_header(labels: &Labels) -> Vec<HeaderColumn> {
    const LAYOUT: [(&str, Option<f64>); CalendarRow::COLUMN_COUNT] = [
        ("A", Some(15.0)),
        ("B", Some(50.0)),
        ("C", Some(10.0)),
        ("D", Some(25.0)),
        ("E", Some(15.0)),
        ("F", Some(15.0)),
        ("G", None),
        ("H", None),
        ("I", None),
        ("J", None),
        ("K", None),
    ];

    LAYOUT
        .iter()
        .zip(labels.columns)
        .map(|((column, width), name)| HeaderColumn {
            column: (*column).to_string(),
            name: name.to_string(),
            width: *width,
        })
        .collect()
}

/// Zero-based index of a column name: `A` is 0, `K` is 10, `AA` is 26
pub fn column_index(column: &str) -> Option<u16> {
    if column.is_empty() || !column.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }

    let mut index: u32 = 0;
    for b in column.bytes() {
        index = index * 26 + u32::from(b - b'A' + 1);
        // Excel stops at XFD
        if index > 16_384 {
            return None;
        }
    }
    u16::try_from(index - 1).ok()
}

/// Header and body cell formats
#[derive(Clone, Debug)]
pub struct TableStyle {
    pub header: Format,
    pub body: Format,
}

impl Default for TableStyle {
    fn default() -> Self {
        let header = Format::new()
            .set_bold()
            .set_font_name("Calibri")
            .set_font_size(8)
            .set_font_color(0xFFFFFF)
            .set_background_color(0x90C225)
            .set_text_wrap()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(0x000000);

        let body = Format::new()
            .set_font_name("Calibri")
            .set_font_size(10)
            .set_font_color(0x000000)
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::Top)
            .set_border(FormatBorder::Thin)
            .set_border_color(0x000000);

        Self { header, body }
    }
}

/// Deployment calendar document
#[derive(Clone, Debug)]
pub struct CalendarTable {
    header: Vec<HeaderColumn>,
    /// Parsed column indexes, parallel to `header`
    columns: Vec<u16>,
    rows: Vec<CalendarRow>,
    style: TableStyle,
}

/// Header plus rows, in input order
pub fn build(
    header: Vec<HeaderColumn>,
    rows: impl IntoIterator<Item = CalendarRow>,
) -> Result<CalendarTable, RenderError> {
    let mut table = CalendarTable::new(header)?;
    for row in rows {
        table.add_row(row);
    }
    Ok(table)
}

impl CalendarTable {
    /// Validate the header layout.
    ///
    /// The layout must have exactly one column per calendar field and every
    /// column letter must be valid and distinct.
    pub fn new(header: Vec<HeaderColumn>) -> Result<Self, RenderError> {
        if header.len() != CalendarRow::COLUMN_COUNT {
            return Err(RenderError::InvalidHeader(format!(
                "expected {} columns, got {}",
                CalendarRow::COLUMN_COUNT,
                header.len()
            )));
        }

        let mut columns = Vec::with_capacity(header.len());
        for col in &header {
            let index = column_index(&col.column).ok_or_else(|| {
                RenderError::InvalidHeader(format!("invalid column '{}'", col.column))
            })?;
            if columns.contains(&index) {
                return Err(RenderError::InvalidHeader(format!(
                    "column '{}' used twice",
                    col.column
                )));
            }
            columns.push(index);
        }

        Ok(Self {
            header,
            columns,
            rows: Vec::new(),
            style: TableStyle::default(),
        })
    }

    pub fn style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    pub fn add_row(&mut self, row: CalendarRow) {
        debug!(row = self.rows.len() + 2, id = %row.id, "Adding row");
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[CalendarRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn first_column(&self) -> &str {
        &self.header[0].column
    }

    fn last_column(&self) -> &str {
        &self.header[self.header.len() - 1].column
    }

    /// Styled header span, e.g. `A1:K1`
    pub fn header_range(&self) -> String {
        format!("{}1:{}1", self.first_column(), self.last_column())
    }

    /// Styled body span, e.g. `A2:K7`; `None` while the table has no rows
    pub fn body_range(&self) -> Option<String> {
        if self.rows.is_empty() {
            return None;
        }
        Some(format!(
            "{}2:{}{}",
            self.first_column(),
            self.last_column(),
            self.rows.len() + 1
        ))
    }

    /// Build the workbook in memory
    pub fn to_workbook(&self) -> Result<Workbook, RenderError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(SHEET_NAME)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        self.write_header(sheet)?;
        self.write_body(sheet)?;

        for (col, header) in self.columns.iter().zip(&self.header) {
            if let Some(width) = header.width {
                sheet
                    .set_column_width(*col, width)
                    .map_err(|e| RenderError::Format(format!("column {} width: {e}", header.column)))?;
            }
        }

        Ok(workbook)
    }

    fn write_header(&self, sheet: &mut Worksheet) -> Result<(), RenderError> {
        info!(range = %self.header_range(), "Writing header");
        for (col, header) in self.columns.iter().zip(&self.header) {
            sheet
                .write_with_format(0, *col, header.name.as_str(), &self.style.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        Ok(())
    }

    fn write_body(&self, sheet: &mut Worksheet) -> Result<(), RenderError> {
        for (offset, row) in self.rows.iter().enumerate() {
            let sheet_row = u32::try_from(offset + 1)
                .map_err(|_| RenderError::Format("too many rows".into()))?;

            for (col, value) in self.columns.iter().zip(row.cells()) {
                let written = if value.is_empty() {
                    sheet.write_blank(sheet_row, *col, &self.style.body)
                } else {
                    sheet.write_with_format(sheet_row, *col, value, &self.style.body)
                };
                written.map_err(|e| RenderError::Format(e.to_string()))?;
            }
        }

        if let Some(range) = self.body_range() {
            info!(sheet = SHEET_NAME, range = %range, "Formatted body");
        }
        Ok(())
    }

    /// Render to XLSX bytes
    pub fn render_to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        self.to_workbook()?
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    /// Write the document to `path`, creating missing parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let bytes = self.render_to_bytes()?;
        std::fs::write(path, bytes)?;

        info!(path = %path.display(), rows = self.rows.len(), "File saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(id: &str) -> CalendarRow {
        CalendarRow {
            id: id.into(),
            description: "Fix".into(),
            service_name: "ERP".into(),
            unavailability_note: "none".into(),
            deploy_start: "2024-03-10 23:00".into(),
            deploy_end: "2024-03-11 03:00".into(),
            deploy_status: "Completed".into(),
            deploy_manager: "Jane Doe".into(),
            maintain_manager: "Jane Doe".into(),
            deploy_risk: String::new(),
            deploy_result: "successful".into(),
        }
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("K"), Some(10));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("XFD"), Some(16_383));
        assert_eq!(column_index("XFE"), None);
        assert_eq!(column_index("a"), None);
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn standard_header_layout() {
        let header = calendar_header(&Labels::english());
        assert_eq!(header.len(), 11);
        assert_eq!(header[0], HeaderColumn::new("A", "Code / ID").width(15.0));
        assert_eq!(header[1].width, Some(50.0));
        assert_eq!(header[10], HeaderColumn::new("K", "Deployment result"));
    }

    #[test]
    fn header_must_cover_every_field() {
        let mut header = calendar_header(&Labels::english());
        header.pop();
        assert!(matches!(
            CalendarTable::new(header),
            Err(RenderError::InvalidHeader(_))
        ));
    }

    #[test]
    fn header_rejects_bad_and_duplicate_columns() {
        let mut header = calendar_header(&Labels::english());
        header[3].column = "d".into();
        assert!(CalendarTable::new(header).is_err());

        let mut header = calendar_header(&Labels::english());
        header[3].column = "A".into();
        assert!(CalendarTable::new(header).is_err());
    }

    #[test]
    fn ranges_track_rows() {
        let mut table = CalendarTable::new(calendar_header(&Labels::english())).unwrap();
        assert_eq!(table.header_range(), "A1:K1");
        assert_eq!(table.body_range(), None);

        table.add_row(row("ERP-1"));
        table.add_row(row("ERP-2"));
        assert_eq!(table.body_range().as_deref(), Some("A2:K3"));
    }

    #[test]
    fn build_keeps_input_order() {
        let table = build(
            calendar_header(&Labels::english()),
            vec![row("B-2"), row("A-1"), row("C-3")],
        )
        .unwrap();
        let ids: Vec<_> = table.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["B-2", "A-1", "C-3"]);
    }

    #[test]
    fn renders_xlsx_bytes() {
        let table = build(calendar_header(&Labels::english()), vec![row("ERP-1")]).unwrap();
        let bytes = table.render_to_bytes().unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..2], b"PK");
    }
}
