//! Spreadsheet export: entries flattened to display rows, then encoded.

use chrono::{Datelike, Utc};
use models::entry;
use rust_xlsxwriter::Workbook;
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use serde::Serialize;

use crate::errors::ServiceError;

pub const SHEET_NAME: &str = "Customer Entries";
pub const EXPORT_FILENAME: &str = "entries.xlsx";
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Placeholder for empty display cells.
pub const NOT_FOUND: &str = "Not Found";

pub const COLUMNS: [&str; 14] = [
    "customerName",
    "mobileNumber",
    "address",
    "state",
    "city",
    "products",
    "type",
    "organization",
    "category",
    "status",
    "createdAt",
    "expectedClosingDate",
    "followUpDate",
    "remarks",
];

/// One display row, already formatted, in [`COLUMNS`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub customer_name: String,
    pub mobile_number: String,
    pub address: String,
    pub state: String,
    pub city: String,
    pub products: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub organization: String,
    pub category: String,
    pub status: String,
    pub created_at: String,
    pub expected_closing_date: String,
    pub follow_up_date: String,
    pub remarks: String,
}

impl ExportRow {
    pub fn cells(&self) -> [&str; 14] {
        [
            self.customer_name.as_str(),
            self.mobile_number.as_str(),
            self.address.as_str(),
            self.state.as_str(),
            self.city.as_str(),
            self.products.as_str(),
            self.entry_type.as_str(),
            self.organization.as_str(),
            self.category.as_str(),
            self.status.as_str(),
            self.created_at.as_str(),
            self.expected_closing_date.as_str(),
            self.follow_up_date.as_str(),
            self.remarks.as_str(),
        ]
    }
}

/// `M/D/YYYY` on the UTC calendar day.
pub fn format_date(date: &DateTimeWithTimeZone) -> String {
    let d = date.with_timezone(&Utc);
    format!("{}/{}/{}", d.month(), d.day(), d.year())
}

fn or_not_found(value: &str) -> String {
    if value.is_empty() { NOT_FOUND.to_string() } else { value.to_string() }
}

fn date_or_not_found(date: Option<&DateTimeWithTimeZone>) -> String {
    date.map(format_date).unwrap_or_else(|| NOT_FOUND.to_string())
}

pub fn to_row(e: &entry::Model) -> ExportRow {
    ExportRow {
        customer_name: e.customer_name.clone(),
        mobile_number: e.mobile_number.clone(),
        address: e.address.clone(),
        state: e.state.clone(),
        city: e.city.clone(),
        products: e.products.clone(),
        entry_type: e.entry_type.as_str().to_string(),
        organization: e.organization.clone(),
        category: e.category.as_str().to_string(),
        status: or_not_found(e.status.as_str()),
        created_at: format_date(&e.created_at),
        expected_closing_date: date_or_not_found(e.expected_closing_date.as_ref()),
        follow_up_date: date_or_not_found(e.follow_up_date.as_ref()),
        remarks: or_not_found(&e.remarks),
    }
}

/// Encoded export ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: &'static str,
    pub content_type: &'static str,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

/// Tabular encoder seam; the HTTP layer only sees bytes.
pub trait SheetEncoder: Send + Sync {
    fn encode(&self, sheet_name: &str, header: &[&str], rows: &[ExportRow]) -> Result<Vec<u8>, ServiceError>;
}

/// Single-sheet xlsx workbook, header row first, every cell written as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxEncoder;

impl SheetEncoder for XlsxEncoder {
    fn encode(&self, sheet_name: &str, header: &[&str], rows: &[ExportRow]) -> Result<Vec<u8>, ServiceError> {
        let xlsx_err = |e: rust_xlsxwriter::XlsxError| ServiceError::Export(e.to_string());
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name).map_err(xlsx_err)?;
        for (col, title) in header.iter().enumerate() {
            sheet.write_string(0, col as u16, *title).map_err(xlsx_err)?;
        }
        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, cell) in row.cells().iter().enumerate() {
                sheet.write_string(r, col as u16, *cell).map_err(xlsx_err)?;
            }
        }
        workbook.save_to_buffer().map_err(xlsx_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::test_fixtures::stored_entry;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn dates_use_month_day_year() {
        let d: DateTimeWithTimeZone = Utc.with_ymd_and_hms(2030, 3, 4, 12, 0, 0).unwrap().into();
        assert_eq!(format_date(&d), "3/4/2030");
    }

    #[test]
    fn empty_cells_become_not_found() {
        let mut e = stored_entry(Uuid::new_v4(), "Asha Traders");
        e.remarks.clear();
        e.expected_closing_date = None;
        e.follow_up_date = Some(Utc.with_ymd_and_hms(2031, 12, 25, 0, 0, 0).unwrap().into());

        let row = to_row(&e);
        assert_eq!(row.remarks, NOT_FOUND);
        assert_eq!(row.expected_closing_date, NOT_FOUND);
        assert_eq!(row.follow_up_date, "12/25/2031");
        assert_eq!(row.status, "Not Found");
        assert_eq!(row.cells()[0], "Asha Traders");
    }

    #[test]
    fn cells_follow_column_order() {
        let row = to_row(&stored_entry(Uuid::new_v4(), "Asha Traders"));
        let json = serde_json::to_value(&row).unwrap();
        for (name, cell) in COLUMNS.iter().zip(row.cells()) {
            assert_eq!(json[*name].as_str(), Some(cell), "column {name}");
        }
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let rows = vec![to_row(&stored_entry(Uuid::new_v4(), "Asha Traders"))];
        let bytes = XlsxEncoder.encode(SHEET_NAME, &COLUMNS, &rows).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
