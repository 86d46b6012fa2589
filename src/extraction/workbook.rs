//! Workbook collaborator - append extracted rows to the persisted dataset.
//!
//! The dataset is an existing XLSX workbook with a sheet named `data`.
//! Attribute columns are 3..=20; the sentinel column (the last attribute's
//! column) is empty exactly on rows not yet written, which is what the
//! first-available-row scan keys on.

use crate::extraction::columns::{CellValue, SENTINEL_COLUMN};
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::info;
use umya_spreadsheet::{reader, writer, Spreadsheet, Worksheet};

const DATA_SHEET: &str = "data";

/// Handle on the open workbook. Rows accumulate in memory; `save` persists
/// the whole book once, at session end.
#[derive(Debug)]
pub struct DataSheet {
    book: Spreadsheet,
    path: PathBuf,
}

impl DataSheet {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let book = reader::xlsx::read(&path)
            .map_err(|e| anyhow!("failed to open workbook {:?}: {:?}", path, e))?;

        if book.get_sheet_by_name(DATA_SHEET).is_none() {
            return Err(anyhow!("workbook {:?} has no '{}' sheet", path, DATA_SHEET));
        }

        info!("Opened workbook {:?}", path);
        Ok(DataSheet { book, path })
    }

    fn sheet(&self) -> &Worksheet {
        // Presence is validated in `open`.
        self.book.get_sheet_by_name(DATA_SHEET).unwrap()
    }

    /// First row whose sentinel column is empty.
    pub fn first_available_row(&self) -> u32 {
        let sheet = self.sheet();
        let mut row = 1;
        while !sheet.get_value((SENTINEL_COLUMN, row)).is_empty() {
            row += 1;
        }
        row
    }

    /// Write one extracted row at the first available row; returns the row
    /// index written.
    pub fn append_row(&mut self, cells: &[(u32, CellValue)]) -> Result<u32> {
        let row = self.first_available_row();
        let sheet = self
            .book
            .get_sheet_by_name_mut(DATA_SHEET)
            .ok_or_else(|| anyhow!("workbook has no '{}' sheet", DATA_SHEET))?;

        for (column, value) in cells {
            let cell = sheet.get_cell_mut((*column, row));
            match value {
                CellValue::Int(v) => {
                    cell.set_value_number(*v as f64);
                }
                CellValue::Text(s) => {
                    cell.set_value_string(s.clone());
                }
                CellValue::Date(d) => {
                    cell.set_value_string(d.format("%Y-%m-%d").to_string());
                }
            }
        }

        info!("Wrote {} cells to row {}", cells.len(), row);
        Ok(row)
    }

    /// Persist the workbook back to its path.
    pub fn save(&self) -> Result<()> {
        writer::xlsx::write(&self.book, &self.path)
            .map_err(|e| anyhow!("failed to save workbook {:?}: {:?}", self.path, e))?;
        info!("Saved workbook {:?}", self.path);
        Ok(())
    }
}
