//! Listing extraction module - fetch one advertisement, derive typed
//! attributes rule by rule, and persist them as a workbook row

pub mod columns;
pub mod fetch;
pub mod listing;
pub mod salvage;
pub mod text;
pub mod types;
pub mod workbook;

pub use columns::{extract_row, Attribute, CellValue, COLUMN_ORDER};
pub use fetch::{listing_id_from_url, SrealityClient};
pub use listing::Listing;
pub use types::*;
pub use workbook::DataSheet;
