//! Ordered attribute table driving the spreadsheet-column mapping.
//!
//! Column order is configuration, not extraction logic: the table below is
//! the single source of truth for which attribute lands in which column and
//! how its value is coerced to the persisted wire form.

use crate::extraction::listing::Listing;
use crate::extraction::types::ExtractError;
use chrono::NaiveDate;

/// First column holding extracted attributes; columns 1 and 2 are reserved
/// for manual bookkeeping in the workbook.
pub const FIRST_DATA_COLUMN: u32 = 3;

/// Sentinel column for the first-available-row scan: the last attribute's
/// column, empty only on rows not yet written.
pub const SENTINEL_COLUMN: u32 = FIRST_DATA_COLUMN + COLUMN_ORDER.len() as u32 - 1;

/// The extracted attributes, in persisted column order (columns 3..=20).
pub const COLUMN_ORDER: [Attribute; 18] = [
    Attribute::SizeM2,
    Attribute::RentCzk,
    Attribute::PriceCzk,
    Attribute::Provision,
    Attribute::RoomsNum,
    Attribute::Kitchen,
    Attribute::Construction,
    Attribute::Condition,
    Attribute::Reconstruction,
    Attribute::Ownership,
    Attribute::FloorsNum,
    Attribute::Floor,
    Attribute::BalconyNum,
    Attribute::Cellar,
    Attribute::Heating,
    Attribute::Elevator,
    Attribute::Insulation,
    Attribute::LastUpdateDate,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    SizeM2,
    RentCzk,
    PriceCzk,
    Provision,
    RoomsNum,
    Kitchen,
    Construction,
    Condition,
    Reconstruction,
    Ownership,
    FloorsNum,
    Floor,
    BalconyNum,
    Cellar,
    Heating,
    Elevator,
    Insulation,
    LastUpdateDate,
}

/// A value in its persisted wire form: booleans and enums already coerced to
/// integers or codes, never symbolic names.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Text(String),
    Date(NaiveDate),
}

impl Attribute {
    pub fn name(self) -> &'static str {
        match self {
            Attribute::SizeM2 => "size_m2",
            Attribute::RentCzk => "rent_czk",
            Attribute::PriceCzk => "price_czk",
            Attribute::Provision => "provision",
            Attribute::RoomsNum => "rooms_num",
            Attribute::Kitchen => "kitchen",
            Attribute::Construction => "construction",
            Attribute::Condition => "condition",
            Attribute::Reconstruction => "reconstruction",
            Attribute::Ownership => "ownership",
            Attribute::FloorsNum => "floors_num",
            Attribute::Floor => "floor",
            Attribute::BalconyNum => "balcony_num",
            Attribute::Cellar => "cellar",
            Attribute::Heating => "heating",
            Attribute::Elevator => "elevator",
            Attribute::Insulation => "insulation",
            Attribute::LastUpdateDate => "last_update_date",
        }
    }

    /// Run this attribute's rule and coerce the result to its wire form.
    /// `Ok(None)` means the attribute legitimately has no value for this
    /// listing (e.g. no sale price on a rental).
    pub fn evaluate(self, listing: &Listing) -> Result<Option<CellValue>, ExtractError> {
        use CellValue::{Date, Int, Text};

        Ok(match self {
            Attribute::SizeM2 => Some(Int(listing.size_m2()?)),
            Attribute::RentCzk => listing.rent_czk()?.map(Int),
            Attribute::PriceCzk => listing.price_czk()?.map(Int),
            Attribute::Provision => Some(Int(i64::from(listing.provision()))),
            Attribute::RoomsNum => Some(Int(listing.rooms_num()?)),
            Attribute::Kitchen => Some(Int(i64::from(listing.kitchen()?))),
            Attribute::Construction => Some(Int(listing.construction()?.wire_value())),
            Attribute::Condition => Some(Text(listing.condition()?.code().to_string())),
            Attribute::Reconstruction => Some(Int(i64::from(listing.reconstruction()))),
            Attribute::Ownership => Some(Int(listing.ownership()?.wire_value())),
            Attribute::FloorsNum => listing.floors_num()?.map(Int),
            Attribute::Floor => Some(Int(listing.floor()?)),
            Attribute::BalconyNum => Some(Int(listing.balcony_num()?)),
            Attribute::Cellar => Some(Int(i64::from(listing.cellar()))),
            Attribute::Heating => Some(Int(listing.heating()?.wire_value())),
            Attribute::Elevator => Some(Int(i64::from(listing.elevator()?))),
            Attribute::Insulation => Some(Int(i64::from(listing.insulation()))),
            Attribute::LastUpdateDate => Some(Date(listing.last_update_date()?)),
        })
    }
}

/// Evaluate every attribute against the listing, in column order.
///
/// Each rule runs and fails in isolation: successes come back as
/// `(column, value)` cells, failures are collected per attribute and never
/// abort the rest of the row.
pub fn extract_row(
    listing: &Listing,
) -> (Vec<(u32, CellValue)>, Vec<(Attribute, ExtractError)>) {
    let mut cells = Vec::new();
    let mut failures = Vec::new();

    for (offset, attr) in COLUMN_ORDER.iter().enumerate() {
        let column = FIRST_DATA_COLUMN + offset as u32;
        match attr.evaluate(listing) {
            Ok(Some(value)) => cells.push((column, value)),
            Ok(None) => {}
            Err(e) => failures.push((*attr, e)),
        }
    }

    (cells, failures)
}
