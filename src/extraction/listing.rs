//! The Listing aggregate and its attribute rules - the core of the pipeline.
//!
//! The source exposes data inconsistently across listing types: sometimes a
//! structured item, sometimes only free text. Every attribute therefore has
//! its own bespoke rule and fails on its own, instead of going through a
//! shared schema. Rules are recomputed on every call; nothing is cached, so
//! one failing rule never poisons another.

use crate::extraction::text::{keyword_match, parse_price};
use crate::extraction::types::{
    ConditionType, ConstructionType, ExtractError, HeatingType, Item, OwnershipType, RawListing,
};
use chrono::{Duration, Local, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

/// Disposition pattern in meta descriptions, e.g. "2+kk" or "3+1".
const ROOMS_PATTERN: &str = r"[1-9]\+([0-9]|kk)";

/// Keyword groups per heating type, tried in order; first match wins.
const HEATING_KEYWORDS: [(HeatingType, &[&str]); 4] = [
    (HeatingType::Local, &["lokální plynové", "lokální elektrické"]),
    (HeatingType::Etage, &["etážové"]),
    (HeatingType::Central, &["ústřední plynové"]),
    (HeatingType::Remote, &["ústřední dálkové"]),
];

const RECONSTRUCTION_KEYWORDS: [&str; 4] = [
    "zrekonstruováno",
    "zrekonstruovano",
    "po .*rekonstrukci",
    "rekonstrukcí",
];

const CELLAR_KEYWORDS: [&str; 3] = ["sklep", "sklýpek", "sklypek"];

const INSULATION_KEYWORDS: [&str; 3] = ["zateplení", "střecha", "fasáda"];

/// One advertisement, fully determined by the URL it was constructed from.
///
/// Owns the raw payload plus a name-to-index map over its items, built once
/// at construction (last occurrence wins on duplicate names). Serializes as
/// identifier + raw payload for the salvage store; the index is rebuilt, not
/// persisted.
#[derive(Debug, Serialize)]
pub struct Listing {
    identifier: u64,
    raw: RawListing,
    #[serde(skip)]
    items: HashMap<String, usize>,
}

impl Listing {
    pub fn new(identifier: u64, raw: RawListing) -> Self {
        let items = raw
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.name.clone(), idx))
            .collect();

        Listing {
            identifier,
            raw,
            items,
        }
    }

    pub fn identifier(&self) -> u64 {
        self.identifier
    }

    fn get_item(&self, name: &str) -> Option<&Item> {
        self.items.get(name).map(|idx| &self.raw.items[*idx])
    }

    fn item(&self, name: &str) -> Result<&Item, ExtractError> {
        self.get_item(name)
            .ok_or_else(|| ExtractError::MissingItem(name.to_string()))
    }

    /// Lowercased long-form description, the default keyword-search target.
    fn description_lower(&self) -> String {
        self.raw.text.value.to_lowercase()
    }

    /// Usable area in square meters.
    pub fn size_m2(&self) -> Result<i64, ExtractError> {
        let item = self.item("Užitná plocha")?;
        item.value_i64()
            .ok_or_else(|| ExtractError::invalid("Užitná plocha", &item.value))
    }

    /// Whether the listing offers a rental (price per month) rather than a
    /// sale (price per property). Any other unit is a domain error.
    pub fn rentable(&self) -> Result<bool, ExtractError> {
        let unit = self.item("Celková cena")?.unit.as_deref();
        match unit {
            Some("za měsíc") => Ok(true),
            Some("za nemovitost") => Ok(false),
            other => Err(ExtractError::UnexpectedUnit(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    fn price_value(&self) -> Result<i64, ExtractError> {
        let item = self.item("Celková cena")?;
        let raw = item
            .value_str()
            .ok_or_else(|| ExtractError::invalid("Celková cena", &item.value))?;
        parse_price(raw).ok_or_else(|| ExtractError::invalid("Celková cena", raw))
    }

    /// Sale price in CZK; None for rentals.
    pub fn price_czk(&self) -> Result<Option<i64>, ExtractError> {
        if self.rentable()? {
            return Ok(None);
        }
        self.price_value().map(Some)
    }

    /// Monthly rent in CZK; None for sales.
    pub fn rent_czk(&self) -> Result<Option<i64>, ExtractError> {
        if !self.rentable()? {
            return Ok(None);
        }
        self.price_value().map(Some)
    }

    /// True if any note on the price item mentions a commission.
    pub fn provision(&self) -> bool {
        match self.get_item("Celková cena") {
            Some(item) => item
                .notes
                .iter()
                .any(|note| note.to_lowercase().contains("provize")),
            None => false,
        }
    }

    fn rooms_match(&self) -> Result<String, ExtractError> {
        let meta = self.raw.meta_description.to_lowercase();
        Regex::new(ROOMS_PATTERN)
            .ok()
            .and_then(|re| re.find(&meta).map(|m| m.as_str().to_string()))
            .ok_or(ExtractError::RoomsNotFound(meta))
    }

    /// Room count from the disposition in the meta description ("2+kk" → 2).
    pub fn rooms_num(&self) -> Result<i64, ExtractError> {
        let m = self.rooms_match()?;
        let digit = m.chars().next().and_then(|c| c.to_digit(10));
        match digit {
            Some(d) => Ok(i64::from(d)),
            None => Err(ExtractError::RoomsNotFound(m)),
        }
    }

    /// Separate kitchen from the disposition suffix: "+1" yes, "+kk" no.
    pub fn kitchen(&self) -> Result<bool, ExtractError> {
        let m = self.rooms_match()?;
        match m.split('+').nth(1) {
            Some("1") => Ok(true),
            Some("kk") => Ok(false),
            _ => Err(ExtractError::UnknownKitchen(
                self.raw.meta_description.to_lowercase(),
            )),
        }
    }

    /// Construction material. Unrecognized values fall back to Other, but a
    /// missing "Stavba" item still raises - the item lookup runs first.
    pub fn construction(&self) -> Result<ConstructionType, ExtractError> {
        let item = self.item("Stavba")?;
        let value = item
            .value_str()
            .ok_or_else(|| ExtractError::invalid("Stavba", &item.value))?;
        Ok(match value.to_lowercase().as_str() {
            "cihlová" => ConstructionType::Brick,
            "panelová" => ConstructionType::Panel,
            _ => ConstructionType::Other,
        })
    }

    pub fn condition(&self) -> Result<ConditionType, ExtractError> {
        let item = self.item("Stav objektu")?;
        let value = item
            .value_str()
            .ok_or_else(|| ExtractError::invalid("Stav objektu", &item.value))?;
        if value.to_lowercase().contains("špatný") {
            Ok(ConditionType::Bad)
        } else {
            Ok(ConditionType::Good)
        }
    }

    /// True if the description claims a reconstruction that is not merely
    /// planned ("před rekonstrukcí" negates the claim).
    pub fn reconstruction(&self) -> bool {
        let text = self.description_lower();
        keyword_match(&RECONSTRUCTION_KEYWORDS, &text)
            && !keyword_match(&["před rekonstrukcí"], &text)
    }

    pub fn ownership(&self) -> Result<OwnershipType, ExtractError> {
        let item = self.item("Vlastnictví")?;
        let value = item
            .value_str()
            .ok_or_else(|| ExtractError::invalid("Vlastnictví", &item.value))?;
        Ok(match value.to_lowercase().as_str() {
            "osobní" => OwnershipType::Personal,
            "družstevní" => OwnershipType::Cooperative,
            _ => OwnershipType::Other,
        })
    }

    /// Total floors in the building, the trailing token of the floor item
    /// ("3. podlaží z 5" → 5). None when the item carries no total.
    pub fn floors_num(&self) -> Result<Option<i64>, ExtractError> {
        let item = self.item("Podlaží")?;
        let value = item
            .value_str()
            .ok_or_else(|| ExtractError::invalid("Podlaží", &item.value))?;
        Ok(value.split(' ').next_back().and_then(|t| t.parse().ok()))
    }

    /// Floor of the unit, the leading token of the floor item
    /// ("3. podlaží z 5" → 3).
    pub fn floor(&self) -> Result<i64, ExtractError> {
        let item = self.item("Podlaží")?;
        let value = item
            .value_str()
            .ok_or_else(|| ExtractError::invalid("Podlaží", &item.value))?;
        value
            .split('.')
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| ExtractError::invalid("Podlaží", value))
    }

    /// Balcony count, falling back to loggias, then zero.
    pub fn balcony_num(&self) -> Result<i64, ExtractError> {
        for name in ["Balkón", "Lodžie"] {
            if let Some(item) = self.get_item(name) {
                return item
                    .value_i64()
                    .ok_or_else(|| ExtractError::invalid(name, &item.value));
            }
        }
        Ok(0)
    }

    pub fn cellar(&self) -> bool {
        keyword_match(&CELLAR_KEYWORDS, &self.description_lower())
    }

    /// Heating type from the structured item's joined display values, or from
    /// the long-form description when the item is absent. Keyword groups run
    /// in declaration order and the first match wins.
    pub fn heating(&self) -> Result<HeatingType, ExtractError> {
        let text = match self.get_item("Topení") {
            Some(item) => match &item.value {
                serde_json::Value::Array(entries) => entries
                    .iter()
                    .filter_map(|e| e.get("value").and_then(|v| v.as_str()))
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase(),
                serde_json::Value::String(s) => s.to_lowercase(),
                other => return Err(ExtractError::invalid("Topení", other)),
            },
            None => self.description_lower(),
        };

        for (heating, keywords) in HEATING_KEYWORDS {
            if keyword_match(keywords, &text) {
                return Ok(heating);
            }
        }
        Err(ExtractError::HeatingNotFound)
    }

    pub fn elevator(&self) -> Result<bool, ExtractError> {
        let item = self.item("Výtah")?;
        item.value_bool()
            .ok_or_else(|| ExtractError::invalid("Výtah", &item.value))
    }

    pub fn insulation(&self) -> bool {
        keyword_match(&INSULATION_KEYWORDS, &self.description_lower())
    }

    /// Last update of the listing: "dnes" is today, "včera" yesterday,
    /// anything else must parse as DD.MM.YYYY.
    pub fn last_update_date(&self) -> Result<NaiveDate, ExtractError> {
        let item = self.item("Aktualizace")?;
        let value = item
            .value_str()
            .ok_or_else(|| ExtractError::invalid("Aktualizace", &item.value))?
            .to_lowercase();

        let today = Local::now().date_naive();
        match value.as_str() {
            "dnes" => Ok(today),
            "včera" => Ok(today - Duration::days(1)),
            other => NaiveDate::parse_from_str(other, "%d.%m.%Y")
                .map_err(|_| ExtractError::InvalidDate(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(payload: serde_json::Value) -> Listing {
        Listing::new(3890874972, serde_json::from_value(payload).unwrap())
    }

    fn sale_listing() -> Listing {
        listing(json!({
            "items": [
                {"name": "Užitná plocha", "value": "65"},
                {"name": "Celková cena", "value": "5 500 000",
                 "unit": "za nemovitost", "notes": []},
                {"name": "Podlaží", "value": "3. podlaží z 5"},
                {"name": "Výtah", "value": true}
            ],
            "meta_description": "Prodej bytu 2+kk, Praha",
            "text": {"value": "Byt po kompletní rekonstrukci se sklepem."}
        }))
    }

    #[test]
    fn test_sale_listing_end_to_end() {
        let ad = sale_listing();
        assert_eq!(ad.size_m2().unwrap(), 65);
        assert!(!ad.rentable().unwrap());
        assert_eq!(ad.price_czk().unwrap(), Some(5_500_000));
        assert_eq!(ad.rent_czk().unwrap(), None);
        assert_eq!(ad.rooms_num().unwrap(), 2);
        assert!(!ad.kitchen().unwrap());
        assert_eq!(ad.floor().unwrap(), 3);
        assert_eq!(ad.floors_num().unwrap(), Some(5));
        assert!(ad.elevator().unwrap());
    }

    #[test]
    fn test_rentable_gates_price_and_rent() {
        let ad = listing(json!({
            "items": [
                {"name": "Celková cena", "value": "18 500", "unit": "za měsíc"}
            ]
        }));
        assert!(ad.rentable().unwrap());
        assert_eq!(ad.rent_czk().unwrap(), Some(18_500));
        assert_eq!(ad.price_czk().unwrap(), None);
    }

    #[test]
    fn test_unexpected_price_unit() {
        let ad = listing(json!({
            "items": [
                {"name": "Celková cena", "value": "1", "unit": "za m²"}
            ]
        }));
        assert!(matches!(
            ad.rentable(),
            Err(ExtractError::UnexpectedUnit(u)) if u == "za m²"
        ));
    }

    #[test]
    fn test_provision_from_price_notes() {
        let ad = listing(json!({
            "items": [
                {"name": "Celková cena", "value": "1", "unit": "za měsíc",
                 "notes": ["+ provize RK", "včetně poplatků"]}
            ]
        }));
        assert!(ad.provision());

        let ad = listing(json!({"items": []}));
        assert!(!ad.provision());
    }

    #[test]
    fn test_rooms_and_kitchen_are_consistent() {
        let ad = listing(json!({"meta_description": "Prodej bytu 3+kk, 72 m²"}));
        assert_eq!(ad.rooms_num().unwrap(), 3);
        assert!(!ad.kitchen().unwrap());

        let ad = listing(json!({"meta_description": "Pronájem bytu 2+1"}));
        assert_eq!(ad.rooms_num().unwrap(), 2);
        assert!(ad.kitchen().unwrap());
    }

    #[test]
    fn test_rooms_missing_pattern() {
        let ad = listing(json!({"meta_description": "Prodej pozemku, Beroun"}));
        assert!(matches!(ad.rooms_num(), Err(ExtractError::RoomsNotFound(_))));
        assert!(ad.kitchen().is_err());
    }

    #[test]
    fn test_unknown_kitchen_suffix() {
        let ad = listing(json!({"meta_description": "Prodej bytu 2+2"}));
        assert_eq!(ad.rooms_num().unwrap(), 2);
        assert!(matches!(ad.kitchen(), Err(ExtractError::UnknownKitchen(_))));
    }

    #[test]
    fn test_construction_variants() {
        let brick = listing(json!({"items": [{"name": "Stavba", "value": "Cihlová"}]}));
        assert_eq!(brick.construction().unwrap(), ConstructionType::Brick);

        let panel = listing(json!({"items": [{"name": "Stavba", "value": "Panelová"}]}));
        assert_eq!(panel.construction().unwrap(), ConstructionType::Panel);

        let other = listing(json!({"items": [{"name": "Stavba", "value": "Smíšená"}]}));
        assert_eq!(other.construction().unwrap(), ConstructionType::Other);
    }

    #[test]
    fn test_construction_missing_item_raises() {
        // The Other fallback only covers an unrecognized present value.
        let ad = listing(json!({"items": []}));
        assert!(matches!(
            ad.construction(),
            Err(ExtractError::MissingItem(name)) if name == "Stavba"
        ));
    }

    #[test]
    fn test_condition() {
        let bad = listing(json!({"items": [{"name": "Stav objektu", "value": "Špatný stav"}]}));
        assert_eq!(bad.condition().unwrap(), ConditionType::Bad);

        let good = listing(json!({"items": [{"name": "Stav objektu", "value": "Velmi dobrý"}]}));
        assert_eq!(good.condition().unwrap(), ConditionType::Good);
    }

    #[test]
    fn test_reconstruction_negated_by_planned_one() {
        let done = listing(json!({"text": {"value": "byt po celkové rekonstrukci"}}));
        assert!(done.reconstruction());

        let planned = listing(json!({"text": {"value": "byt před rekonstrukcí"}}));
        assert!(!planned.reconstruction());
    }

    #[test]
    fn test_ownership_variants() {
        let ad = listing(json!({"items": [{"name": "Vlastnictví", "value": "Osobní"}]}));
        assert_eq!(ad.ownership().unwrap(), OwnershipType::Personal);

        let ad = listing(json!({"items": [{"name": "Vlastnictví", "value": "Družstevní"}]}));
        assert_eq!(ad.ownership().unwrap(), OwnershipType::Cooperative);

        let ad = listing(json!({"items": [{"name": "Vlastnictví", "value": "Státní/obecní"}]}));
        assert_eq!(ad.ownership().unwrap(), OwnershipType::Other);
    }

    #[test]
    fn test_floors_num_none_without_total() {
        let ad = listing(json!({"items": [{"name": "Podlaží", "value": "1. podlaží"}]}));
        assert_eq!(ad.floor().unwrap(), 1);
        assert_eq!(ad.floors_num().unwrap(), None);
    }

    #[test]
    fn test_floor_non_numeric_raises() {
        let ad = listing(json!({"items": [{"name": "Podlaží", "value": "přízemí"}]}));
        assert!(matches!(ad.floor(), Err(ExtractError::InvalidValue { .. })));
    }

    #[test]
    fn test_balcony_fallback_to_loggia_then_zero() {
        let ad = listing(json!({"items": [{"name": "Balkón", "value": 1}]}));
        assert_eq!(ad.balcony_num().unwrap(), 1);

        let ad = listing(json!({"items": [{"name": "Lodžie", "value": "2"}]}));
        assert_eq!(ad.balcony_num().unwrap(), 2);

        let ad = listing(json!({"items": []}));
        assert_eq!(ad.balcony_num().unwrap(), 0);
    }

    #[test]
    fn test_cellar_and_insulation_keywords() {
        let ad = sale_listing();
        assert!(ad.cellar());
        assert!(!ad.insulation());

        let ad = listing(json!({"text": {"value": "dům po zateplení, nová fasáda"}}));
        assert!(ad.insulation());
        assert!(!ad.cellar());
    }

    #[test]
    fn test_heating_from_structured_item() {
        let ad = listing(json!({
            "items": [
                {"name": "Topení", "value": [{"value": "Ústřední plynové"}]}
            ]
        }));
        assert_eq!(ad.heating().unwrap(), HeatingType::Central);
    }

    #[test]
    fn test_heating_falls_back_to_description() {
        let ad = listing(json!({
            "items": [],
            "text": {"value": "Vytápění je lokální plynové."}
        }));
        assert_eq!(ad.heating().unwrap(), HeatingType::Local);
    }

    #[test]
    fn test_heating_first_match_wins_over_later_groups() {
        // Etage is declared before Remote, so it wins even though both match.
        let ad = listing(json!({
            "items": [],
            "text": {"value": "topení etážové, dříve ústřední dálkové"}
        }));
        assert_eq!(ad.heating().unwrap(), HeatingType::Etage);
    }

    #[test]
    fn test_heating_not_found() {
        let ad = listing(json!({
            "items": [],
            "text": {"value": "krásný výhled na město"}
        }));
        assert!(matches!(ad.heating(), Err(ExtractError::HeatingNotFound)));
    }

    #[test]
    fn test_elevator_requires_boolean() {
        let ad = listing(json!({"items": [{"name": "Výtah", "value": "ano"}]}));
        assert!(matches!(ad.elevator(), Err(ExtractError::InvalidValue { .. })));

        let ad = listing(json!({"items": []}));
        assert!(matches!(ad.elevator(), Err(ExtractError::MissingItem(_))));
    }

    #[test]
    fn test_last_update_date_relative_and_absolute() {
        let today = Local::now().date_naive();

        let ad = listing(json!({"items": [{"name": "Aktualizace", "value": "Dnes"}]}));
        assert_eq!(ad.last_update_date().unwrap(), today);

        let ad = listing(json!({"items": [{"name": "Aktualizace", "value": "Včera"}]}));
        assert_eq!(ad.last_update_date().unwrap(), today - Duration::days(1));

        let ad = listing(json!({"items": [{"name": "Aktualizace", "value": "15.03.2021"}]}));
        assert_eq!(
            ad.last_update_date().unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_last_update_date_unparseable() {
        let ad = listing(json!({"items": [{"name": "Aktualizace", "value": "minulý týden"}]}));
        assert!(matches!(
            ad.last_update_date(),
            Err(ExtractError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_duplicate_item_names_last_wins() {
        let ad = listing(json!({
            "items": [
                {"name": "Užitná plocha", "value": "40"},
                {"name": "Užitná plocha", "value": "65"}
            ]
        }));
        assert_eq!(ad.size_m2().unwrap(), 65);
    }
}
