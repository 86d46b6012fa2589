//! Core data types for the extraction pipeline
//! Pure data structures with no behavior beyond value coercion

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw JSON document fetched for one listing.
///
/// Every field defaults when the source omits it, so a gap in the payload
/// surfaces later as a per-attribute extraction error rather than a fetch
/// failure.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub text: TextBlock,
}

/// Long-form listing description, nested under `text.value` in the source.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub value: String,
}

/// One named attribute record in the source's semi-structured representation.
///
/// `value` stays a loose JSON value: the source mixes strings, numbers,
/// booleans and nested arrays under the same key depending on listing type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Item {
    /// String value, if the source stored one.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    /// Integer value, accepting both JSON numbers and numeric strings.
    pub fn value_i64(&self) -> Option<i64> {
        match &self.value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean value, only if the source stored a real boolean.
    pub fn value_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }
}

/// Construction material of the building.
/// Wire values: brick 1, panel 2, other 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructionType {
    Brick,
    Panel,
    Other,
}

impl ConstructionType {
    pub fn wire_value(self) -> i64 {
        match self {
            ConstructionType::Brick => 1,
            ConstructionType::Panel => 2,
            ConstructionType::Other => 0,
        }
    }
}

/// Ownership form of the unit.
/// Wire values: personal 1, cooperative 2, other 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnershipType {
    Personal,
    Cooperative,
    Other,
}

impl OwnershipType {
    pub fn wire_value(self) -> i64 {
        match self {
            OwnershipType::Personal => 1,
            OwnershipType::Cooperative => 2,
            OwnershipType::Other => 3,
        }
    }
}

/// Heating system category.
/// Wire values: local 1, etage 2, central 3, remote 4.
/// Declaration order is load-bearing: keyword matching tries members in this
/// order and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeatingType {
    Local,
    Etage,
    Central,
    Remote,
}

impl HeatingType {
    pub fn wire_value(self) -> i64 {
        match self {
            HeatingType::Local => 1,
            HeatingType::Etage => 2,
            HeatingType::Central => 3,
            HeatingType::Remote => 4,
        }
    }
}

/// Overall condition of the building, persisted as a single-character code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionType {
    Good,
    Bad,
}

impl ConditionType {
    pub fn code(self) -> char {
        match self {
            ConditionType::Good => 'D',
            ConditionType::Bad => 'S',
        }
    }
}

/// Failure of a single attribute rule. Never fatal to the other rules:
/// the orchestrator logs it, salvages the listing, and moves on.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing item: {0}")]
    MissingItem(String),

    #[error("unexpected unit: {0}")]
    UnexpectedUnit(String),

    #[error("number of rooms not found in: {0}")]
    RoomsNotFound(String),

    #[error("unknown kitchen type in meta description: {0}")]
    UnknownKitchen(String),

    #[error("heating type not found")]
    HeatingNotFound,

    #[error("invalid value for {item}: {value}")]
    InvalidValue { item: String, value: String },

    #[error("unparseable date: {0}")]
    InvalidDate(String),
}

impl ExtractError {
    pub(crate) fn invalid(item: &str, value: impl ToString) -> Self {
        ExtractError::InvalidValue {
            item: item.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_value_coercions() {
        let item: Item = serde_json::from_value(json!({
            "name": "Užitná plocha",
            "value": "65"
        }))
        .unwrap();
        assert_eq!(item.value_i64(), Some(65));
        assert_eq!(item.value_str(), Some("65"));
        assert_eq!(item.value_bool(), None);

        let item: Item = serde_json::from_value(json!({
            "name": "Výtah",
            "value": true
        }))
        .unwrap();
        assert_eq!(item.value_bool(), Some(true));
        assert_eq!(item.value_i64(), None);

        let item: Item = serde_json::from_value(json!({
            "name": "Balkón",
            "value": 2
        }))
        .unwrap();
        assert_eq!(item.value_i64(), Some(2));
    }

    #[test]
    fn test_raw_listing_defaults_missing_sections() {
        let raw: RawListing = serde_json::from_value(json!({
            "items": [{"name": "Stavba", "value": "cihlová"}]
        }))
        .unwrap();
        assert_eq!(raw.items.len(), 1);
        assert!(raw.meta_description.is_empty());
        assert!(raw.text.value.is_empty());
    }

    #[test]
    fn test_wire_values_are_stable() {
        assert_eq!(ConstructionType::Brick.wire_value(), 1);
        assert_eq!(ConstructionType::Panel.wire_value(), 2);
        assert_eq!(ConstructionType::Other.wire_value(), 0);

        assert_eq!(OwnershipType::Personal.wire_value(), 1);
        assert_eq!(OwnershipType::Cooperative.wire_value(), 2);
        assert_eq!(OwnershipType::Other.wire_value(), 3);

        assert_eq!(HeatingType::Local.wire_value(), 1);
        assert_eq!(HeatingType::Etage.wire_value(), 2);
        assert_eq!(HeatingType::Central.wire_value(), 3);
        assert_eq!(HeatingType::Remote.wire_value(), 4);

        assert_eq!(ConditionType::Good.code(), 'D');
        assert_eq!(ConditionType::Bad.code(), 'S');
    }
}
