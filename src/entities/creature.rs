// Creature records - raw marketplace listings and what we persist
//
// ListingRecord is the upstream shape, decoded leniently: every field may be
// missing, ids may arrive as strings, prices as strings or numbers.
// PersistedCreature is the normalized row kept in a class store.

use crate::error::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

// ============================================================================
// LISTING RECORD (external, ephemeral)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(default)]
    pub name: Option<String>,

    /// Nested optional price; absent or null means no offer
    #[serde(default, rename = "highestOffer")]
    pub highest_offer: Option<HighestOffer>,

    #[serde(default, rename = "class")]
    pub class_tag: Option<String>,

    #[serde(default)]
    pub stage: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighestOffer {
    #[serde(default, rename = "currentPriceUsd")]
    pub current_price_usd: Option<Value>,
}

impl ListingRecord {
    /// Create a listing with every field present
    pub fn new(id: i64, name: &str, class_tag: &str, stage: i64) -> Self {
        ListingRecord {
            id: Some(Value::from(id)),
            name: Some(name.to_string()),
            highest_offer: None,
            class_tag: Some(class_tag.to_string()),
            stage: Some(stage),
        }
    }

    /// Builder pattern: attach a highest offer in USD
    pub fn with_price(mut self, price_usd: &str) -> Self {
        self.highest_offer = Some(HighestOffer {
            current_price_usd: Some(Value::String(price_usd.to_string())),
        });
        self
    }

    /// External identity. Accepts a JSON integer or a numeric string.
    pub fn external_id(&self) -> Result<i64> {
        match &self.id {
            Some(Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| Error::malformed(format!("id {} is not an integer", n))),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::malformed(format!("id {:?} is not an integer", s))),
            Some(other) => Err(Error::malformed(format!("id has unexpected type: {}", other))),
            None => Err(Error::malformed("missing id")),
        }
    }

    /// Price of the highest offer, or zero when there is none
    pub fn price_usd(&self) -> Result<Decimal> {
        let raw = self
            .highest_offer
            .as_ref()
            .and_then(|offer| offer.current_price_usd.as_ref());

        match raw {
            None | Some(Value::Null) => Ok(Decimal::ZERO),
            Some(Value::Number(n)) => parse_decimal(&n.to_string()),
            Some(Value::String(s)) => parse_decimal(s.trim()),
            Some(other) => Err(Error::malformed(format!(
                "currentPriceUsd has unexpected type: {}",
                other
            ))),
        }
    }

    /// Short label for diagnostics
    pub fn describe(&self) -> String {
        let id = self
            .id
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        format!("axie {} ({})", id, self.name.as_deref().unwrap_or("unnamed"))
    }
}

fn parse_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| Error::malformed(format!("price {:?} is not a decimal", text)))
}

// ============================================================================
// PERSISTED CREATURE (one row in a class store)
// ============================================================================

/// Serialized with the field names the HTTP API has always exposed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCreature {
    #[serde(rename = "axie_id")]
    pub external_id: i64,

    #[serde(rename = "name")]
    pub display_name: String,

    pub stage: i64,

    #[serde(rename = "current_price_usd", with = "rust_decimal::serde::float")]
    pub price_usd: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_marketplace_item() {
        let record: ListingRecord = serde_json::from_value(json!({
            "id": "11234567",
            "name": "Axie #11234567",
            "highestOffer": { "currentPriceUsd": "4.72" },
            "class": "Beast",
            "stage": 4
        }))
        .unwrap();

        assert_eq!(record.external_id().unwrap(), 11234567);
        assert_eq!(record.price_usd().unwrap(), Decimal::from_str("4.72").unwrap());
        assert_eq!(record.class_tag.as_deref(), Some("Beast"));
        assert_eq!(record.stage, Some(4));
    }

    #[test]
    fn test_missing_offer_defaults_to_zero() {
        let no_offer: ListingRecord = serde_json::from_value(json!({
            "id": 1, "name": "a", "class": "Bug", "stage": 1
        }))
        .unwrap();
        let null_offer: ListingRecord = serde_json::from_value(json!({
            "id": 2, "name": "b", "highestOffer": null, "class": "Bug", "stage": 1
        }))
        .unwrap();

        assert_eq!(no_offer.price_usd().unwrap(), Decimal::ZERO);
        assert_eq!(null_offer.price_usd().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_numeric_price_is_accepted() {
        let record: ListingRecord = serde_json::from_value(json!({
            "id": 3, "name": "c", "highestOffer": { "currentPriceUsd": 12.5 }, "class": "Mech", "stage": 2
        }))
        .unwrap();

        assert_eq!(record.price_usd().unwrap(), Decimal::from_str("12.5").unwrap());
    }

    #[test]
    fn test_bad_id_and_price_are_malformed() {
        let mut record = ListingRecord::new(7, "x", "Plant", 1).with_price("cheap");
        assert!(matches!(record.price_usd(), Err(Error::MalformedRecord(_))));

        record.id = Some(json!("seven"));
        assert!(matches!(record.external_id(), Err(Error::MalformedRecord(_))));

        record.id = None;
        assert!(matches!(record.external_id(), Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn test_persisted_creature_wire_format() {
        let creature = PersistedCreature {
            external_id: 42,
            display_name: "Puff".to_string(),
            stage: 4,
            price_usd: Decimal::from_str("10.25").unwrap(),
        };

        let value = serde_json::to_value(&creature).unwrap();
        assert_eq!(value["axie_id"], 42);
        assert_eq!(value["name"], "Puff");
        assert_eq!(value["current_price_usd"], 10.25);
    }
}
