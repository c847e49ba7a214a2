//! Chargers and connectors owned by the account

use crate::error::{ChargeDeckError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single physical charging port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
pub struct Connector {
    pub id: String,
    pub label: String,
}

/// Display record for a charger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
pub struct Charger {
    pub id: String,
    pub name: String,
    /// Short badge such as "Private" or "Commercial"
    pub tag: String,
    pub location: String,
    /// Primary connector type shown on the charger card
    pub connector: String,
    pub max_power_kw: f64,
    /// Lifetime amount earned
    pub amount: f64,
    #[serde(default)]
    pub connectors: Vec<Connector>,
}

/// Charger lookup built once at startup
#[derive(Debug, Clone)]
pub struct Catalog {
    chargers: Vec<Charger>,
    index: HashMap<String, usize>,
    commercial_charger_id: String,
}

impl Catalog {
    /// Build the catalog; duplicate ids are rejected
    pub fn new(chargers: Vec<Charger>, commercial_charger_id: &str) -> Result<Self> {
        let mut index = HashMap::with_capacity(chargers.len());
        for (pos, charger) in chargers.iter().enumerate() {
            if index.insert(charger.id.clone(), pos).is_some() {
                return Err(ChargeDeckError::validation(
                    "chargers.id",
                    format!("Duplicate charger id '{}'", charger.id),
                ));
            }
        }
        Ok(Self {
            chargers,
            index,
            commercial_charger_id: commercial_charger_id.to_string(),
        })
    }

    pub fn list(&self) -> &[Charger] {
        &self.chargers
    }

    pub fn get(&self, id: &str) -> Option<&Charger> {
        self.index.get(id).map(|&pos| &self.chargers[pos])
    }

    /// Connectors of a charger, `None` for an unknown charger
    pub fn connectors(&self, id: &str) -> Option<&[Connector]> {
        self.get(id).map(|c| c.connectors.as_slice())
    }

    /// Whether sessions on this charger are billed
    pub fn is_commercial(&self, id: &str) -> bool {
        id == self.commercial_charger_id
    }

    pub fn commercial_charger_id(&self) -> &str {
        &self.commercial_charger_id
    }
}
