//! # Catalog Input
//!
//! Form input for items and parties, validated into records.

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{Item, Party};
use crate::validation;

/// Item form. `opening_stock` is only read on creation; afterwards stock moves
/// through documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    pub name: String,
    pub cost: Money,
    pub price: Money,
    #[serde(default)]
    pub opening_stock: i64,
}

impl ItemInput {
    /// Validates and builds a new item.
    pub fn into_item(self, id: String, code: String) -> CoreResult<Item> {
        let name = self.validate()?;
        validation::validate_stock(self.opening_stock)?;
        Ok(Item {
            id,
            code,
            name,
            cost: self.cost,
            price: self.price,
            stock: self.opening_stock,
        })
    }

    /// Validates and copies the editable fields onto `item`, stock excluded.
    pub fn apply_to(self, item: &mut Item) -> CoreResult<()> {
        item.name = self.validate()?;
        item.cost = self.cost;
        item.price = self.price;
        Ok(())
    }

    /// Returns the trimmed name.
    pub fn validate(&self) -> CoreResult<String> {
        let name = validation::validate_name("name", &self.name)?;
        validation::validate_cost(self.cost)?;
        validation::validate_price(self.price)?;
        Ok(name)
    }
}

/// Customer or supplier form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyInput {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl PartyInput {
    pub fn into_party(self, id: String, code: String) -> CoreResult<Party> {
        let mut party = Party {
            id,
            code,
            name: String::new(),
            phone: None,
            email: None,
            address: None,
        };
        self.apply_to(&mut party)?;
        Ok(party)
    }

    /// Validates and copies every field onto `party`. On error `party` is
    /// left as it was.
    pub fn apply_to(self, party: &mut Party) -> CoreResult<()> {
        let name = self.validate()?;
        party.name = name;
        party.phone = validation::validate_phone(self.phone.as_deref())?;
        party.email = validation::validate_email(self.email.as_deref())?;
        party.address = validation::optional_text(self.address.as_deref());
        Ok(())
    }

    /// Returns the trimmed name.
    pub fn validate(&self) -> CoreResult<String> {
        let name = validation::validate_name("name", &self.name)?;
        validation::validate_phone(self.phone.as_deref())?;
        validation::validate_email(self.email.as_deref())?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_input() {
        let input = ItemInput {
            name: " Widget ".to_string(),
            cost: Money::from_major(30),
            price: Money::from_major(50),
            opening_stock: 10,
        };
        let item = input.into_item("i".to_string(), "IT001".to_string()).unwrap();
        assert_eq!(item.name, "Widget");
        assert_eq!(item.stock, 10);
    }

    #[test]
    fn test_item_update_leaves_stock() {
        let mut item = ItemInput {
            name: "Widget".to_string(),
            cost: Money::from_major(30),
            price: Money::from_major(50),
            opening_stock: 10,
        }
        .into_item("i".to_string(), "IT001".to_string())
        .unwrap();

        ItemInput {
            name: "Widget Pro".to_string(),
            cost: Money::from_major(35),
            price: Money::from_major(60),
            opening_stock: 999,
        }
        .apply_to(&mut item)
        .unwrap();

        assert_eq!(item.name, "Widget Pro");
        assert_eq!(item.price, Money::from_major(60));
        assert_eq!(item.stock, 10);
    }

    #[test]
    fn test_item_input_rejects_bad_amounts() {
        let bad_price = ItemInput {
            name: "Widget".to_string(),
            cost: Money::zero(),
            price: Money::zero(),
            opening_stock: 0,
        };
        assert!(bad_price.validate().is_err());

        let bad_stock = ItemInput {
            name: "Widget".to_string(),
            cost: Money::zero(),
            price: Money::from_major(1),
            opening_stock: -1,
        };
        assert!(bad_stock.into_item("i".into(), "IT001".into()).is_err());
    }

    #[test]
    fn test_party_input_validates_contact_fields() {
        let party = PartyInput {
            name: "Ali".to_string(),
            phone: Some("0551234567".to_string()),
            email: Some(" ali@shop.sa ".to_string()),
            address: Some("".to_string()),
        }
        .into_party("c".to_string(), "CU001".to_string())
        .unwrap();
        assert_eq!(party.email.as_deref(), Some("ali@shop.sa"));
        assert_eq!(party.address, None);

        let mut existing = party.clone();
        let err = PartyInput {
            name: "Ali B".to_string(),
            phone: Some("123".to_string()),
            ..Default::default()
        }
        .apply_to(&mut existing);
        assert!(err.is_err());
        assert_eq!(existing, party);
    }
}
