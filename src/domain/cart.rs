use super::amount::Amount;
use crate::error::{CheckoutError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Fixed item prices the terminal sells at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(BTreeMap<String, Amount>);

impl PriceTable {
    pub fn new(prices: BTreeMap<String, Amount>) -> Self {
        Self(prices)
    }

    pub fn price_of(&self, item: &str) -> Option<Amount> {
        self.0.get(item).copied()
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self(BTreeMap::from([
            ("Apple".to_string(), Amount::new(50)),
            ("Banana".to_string(), Amount::new(30)),
            ("Orange".to_string(), Amount::new(40)),
        ]))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub item_name: String,
    pub unit_price: Amount,
    pub quantity: u32,
}

impl CartLine {
    pub fn subtotal(&self) -> Amount {
        self.unit_price * self.quantity
    }
}

/// Items the customer has picked, keyed by name.
///
/// Lines with a zero quantity are never stored, so `is_empty` is simply
/// whether the mapping has entries.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    prices: PriceTable,
    quantities: HashMap<String, u32>,
}

impl Cart {
    pub fn new(prices: PriceTable) -> Self {
        Self {
            prices,
            quantities: HashMap::new(),
        }
    }

    /// Adds one unit of `item` and returns its new quantity.
    pub fn add_item(&mut self, item: &str) -> Result<u32> {
        if self.prices.price_of(item).is_none() {
            return Err(CheckoutError::UnknownItem(item.to_string()));
        }
        let quantity = self.quantities.entry(item.to_string()).or_insert(0);
        *quantity = quantity.saturating_add(1);
        Ok(*quantity)
    }

    /// Removes one unit of `item`, dropping the line when it reaches zero.
    /// Returns the remaining quantity.
    pub fn remove_item(&mut self, item: &str) -> u32 {
        let Some(quantity) = self.quantities.get_mut(item) else {
            return 0;
        };
        *quantity -= 1;
        let remaining = *quantity;
        if remaining == 0 {
            self.quantities.remove(item);
        }
        remaining
    }

    pub fn clear(&mut self) {
        self.quantities.clear();
    }

    pub fn quantity(&self, item: &str) -> u32 {
        self.quantities.get(item).copied().unwrap_or(0)
    }

    pub fn total(&self) -> Amount {
        self.lines().iter().map(CartLine::subtotal).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Current lines, sorted by item name.
    pub fn lines(&self) -> Vec<CartLine> {
        let mut lines: Vec<CartLine> = self
            .quantities
            .iter()
            .filter_map(|(item, &quantity)| {
                self.prices.price_of(item).map(|unit_price| CartLine {
                    item_name: item.clone(),
                    unit_price,
                    quantity,
                })
            })
            .collect();
        lines.sort_by(|a, b| a.item_name.cmp(&b.item_name));
        lines
    }
}
