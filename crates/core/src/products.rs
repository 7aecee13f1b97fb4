//! Catalog of refrigerated products and the lowest temperature each tolerates.

use std::collections::BTreeMap;

/// Built-in products with their minimum storage temperature in °C.
pub const DEFAULT_PRODUCTS: &[(&str, i32)] = &[
    ("Bananas", 13),
    ("Chocolate", 18),
    ("Fish", 2),
    ("Meat", -15),
    ("Ice cream", -18),
    ("Frozen pizza", -30),
    ("Cheese", 7),
    ("Sausages", 5),
    ("Butter", 20),
    ("Eggs", 19),
];

/// Case-insensitive product lookup.
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    entries: BTreeMap<String, (String, i32)>,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        let mut catalog = Self {
            entries: BTreeMap::new(),
        };
        for (name, minimum) in DEFAULT_PRODUCTS {
            catalog.insert(name, *minimum);
        }
        catalog
    }
}

impl ProductCatalog {
    /// Built-in catalog with `overrides` applied on top.
    pub fn with_overrides<'a>(overrides: impl IntoIterator<Item = (&'a String, &'a i32)>) -> Self {
        let mut catalog = Self::default();
        for (name, minimum) in overrides {
            catalog.insert(name, *minimum);
        }
        catalog
    }

    /// Add or replace a product.
    pub fn insert(&mut self, name: &str, minimum_temperature_c: i32) {
        let display = name.trim().to_string();
        if display.is_empty() {
            return;
        }
        self.entries
            .insert(display.to_lowercase(), (display, minimum_temperature_c));
    }

    /// Minimum temperature for `product`, ignoring case and surrounding whitespace.
    pub fn minimum_temperature(&self, product: &str) -> Option<i32> {
        self.entries
            .get(&product.trim().to_lowercase())
            .map(|(_, minimum)| *minimum)
    }

    /// Products sorted by name.
    pub fn products(&self) -> impl Iterator<Item = (&str, i32)> {
        self.entries
            .values()
            .map(|(name, minimum)| (name.as_str(), *minimum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let catalog = ProductCatalog::default();
        assert_eq!(catalog.minimum_temperature("  ice CREAM "), Some(-18));
        assert_eq!(catalog.minimum_temperature("Caviar"), None);
    }

    #[test]
    fn overrides_replace_and_extend() {
        let overrides = BTreeMap::from([
            ("bananas".to_string(), 12),
            ("Caviar".to_string(), -2),
        ]);
        let catalog = ProductCatalog::with_overrides(&overrides);
        assert_eq!(catalog.minimum_temperature("Bananas"), Some(12));
        assert_eq!(catalog.minimum_temperature("caviar"), Some(-2));
        assert_eq!(catalog.products().count(), DEFAULT_PRODUCTS.len() + 1);
    }
}
