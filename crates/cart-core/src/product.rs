//! # Product Catalog
//!
//! A simple purchaseable catalog loaded from `config/products.toml`.
//! Hosts with their own catalog implement [`Purchaseable`] on their types
//! instead.

use crate::entity::Purchaseable;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Purchaseable type recorded for catalog products
pub const PRODUCT_TYPE: &str = "product";

/// A product in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier (e.g., "tee-classic-black")
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Retail unit price
    pub price: Money,

    /// Whether this product can currently be added to carts
    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            active: true,
            image_url: None,
            metadata: HashMap::new(),
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: mark as unavailable
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Builder: add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Purchaseable for Product {
    fn identifier(&self) -> String {
        self.id.clone()
    }

    fn purchaseable_type(&self) -> String {
        PRODUCT_TYPE.to_string()
    }

    fn retail_price(&self) -> Money {
        self.price
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

/// Product catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default)]
    pub products: Vec<Product>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Builder: add a product
    pub fn with_product(mut self, product: Product) -> Self {
        self.add(product);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.active)
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_is_purchaseable() {
        let product = Product::new("tee", "Classic Tee", Money::from_cents(1999));
        assert_eq!(product.identifier(), "tee");
        assert_eq!(product.purchaseable_type(), "product");
        assert_eq!(product.retail_price(), Money::from_cents(1999));
        assert_eq!(product.display_name(), "Classic Tee");
    }

    #[test]
    fn test_product_builder() {
        let product = Product::new("mug", "Mug", Money::from_units(8))
            .with_description("Stoneware")
            .with_metadata("sku", "MUG-01")
            .inactive();

        assert_eq!(product.description, "Stoneware");
        assert_eq!(product.metadata.get("sku"), Some(&"MUG-01".to_string()));
        assert!(!product.active);
    }

    #[test]
    fn test_catalog_from_toml() {
        let catalog = ProductCatalog::from_toml(
            r#"
            [[products]]
            id = "tee"
            name = "Classic Tee"
            price = "19.99"

            [[products]]
            id = "poster"
            name = "Poster"
            price = "7.50"
            active = false
            "#,
        )
        .unwrap();

        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.get("tee").unwrap().price, Money::from_cents(1999));
        assert_eq!(catalog.active_products().count(), 1);
        assert!(catalog.get("missing").is_none());
    }
}
