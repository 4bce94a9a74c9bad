// src/catalog.rs - Static product catalog loaded once at startup.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read product data: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse product data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id {0}")]
    DuplicateId(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub image: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProductFile {
    products: Vec<Product>,
}

/// Immutable product list with id-based lookup. The browsing surface filters
/// it by category and free-text query; the selection layer resolves ids
/// through it.
#[derive(Debug)]
pub struct ProductCatalog {
    products: Vec<Product>,
    by_id: HashMap<i64, usize>,
}

impl ProductCatalog {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let data = tokio::fs::read(path.as_ref()).await?;
        let file: ProductFile = serde_json::from_slice(&data)?;
        Self::from_products(file.products)
    }

    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(products.len());
        for (index, product) in products.iter().enumerate() {
            if by_id.insert(product.id, index).is_some() {
                return Err(CatalogError::DuplicateId(product.id));
            }
        }
        Ok(Self { products, by_id })
    }

    pub fn get(&self, id: i64) -> Option<&Product> {
        self.by_id.get(&id).map(|&index| &self.products[index])
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Distinct categories in first-seen order, for the filter dropdown.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for product in &self.products {
            if !seen.contains(&product.category.as_str()) {
                seen.push(product.category.as_str());
            }
        }
        seen
    }

    /// Category equality plus case-insensitive substring search over
    /// name, brand, and description.
    pub fn filter(&self, category: Option<&str>, query: Option<&str>) -> Vec<&Product> {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        self.products
            .iter()
            .filter(|product| match category {
                Some(category) => product.category == category,
                None => true,
            })
            .filter(|product| match &query {
                Some(query) => {
                    product.name.to_lowercase().contains(query)
                        || product.brand.to_lowercase().contains(query)
                        || product.description.to_lowercase().contains(query)
                }
                None => true,
            })
            .collect()
    }
}

/// Persisted ids may arrive as numbers or strings; normalize both to i64.
pub fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce_id(&value).ok_or_else(|| serde::de::Error::custom("product id must be an integer"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_catalog() -> ProductCatalog {
        let data = serde_json::json!({
            "products": [
                {
                    "id": 1,
                    "name": "Hydra Boost Cleanser",
                    "brand": "Glow Labs",
                    "category": "cleanser",
                    "image": "img/hydra-boost.png",
                    "description": "Gentle gel cleanser with hyaluronic acid."
                },
                {
                    "id": "2",
                    "name": "Velvet Day Cream",
                    "brand": "Glow Labs",
                    "category": "moisturizer",
                    "image": "img/velvet-day.png",
                    "description": "Lightweight daily moisturizer with SPF 15.",
                    "price": "$24.99"
                },
                {
                    "id": 3,
                    "name": "Citrus Foam Wash",
                    "brand": "Pure Peel",
                    "category": "cleanser",
                    "image": "img/citrus-foam.png",
                    "description": "Foaming wash for oily skin."
                }
            ]
        });
        let file: ProductFile = serde_json::from_value(data).unwrap();
        ProductCatalog::from_products(file.products).unwrap()
    }

    #[test]
    fn parses_string_ids() {
        let catalog = sample_catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(2).unwrap().name, "Velvet Day Cream");
    }

    #[test]
    fn filters_by_category() {
        let catalog = sample_catalog();
        let cleansers = catalog.filter(Some("cleanser"), None);
        assert_eq!(cleansers.len(), 2);
        assert!(cleansers.iter().all(|p| p.category == "cleanser"));
    }

    #[test]
    fn search_is_case_insensitive() {
        let catalog = sample_catalog();
        let hits = catalog.filter(None, Some("VELVET"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);

        let brand_hits = catalog.filter(Some("cleanser"), Some("pure peel"));
        assert_eq!(brand_hits.len(), 1);
        assert_eq!(brand_hits[0].id, 3);
    }

    #[test]
    fn blank_query_matches_everything() {
        let catalog = sample_catalog();
        assert_eq!(catalog.filter(None, Some("   ")).len(), 3);
    }

    #[test]
    fn coerces_string_and_numeric_ids() {
        assert_eq!(coerce_id(&serde_json::json!(7)), Some(7));
        assert_eq!(coerce_id(&serde_json::json!("7")), Some(7));
        assert_eq!(coerce_id(&serde_json::json!(" 7 ")), Some(7));
        assert_eq!(coerce_id(&serde_json::json!("seven")), None);
        assert_eq!(coerce_id(&serde_json::json!(null)), None);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let products = vec![
            Product {
                id: 1,
                name: "A".into(),
                brand: "B".into(),
                category: "c".into(),
                image: "i".into(),
                description: "d".into(),
                price: None,
            },
            Product {
                id: 1,
                name: "A2".into(),
                brand: "B".into(),
                category: "c".into(),
                image: "i".into(),
                description: "d".into(),
                price: None,
            },
        ];
        assert!(matches!(
            ProductCatalog::from_products(products),
            Err(CatalogError::DuplicateId(1))
        ));
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let catalog = sample_catalog();
        assert_eq!(catalog.categories(), vec!["cleanser", "moisturizer"]);
    }
}
