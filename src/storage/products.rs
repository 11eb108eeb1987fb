//! Product catalog backed by a flat JSON file.
//!
//! Whole-file read-modify-write; concurrent writers can race, accepted at
//! this scope. A missing or unparsable file loads as the empty catalog.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub warranty: String,
    #[serde(default)]
    pub includes: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub main_image: String,
    #[serde(default)]
    pub gallery_images: Vec<String>,
    #[serde(default = "now_iso")]
    pub created_at: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub ratings: Vec<i32>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

fn default_active() -> bool {
    true
}

impl Product {
    pub fn new(name: &str, category: &str, price: i64) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            slug: slugify(name),
            description: String::new(),
            category: category.to_string(),
            material: String::new(),
            year: String::new(),
            warranty: String::new(),
            includes: String::new(),
            price,
            discount: 0,
            main_image: String::new(),
            gallery_images: Vec::new(),
            created_at: now_iso(),
            is_active: true,
            ratings: Vec::new(),
        }
    }

    /// Price after the percentage discount, rounded down.
    pub fn discounted_price(&self) -> i64 {
        if self.discount > 0 {
            self.price - self.price * self.discount / 100
        } else {
            self.price
        }
    }
}

/// URL-friendly slug from a product name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true; // suppress a leading dash
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Handle to the products.json store.
#[derive(Clone)]
pub struct ProductStore {
    path: String,
}

impl ProductStore {
    pub fn new(path: &str) -> Self {
        Self { path: path.to_string() }
    }

    /// Load the whole catalog. Missing or broken file reads as empty.
    pub fn load(&self) -> Vec<Product> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("Failed to parse {}: {}", self.path, e);
            Vec::new()
        })
    }

    /// Save the whole catalog, creating parent directories when needed.
    pub fn save(&self, products: &[Product]) -> AppResult<()> {
        if let Some(parent) = Path::new(&self.path).parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(products)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    pub fn add(&self, product: Product) -> AppResult<()> {
        let mut products = self.load();
        products.push(product);
        self.save(&products)
    }

    /// Replace a product by id. Returns false when the id is unknown.
    pub fn update(&self, product_id: &str, updated: Product) -> AppResult<bool> {
        let mut products = self.load();
        match products.iter_mut().find(|p| p.id == product_id) {
            Some(slot) => {
                *slot = updated;
                self.save(&products)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete a product by id. Returns false when the id is unknown.
    pub fn delete(&self, product_id: &str) -> AppResult<bool> {
        let mut products = self.load();
        let before = products.len();
        products.retain(|p| p.id != product_id);
        if products.len() == before {
            return Ok(false);
        }
        self.save(&products)?;
        Ok(true)
    }

    pub fn by_id(&self, product_id: &str) -> Option<Product> {
        self.load().into_iter().find(|p| p.id == product_id)
    }

    pub fn by_slug(&self, slug: &str) -> Option<Product> {
        self.load().into_iter().find(|p| p.slug == slug)
    }

    /// Products in a category; "all" returns everything.
    pub fn by_category(&self, category: &str) -> Vec<Product> {
        let products = self.load();
        if category == "all" {
            return products;
        }
        products.into_iter().filter(|p| p.category == category).collect()
    }

    /// Distinct categories of active products, in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for product in self.load() {
            if product.is_active && !seen.contains(&product.category) && !product.category.is_empty() {
                seen.push(product.category);
            }
        }
        seen
    }

    /// Active products only, for customer-facing pages.
    pub fn active(&self) -> Vec<Product> {
        self.load().into_iter().filter(|p| p.is_active).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_store() -> (tempfile::TempDir, ProductStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        (dir, ProductStore::new(path.to_str().unwrap()))
    }

    #[test]
    fn missing_file_loads_as_empty_catalog() {
        let (_dir, store) = temp_store();
        assert!(store.load().is_empty());
    }

    #[test]
    fn broken_json_loads_as_empty_catalog() {
        let (dir, store) = temp_store();
        std::fs::write(dir.path().join("products.json"), "{not json").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn add_then_lookup_by_slug_and_category() {
        let (_dir, store) = temp_store();
        let mut divan = Product::new("Divan Premium", "divan", 4_500_000);
        divan.discount = 10;
        store.add(divan).unwrap();
        store.add(Product::new("Shkaf Klassik", "shkaf", 2_000_000)).unwrap();

        let found = store.by_slug("divan-premium").unwrap();
        assert_eq!(found.name, "Divan Premium");
        assert_eq!(found.discounted_price(), 4_050_000);

        assert_eq!(store.by_category("divan").len(), 1);
        assert_eq!(store.by_category("all").len(), 2);
        assert_eq!(store.by_category("stol").len(), 0);
        assert_eq!(store.categories(), vec!["divan".to_string(), "shkaf".to_string()]);
    }

    #[test]
    fn update_and_delete_by_id() {
        let (_dir, store) = temp_store();
        let product = Product::new("Stol", "stol", 800_000);
        let id = product.id.clone();
        store.add(product).unwrap();

        let mut renamed = store.by_id(&id).unwrap();
        renamed.name = "Stol Oq".to_string();
        assert!(store.update(&id, renamed).unwrap());
        assert_eq!(store.by_id(&id).unwrap().name, "Stol Oq");

        assert!(!store.update("missing", Product::new("X", "y", 1)).unwrap());
        assert!(store.delete(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
        assert!(store.by_id(&id).is_none());
    }

    #[test]
    fn inactive_products_hidden_from_active_view() {
        let (_dir, store) = temp_store();
        let mut hidden = Product::new("Eski divan", "divan", 100);
        hidden.is_active = false;
        store.add(hidden).unwrap();
        store.add(Product::new("Yangi divan", "divan", 200)).unwrap();

        let active = store.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Yangi divan");
    }

    #[test]
    fn slugify_handles_spaces_and_symbols() {
        assert_eq!(slugify("Divan Premium"), "divan-premium");
        assert_eq!(slugify("  Stol — Oq!  "), "stol-oq");
        assert_eq!(slugify("Shkaf_2000"), "shkaf-2000");
    }
}
