// src/selection.rs - The user's working set of chosen products.
//
// Uniqueness is by product id, insertion order is what the chip list
// renders. The persisted form is a bare id array so a stale catalog entry
// simply drops out on restore.
use crate::catalog::{coerce_id, Product, ProductCatalog};
use crate::storage::PrefsStore;
use serde_json::Value;

pub const STORAGE_KEY: &str = "selectedProducts";

#[derive(Debug, Default)]
pub struct SelectionSet {
    ids: Vec<i64>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Remove the id when present, otherwise resolve it through the catalog
    /// and append. An id the catalog does not know is a no-op, not an error.
    /// Returns whether the product is selected afterwards.
    pub fn toggle(&mut self, id: i64, catalog: &ProductCatalog) -> bool {
        if let Some(position) = self.ids.iter().position(|&existing| existing == id) {
            self.ids.remove(position);
            return false;
        }

        if catalog.get(id).is_none() {
            tracing::debug!("ignoring toggle for unknown product id {}", id);
            return false;
        }

        self.ids.push(id);
        true
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Selected products in insertion order.
    pub fn products<'a>(&self, catalog: &'a ProductCatalog) -> Vec<&'a Product> {
        self.ids.iter().filter_map(|&id| catalog.get(id)).collect()
    }

    /// Serialize the current ids to durable storage. Write failures are
    /// handled (logged) inside the store.
    pub fn persist(&self, store: &PrefsStore) {
        store.set(STORAGE_KEY, &Value::from(self.ids().to_vec()));
    }

    /// Replace the in-memory set with the persisted ids, dropping anything
    /// the catalog cannot resolve. Ids may be stored as numbers or strings.
    pub fn restore(&mut self, store: &PrefsStore, catalog: &ProductCatalog) {
        let Some(Value::Array(raw_ids)) = store.get(STORAGE_KEY) else {
            return;
        };

        let mut restored = Vec::with_capacity(raw_ids.len());
        for raw in &raw_ids {
            match coerce_id(raw) {
                Some(id) if catalog.get(id).is_some() && !restored.contains(&id) => {
                    restored.push(id);
                }
                _ => {
                    tracing::debug!("dropping unresolvable persisted selection entry: {}", raw);
                }
            }
        }

        self.ids = restored;
    }
}
