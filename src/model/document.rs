//! The single persisted document that holds every collection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::field::{Collection, FieldValue, OrderStatus, RecordId, Status};
use super::{Category, Order, Product, Supplier, Warehouse};
use crate::framework::Record;

/// Blob key the document is persisted under.
pub const DOCUMENT_KEY: &str = "inventoryAppData";

/// All five collections. Serialized and written whole on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryDocument {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    #[serde(default)]
    pub warehouses: Vec<Warehouse>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl InventoryDocument {
    /// `(id, display name)` pairs of one collection, in insertion order.
    pub fn labels(&self, collection: Collection) -> Vec<(RecordId, String)> {
        fn pairs<T: Record>(items: &[T]) -> Vec<(RecordId, String)> {
            items.iter().map(|item| (item.id(), item.label().to_string())).collect()
        }
        match collection {
            Collection::Products => pairs(&self.products),
            Collection::Suppliers => pairs(&self.suppliers),
            Collection::Warehouses => pairs(&self.warehouses),
            Collection::Orders => pairs(&self.orders),
            Collection::Categories => pairs(&self.categories),
        }
    }

    /// How many records of `source` point at each id through `field`.
    pub fn reference_counts(&self, source: Collection, field: &str) -> HashMap<RecordId, usize> {
        fn count<T: Record>(items: &[T], field: &str) -> HashMap<RecordId, usize> {
            let mut counts = HashMap::new();
            for item in items {
                if let Some(FieldValue::Reference(id)) = item.field(field) {
                    *counts.entry(id).or_insert(0) += 1;
                }
            }
            counts
        }
        match source {
            Collection::Products => count(&self.products, field),
            Collection::Suppliers => count(&self.suppliers, field),
            Collection::Warehouses => count(&self.warehouses, field),
            Collection::Orders => count(&self.orders, field),
            Collection::Categories => count(&self.categories, field),
        }
    }

    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Products => self.products.len(),
            Collection::Suppliers => self.suppliers.len(),
            Collection::Warehouses => self.warehouses.len(),
            Collection::Orders => self.orders.len(),
            Collection::Categories => self.categories.len(),
        }
    }

    /// The demo dataset written on first run.
    pub fn seed() -> Self {
        let product = |id: u32, name: &str, sku: &str, quantity: u32, price: f64, category: u32, description: &str| Product {
            id: RecordId(id),
            name: name.into(),
            sku: sku.into(),
            quantity,
            price,
            category: RecordId(category),
            description: description.into(),
            status: Status::Active,
        };
        let supplier = |id: u32, name: &str, contact: &str, email: &str, phone: &str, address: &str| Supplier {
            id: RecordId(id),
            name: name.into(),
            contact: contact.into(),
            email: email.into(),
            phone: phone.into(),
            address: address.into(),
            status: Status::Active,
        };
        let warehouse = |id: u32, name: &str, location: &str, capacity: u32, manager: &str| Warehouse {
            id: RecordId(id),
            name: name.into(),
            location: location.into(),
            capacity,
            manager: manager.into(),
            status: Status::Active,
        };
        let order = |id: u32, number: &str, supplier: u32, product: u32, quantity: u32, (y, m, d): (i32, u32, u32), status: OrderStatus| Order {
            id: RecordId(id),
            order_number: number.into(),
            supplier: RecordId(supplier),
            product: RecordId(product),
            quantity,
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN),
            status,
        };
        let category = |id: u32, name: &str, description: &str| Category {
            id: RecordId(id),
            name: name.into(),
            description: description.into(),
            status: Status::Active,
        };

        Self {
            products: vec![
                product(1, "Ordinateur Portable Dell", "DELL-001", 15, 899.99, 1, "Ordinateur professionnel haute performance"),
                product(2, "Clavier Mécanique", "KEY-001", 45, 79.99, 2, "Clavier gaming RGB"),
                product(3, "Souris Sans Fil", "MOU-001", 30, 29.99, 2, "Souris ergonomique"),
                product(4, "Écran 27 pouces", "SCR-001", 12, 349.99, 1, "Écran 4K UHD"),
                product(5, "Webcam HD", "CAM-001", 2, 59.99, 2, "Webcam 1080p"),
                product(6, "Routeur WiFi 6", "NET-001", 8, 129.99, 3, "Routeur haute performance"),
                product(7, "Switch Gigabit", "NET-002", 0, 89.99, 3, "Switch 24 ports"),
                product(8, "Casque Audio", "ACC-001", 25, 49.99, 2, "Casque Bluetooth 5.0"),
            ],
            suppliers: vec![
                supplier(1, "TechDistrib", "Ahmed Benali", "ahmed@techdistrib.ma", "+212-600-111-222", "Casablanca, Maroc"),
                supplier(2, "GlobalIT", "Sarah Martin", "sarah@globalit.com", "+212-600-333-444", "Rabat, Maroc"),
                supplier(3, "ElectroSupply", "Karim Ziani", "karim@electro.ma", "+212-600-555-666", "Tanger, Maroc"),
            ],
            warehouses: vec![
                warehouse(1, "Entrepôt Principal", "Casablanca", 10000, "Hassan Alami"),
                warehouse(2, "Entrepôt Nord", "Tanger", 5000, "Fatima Zahra"),
                warehouse(3, "Entrepôt Sud", "Agadir", 3000, "Omar Idrissi"),
            ],
            orders: vec![
                order(1, "ORD-001", 1, 1, 50, (2024, 11, 15), OrderStatus::Completed),
                order(2, "ORD-002", 2, 2, 100, (2024, 12, 1), OrderStatus::Completed),
                order(3, "ORD-003", 1, 3, 75, (2024, 12, 15), OrderStatus::Processing),
                order(4, "ORD-004", 3, 4, 20, (2024, 12, 20), OrderStatus::Pending),
                order(5, "ORD-005", 2, 5, 30, (2024, 12, 22), OrderStatus::Pending),
                order(6, "ORD-006", 1, 6, 15, (2024, 12, 25), OrderStatus::Completed),
            ],
            categories: vec![
                category(1, "Informatique", "Matériel informatique"),
                category(2, "Accessoires", "Accessoires PC"),
                category(3, "Réseau", "Équipement réseau"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_shape() {
        let doc = InventoryDocument::seed();
        assert_eq!(doc.len(Collection::Products), 8);
        assert_eq!(doc.len(Collection::Suppliers), 3);
        assert_eq!(doc.len(Collection::Warehouses), 3);
        assert_eq!(doc.len(Collection::Orders), 6);
        assert_eq!(doc.len(Collection::Categories), 3);
        for collection in Collection::ALL {
            assert_eq!(doc.labels(collection).len(), doc.len(collection));
        }
    }

    #[test]
    fn test_wire_format_uses_camel_case_names() {
        let doc = InventoryDocument::seed();
        let json = serde_json::to_value(&doc).unwrap();
        let first_order = &json["orders"][0];
        assert_eq!(first_order["orderNumber"], "ORD-001");
        assert_eq!(first_order["date"], "2024-11-15");
        assert_eq!(first_order["status"], "completed");
        assert_eq!(json["products"][6]["quantity"], 0);
        assert_eq!(json["products"][0]["category"], 1);

        let back: InventoryDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let doc: InventoryDocument = serde_json::from_str(r#"{"products": []}"#).unwrap();
        assert!(doc.orders.is_empty());
        assert!(doc.categories.is_empty());
    }

    #[test]
    fn test_labels_use_order_numbers_for_orders() {
        let doc = InventoryDocument::seed();
        let labels = doc.labels(Collection::Orders);
        assert_eq!(labels[0], (RecordId(1), "ORD-001".to_string()));
        let labels = doc.labels(Collection::Categories);
        assert_eq!(labels[2], (RecordId(3), "Réseau".to_string()));
    }
}
