use serde::{Deserialize, Serialize};

use super::field::{Collection, Descriptor, FieldKind, FieldSpec, FieldValue, RecordId, Status};
use crate::framework::{Record, ResourceRequest, StoreRequest};
use crate::model::InventoryDocument;

/// A stocked item.
///
/// `category` is a soft reference into [`Collection::Categories`]; nothing
/// stops it from dangling after the category is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    pub sku: String,
    pub quantity: u32,
    pub price: f64,
    pub category: RecordId,
    pub description: String,
    pub status: Status,
}

/// Every non-id attribute of a [`Product`]; used for both create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub sku: String,
    pub quantity: u32,
    pub price: f64,
    pub category: RecordId,
    pub description: String,
    pub status: Status,
}

impl Product {
    /// Stock value of this line: quantity times unit price.
    pub fn stock_value(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", FieldKind::Text),
    FieldSpec::new("sku", FieldKind::Text),
    FieldSpec::new("quantity", FieldKind::Integer),
    FieldSpec::new("price", FieldKind::Decimal),
    FieldSpec::new("category", FieldKind::Reference(Collection::Categories)),
    FieldSpec::new("description", FieldKind::Text),
    FieldSpec::new("status", FieldKind::Status),
];

impl Record for Product {
    type Fields = ProductFields;

    const COLLECTION: Collection = Collection::Products;
    const DESCRIPTOR: Descriptor = Descriptor {
        fields: FIELDS,
        search: &["name", "sku", "description"],
        filters: &["status", "category"],
        counts: &[],
    };

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn from_fields(id: RecordId, fields: ProductFields) -> Self {
        Self {
            id,
            name: fields.name,
            sku: fields.sku,
            quantity: fields.quantity,
            price: fields.price,
            category: fields.category,
            description: fields.description,
            status: fields.status,
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => FieldValue::Integer(self.id.0.into()),
            "name" => FieldValue::Text(self.name.clone()),
            "sku" => FieldValue::Text(self.sku.clone()),
            "quantity" => FieldValue::Integer(self.quantity.into()),
            "price" => FieldValue::Decimal(self.price),
            "category" => FieldValue::Reference(self.category),
            "description" => FieldValue::Text(self.description.clone()),
            "status" => FieldValue::Text(self.status.as_str().to_string()),
            _ => return None,
        })
    }

    fn collection(document: &InventoryDocument) -> &Vec<Self> {
        &document.products
    }

    fn collection_mut(document: &mut InventoryDocument) -> &mut Vec<Self> {
        &mut document.products
    }

    fn wrap(request: ResourceRequest<Self>) -> StoreRequest {
        StoreRequest::Products(request)
    }

    fn unwrap(request: StoreRequest) -> Result<ResourceRequest<Self>, StoreRequest> {
        match request {
            StoreRequest::Products(request) => Ok(request),
            other => Err(other),
        }
    }
}
