use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::field::{Collection, Descriptor, FieldKind, FieldSpec, FieldValue, OrderStatus, RecordId};
use crate::framework::{Record, ResourceRequest, StoreRequest};
use crate::model::InventoryDocument;

/// A purchase order: `quantity` units of `product` bought from `supplier`.
///
/// Both references are soft. The wire name of `order_number` is
/// `orderNumber`, and `date` travels as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: RecordId,
    pub order_number: String,
    pub supplier: RecordId,
    pub product: RecordId,
    pub quantity: u32,
    pub date: NaiveDate,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFields {
    pub order_number: String,
    pub supplier: RecordId,
    pub product: RecordId,
    pub quantity: u32,
    pub date: NaiveDate,
    pub status: OrderStatus,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("orderNumber", FieldKind::Text),
    FieldSpec::new("supplier", FieldKind::Reference(Collection::Suppliers)),
    FieldSpec::new("product", FieldKind::Reference(Collection::Products)),
    FieldSpec::new("quantity", FieldKind::Integer),
    FieldSpec::new("date", FieldKind::Date),
    FieldSpec::new("status", FieldKind::OrderStatus),
];

impl Record for Order {
    type Fields = OrderFields;

    const COLLECTION: Collection = Collection::Orders;
    const DESCRIPTOR: Descriptor = Descriptor {
        fields: FIELDS,
        search: &["orderNumber", "date"],
        filters: &["status"],
        counts: &[],
    };

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> &str {
        &self.order_number
    }

    fn from_fields(id: RecordId, fields: OrderFields) -> Self {
        Self {
            id,
            order_number: fields.order_number,
            supplier: fields.supplier,
            product: fields.product,
            quantity: fields.quantity,
            date: fields.date,
            status: fields.status,
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => FieldValue::Integer(self.id.0.into()),
            "orderNumber" => FieldValue::Text(self.order_number.clone()),
            "supplier" => FieldValue::Reference(self.supplier),
            "product" => FieldValue::Reference(self.product),
            "quantity" => FieldValue::Integer(self.quantity.into()),
            "date" => FieldValue::Date(self.date),
            "status" => FieldValue::Text(self.status.as_str().to_string()),
            _ => return None,
        })
    }

    /// New orders get a time-based number, `ORD-<epoch millis>`.
    fn suggested_value(field: &str, now: DateTime<Utc>) -> Option<String> {
        (field == "orderNumber").then(|| format!("ORD-{}", now.timestamp_millis()))
    }

    fn collection(document: &InventoryDocument) -> &Vec<Self> {
        &document.orders
    }

    fn collection_mut(document: &mut InventoryDocument) -> &mut Vec<Self> {
        &mut document.orders
    }

    fn wrap(request: ResourceRequest<Self>) -> StoreRequest {
        StoreRequest::Orders(request)
    }

    fn unwrap(request: StoreRequest) -> Result<ResourceRequest<Self>, StoreRequest> {
        match request {
            StoreRequest::Orders(request) => Ok(request),
            other => Err(other),
        }
    }
}
