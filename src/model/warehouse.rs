use serde::{Deserialize, Serialize};

use super::field::{Collection, Descriptor, FieldKind, FieldSpec, FieldValue, RecordId, Status};
use crate::framework::{Record, ResourceRequest, StoreRequest};
use crate::model::InventoryDocument;

/// A storage site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: RecordId,
    pub name: String,
    pub location: String,
    pub capacity: u32,
    pub manager: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseFields {
    pub name: String,
    pub location: String,
    pub capacity: u32,
    pub manager: String,
    pub status: Status,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", FieldKind::Text),
    FieldSpec::new("location", FieldKind::Text),
    FieldSpec::new("capacity", FieldKind::Integer),
    FieldSpec::new("manager", FieldKind::Text),
    FieldSpec::new("status", FieldKind::Status),
];

impl Record for Warehouse {
    type Fields = WarehouseFields;

    const COLLECTION: Collection = Collection::Warehouses;
    const DESCRIPTOR: Descriptor = Descriptor {
        fields: FIELDS,
        search: &["name", "location", "manager"],
        filters: &["status"],
        counts: &[],
    };

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn from_fields(id: RecordId, fields: WarehouseFields) -> Self {
        Self {
            id,
            name: fields.name,
            location: fields.location,
            capacity: fields.capacity,
            manager: fields.manager,
            status: fields.status,
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => FieldValue::Integer(self.id.0.into()),
            "name" => FieldValue::Text(self.name.clone()),
            "location" => FieldValue::Text(self.location.clone()),
            "capacity" => FieldValue::Integer(self.capacity.into()),
            "manager" => FieldValue::Text(self.manager.clone()),
            "status" => FieldValue::Text(self.status.as_str().to_string()),
            _ => return None,
        })
    }

    fn collection(document: &InventoryDocument) -> &Vec<Self> {
        &document.warehouses
    }

    fn collection_mut(document: &mut InventoryDocument) -> &mut Vec<Self> {
        &mut document.warehouses
    }

    fn wrap(request: ResourceRequest<Self>) -> StoreRequest {
        StoreRequest::Warehouses(request)
    }

    fn unwrap(request: StoreRequest) -> Result<ResourceRequest<Self>, StoreRequest> {
        match request {
            StoreRequest::Warehouses(request) => Ok(request),
            other => Err(other),
        }
    }
}
