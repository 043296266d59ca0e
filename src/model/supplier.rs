use serde::{Deserialize, Serialize};

use super::field::{Collection, Descriptor, FieldKind, FieldSpec, FieldValue, RecordId, Status};
use crate::framework::{Record, ResourceRequest, StoreRequest};
use crate::model::InventoryDocument;

/// A vendor that purchase orders are placed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: RecordId,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierFields {
    pub name: String,
    pub contact: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub status: Status,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", FieldKind::Text),
    FieldSpec::new("contact", FieldKind::Text),
    FieldSpec::new("email", FieldKind::Text),
    FieldSpec::new("phone", FieldKind::Text),
    FieldSpec::new("address", FieldKind::Text),
    FieldSpec::new("status", FieldKind::Status),
];

impl Record for Supplier {
    type Fields = SupplierFields;

    const COLLECTION: Collection = Collection::Suppliers;
    const DESCRIPTOR: Descriptor = Descriptor {
        fields: FIELDS,
        search: &["name", "contact", "email", "phone"],
        filters: &["status"],
        counts: &[],
    };

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn from_fields(id: RecordId, fields: SupplierFields) -> Self {
        Self {
            id,
            name: fields.name,
            contact: fields.contact,
            email: fields.email,
            phone: fields.phone,
            address: fields.address,
            status: fields.status,
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => FieldValue::Integer(self.id.0.into()),
            "name" => FieldValue::Text(self.name.clone()),
            "contact" => FieldValue::Text(self.contact.clone()),
            "email" => FieldValue::Text(self.email.clone()),
            "phone" => FieldValue::Text(self.phone.clone()),
            "address" => FieldValue::Text(self.address.clone()),
            "status" => FieldValue::Text(self.status.as_str().to_string()),
            _ => return None,
        })
    }

    fn collection(document: &InventoryDocument) -> &Vec<Self> {
        &document.suppliers
    }

    fn collection_mut(document: &mut InventoryDocument) -> &mut Vec<Self> {
        &mut document.suppliers
    }

    fn wrap(request: ResourceRequest<Self>) -> StoreRequest {
        StoreRequest::Suppliers(request)
    }

    fn unwrap(request: StoreRequest) -> Result<ResourceRequest<Self>, StoreRequest> {
        match request {
            StoreRequest::Suppliers(request) => Ok(request),
            other => Err(other),
        }
    }
}
