use serde::{Deserialize, Serialize};

use super::field::{Backlink, Collection, Descriptor, FieldKind, FieldSpec, FieldValue, RecordId, Status};
use crate::framework::{Record, ResourceRequest, StoreRequest};
use crate::model::InventoryDocument;

/// A product grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFields {
    pub name: String,
    pub description: String,
    pub status: Status,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", FieldKind::Text),
    FieldSpec::new("description", FieldKind::Text),
    FieldSpec::new("status", FieldKind::Status),
];

impl Record for Category {
    type Fields = CategoryFields;

    const COLLECTION: Collection = Collection::Categories;
    const DESCRIPTOR: Descriptor = Descriptor {
        fields: FIELDS,
        search: &["name", "description"],
        filters: &["status"],
        counts: &[Backlink {
            name: "products",
            source: Collection::Products,
            field: "category",
        }],
    };

    fn id(&self) -> RecordId {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn from_fields(id: RecordId, fields: CategoryFields) -> Self {
        Self {
            id,
            name: fields.name,
            description: fields.description,
            status: fields.status,
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => FieldValue::Integer(self.id.0.into()),
            "name" => FieldValue::Text(self.name.clone()),
            "description" => FieldValue::Text(self.description.clone()),
            "status" => FieldValue::Text(self.status.as_str().to_string()),
            _ => return None,
        })
    }

    fn collection(document: &InventoryDocument) -> &Vec<Self> {
        &document.categories
    }

    fn collection_mut(document: &mut InventoryDocument) -> &mut Vec<Self> {
        &mut document.categories
    }

    fn wrap(request: ResourceRequest<Self>) -> StoreRequest {
        StoreRequest::Categories(request)
    }

    fn unwrap(request: StoreRequest) -> Result<ResourceRequest<Self>, StoreRequest> {
        match request {
            StoreRequest::Categories(request) => Ok(request),
            other => Err(other),
        }
    }
}
