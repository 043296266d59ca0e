use crate::framework::StoreError;
use crate::model::{Collection, RecordId};

/// Errors surfaced by an entity controller.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid value for {field}: {value:?}")]
    InvalidField { field: String, value: String },
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Form does not describe a valid record: {0}")]
    MalformedForm(#[source] serde_json::Error),
    #[error("Nothing to export")]
    EmptyExport,
    #[error("No pending delete for {collection} {id}")]
    StaleConfirmation { collection: Collection, id: RecordId },
    #[error("Document rendering failed: {0}")]
    Render(#[source] std::io::Error),
}

impl ControllerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ControllerError::Store(e) if e.is_not_found())
    }
}
