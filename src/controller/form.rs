//! Create/edit forms: the schema-driven view and the coercion of raw input.

use std::collections::BTreeMap;

use crate::controller::ControllerError;
use crate::framework::Record;
use crate::model::{FieldKind, RecordId};

/// Raw form submission, field name to the string the input held.
pub type FormData = BTreeMap<String, String>;

/// One selectable option of a `<select>`-style input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Current raw value (the record's, or the default for a new record).
    pub value: String,
    /// Allowed values for references and statuses, empty for free input.
    pub choices: Vec<Choice>,
}

/// The form for creating (`editing == None`) or editing a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub editing: Option<RecordId>,
    pub fields: Vec<FormField>,
}

impl FormView {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// The submission a user would send without touching anything.
    pub fn to_form_data(&self) -> FormData {
        self.fields
            .iter()
            .map(|field| (field.name.to_string(), field.value.clone()))
            .collect()
    }
}

/// Default raw value of a blank input of `kind`.
pub(crate) fn blank_value(kind: FieldKind, choices: &[Choice]) -> String {
    match kind {
        FieldKind::Integer | FieldKind::Decimal => "0".to_string(),
        FieldKind::Text | FieldKind::Date => String::new(),
        FieldKind::Reference(_) | FieldKind::Status | FieldKind::OrderStatus => {
            choices.first().map(|choice| choice.value.clone()).unwrap_or_default()
        }
    }
}

/// Turns a raw submission into the record's typed payload.
///
/// Every schema field is parsed by its kind; a missing input counts as empty.
/// Inputs that are not part of the schema are rejected.
pub fn coerce<T: Record>(form: &FormData) -> Result<T::Fields, ControllerError> {
    let descriptor = T::DESCRIPTOR;
    if let Some(unknown) = form.keys().find(|name| descriptor.field(name).is_none()) {
        return Err(ControllerError::UnknownField(unknown.clone()));
    }

    let mut object = serde_json::Map::new();
    for spec in descriptor.fields {
        let raw = form.get(spec.name).map(String::as_str).unwrap_or_default();
        let value = spec.kind.parse(raw).ok_or_else(|| ControllerError::InvalidField {
            field: spec.name.to_string(),
            value: raw.to_string(),
        })?;
        object.insert(spec.name.to_string(), value.to_json());
    }

    serde_json::from_value(serde_json::Value::Object(object)).map_err(ControllerError::MalformedForm)
}
