//! Field-level vocabulary shared by every record type.
//!
//! Records are flat. Each one exposes its attributes as [`FieldValue`]s so the
//! list pipeline, the CSV export and the detail sheet can treat all five
//! collections the same way. The [`Descriptor`] attached to each record type
//! is the data that specializes the generic controller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display};

/// Store-assigned identifier, unique within one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u32);

impl From<u32> for RecordId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The five named collections of the persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Products,
    Suppliers,
    Warehouses,
    Orders,
    Categories,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Products,
        Collection::Suppliers,
        Collection::Warehouses,
        Collection::Orders,
        Collection::Categories,
    ];

    /// The collection's key in the persisted document.
    pub const fn name(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Suppliers => "suppliers",
            Collection::Warehouses => "warehouses",
            Collection::Orders => "orders",
            Collection::Categories => "categories",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle flag carried by products, suppliers, warehouses and categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub const ALL: [Status; 2] = [Status::Active, Status::Inactive];

    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }
}

/// Progress of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// How a field is typed, coerced from raw input, and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Non-negative integer (quantities, capacities).
    Integer,
    /// Non-negative decimal (prices).
    Decimal,
    /// Soft foreign key into another collection.
    Reference(Collection),
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// One of [`Status::ALL`].
    Status,
    /// One of [`OrderStatus::ALL`].
    OrderStatus,
}

impl FieldKind {
    /// Parses raw UI input (form field or filter control) into a typed value.
    ///
    /// Returns `None` when the input does not fit the kind.
    pub fn parse(self, raw: &str) -> Option<FieldValue> {
        let trimmed = raw.trim();
        match self {
            FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
            FieldKind::Integer => trimmed.parse::<u32>().ok().map(|n| FieldValue::Integer(n.into())),
            FieldKind::Decimal => trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(FieldValue::Decimal),
            FieldKind::Reference(_) => trimmed.parse::<u32>().ok().map(|n| FieldValue::Reference(RecordId(n))),
            FieldKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok().map(FieldValue::Date),
            FieldKind::Status => Status::ALL
                .iter()
                .find(|s| s.as_str() == trimmed)
                .map(|s| FieldValue::Text(s.as_str().to_string())),
            FieldKind::OrderStatus => OrderStatus::ALL
                .iter()
                .find(|s| s.as_str() == trimmed)
                .map(|s| FieldValue::Text(s.as_str().to_string())),
        }
    }

    /// Allowed raw values for enumerated kinds, empty otherwise.
    pub fn choices(self) -> Vec<&'static str> {
        match self {
            FieldKind::Status => Status::ALL.iter().map(|s| s.as_str()).collect(),
            FieldKind::OrderStatus => OrderStatus::ALL.iter().map(|s| s.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    pub const fn is_status(self) -> bool {
        matches!(self, FieldKind::Status | FieldKind::OrderStatus)
    }
}

/// A typed attribute value read off a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Reference(RecordId),
    Date(NaiveDate),
}

impl FieldValue {
    /// Orders two values of the same field.
    ///
    /// Text uses [`collate`]; numbers compare numerically; dates chronologically;
    /// references by id. Values of different variants compare equal.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => collate(a, b),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => a.total_cmp(b),
            (FieldValue::Reference(a), FieldValue::Reference(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }

    /// The value as it is written into the persisted document.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Integer(n) => serde_json::Value::from(*n),
            FieldValue::Decimal(n) => serde_json::Value::from(*n),
            FieldValue::Reference(id) => serde_json::Value::from(id.0),
            FieldValue::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Raw rendering: what a CSV cell or a form input holds.
impl Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Decimal(n) => write!(f, "{n}"),
            FieldValue::Reference(id) => write!(f, "{id}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Compares display strings the way a French/English UI expects:
/// case and Latin diacritics are ignored first, the raw text breaks ties.
pub fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b)).then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'ç' => 'c',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ñ' => 'n',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ý' | 'ÿ' => 'y',
            other => other,
        })
        .collect()
}

/// One attribute of a record type: its wire name and its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Per-entity data that specializes the generic controller.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    /// Every non-id attribute, in wire order. Doubles as the form schema.
    pub fields: &'static [FieldSpec],
    /// Fields the free-text search looks into.
    pub search: &'static [&'static str],
    /// Fields that accept an equality filter.
    pub filters: &'static [&'static str],
    /// Derived columns counting the records that point at this one.
    pub counts: &'static [Backlink],
}

/// A derived column: how many `source` records reference a row through `field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backlink {
    /// Column name in the table.
    pub name: &'static str,
    pub source: Collection,
    pub field: &'static str,
}

impl Descriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Foreign-key fields and the collection each one points into.
    pub fn references(&self) -> impl Iterator<Item = (&'static str, Collection)> + '_ {
        self.fields.iter().filter_map(|spec| match spec.kind {
            FieldKind::Reference(target) => Some((spec.name, target)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_bad_numbers() {
        assert_eq!(FieldKind::Integer.parse(" 12 "), Some(FieldValue::Integer(12)));
        assert_eq!(FieldKind::Integer.parse("-3"), None);
        assert_eq!(FieldKind::Integer.parse("abc"), None);
        assert_eq!(FieldKind::Decimal.parse("79.99"), Some(FieldValue::Decimal(79.99)));
        assert_eq!(FieldKind::Decimal.parse("NaN"), None);
        assert_eq!(
            FieldKind::Reference(Collection::Categories).parse("2"),
            Some(FieldValue::Reference(RecordId(2)))
        );
    }

    #[test]
    fn test_parse_enumerations_and_dates() {
        assert_eq!(FieldKind::Status.parse("inactive"), Some(FieldValue::Text("inactive".into())));
        assert_eq!(FieldKind::Status.parse("pending"), None);
        assert_eq!(FieldKind::OrderStatus.parse("pending"), Some(FieldValue::Text("pending".into())));
        assert_eq!(
            FieldKind::Date.parse("2024-12-25"),
            Some(FieldValue::Date(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()))
        );
        assert_eq!(FieldKind::Date.parse("25/12/2024"), None);
    }

    #[test]
    fn test_collate_ignores_case_and_accents() {
        assert_eq!(collate("écran", "Entrepôt"), Ordering::Less);
        assert_eq!(collate("Souris", "clavier"), Ordering::Greater);
        assert_eq!(collate("Réseau", "Routeur"), Ordering::Less);
    }

    #[test]
    fn test_compare_numbers_numerically() {
        let nine = FieldValue::Integer(9);
        let ten = FieldValue::Integer(10);
        assert_eq!(nine.compare(&ten), Ordering::Less);
        assert_eq!(FieldValue::Decimal(2.5).compare(&FieldValue::Decimal(2.25)), Ordering::Greater);
    }
}
