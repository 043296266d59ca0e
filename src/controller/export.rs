//! CSV export and the detail sheet handed to document renderers.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::framework::{Record, StoreClient, StoreError};
use crate::i18n::Localizer;
use crate::model::{Collection, FieldKind, FieldValue, RecordId};

/// Shown in place of a reference whose target no longer exists.
pub const MISSING_REFERENCE: &str = "-";

const CSV_DELIMITER: &str = ";";
const BOM: char = '\u{FEFF}';

// =============================================================================
// FOREIGN-KEY RESOLUTION
// =============================================================================

/// Display names of every collection a record type points into, plus the
/// per-row counts of its derived columns.
///
/// Loaded once per view so each row resolves its references without another
/// store round trip.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    labels: HashMap<Collection, HashMap<RecordId, String>>,
    counts: HashMap<&'static str, HashMap<RecordId, usize>>,
}

impl ReferenceIndex {
    pub async fn load<T: Record>(store: &StoreClient) -> Result<Self, StoreError> {
        let mut labels = HashMap::new();
        for (_, target) in T::DESCRIPTOR.references() {
            if !labels.contains_key(&target) {
                let pairs = store.labels(target).await?;
                labels.insert(target, pairs.into_iter().collect());
            }
        }

        let mut counts = HashMap::new();
        if !T::DESCRIPTOR.counts.is_empty() {
            let document = store.snapshot().await?;
            for link in T::DESCRIPTOR.counts {
                counts.insert(link.name, document.reference_counts(link.source, link.field));
            }
        }
        Ok(Self { labels, counts })
    }

    /// Value of the derived column `name` for the record `id`.
    pub fn count(&self, name: &str, id: RecordId) -> usize {
        self.counts
            .get(name)
            .and_then(|counts| counts.get(&id))
            .copied()
            .unwrap_or(0)
    }

    /// The target's display name, or [`MISSING_REFERENCE`].
    pub fn resolve(&self, collection: Collection, id: RecordId) -> &str {
        self.labels
            .get(&collection)
            .and_then(|names| names.get(&id))
            .map_or(MISSING_REFERENCE, String::as_str)
    }

    /// Renders a field for display, resolving references.
    pub fn display(&self, kind: FieldKind, value: Option<FieldValue>) -> String {
        match (kind, value) {
            (FieldKind::Reference(target), Some(FieldValue::Reference(id))) => self.resolve(target, id).to_string(),
            (_, Some(value)) => value.to_string(),
            (_, None) => String::new(),
        }
    }

    /// Renders a field for a table cell or a detail sheet: prices read
    /// `{:.2} DH`, statuses go through the translator, references resolve.
    pub fn format(&self, kind: FieldKind, value: Option<FieldValue>, localizer: &Localizer) -> String {
        match (kind, value) {
            (FieldKind::Decimal, Some(FieldValue::Decimal(n))) => format!("{n:.2} DH"),
            (kind, Some(FieldValue::Text(text))) if kind.is_status() => localizer.t(&text),
            (kind, value) => self.display(kind, value),
        }
    }
}

// =============================================================================
// CSV
// =============================================================================

/// Quotes a cell when it holds the delimiter, a comma, a quote or a line
/// break. Embedded quotes are doubled.
pub fn escape_csv_cell(cell: &str) -> String {
    if cell.contains(|c: char| matches!(c, ';' | ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// A ready-to-save CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

impl CsvExport {
    /// Header of raw field names (`id` first), then one line per record.
    pub fn build<T: Record>(records: &[T], references: &ReferenceIndex, today: NaiveDate) -> Self {
        let fields = T::DESCRIPTOR.fields;
        let header = std::iter::once("id")
            .chain(fields.iter().map(|spec| spec.name))
            .collect::<Vec<_>>()
            .join(CSV_DELIMITER);

        let lines = records.iter().map(|record| {
            std::iter::once(record.id().to_string())
                .chain(fields.iter().map(|spec| references.display(spec.kind, record.field(spec.name))))
                .map(|cell| escape_csv_cell(&cell))
                .collect::<Vec<_>>()
                .join(CSV_DELIMITER)
        });

        let mut content = String::new();
        content.push(BOM);
        content.push_str(&std::iter::once(header).chain(lines).collect::<Vec<_>>().join("\n"));

        Self {
            filename: format!("{}-{}.csv", T::COLLECTION, today.format("%Y-%m-%d")),
            content,
        }
    }

    /// Writes the file into `dir` and returns its path.
    pub async fn save(&self, dir: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = dir.as_ref().join(&self.filename);
        tokio::fs::write(&path, &self.content).await?;
        info!(path = %path.display(), bytes = self.content.len(), "CSV saved");
        Ok(path)
    }
}

// =============================================================================
// DETAIL SHEET
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailEntry {
    pub label: String,
    pub value: String,
}

/// Label/value view of one record, ready for a document renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailSheet {
    pub title: String,
    pub generated_on: NaiveDate,
    pub entries: Vec<DetailEntry>,
}

impl DetailSheet {
    pub fn value(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.value.as_str())
    }
}

/// Plain-text rendering for terminals and logs.
impl Display for DetailSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.entries.iter().map(|entry| entry.label.chars().count()).max().unwrap_or(0);
        writeln!(f, "FICHE DÉTAILLÉE")?;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "Généré le {}", self.generated_on.format("%d/%m/%Y"))?;
        writeln!(f, "{}", "-".repeat(40))?;
        for entry in &self.entries {
            writeln!(f, "{:<width$}  {}", entry.label, entry.value)?;
        }
        writeln!(f, "{}", "-".repeat(40))?;
        write!(f, "Document confidentiel - Système de Gestion des Stocks")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageOptions {
    #[serde(rename = "type")]
    pub format: &'static str,
    pub quality: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSetup {
    pub unit: &'static str,
    pub format: &'static str,
    pub orientation: &'static str,
}

/// Layout handed to the PDF renderer along with the sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfOptions {
    /// Top, left, bottom, right, in millimetres.
    pub margin: [u32; 4],
    pub filename: String,
    pub image: ImageOptions,
    #[serde(rename = "jsPDF")]
    pub page: PageSetup,
}

impl PdfOptions {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            margin: [10, 10, 10, 10],
            filename: format!("fiche-details-{}.pdf", now.timestamp_millis()),
            image: ImageOptions {
                format: "jpeg",
                quality: 0.98,
            },
            page: PageSetup {
                unit: "mm",
                format: "a4",
                orientation: "portrait",
            },
        }
    }
}

/// Turns a detail sheet into a document (PDF, print preview).
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, sheet: &DetailSheet, options: &PdfOptions) -> io::Result<()>;
}

/// Writes the plain-text sheet to the log instead of producing a document.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDocumentRenderer;

#[async_trait]
impl DocumentRenderer for LogDocumentRenderer {
    async fn render(&self, sheet: &DetailSheet, options: &PdfOptions) -> io::Result<()> {
        info!(filename = %options.filename, "\n{sheet}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Catalog, Language};
    use crate::model::{Category, CategoryFields, Status};
    use chrono::TimeZone;
    use std::sync::Arc;

    #[test]
    fn test_escape_csv_cell() {
        assert_eq!(escape_csv_cell("plain"), "plain");
        assert_eq!(escape_csv_cell("a;b"), "\"a;b\"");
        assert_eq!(escape_csv_cell("Casablanca, Maroc"), "\"Casablanca, Maroc\"");
        assert_eq!(escape_csv_cell("27\" screen"), "\"27\"\" screen\"");
        assert_eq!(escape_csv_cell("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_csv_layout() {
        let records = vec![Category::from_fields(
            RecordId(4),
            CategoryFields {
                name: "Stockage".into(),
                description: "Disques; clés".into(),
                status: Status::Active,
            },
        )];
        let today = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let export = CsvExport::build(&records, &ReferenceIndex::default(), today);

        assert_eq!(export.filename, "categories-2025-03-09.csv");
        assert_eq!(
            export.content,
            "\u{FEFF}id;name;description;status\n4;Stockage;\"Disques; clés\";active"
        );
    }

    #[test]
    fn test_format_shares_price_and_status_rendering() {
        let mut catalog = Catalog::new();
        catalog.insert(Language::Fr, "completed", "Terminée");
        let localizer = Localizer::new(Language::Fr, Arc::new(catalog));
        let index = ReferenceIndex::default();

        assert_eq!(index.format(FieldKind::Decimal, Some(FieldValue::Decimal(100.0)), &localizer), "100.00 DH");
        assert_eq!(
            index.format(FieldKind::OrderStatus, Some(FieldValue::Text("completed".into())), &localizer),
            "Terminée"
        );
        assert_eq!(index.format(FieldKind::Integer, Some(FieldValue::Integer(45)), &localizer), "45");
        assert_eq!(
            index.format(FieldKind::Reference(Collection::Suppliers), Some(FieldValue::Reference(RecordId(1))), &localizer),
            "-"
        );
        assert_eq!(index.count("products", RecordId(1)), 0);
    }

    #[test]
    fn test_missing_reference_renders_placeholder() {
        let index = ReferenceIndex::default();
        assert_eq!(index.resolve(Collection::Suppliers, RecordId(1)), "-");
        assert_eq!(
            index.display(FieldKind::Reference(Collection::Suppliers), Some(FieldValue::Reference(RecordId(1)))),
            "-"
        );
    }

    #[test]
    fn test_pdf_options() {
        let now = Utc.timestamp_millis_opt(1_735_000_000_000).unwrap();
        let options = PdfOptions::at(now);
        assert_eq!(options.filename, "fiche-details-1735000000000.pdf");

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["margin"], serde_json::json!([10, 10, 10, 10]));
        assert_eq!(json["image"]["type"], "jpeg");
        assert_eq!(json["jsPDF"]["orientation"], "portrait");
    }

    #[test]
    fn test_sheet_text_rendering() {
        let sheet = DetailSheet {
            title: "Webcam HD".into(),
            generated_on: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            entries: vec![DetailEntry {
                label: "price".into(),
                value: "59.99 DH".into(),
            }],
        };
        let text = sheet.to_string();
        assert!(text.contains("Webcam HD"));
        assert!(text.contains("Généré le 02/01/2025"));
        assert!(text.contains("price  59.99 DH"));
    }
}
