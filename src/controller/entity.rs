use chrono::{DateTime, NaiveDate, Utc};
use std::marker::PhantomData;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use crate::controller::export::{CsvExport, DetailEntry, DetailSheet, DocumentRenderer, PdfOptions, ReferenceIndex};
use crate::controller::form::{self, blank_value, Choice, FormData, FormField, FormView};
use crate::controller::{ChangeEvent, ChangeKind, ControllerError};
use crate::framework::{Record, StoreClient};
use crate::i18n::Localizer;
use crate::model::{FieldKind, RecordId};
use crate::pipeline::{self, ListQuery, PageLink};

/// One displayed cell: the field it shows and its rendered value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub field: &'static str,
    pub value: String,
}

/// A table row: the record plus its formatted cells, references already
/// resolved and derived counts appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<T> {
    pub record: T,
    pub cells: Vec<Cell>,
}

impl<T> Row<T> {
    pub fn cell(&self, field: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|cell| cell.field == field)
            .map(|cell| cell.value.as_str())
    }
}

/// What a table screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    pub rows: Vec<Row<T>>,
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
    pub links: Vec<PageLink>,
}

/// Proof that a delete was requested; pass it back to confirm.
#[derive(Debug, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pub id: RecordId,
    /// Display name of the record about to go.
    pub label: String,
}

/// The generic table controller.
///
/// # Architecture Note
/// The controller never holds records. Every view re-reads the collection
/// from the store, so what it shows is always a fresh snapshot. Its own state
/// is the [`ListQuery`] and at most one pending delete.
pub struct EntityController<T: Record> {
    store: StoreClient,
    events: broadcast::Sender<ChangeEvent>,
    query: ListQuery,
    pending_delete: Option<RecordId>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> EntityController<T> {
    pub fn new(store: StoreClient, events: broadcast::Sender<ChangeEvent>, page_size: usize) -> Self {
        Self {
            store,
            events,
            query: ListQuery::new(page_size),
            pending_delete: None,
            _record: PhantomData,
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    // -------------------------------------------------------------------------
    // View state
    // -------------------------------------------------------------------------

    pub fn set_search(&mut self, term: &str) {
        self.query.set_search(term);
    }

    /// Applies an equality filter from a raw control value. An empty value
    /// clears the filter ("all").
    pub fn set_filter(&mut self, field: &str, raw: &str) -> Result<(), ControllerError> {
        if !T::DESCRIPTOR.filters.contains(&field) {
            return Err(ControllerError::UnknownField(field.to_string()));
        }
        let kind = T::DESCRIPTOR
            .field(field)
            .map(|spec| spec.kind)
            .ok_or_else(|| ControllerError::UnknownField(field.to_string()))?;

        if raw.trim().is_empty() {
            self.query.clear_filter(field);
            return Ok(());
        }
        let value = kind.parse(raw).ok_or_else(|| ControllerError::InvalidField {
            field: field.to_string(),
            value: raw.to_string(),
        })?;
        self.query.set_filter(field, value);
        Ok(())
    }

    pub fn clear_filter(&mut self, field: &str) {
        self.query.clear_filter(field);
    }

    pub fn sort_by(&mut self, field: &str) -> Result<(), ControllerError> {
        if field != "id" && T::DESCRIPTOR.field(field).is_none() {
            return Err(ControllerError::UnknownField(field.to_string()));
        }
        self.query.sort_by(field);
        Ok(())
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.query.go_to_page(page);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.query.set_page_size(page_size);
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// The current page. Cells are formatted like the detail sheet; the CSV
    /// export keeps raw values.
    #[instrument(skip_all, fields(collection = %T::COLLECTION, page = self.query.page))]
    pub async fn list_view(&self, localizer: &Localizer) -> Result<ListView<T>, ControllerError> {
        let items = self.store.list::<T>().await?;
        let page = pipeline::run(items, &self.query);
        let references = ReferenceIndex::load::<T>(&self.store).await?;
        let links = page.links();

        let rows = page
            .items
            .into_iter()
            .map(|record| {
                let fields = T::DESCRIPTOR.fields.iter().map(|spec| Cell {
                    field: spec.name,
                    value: references.format(spec.kind, record.field(spec.name), localizer),
                });
                let counts = T::DESCRIPTOR.counts.iter().map(|link| Cell {
                    field: link.name,
                    value: references.count(link.name, record.id()).to_string(),
                });
                let cells = fields.chain(counts).collect();
                Row { record, cells }
            })
            .collect::<Vec<_>>();

        debug!(rows = rows.len(), total = page.total, "List view");
        Ok(ListView {
            rows,
            total: page.total,
            page: page.page,
            page_count: page.page_count,
            links,
        })
    }

    /// Options offered by a filter control.
    pub async fn filter_choices(&self, field: &str) -> Result<Vec<Choice>, ControllerError> {
        let spec = T::DESCRIPTOR
            .field(field)
            .filter(|spec| T::DESCRIPTOR.filters.contains(&spec.name))
            .ok_or_else(|| ControllerError::UnknownField(field.to_string()))?;
        self.choices_for(spec.kind).await
    }

    /// The create form (`id == None`) or the edit form of an existing record.
    #[instrument(skip_all, fields(collection = %T::COLLECTION, ?id))]
    pub async fn form(&self, id: Option<RecordId>, now: DateTime<Utc>) -> Result<FormView, ControllerError> {
        let record = match id {
            Some(id) => Some(self.store.fetch::<T>(id).await?),
            None => None,
        };

        let mut fields = Vec::with_capacity(T::DESCRIPTOR.fields.len());
        for spec in T::DESCRIPTOR.fields {
            let choices = self.choices_for(spec.kind).await?;
            let value = match &record {
                Some(record) => record.field(spec.name).map(|v| v.to_string()).unwrap_or_default(),
                None => T::suggested_value(spec.name, now).unwrap_or_else(|| blank_value(spec.kind, &choices)),
            };
            fields.push(FormField {
                name: spec.name,
                kind: spec.kind,
                value,
                choices,
            });
        }

        Ok(FormView { editing: id, fields })
    }

    /// Label/value sheet of one record, formatted like the table cells.
    #[instrument(skip_all, fields(collection = %T::COLLECTION, %id))]
    pub async fn detail(
        &self,
        id: RecordId,
        today: NaiveDate,
        localizer: &Localizer,
    ) -> Result<DetailSheet, ControllerError> {
        let record = self.store.fetch::<T>(id).await?;
        let references = ReferenceIndex::load::<T>(&self.store).await?;

        let entries = T::DESCRIPTOR
            .fields
            .iter()
            .map(|spec| DetailEntry {
                label: localizer.t(spec.name),
                value: references.format(spec.kind, record.field(spec.name), localizer),
            })
            .collect();

        Ok(DetailSheet {
            title: record.label().to_string(),
            generated_on: today,
            entries,
        })
    }

    /// Builds the detail sheet and hands it to `renderer` with the PDF layout.
    pub async fn export_document(
        &self,
        id: RecordId,
        now: DateTime<Utc>,
        localizer: &Localizer,
        renderer: &dyn DocumentRenderer,
    ) -> Result<PdfOptions, ControllerError> {
        let sheet = self.detail(id, now.date_naive(), localizer).await?;
        let options = PdfOptions::at(now);
        renderer.render(&sheet, &options).await.map_err(ControllerError::Render)?;
        info!(collection = %T::COLLECTION, %id, filename = %options.filename, "Document exported");
        Ok(options)
    }

    /// Every filtered and sorted record (not just the current page) as CSV.
    #[instrument(skip_all, fields(collection = %T::COLLECTION))]
    pub async fn export_csv(&self, today: NaiveDate) -> Result<CsvExport, ControllerError> {
        let records = pipeline::arrange(self.store.list::<T>().await?, &self.query);
        if records.is_empty() {
            return Err(ControllerError::EmptyExport);
        }
        let references = ReferenceIndex::load::<T>(&self.store).await?;
        let export = CsvExport::build(&records, &references, today);
        info!(rows = records.len(), filename = %export.filename, "CSV exported");
        Ok(export)
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    #[instrument(skip_all, fields(collection = %T::COLLECTION))]
    pub async fn create(&self, form: &FormData) -> Result<T, ControllerError> {
        let fields = form::coerce::<T>(form)?;
        let record = self.store.create::<T>(fields).await?;
        self.publish(record.id(), ChangeKind::Created);
        Ok(record)
    }

    #[instrument(skip_all, fields(collection = %T::COLLECTION, %id))]
    pub async fn update(&self, id: RecordId, form: &FormData) -> Result<T, ControllerError> {
        let fields = form::coerce::<T>(form)?;
        let record = self.store.update::<T>(id, fields).await?;
        self.publish(id, ChangeKind::Updated);
        Ok(record)
    }

    /// First phase of a delete: checks the record exists and remembers it.
    pub async fn request_delete(&mut self, id: RecordId) -> Result<DeleteConfirmation, ControllerError> {
        let record = self.store.fetch::<T>(id).await?;
        self.pending_delete = Some(id);
        debug!(collection = %T::COLLECTION, %id, "Delete requested");
        Ok(DeleteConfirmation {
            id,
            label: record.label().to_string(),
        })
    }

    /// Second phase: deletes, returns to page 1 and notifies listeners.
    #[instrument(skip_all, fields(collection = %T::COLLECTION, id = %confirmation.id))]
    pub async fn confirm_delete(&mut self, confirmation: DeleteConfirmation) -> Result<(), ControllerError> {
        let id = confirmation.id;
        if self.pending_delete != Some(id) {
            return Err(ControllerError::StaleConfirmation {
                collection: T::COLLECTION,
                id,
            });
        }
        self.pending_delete = None;
        self.store.delete::<T>(id).await?;
        self.query.go_to_page(1);
        self.publish(id, ChangeKind::Deleted);
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn choices_for(&self, kind: FieldKind) -> Result<Vec<Choice>, ControllerError> {
        Ok(match kind {
            FieldKind::Reference(target) => self
                .store
                .labels(target)
                .await?
                .into_iter()
                .map(|(id, label)| Choice {
                    value: id.to_string(),
                    label,
                })
                .collect(),
            other => other
                .choices()
                .into_iter()
                .map(|value| Choice {
                    value: value.to_string(),
                    label: value.to_string(),
                })
                .collect(),
        })
    }

    fn publish(&self, id: RecordId, kind: ChangeKind) {
        let event = ChangeEvent {
            collection: T::COLLECTION,
            id,
            kind,
        };
        // No subscriber means nothing to refresh.
        let receivers = self.events.send(event).unwrap_or(0);
        debug!(?event, receivers, "Change published");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{MemoryBlobStore, StoreActor, StoreError};
    use crate::i18n::{Catalog, Language, NoTranslations};
    use crate::model::{Category, Collection, Order, Product, Supplier};
    use chrono::TimeZone;
    use std::sync::Arc;
    use std::time::Duration;

    async fn seeded_store() -> StoreClient {
        let blob = Arc::new(MemoryBlobStore::new());
        let (actor, client) = StoreActor::open(blob, Duration::ZERO, 16).await.unwrap();
        tokio::spawn(actor.run());
        client
    }

    fn controller<T: Record>(store: &StoreClient) -> (EntityController<T>, broadcast::Receiver<ChangeEvent>) {
        let (events, receiver) = broadcast::channel(16);
        (EntityController::new(store.clone(), events, 10), receiver)
    }

    fn plain() -> Localizer {
        Localizer::new(Language::Fr, Arc::new(NoTranslations))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn category_form(name: &str) -> FormData {
        [("name", name), ("description", "Nouvelle"), ("status", "active")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_list_view_resolves_references() {
        let store = seeded_store().await;
        let (products, _) = controller::<Product>(&store);

        let view = products.list_view(&plain()).await.unwrap();
        assert_eq!(view.total, 8);
        assert_eq!(view.page_count, 1);
        assert!(view.links.is_empty());
        assert_eq!(view.rows[0].cell("category"), Some("Informatique"));
        assert_eq!(view.rows[6].cell("category"), Some("Réseau"));
        assert_eq!(view.rows[6].cell("quantity"), Some("0"));
        assert_eq!(view.rows[0].cell("price"), Some("899.99 DH"));
        assert_eq!(view.rows[0].cell("status"), Some("active"));
    }

    #[tokio::test]
    async fn test_list_view_translates_statuses() {
        let store = seeded_store().await;
        let (orders, _) = controller::<Order>(&store);
        let mut catalog = Catalog::new();
        catalog.insert(Language::En, "completed", "Completed");
        let localizer = Localizer::new(Language::En, Arc::new(catalog));

        let view = orders.list_view(&localizer).await.unwrap();
        assert_eq!(view.rows[0].cell("status"), Some("Completed"));
        assert_eq!(view.rows[2].cell("status"), Some("processing"));
    }

    #[tokio::test]
    async fn test_category_rows_count_their_products() {
        let store = seeded_store().await;
        let (categories, _) = controller::<Category>(&store);

        let view = categories.list_view(&plain()).await.unwrap();
        let counts: Vec<_> = view.rows.iter().map(|row| row.cell("products")).collect();
        assert_eq!(counts, vec![Some("2"), Some("4"), Some("2")]);

        store.delete::<Product>(RecordId(7)).await.unwrap();
        let view = categories.list_view(&plain()).await.unwrap();
        assert_eq!(view.rows[2].cell("products"), Some("1"));

        // Counts are a table column only
        let export = categories.export_csv(today()).await.unwrap();
        assert!(export.content.starts_with("\u{FEFF}id;name;description;status\n"));
    }

    #[tokio::test]
    async fn test_filter_and_search_switch() {
        let store = seeded_store().await;
        let (mut products, _) = controller::<Product>(&store);

        products.set_filter("status", "active").unwrap();
        products.set_search("Switch");
        let view = products.list_view(&plain()).await.unwrap();
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].record.id, RecordId(7));
        assert_eq!(view.rows[0].record.quantity, 0);
    }

    #[tokio::test]
    async fn test_filter_validation() {
        let store = seeded_store().await;
        let (mut products, _) = controller::<Product>(&store);

        assert!(matches!(products.set_filter("sku", "DELL-001"), Err(ControllerError::UnknownField(_))));
        assert!(matches!(
            products.set_filter("category", "abc"),
            Err(ControllerError::InvalidField { .. })
        ));

        products.set_filter("category", "2").unwrap();
        assert_eq!(products.list_view(&plain()).await.unwrap().total, 4);
        products.set_filter("category", "").unwrap();
        assert_eq!(products.list_view(&plain()).await.unwrap().total, 8);

        let choices = products.filter_choices("category").await.unwrap();
        assert_eq!(choices[0], Choice { value: "1".into(), label: "Informatique".into() });
    }

    #[tokio::test]
    async fn test_create_update_publish_events() {
        let store = seeded_store().await;
        let (categories, mut events) = controller::<Category>(&store);

        let created = categories.create(&category_form("Stockage")).await.unwrap();
        assert_eq!(created.id, RecordId(4));
        assert_eq!(
            events.recv().await.unwrap(),
            ChangeEvent { collection: Collection::Categories, id: RecordId(4), kind: ChangeKind::Created }
        );

        let updated = categories.update(RecordId(4), &category_form("Stockage SSD")).await.unwrap();
        assert_eq!(updated.name, "Stockage SSD");
        assert_eq!(events.recv().await.unwrap().kind, ChangeKind::Updated);

        let err = categories.update(RecordId(99), &category_form("X")).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_store() {
        let store = seeded_store().await;
        let (products, _) = controller::<Product>(&store);
        let mut form = products.form(None, Utc::now()).await.unwrap().to_form_data();
        form.insert("price".into(), "cheap".into());

        let err = products.create(&form).await.unwrap_err();
        assert!(matches!(err, ControllerError::InvalidField { .. }));
        assert_eq!(store.list::<Product>().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_two_phase_delete_resets_page() {
        let store = seeded_store().await;
        let (mut suppliers, mut events) = controller::<Supplier>(&store);
        suppliers.set_page_size(1);
        suppliers.go_to_page(3);

        let confirmation = suppliers.request_delete(RecordId(2)).await.unwrap();
        assert_eq!(confirmation.label, "GlobalIT");
        suppliers.confirm_delete(confirmation).await.unwrap();

        assert_eq!(suppliers.query().page, 1);
        assert_eq!(events.recv().await.unwrap().kind, ChangeKind::Deleted);
        assert_eq!(suppliers.list_view(&plain()).await.unwrap().total, 2);

        let stale = DeleteConfirmation { id: RecordId(2), label: "GlobalIT".into() };
        assert!(matches!(
            suppliers.confirm_delete(stale).await,
            Err(ControllerError::StaleConfirmation { .. })
        ));

        let confirmation = suppliers.request_delete(RecordId(1)).await.unwrap();
        suppliers.cancel_delete();
        assert!(suppliers.confirm_delete(confirmation).await.is_err());
        assert!(suppliers.request_delete(RecordId(2)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_export_csv_is_unpaginated_and_resolved() {
        let store = seeded_store().await;
        let (mut orders, _) = controller::<Order>(&store);
        orders.set_page_size(2);

        let export = orders.export_csv(today()).await.unwrap();
        assert_eq!(export.filename, "orders-2025-01-15.csv");
        let lines: Vec<&str> = export.content.trim_start_matches('\u{FEFF}').split('\n').collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "id;orderNumber;supplier;product;quantity;date;status");
        assert_eq!(lines[1], "1;ORD-001;TechDistrib;Ordinateur Portable Dell;50;2024-11-15;completed");

        orders.set_search("nothing matches");
        assert!(matches!(orders.export_csv(today()).await, Err(ControllerError::EmptyExport)));
    }

    #[tokio::test]
    async fn test_detail_sheet() {
        let store = seeded_store().await;
        let (products, _) = controller::<Product>(&store);
        let mut catalog = Catalog::new();
        catalog.insert(Language::Fr, "price", "Prix").insert(Language::Fr, "active", "Actif");
        let localizer = Localizer::new(Language::Fr, Arc::new(catalog));

        let sheet = products.detail(RecordId(5), today(), &localizer).await.unwrap();
        assert_eq!(sheet.title, "Webcam HD");
        assert_eq!(sheet.generated_on, today());
        assert_eq!(sheet.value("Prix"), Some("59.99 DH"));
        assert_eq!(sheet.value("status"), Some("Actif"));
        assert_eq!(sheet.value("category"), Some("Accessoires"));
        assert_eq!(sheet.entries.len(), 7);

        let plain = Localizer::new(Language::En, Arc::new(NoTranslations));
        let err = products.detail(RecordId(42), today(), &plain).await.unwrap_err();
        assert!(matches!(err, ControllerError::Store(StoreError::NotFound { .. })));
    }

    struct FailingRenderer;

    #[async_trait::async_trait]
    impl DocumentRenderer for FailingRenderer {
        async fn render(&self, _sheet: &DetailSheet, _options: &PdfOptions) -> std::io::Result<()> {
            Err(std::io::Error::other("printer on fire"))
        }
    }

    #[tokio::test]
    async fn test_export_document() {
        let store = seeded_store().await;
        let (warehouses, _) = controller::<crate::model::Warehouse>(&store);
        let localizer = Localizer::new(Language::Fr, Arc::new(NoTranslations));
        let now = Utc.timestamp_millis_opt(1_736_900_000_000).unwrap();

        let options = warehouses
            .export_document(RecordId(2), now, &localizer, &crate::controller::LogDocumentRenderer)
            .await
            .unwrap();
        assert_eq!(options.filename, "fiche-details-1736900000000.pdf");

        let err = warehouses
            .export_document(RecordId(2), now, &localizer, &FailingRenderer)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Render(_)));
    }

    #[tokio::test]
    async fn test_order_form_defaults() {
        let store = seeded_store().await;
        let (orders, _) = controller::<Order>(&store);
        let now = Utc.timestamp_millis_opt(1_736_900_000_000).unwrap();

        let blank = orders.form(None, now).await.unwrap();
        assert_eq!(blank.field("orderNumber").unwrap().value, "ORD-1736900000000");
        assert_eq!(blank.field("quantity").unwrap().value, "0");
        assert_eq!(blank.field("status").unwrap().value, "pending");
        assert_eq!(blank.field("supplier").unwrap().choices.len(), 3);
        assert_eq!(blank.field("supplier").unwrap().value, "1");

        let edit = orders.form(Some(RecordId(3)), now).await.unwrap();
        assert_eq!(edit.editing, Some(RecordId(3)));
        assert_eq!(edit.field("orderNumber").unwrap().value, "ORD-003");
        assert_eq!(edit.field("date").unwrap().value, "2024-12-15");
    }
}
