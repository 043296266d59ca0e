use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::broadcast;

use inventory_desk::controller::{ChangeEvent, ChangeKind, ControllerError, EntityController, FormData};
use inventory_desk::framework::mock::{create_mock_client, expect_create, MockStore};
use inventory_desk::framework::{Record, StoreError};
use inventory_desk::i18n::{Language, Localizer, NoTranslations};
use inventory_desk::model::{Collection, Product, ProductFields, RecordId, Status};

fn product(id: u32, name: &str, category: u32) -> Product {
    Product::from_fields(
        RecordId(id),
        ProductFields {
            name: name.to_string(),
            sku: format!("SKU-{id}"),
            quantity: 3,
            price: 12.5,
            category: RecordId(category),
            description: String::new(),
            status: Status::Active,
        },
    )
}

fn form(pairs: &[(&str, &str)]) -> FormData {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn valid_form() -> FormData {
    form(&[
        ("name", "Hub USB"),
        ("sku", "HUB-001"),
        ("quantity", "12"),
        ("price", "19.90"),
        ("category", "2"),
        ("description", "4 ports"),
        ("status", "active"),
    ])
}

fn controller(mock: &MockStore) -> (EntityController<Product>, broadcast::Receiver<ChangeEvent>) {
    let (events, receiver) = broadcast::channel(8);
    (EntityController::new(mock.client(), events, 10), receiver)
}

/// Real controller, scripted store.
///
/// Pattern: Controller + Mock
/// - Real `EntityController` (form coercion, event publishing)
/// - `MockStore` answers in a fixed order and fails on anything else
#[tokio::test]
async fn test_update_surfaces_not_found() {
    let mock = MockStore::new();
    mock.expect_update::<Product>(RecordId(42)).return_err(StoreError::NotFound {
        collection: Collection::Products,
        id: RecordId(42),
    });
    let (controller, mut events) = controller(&mock);

    let err = controller.update(RecordId(42), &valid_form()).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, ControllerError::Store(StoreError::NotFound { .. })));

    // Nothing changed, so nothing is announced
    assert!(events.try_recv().is_err());
    mock.verify();
}

#[tokio::test]
async fn test_successful_update_publishes_event() {
    let mock = MockStore::new();
    mock.expect_update::<Product>(RecordId(1)).return_ok(product(1, "Hub USB", 2));
    let (controller, mut events) = controller(&mock);

    let updated = controller.update(RecordId(1), &valid_form()).await.unwrap();
    assert_eq!(updated.name, "Hub USB");

    let event = events.try_recv().unwrap();
    assert_eq!(event.collection, Collection::Products);
    assert_eq!(event.id, RecordId(1));
    assert_eq!(event.kind, ChangeKind::Updated);
    mock.verify();
}

#[tokio::test]
async fn test_empty_export_never_loads_references() {
    let mock = MockStore::new();
    mock.expect_list::<Product>().return_ok(Vec::new());
    let (controller, _events) = controller(&mock);

    let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    let err = controller.export_csv(today).await.unwrap_err();
    assert!(matches!(err, ControllerError::EmptyExport));
    mock.verify();
}

#[tokio::test]
async fn test_list_view_falls_back_for_missing_category() {
    let mock = MockStore::new();
    mock.expect_list::<Product>()
        .return_ok(vec![product(1, "Clavier", 2), product(2, "Orphelin", 9)]);
    mock.expect_labels(Collection::Categories)
        .return_ok(vec![(RecordId(2), "Accessoires".to_string())]);
    let (controller, _events) = controller(&mock);

    let localizer = Localizer::new(Language::Fr, Arc::new(NoTranslations));
    let view = controller.list_view(&localizer).await.unwrap();
    assert_eq!(view.total, 2);
    assert_eq!(view.rows[0].cell("category"), Some("Accessoires"));
    assert_eq!(view.rows[1].cell("category"), Some("-"));
    assert_eq!(view.rows[0].cell("price"), Some("12.50 DH"));
    mock.verify();
}

#[tokio::test]
async fn test_failed_delete_keeps_state() {
    let mock = MockStore::new();
    mock.expect_get::<Product>(RecordId(5)).return_ok(Some(product(5, "Webcam HD", 2)));
    mock.expect_delete::<Product>(RecordId(5)).return_err(StoreError::NotFound {
        collection: Collection::Products,
        id: RecordId(5),
    });
    let (mut controller, mut events) = controller(&mock);
    controller.go_to_page(2);

    let confirmation = controller.request_delete(RecordId(5)).await.unwrap();
    assert_eq!(confirmation.label, "Webcam HD");

    let err = controller.confirm_delete(confirmation).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(controller.query().page, 2);
    assert!(events.try_recv().is_err());
    mock.verify();
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let mock = MockStore::new();
    let (controller, _events) = controller(&mock);

    let mut bad = valid_form();
    bad.insert("price".into(), "abc".into());
    let err = controller.create(&bad).await.unwrap_err();
    assert!(matches!(err, ControllerError::InvalidField { ref field, .. } if field == "price"));

    let mut unknown = valid_form();
    unknown.insert("colour".into(), "red".into());
    let err = controller.create(&unknown).await.unwrap_err();
    assert!(matches!(err, ControllerError::UnknownField(ref name) if name == "colour"));

    mock.verify();
}

/// Drives the raw channel to inspect exactly what the controller sends.
#[tokio::test]
async fn test_create_sends_coerced_fields() {
    let (client, mut receiver) = create_mock_client(10);
    let (events, mut changes) = broadcast::channel(8);
    let controller = EntityController::<Product>::new(client, events, 10);

    let create_task = tokio::spawn(async move { controller.create(&valid_form()).await });

    let (fields, responder) = expect_create::<Product>(&mut receiver)
        .await
        .expect("Expected Create request");
    assert_eq!(fields.quantity, 12);
    assert_eq!(fields.price, 19.90);
    assert_eq!(fields.category, RecordId(2));
    assert_eq!(fields.status, Status::Active);
    responder.send(Ok(Product::from_fields(RecordId(9), fields))).unwrap();

    let created = create_task.await.unwrap().unwrap();
    assert_eq!(created.id, RecordId(9));
    assert_eq!(changes.recv().await.unwrap().kind, ChangeKind::Created);
}
