//! # Core Store Framework
//!
//! This module defines the generic building blocks of the mock store.
//!
//! ## Key Types
//!
//! - [`Record`]: The trait every collection's record type implements.
//! - [`StoreActor`]: The single task that owns the persisted document.
//! - [`StoreClient`]: The cloneable handle used to talk to the store.
//! - [`StoreError`]: Store failures (NotFound, closed channels, persistence).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::framework::blob::BlobStore;
use crate::model::{
    Category, Collection, Descriptor, FieldValue, InventoryDocument, Order, Product, RecordId, Supplier, Warehouse,
    DOCUMENT_KEY,
};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that every record type must implement to live in the store.
///
/// # Architecture Note
/// The store logic (id assignment, replace-in-place, whole-document commit) is
/// written *once* against this trait. A record type only says which collection
/// it lives in, how it is built from its fields, and how its attributes read.
///
/// `Fields` is the full set of non-id attributes. Create and update take the
/// same payload because update is a full replace.
///
/// The [`Descriptor`] is plain data (searchable fields, filterable fields, form
/// schema) consumed by the list pipeline and the entity controller.
pub trait Record: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Every non-id attribute; the create and update payload.
    type Fields: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static;

    const COLLECTION: Collection;
    const DESCRIPTOR: Descriptor;

    fn id(&self) -> RecordId;

    /// Display name used when another record references this one.
    fn label(&self) -> &str;

    /// Builds the stored record from its id and payload.
    fn from_fields(id: RecordId, fields: Self::Fields) -> Self;

    /// Reads one attribute by wire name. `"id"` is always readable.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Pre-filled value for `field` in a blank create form, if any.
    fn suggested_value(_field: &str, _now: DateTime<Utc>) -> Option<String> {
        None
    }

    fn collection(document: &InventoryDocument) -> &Vec<Self>;
    fn collection_mut(document: &mut InventoryDocument) -> &mut Vec<Self>;

    /// Routes a typed request into the store's request enum.
    fn wrap(request: ResourceRequest<Self>) -> StoreRequest;

    /// Inverse of [`Record::wrap`]; hands the request back when it belongs to
    /// another collection.
    fn unwrap(request: StoreRequest) -> Result<ResourceRequest<Self>, StoreRequest>;
}

// =============================================================================
// 2. MESSAGES & ERRORS
// =============================================================================

/// Errors surfaced by the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store closed")]
    ActorClosed,
    #[error("Store dropped response channel")]
    ActorDropped,
    #[error("Item not found in {collection}: {id}")]
    NotFound { collection: Collection, id: RecordId },
    #[error("No identifier left in {0}")]
    IdsExhausted(Collection),
    #[error("Persisted document is corrupt: {0}")]
    CorruptDocument(#[source] serde_json::Error),
    #[error("Failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Blob storage error: {0}")]
    Persistence(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// One-shot reply channel carried by every request.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// CRUD request against one collection.
///
/// Generic over the record type, so a `Product` payload can only ever reach the
/// products collection.
#[derive(Debug)]
pub enum ResourceRequest<T: Record> {
    List {
        respond_to: Response<Vec<T>>,
    },
    Get {
        id: RecordId,
        respond_to: Response<Option<T>>,
    },
    Create {
        fields: T::Fields,
        respond_to: Response<T>,
    },
    Update {
        id: RecordId,
        fields: T::Fields,
        respond_to: Response<T>,
    },
    Delete {
        id: RecordId,
        respond_to: Response<()>,
    },
}

/// Everything the store task accepts.
#[derive(Debug)]
pub enum StoreRequest {
    Products(ResourceRequest<Product>),
    Suppliers(ResourceRequest<Supplier>),
    Warehouses(ResourceRequest<Warehouse>),
    Orders(ResourceRequest<Order>),
    Categories(ResourceRequest<Category>),
    /// `(id, label)` pairs of a collection, for foreign-key display.
    Labels {
        collection: Collection,
        respond_to: Response<Vec<(RecordId, String)>>,
    },
    /// A copy of the whole document.
    Snapshot {
        respond_to: Response<InventoryDocument>,
    },
}

// =============================================================================
// 3. THE STORE TASK
// =============================================================================

/// The task that owns the inventory document.
///
/// # Architecture Note
/// Requests are served one at a time, in arrival order. Two mutations can never
/// interleave inside the document, which gives single-writer semantics without
/// a lock. Each request first waits the configured artificial latency.
///
/// Mutations are applied to a copy of the document. The copy is serialized and
/// written under [`DOCUMENT_KEY`]; only when the write succeeds does it replace
/// the live document. A failed operation never touches the blob.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    document: InventoryDocument,
    blob: Arc<dyn BlobStore>,
    latency: Duration,
}

impl StoreActor {
    /// Loads the document from `blob`, seeding the demo dataset on first run.
    pub async fn open(
        blob: Arc<dyn BlobStore>,
        latency: Duration,
        buffer_size: usize,
    ) -> Result<(Self, StoreClient), StoreError> {
        let document = match blob.get(DOCUMENT_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(StoreError::CorruptDocument)?,
            None => {
                let seed = InventoryDocument::seed();
                let payload = serde_json::to_string(&seed).map_err(StoreError::Encode)?;
                blob.set(DOCUMENT_KEY, &payload).await?;
                info!("Seeded demo dataset");
                seed
            }
        };

        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            document,
            blob,
            latency,
        };
        Ok((actor, StoreClient::new(sender)))
    }

    /// Serves requests until every [`StoreClient`] is dropped.
    pub async fn run(mut self) {
        info!(
            products = self.document.products.len(),
            suppliers = self.document.suppliers.len(),
            warehouses = self.document.warehouses.len(),
            orders = self.document.orders.len(),
            categories = self.document.categories.len(),
            "Store started"
        );

        while let Some(request) = self.receiver.recv().await {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            match request {
                StoreRequest::Products(request) => self.serve(request).await,
                StoreRequest::Suppliers(request) => self.serve(request).await,
                StoreRequest::Warehouses(request) => self.serve(request).await,
                StoreRequest::Orders(request) => self.serve(request).await,
                StoreRequest::Categories(request) => self.serve(request).await,
                StoreRequest::Labels { collection, respond_to } => {
                    let labels = self.document.labels(collection);
                    debug!(%collection, count = labels.len(), "Labels");
                    let _ = respond_to.send(Ok(labels));
                }
                StoreRequest::Snapshot { respond_to } => {
                    debug!("Snapshot");
                    let _ = respond_to.send(Ok(self.document.clone()));
                }
            }
        }

        info!("Shutdown");
    }

    async fn serve<T: Record>(&mut self, request: ResourceRequest<T>) {
        let collection = T::COLLECTION;
        match request {
            ResourceRequest::List { respond_to } => {
                let items = T::collection(&self.document).clone();
                debug!(%collection, size = items.len(), "List");
                let _ = respond_to.send(Ok(items));
            }
            ResourceRequest::Get { id, respond_to } => {
                let item = T::collection(&self.document).iter().find(|r| r.id() == id).cloned();
                debug!(%collection, %id, found = item.is_some(), "Get");
                let _ = respond_to.send(Ok(item));
            }
            ResourceRequest::Create { fields, respond_to } => {
                debug!(%collection, ?fields, "Create");
                let mut next = self.document.clone();
                let items = T::collection_mut(&mut next);
                let Some(id) = next_id(items) else {
                    warn!(%collection, "Identifiers exhausted");
                    let _ = respond_to.send(Err(StoreError::IdsExhausted(collection)));
                    return;
                };
                let record = T::from_fields(id, fields);
                items.push(record.clone());
                let size = items.len();

                let result = self.commit(next).await.map(|()| record);
                match &result {
                    Ok(_) => info!(%collection, %id, size, "Created"),
                    Err(e) => warn!(%collection, error = %e, "Create failed"),
                }
                let _ = respond_to.send(result);
            }
            ResourceRequest::Update { id, fields, respond_to } => {
                debug!(%collection, %id, ?fields, "Update");
                let Some(index) = position::<T>(&self.document, id) else {
                    warn!(%collection, %id, "Not found");
                    let _ = respond_to.send(Err(StoreError::NotFound { collection, id }));
                    return;
                };
                let record = T::from_fields(id, fields);
                let mut next = self.document.clone();
                T::collection_mut(&mut next)[index] = record.clone();

                let result = self.commit(next).await.map(|()| record);
                match &result {
                    Ok(_) => info!(%collection, %id, "Updated"),
                    Err(e) => warn!(%collection, %id, error = %e, "Update failed"),
                }
                let _ = respond_to.send(result);
            }
            ResourceRequest::Delete { id, respond_to } => {
                debug!(%collection, %id, "Delete");
                let Some(index) = position::<T>(&self.document, id) else {
                    warn!(%collection, %id, "Not found");
                    let _ = respond_to.send(Err(StoreError::NotFound { collection, id }));
                    return;
                };
                let mut next = self.document.clone();
                let items = T::collection_mut(&mut next);
                items.remove(index);
                let size = items.len();

                let result = self.commit(next).await;
                match &result {
                    Ok(()) => info!(%collection, %id, size, "Deleted"),
                    Err(e) => warn!(%collection, %id, error = %e, "Delete failed"),
                }
                let _ = respond_to.send(result);
            }
        }
    }

    /// Writes `next` whole, then makes it the live document.
    async fn commit(&mut self, next: InventoryDocument) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&next).map_err(StoreError::Encode)?;
        self.blob.set(DOCUMENT_KEY, &payload).await?;
        self.document = next;
        Ok(())
    }
}

/// `max(id) + 1`, or 1 for an empty collection. `None` once `u32::MAX` is taken.
fn next_id<T: Record>(items: &[T]) -> Option<RecordId> {
    match items.iter().map(T::id).max() {
        None => Some(RecordId(1)),
        Some(RecordId(max)) => max.checked_add(1).map(RecordId),
    }
}

fn position<T: Record>(document: &InventoryDocument, id: RecordId) -> Option<usize> {
    T::collection(document).iter().position(|r| r.id() == id)
}

// =============================================================================
// 4. THE CLIENT
// =============================================================================

/// A cloneable handle to the [`StoreActor`].
///
/// Every call is a suspension point: the request is queued behind any pending
/// ones and answered after the store's artificial latency.
#[derive(Debug, Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    /// A copy of the collection, in insertion order.
    pub async fn list<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.send(T::wrap(ResourceRequest::List { respond_to }), response).await
    }

    pub async fn get<T: Record>(&self, id: RecordId) -> Result<Option<T>, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.send(T::wrap(ResourceRequest::Get { id, respond_to }), response).await
    }

    /// Like [`StoreClient::get`], but an absent id is a `NotFound` error.
    pub async fn fetch<T: Record>(&self, id: RecordId) -> Result<T, StoreError> {
        self.get::<T>(id).await?.ok_or(StoreError::NotFound {
            collection: T::COLLECTION,
            id,
        })
    }

    pub async fn create<T: Record>(&self, fields: T::Fields) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.send(T::wrap(ResourceRequest::Create { fields, respond_to }), response).await
    }

    pub async fn update<T: Record>(&self, id: RecordId, fields: T::Fields) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.send(T::wrap(ResourceRequest::Update { id, fields, respond_to }), response).await
    }

    pub async fn delete<T: Record>(&self, id: RecordId) -> Result<(), StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.send(T::wrap(ResourceRequest::Delete { id, respond_to }), response).await
    }

    pub async fn labels(&self, collection: Collection) -> Result<Vec<(RecordId, String)>, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.send(StoreRequest::Labels { collection, respond_to }, response).await
    }

    pub async fn snapshot(&self) -> Result<InventoryDocument, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.send(StoreRequest::Snapshot { respond_to }, response).await
    }

    async fn send<R>(
        &self,
        request: StoreRequest,
        response: oneshot::Receiver<Result<R, StoreError>>,
    ) -> Result<R, StoreError> {
        self.sender.send(request).await.map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }
}

// =============================================================================
// 5. TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::blob::MemoryBlobStore;
    use crate::model::{CategoryFields, ProductFields, Status};
    use async_trait::async_trait;
    use std::io;

    async fn start(blob: Arc<dyn BlobStore>) -> StoreClient {
        let (actor, client) = StoreActor::open(blob, Duration::ZERO, 8).await.unwrap();
        tokio::spawn(actor.run());
        client
    }

    fn category(name: &str) -> CategoryFields {
        CategoryFields {
            name: name.into(),
            description: format!("{name} description"),
            status: Status::Active,
        }
    }

    async fn persisted(blob: &MemoryBlobStore) -> InventoryDocument {
        let raw = blob.get(DOCUMENT_KEY).await.unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_first_open_seeds_and_persists() {
        let blob = Arc::new(MemoryBlobStore::new());
        let client = start(blob.clone()).await;

        let products: Vec<Product> = client.list().await.unwrap();
        assert_eq!(products.len(), 8);
        assert_eq!(persisted(&blob).await, InventoryDocument::seed());
    }

    #[tokio::test]
    async fn test_create_assigns_max_plus_one() {
        let blob = Arc::new(MemoryBlobStore::with_entry(DOCUMENT_KEY, "{}"));
        let client = start(blob.clone()).await;

        let first: Category = client.create(category("A")).await.unwrap();
        assert_eq!(first.id, RecordId(1));
        let second: Category = client.create(category("B")).await.unwrap();
        assert_eq!(second.id, RecordId(2));

        client.delete::<Category>(RecordId(1)).await.unwrap();
        let third: Category = client.create(category("C")).await.unwrap();
        assert_eq!(third.id, RecordId(3));

        let fetched: Category = client.fetch(third.id).await.unwrap();
        assert_eq!(fetched, Category::from_fields(RecordId(3), category("C")));
        assert_eq!(persisted(&blob).await.categories.len(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let blob = Arc::new(MemoryBlobStore::new());
        let client = start(blob.clone()).await;

        let updated: Category = client.update(RecordId(2), category("Périphériques")).await.unwrap();
        assert_eq!(updated.id, RecordId(2));

        let categories: Vec<Category> = client.list().await.unwrap();
        assert_eq!(categories[1].name, "Périphériques");
        assert_eq!(categories[1].description, "Périphériques description");
        assert_eq!(persisted(&blob).await.categories[1].name, "Périphériques");
    }

    #[tokio::test]
    async fn test_update_missing_id_leaves_collection_unchanged() {
        let blob = Arc::new(MemoryBlobStore::new());
        let client = start(blob.clone()).await;

        let err = client.update::<Category>(RecordId(42), category("X")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound { collection: Collection::Categories, id: RecordId(42) }
        ));

        let categories: Vec<Category> = client.list().await.unwrap();
        assert_eq!(categories, InventoryDocument::seed().categories);
    }

    #[tokio::test]
    async fn test_create_fails_once_ids_run_out() {
        let document = r#"{"categories":[{"id":4294967295,"name":"Max","description":"","status":"active"}]}"#;
        let blob = Arc::new(MemoryBlobStore::with_entry(DOCUMENT_KEY, document));
        let client = start(blob.clone()).await;

        let err = client.create::<Category>(category("Overflow")).await.unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted(Collection::Categories)));
        assert_eq!(client.list::<Category>().await.unwrap().len(), 1);
        assert_eq!(persisted(&blob).await.categories.len(), 1);

        // Other collections are unaffected
        let product: Product = client
            .create(ProductFields {
                name: "Hub".into(),
                sku: "HUB-1".into(),
                quantity: 1,
                price: 5.0,
                category: RecordId(u32::MAX),
                description: String::new(),
                status: Status::Active,
            })
            .await
            .unwrap();
        assert_eq!(product.id, RecordId(1));
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let blob = Arc::new(MemoryBlobStore::new());
        let client = start(blob.clone()).await;

        client.delete::<Product>(RecordId(3)).await.unwrap();
        let products: Vec<Product> = client.list().await.unwrap();
        let ids: Vec<u32> = products.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 2, 4, 5, 6, 7, 8]);

        let err = client.delete::<Product>(RecordId(3)).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(client.get::<Product>(RecordId(3)).await.unwrap().is_none());
    }

    struct ReadOnlyBlob(MemoryBlobStore);

    #[async_trait]
    impl BlobStore for ReadOnlyBlob {
        async fn get(&self, key: &str) -> io::Result<Option<String>> {
            self.0.get(key).await
        }

        async fn set(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }

        async fn remove(&self, _key: &str) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_write_keeps_live_document() {
        let blob = Arc::new(ReadOnlyBlob(MemoryBlobStore::with_entry(DOCUMENT_KEY, "{}")));
        let client = start(blob).await;

        let err = client.create::<Category>(category("A")).await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert!(client.list::<Category>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_rejected() {
        let blob = Arc::new(MemoryBlobStore::with_entry(DOCUMENT_KEY, "{not json"));
        let result = StoreActor::open(blob, Duration::ZERO, 8).await;
        assert!(matches!(result, Err(StoreError::CorruptDocument(_))));
    }

    #[tokio::test]
    async fn test_labels_and_snapshot() {
        let client = start(Arc::new(MemoryBlobStore::new())).await;

        let labels = client.labels(Collection::Suppliers).await.unwrap();
        assert_eq!(labels[1], (RecordId(2), "GlobalIT".to_string()));

        let snapshot = client.snapshot().await.unwrap();
        assert_eq!(snapshot, InventoryDocument::seed());
    }

    #[tokio::test]
    async fn test_latency_delays_each_request() {
        let blob = Arc::new(MemoryBlobStore::new());
        let (actor, client) = StoreActor::open(blob, Duration::from_millis(20), 8).await.unwrap();
        tokio::spawn(actor.run());

        let started = std::time::Instant::now();
        client.list::<Warehouse>().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_closed_store_reports_actor_closed() {
        let blob = Arc::new(MemoryBlobStore::new());
        let (actor, client) = StoreActor::open(blob, Duration::ZERO, 8).await.unwrap();
        drop(actor);

        let err = client.list::<Order>().await.unwrap_err();
        assert!(matches!(err, StoreError::ActorClosed));
    }
}
