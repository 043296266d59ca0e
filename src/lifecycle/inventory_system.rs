use chrono::NaiveDate;
use std::io;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::{ConfigError, InventoryConfig};
use crate::controller::{ChangeEvent, EntityController};
use crate::dashboard::{ChartRenderer, Dashboard, DashboardRefresher};
use crate::framework::{BlobStore, FileBlobStore, MemoryBlobStore, StoreActor, StoreClient, StoreError};
use crate::i18n::{Localizer, Preferences, Translator};
use crate::model::{Category, Order, Product, Supplier, Warehouse};
use crate::session::Session;

const STORE_BUFFER: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The running application.
///
/// # Example
///
/// ```ignore
/// let mut system = InventorySystem::open(InventoryConfig::load("inventory.toml")?).await?;
/// system.session.login("karim").await?;
///
/// system.products.set_search("switch");
/// let localizer = system.localizer(Arc::new(NoTranslations));
/// let view = system.products.list_view(&localizer).await?;
///
/// system.shutdown().await?;
/// ```
pub struct InventorySystem {
    pub products: EntityController<Product>,
    pub suppliers: EntityController<Supplier>,
    pub warehouses: EntityController<Warehouse>,
    pub orders: EntityController<Order>,
    pub categories: EntityController<Category>,
    pub session: Session,
    pub preferences: Preferences,
    config: InventoryConfig,
    store: StoreClient,
    events: broadcast::Sender<ChangeEvent>,
    store_handle: JoinHandle<()>,
    refresher: Option<JoinHandle<()>>,
}

impl InventorySystem {
    /// Starts on the blob store `config` asks for: a directory when
    /// `data_dir` is set, memory otherwise.
    pub async fn open(config: InventoryConfig) -> Result<Self, SystemError> {
        let blob: Arc<dyn BlobStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileBlobStore::open(dir).await?),
            None => Arc::new(MemoryBlobStore::new()),
        };
        Self::start(config, blob).await
    }

    /// Loads (or seeds) the document from `blob` and wires everything up.
    pub async fn start(config: InventoryConfig, blob: Arc<dyn BlobStore>) -> Result<Self, SystemError> {
        let (actor, store) = StoreActor::open(blob.clone(), config.latency(), STORE_BUFFER).await?;
        let store_handle = tokio::spawn(actor.run());

        let session = Session::load(blob.clone()).await?;
        let preferences = Preferences::load(blob).await?;
        let (events, _) = broadcast::channel(config.event_capacity);

        let page_size = config.page_size;
        info!(
            user = session.display_name(),
            language = %preferences.language(),
            page_size,
            "Inventory system started"
        );

        Ok(Self {
            products: EntityController::new(store.clone(), events.clone(), page_size),
            suppliers: EntityController::new(store.clone(), events.clone(), page_size),
            warehouses: EntityController::new(store.clone(), events.clone(), page_size),
            orders: EntityController::new(store.clone(), events.clone(), page_size),
            categories: EntityController::new(store.clone(), events.clone(), page_size),
            session,
            preferences,
            config,
            store,
            events,
            store_handle,
            refresher: None,
        })
    }

    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Receives every change published by the controllers.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Keeps `renderer` up to date: every change re-renders all charts.
    /// Replaces a previously attached refresher's subscription.
    pub fn attach_dashboard(&mut self, renderer: Arc<dyn ChartRenderer>) {
        let refresher = DashboardRefresher::new(self.store.clone(), renderer, self.config.dashboard_period_days);
        if let Some(previous) = self.refresher.replace(refresher.spawn(self.events.subscribe())) {
            previous.abort();
        }
    }

    pub async fn dashboard(&self, today: NaiveDate) -> Result<Dashboard, StoreError> {
        let document = self.store.snapshot().await?;
        Ok(Dashboard::build(&document, self.config.dashboard_period_days, today))
    }

    pub fn localizer(&self, translator: Arc<dyn Translator>) -> Localizer {
        self.preferences.localizer(translator)
    }

    /// Closes every channel and waits for the background tasks.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");

        // Dropping the last event sender stops the refresher; dropping the
        // last store client stops the store.
        drop(self.products);
        drop(self.suppliers);
        drop(self.warehouses);
        drop(self.orders);
        drop(self.categories);
        drop(self.events);
        drop(self.store);

        if let Some(refresher) = self.refresher {
            if let Err(e) = refresher.await {
                error!(error = %e, "Dashboard refresher failed");
                return Err(e.into());
            }
        }
        if let Err(e) = self.store_handle.await {
            error!(error = %e, "Store task failed");
            return Err(e.into());
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
