//! # Inventory Desk demo
//!
//! Walks the main flows end to end against the seeded dataset:
//! 1.  Starting the [`InventorySystem`] and logging in.
//! 2.  Filtering the products table and exporting it as CSV.
//! 3.  Creating a category and a product in it.
//! 4.  Printing a detail sheet and the dashboard.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, Instrument};

use inventory_desk::config::InventoryConfig;
use inventory_desk::controller::LogDocumentRenderer;
use inventory_desk::dashboard::LogChartRenderer;
use inventory_desk::i18n::NoTranslations;
use inventory_desk::lifecycle::tracing::setup_tracing;
use inventory_desk::lifecycle::InventorySystem;

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = InventoryConfig::load("inventory.toml").map_err(|e| e.to_string())?;
    info!(?config, "Starting inventory desk");

    let mut system = InventorySystem::open(config).await.map_err(|e| e.to_string())?;
    system.attach_dashboard(Arc::new(LogChartRenderer));
    system.session.login("admin").await.map_err(|e| e.to_string())?;
    info!(user = system.session.display_name(), "Logged in");

    let now = Utc::now();
    let today = now.date_naive();
    let localizer = system.localizer(Arc::new(NoTranslations));

    // Network gear only, as the products screen would show it
    let span = tracing::info_span!("product_listing");
    let export = async {
        system.products.set_filter("category", "3").map_err(|e| e.to_string())?;
        let view = system.products.list_view(&localizer).await.map_err(|e| e.to_string())?;
        for row in &view.rows {
            info!(
                name = row.cell("name").unwrap_or_default(),
                quantity = row.cell("quantity").unwrap_or_default(),
                price = row.cell("price").unwrap_or_default(),
                category = row.cell("category").unwrap_or_default(),
                "Product"
            );
        }
        system.products.export_csv(today).await.map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;

    info!(filename = %export.filename, bytes = export.content.len(), "CSV ready");
    if let Some(dir) = &system.config().data_dir {
        export.save(dir).await.map_err(|e| e.to_string())?;
    }

    // Create a category, then a product that points at it
    let span = tracing::info_span!("catalog_update");
    let created = async {
        let category = system
            .categories
            .create(&BTreeMap::from([
                ("name".to_string(), "Stockage".to_string()),
                ("description".to_string(), "Disques et NAS".to_string()),
                ("status".to_string(), "active".to_string()),
            ]))
            .await?;

        let mut form = system.products.form(None, now).await?.to_form_data();
        form.insert("name".into(), "Disque SSD 1To".into());
        form.insert("sku".into(), "STO-001".into());
        form.insert("quantity".into(), "40".into());
        form.insert("price".into(), "99.90".into());
        form.insert("category".into(), category.id.to_string());
        system.products.create(&form).await
    }
    .instrument(span)
    .await;

    match created {
        Ok(product) => {
            info!(id = %product.id, name = %product.name, "Product created");
            let sheet = system
                .products
                .detail(product.id, today, &localizer)
                .await
                .map_err(|e| e.to_string())?;
            println!("{sheet}");
            system
                .products
                .export_document(product.id, now, &localizer, &LogDocumentRenderer)
                .await
                .map_err(|e| e.to_string())?;
        }
        Err(e) => error!(error = %e, "Catalog update failed"),
    }

    let categories = system.categories.list_view(&localizer).await.map_err(|e| e.to_string())?;
    for row in &categories.rows {
        info!(
            name = row.cell("name").unwrap_or_default(),
            products = row.cell("products").unwrap_or_default(),
            "Category"
        );
    }

    let dashboard = system.dashboard(today).await.map_err(|e| e.to_string())?;
    info!(summary = ?dashboard.summary, "Dashboard");
    for chart in dashboard.charts() {
        info!(kind = ?chart.kind, labels = ?chart.labels, series = ?chart.series(), "Chart");
    }

    system.session.logout().await.map_err(|e| e.to_string())?;

    // Shutdown system gracefully
    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Application completed successfully");
    Ok(())
}
