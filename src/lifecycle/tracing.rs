//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging once, from the binary.
//! Library code only emits events.
//!
//! ## What Gets Traced
//!
//! - **Store lifecycle**: seeding, startup counts, shutdown
//! - **Store operations**: List, Get, Create, Update, Delete with `collection`,
//!   `id` and `size` fields
//! - **Controller operations**: one span per call (`list_view`, `create`,
//!   `export_csv`, ...) carrying the collection
//! - **Session & preferences**: login, logout, language changes, corrupt payloads
//!
//! ## Usage Examples
//!
//! ```bash
//! # Compact logs
//! RUST_LOG=info cargo run
//!
//! # Payloads of every store request
//! RUST_LOG=debug cargo run
//!
//! # Only the store
//! RUST_LOG=inventory_desk::framework=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` a create and an export read:
//!
//! ```text
//! INFO Created collection=categories id=4 size=4
//! INFO export_csv{collection=products}: CSV exported rows=8 filename=products-2025-01-15.csv
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // collection fields identify the source
        .compact() // spans inline, e.g. "create{collection=categories}"
        .init();
}
