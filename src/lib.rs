#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Inventory Desk
//!
//! > **An inventory dashboard engine: five collections, one store actor.**
//!
//! Products, suppliers, warehouses, orders and categories live in a single
//! JSON document. One Tokio task owns that document, serves CRUD requests over
//! a channel and persists every mutation before acknowledging it. Everything
//! else (list screens, forms, exports, charts) talks to it through a cloneable
//! [`StoreClient`](framework::StoreClient).
//!
//! ## 🏗️ Design Philosophy
//!
//! ### One Writer
//!
//! The document has exactly one owner. Requests are processed in order, so two
//! creates can never hand out the same id and a failed write never leaves a
//! half-applied change behind: the actor mutates a copy, persists it, and only
//! then swaps it in.
//!
//! ### Generics: The Power of `T`
//! You'll see `EntityController<T: Record>` everywhere. The list, form, detail,
//! export and delete flows are written **once** and driven by each record's
//! [`Descriptor`](model::Descriptor): which fields exist, which are searchable,
//! which are filters, which point at another collection.
//!
//! ### Mocking: Testing without Pain
//! Controllers can be tested against a scripted store with
//! [`MockStore`](framework::mock::MockStore). See the [`framework::mock`]
//! module.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! The store reports [`StoreError`](framework::StoreError); controllers wrap it
//! in [`ControllerError`](controller::ControllerError) next to form and export
//! failures. Not-found is a distinct variant at both levels.
//!
//! ### 2. Change Events
//! Every successful mutation is published on a broadcast channel as a
//! [`ChangeEvent`](controller::ChangeEvent). The dashboard refresher listens
//! and recomputes all charts.
//!
//! ### 3. Observability
//! `tracing` everywhere, with one span per controller operation. See the
//! [`lifecycle::tracing`] module.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Data ([`model`])
//! Record types, field kinds and values, the seed document.
//!
//! ### 2. The Engine ([`framework`])
//! The store actor, its client, the blob storage it persists to, and the mock.
//! - **Key items**: [`Record`](framework::Record), [`StoreActor`](framework::StoreActor).
//!
//! ### 3. The Screens ([`pipeline`], [`controller`], [`dashboard`])
//! Search, filter, sort and paginate; the generic entity controller with forms,
//! detail sheets and CSV export; the five dashboard charts.
//!
//! ### 4. The Context ([`session`], [`i18n`], [`config`], [`lifecycle`])
//! Login state, the language preference, runtime configuration, and
//! [`InventorySystem`](lifecycle::InventorySystem), which wires it all together.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Persist to a directory instead of memory
//! INVENTORY_DATA_DIR=./data cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod config;
pub mod controller;
pub mod dashboard;
pub mod framework;
pub mod i18n;
pub mod lifecycle;
pub mod model;
pub mod pipeline;
pub mod session;
