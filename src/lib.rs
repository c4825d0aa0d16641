//! Errand: a model-driven shopping agent for web storefronts.
//!
//! The agent reads a page as a compact text snapshot with `@eN` element
//! references, asks the model for exactly one tool call at a time, executes
//! it against the page, and feeds the refreshed snapshot back. Questions for
//! the user suspend the run until an answer arrives.
//!
//! # Quick start
//!
//! ```no_run
//! use errand::api::ApiClient;
//! use errand::config::load_config;
//! use errand::host::SimulatedHost;
//! use errand::router::{spawn_background, BackgroundDeps};
//! use errand::tools::ToolRegistry;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let tab = errand::demo::page_process().spawn(config.page.request_timeout());
//! let host = SimulatedHost::new(tab).with_home(errand::demo::HOME_URL);
//! let (handle, mut events) = spawn_background(BackgroundDeps {
//!     client: Arc::new(ApiClient::new(&config.api)),
//!     host: Arc::new(host),
//!     tools: ToolRegistry::storefront(),
//!     config,
//! });
//! handle.send_message("order a margherita").await.unwrap();
//! while let Some(event) = events.recv().await {
//!     if event.is_done() {
//!         break;
//!     }
//! }
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod build_info;
pub mod config;
pub mod demo;
pub mod dom;
pub mod error;
pub mod host;
pub mod page;
pub mod prompt;
pub mod render;
pub mod router;
pub mod snapshot;
#[cfg(test)]
pub mod testsupport;
pub mod textutil;
pub mod tools;
pub mod types;
