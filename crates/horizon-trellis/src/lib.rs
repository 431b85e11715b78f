//! Horizon Trellis - server-side data binding for browser-rendered
//! collection components.
//!
//! Application code works with server-side component objects (combo boxes,
//! grids, virtual lists) while the actual rendering happens in the browser.
//! This crate implements the machinery that keeps the two sides in sync for
//! collection data: stable client keys for backend items, exact/estimated/
//! unknown item counts, lazy fetching of just the scrolled-to window, and
//! diff-based pushes coalesced to one per processing turn.
//!
//! The [`data`] module is the core engine; the [`component`] module holds
//! the per-widget adapters built on it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_trellis::component::ComboBox;
//! use horizon_trellis::data::RecordingSink;
//!
//! let sink = Arc::new(RecordingSink::new());
//! let combo: ComboBox<String> = ComboBox::new(sink.clone());
//! combo.set_items(vec!["Apple".to_string(), "Banana".to_string()]);
//!
//! // The UI-tree layer drives the binding.
//! combo.attach();
//! combo.request_range(0, 50);
//! combo.flush();
//!
//! assert_eq!(sink.last_count().unwrap().count, 2);
//! ```

pub use horizon_trellis_core::{ConnectionGuard, ConnectionId, Signal, logging};

pub mod component;
pub mod data;
