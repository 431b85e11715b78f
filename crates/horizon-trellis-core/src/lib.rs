//! Core systems for Horizon Trellis.
//!
//! This crate provides the foundation the server-side component library is
//! built on:
//!
//! - **Signal/Slot System**: Type-safe notification between server-side
//!   objects (data communicators, views, components)
//! - **Logging targets**: `tracing` target constants for filtering by
//!   subsystem
//!
//! # Threading Model
//!
//! Horizon Trellis follows a single-threaded-per-UI turn model: every
//! mutation of a UI's server-side state happens while that UI's exclusive
//! processing turn is held by the surrounding session layer. Signals
//! therefore invoke their slots directly on the emitting turn; there is no
//! queued cross-thread delivery. Background threads that need to mutate UI
//! state must marshal onto the owning UI's turn first; that obligation
//! belongs to the caller, not this crate.
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_trellis_core::Signal;
//!
//! // Create a signal that notifies when a count changes
//! let count_changed = Signal::<usize>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = count_changed.connect(|count| {
//!     println!("Count changed to: {}", count);
//! });
//!
//! // Emit the signal
//! count_changed.emit(42);
//!
//! // Disconnect when done
//! count_changed.disconnect(conn_id);
//! ```

pub mod logging;
mod signal;

pub use signal::{ConnectionGuard, ConnectionId, Signal};
