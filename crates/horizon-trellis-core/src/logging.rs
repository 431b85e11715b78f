//! Logging facilities for Horizon Trellis.
//!
//! Horizon Trellis uses the `tracing` crate for instrumentation. To see
//! logs, install a tracing subscriber in your application:
//!
//! ```ignore
//! use tracing_subscriber;
//!
//! fn main() {
//!     // Initialize tracing (you can customize this)
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! The constants in [`targets`] can be used with `tracing` directives to
//! filter logs by subsystem, e.g.
//! `RUST_LOG=horizon_trellis::data::communicator=trace`.

/// Target names for log filtering.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_trellis_core::signal";
    /// Data-binding core target (parent of the per-module targets below).
    pub const DATA: &str = "horizon_trellis::data";
    /// Data communicator target.
    pub const COMMUNICATOR: &str = "horizon_trellis::data::communicator";
    /// Key mapper target.
    pub const KEY_MAPPER: &str = "horizon_trellis::data::key_mapper";
    /// Data provider target.
    pub const PROVIDER: &str = "horizon_trellis::data::provider";
    /// Component integration target.
    pub const COMPONENT: &str = "horizon_trellis::component";
}
