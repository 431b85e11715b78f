//! The data-binding and lazy-data-fetching core.
//!
//! This module is the engine shared by every collection component
//! (combo box, grid, virtual list): it maps backend items to stable client
//! keys, resolves item counts that may be exact, estimated, or unknown,
//! tracks the index range the client currently renders, and pushes only the
//! delta, coalesced to at most one push per processing turn.
//!
//! # Core Types
//!
//! - `Query`: immutable request descriptor (offset, limit, sort, filter)
//! - `DataProvider`: where items come from, an in-memory list or a backend
//!   callback
//! - `KeyMapper`: backend item identity ↔ client key map
//! - `DataCommunicator`: the per-component engine orchestrating all of the
//!   above
//! - `DataViewRead` / `ListDataView` / `LazyDataView` / `GenericDataView`:
//!   typed read/filter/sort façades over the bound provider
//! - `ClientSink`: the outbound boundary towards the browser widget
//!
//! # Control Flow
//!
//! ```text
//! ┌───────────┐ set_provider ┌──────────────────┐   fetch    ┌──────────────┐
//! │ Component │─────────────>│ DataCommunicator │───────────>│ DataProvider │
//! └───────────┘              │  KeyMapper       │<───────────└──────────────┘
//!       │ request_range      │  count strategy  │   items
//!       └─────────────────-─>│  active range    │
//!                            └──────────────────┘
//!                                  │ flush (once per turn)
//!                                  v
//!                            ┌──────────────────┐
//!                            │    ClientSink    │  item diff + count update
//!                            └──────────────────┘
//! ```
//!
//! Data views read through the same provider + query machinery directly,
//! bypassing the communicator's pushed window, so listing and counting are
//! deterministic regardless of what the client currently renders.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_trellis::data::{
//!     DataCommunicator, DataViewRead, ListDataProvider, ListDataView,
//!     ItemPredicate, RecordingSink,
//! };
//!
//! let sink = Arc::new(RecordingSink::new());
//! let communicator: Arc<DataCommunicator<String, ItemPredicate<String>>> =
//!     Arc::new(DataCommunicator::new(sink.clone()));
//!
//! let provider = Arc::new(ListDataProvider::new(vec![
//!     "Apple".to_string(),
//!     "Banana".to_string(),
//! ]));
//! communicator.set_provider(provider, None);
//!
//! // The client attaches and asks for the first rows; one flush pushes
//! // one coalesced batch plus one count update.
//! communicator.attach();
//! communicator.request_range(0, 10);
//! communicator.flush();
//! assert_eq!(sink.updates().len(), 1);
//! assert_eq!(sink.last_count().unwrap().count, 2);
//!
//! // Reads go straight to the provider, not the pushed window.
//! let view = ListDataView::new(communicator).unwrap();
//! assert_eq!(view.item_count().unwrap(), 2);
//! ```

mod communicator;
mod error;
mod generator;
mod generic_view;
mod key_mapper;
mod lazy_view;
mod list_provider;
mod list_view;
mod provider;
mod query;
mod sink;
mod traits;

pub use communicator::{
    CommunicatorConfig, DataCommunicator, ItemCountChange, SizeState,
};
pub use error::{DataError, DataResult};
pub use generator::{ClosureGenerator, DataGenerator};
pub use generic_view::GenericDataView;
pub use key_mapper::{KeyMapper, default_identifier_provider};
pub use lazy_view::LazyDataView;
pub use list_provider::ListDataProvider;
pub use list_view::ListDataView;
pub use provider::{
    CallbackDataProvider, ConvertingDataProvider, CountCallback, DataProvider, FetchCallback,
    FilterConverter, ProviderKind, RefreshEvent,
};
pub use query::{
    IdentifierProvider, ItemComparator, ItemId, ItemPredicate, Query, SortDirection, SortOrder,
};
pub use sink::{ClientSink, CountMode, CountUpdate, ItemChange, NullSink, RecordingSink, UpdateBatch};
pub use traits::{DataViewRead, FilterableView, SortableView};
