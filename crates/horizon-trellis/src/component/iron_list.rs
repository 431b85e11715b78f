//! IronList component integration.
//!
//! The legacy flat-scroller widget. Same data contract as
//! [`VirtualList`] (scroll-driven range requests, no paging) plus a
//! placeholder item: a row the browser renders in place of indices it has
//! not received yet, so fast scrolling shows placeholder rows instead of
//! blank space.

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::data::{
    ClientSink, DataProvider, DataResult, GenericDataView, ItemPredicate, LazyDataView,
    ListDataView,
};

use super::virtual_list::{ItemRenderer, VirtualList};

/// Server-side adapter for the iron-list browser widget.
pub struct IronList<T> {
    list: VirtualList<T>,
    placeholder: RwLock<Option<T>>,
}

impl<T> IronList<T>
where
    T: Clone + Hash + Send + Sync + 'static,
{
    /// Creates a list pushing to `sink`, with no renderer, no provider, and
    /// no placeholder.
    pub fn new(sink: Arc<dyn ClientSink>) -> Self {
        Self {
            list: VirtualList::new(sink),
            placeholder: RwLock::new(None),
        }
    }
}

impl<T> IronList<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Sets the item rendered for indices the client has not received yet,
    /// or `None` to render blank space.
    pub fn set_placeholder_item(&self, item: Option<T>) {
        *self.placeholder.write() = item;
    }

    /// The placeholder item, if one is set.
    pub fn placeholder_item(&self) -> Option<T> {
        self.placeholder.read().clone()
    }

    /// The placeholder's wire object, rendered through the current row
    /// renderer; what the UI-tree layer forwards for unfetched indices.
    pub fn placeholder_data(&self) -> Option<Map<String, Value>> {
        let item = self.placeholder.read().clone()?;
        let mut target = Map::new();
        if let Some(renderer) = self.list.renderer() {
            renderer(&item, &mut target);
        }
        Some(target)
    }

    /// Replaces the row renderer; queues a full refresh.
    pub fn set_renderer(&self, renderer: ItemRenderer<T>) {
        self.list.set_renderer(renderer);
    }

    /// Binds an in-memory item list.
    pub fn set_items(&self, items: Vec<T>) {
        self.list.set_items(items);
    }

    /// Binds an arbitrary data provider.
    pub fn set_data_provider(&self, provider: Arc<dyn DataProvider<T, ItemPredicate<T>>>) {
        self.list.set_data_provider(provider);
    }

    /// A filter/sort-capable view; errors unless the bound provider is an
    /// in-memory list.
    pub fn list_data_view(&self) -> DataResult<ListDataView<T>> {
        self.list.list_data_view()
    }

    /// A count-strategy-capable view; errors unless the bound provider is a
    /// backend callback.
    pub fn lazy_data_view(&self) -> DataResult<LazyDataView<T, ItemPredicate<T>>> {
        self.list.lazy_data_view()
    }

    /// A read-only view over whatever provider is bound.
    pub fn generic_data_view(&self) -> DataResult<GenericDataView<T, ItemPredicate<T>>> {
        self.list.generic_data_view()
    }

    /// The widget renders one continuous scroller; paging cannot be turned
    /// on.
    pub fn set_paging_enabled(&self, enabled: bool) -> DataResult<()> {
        self.list.set_paging_enabled(enabled)
    }

    /// Forwards the client's scroll window.
    pub fn request_range(&self, start: usize, length: usize) {
        self.list.request_range(start, length);
    }

    /// The component entered the live component tree.
    pub fn attach(&self) {
        self.list.attach();
    }

    /// The component left the live component tree.
    pub fn detach(&self) {
        self.list.detach();
    }

    /// End-of-turn flush; see
    /// [`DataCommunicator::flush`](crate::data::DataCommunicator::flush).
    pub fn flush(&self) {
        self.list.flush();
    }
}
