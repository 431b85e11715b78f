//! VirtualList component integration.
//!
//! A virtual list mirrors a browser widget that renders a flat scroller of
//! rows, fetching only the window the user has scrolled to. The server side
//! here is a thin adapter: it owns a [`DataCommunicator`], forwards the
//! client's scroll windows to it, and renders each pushed row through a
//! caller-supplied [`ItemRenderer`].
//!
//! The widget renders one continuous scroller, so paging is structurally
//! unsupported: [`VirtualList::set_paging_enabled`] fails fast instead of
//! silently accepting a setting the client could never honor.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::Value;
//! use horizon_trellis::component::VirtualList;
//! use horizon_trellis::data::RecordingSink;
//!
//! let sink = Arc::new(RecordingSink::new());
//! let list = VirtualList::new(sink.clone());
//! list.set_renderer(Arc::new(|item: &String, target| {
//!     target.insert("label".into(), Value::String(item.clone()));
//! }));
//! list.set_items(vec!["Apple".to_string(), "Banana".to_string()]);
//!
//! list.attach();
//! list.request_range(0, 10);
//! list.flush();
//! assert_eq!(sink.updates().len(), 1);
//! ```

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::data::{
    ClientSink, ClosureGenerator, CommunicatorConfig, DataCommunicator, DataError, DataProvider,
    DataResult, GenericDataView, ItemPredicate, LazyDataView, ListDataProvider, ListDataView,
};

/// Renders one row's wire properties.
pub type ItemRenderer<T> = Arc<dyn Fn(&T, &mut Map<String, Value>) + Send + Sync>;

/// Server-side adapter for the virtual-list browser widget.
pub struct VirtualList<T> {
    communicator: Arc<DataCommunicator<T, ItemPredicate<T>>>,
    renderer: Arc<RwLock<Option<ItemRenderer<T>>>>,
}

impl<T> VirtualList<T>
where
    T: Clone + Hash + Send + Sync + 'static,
{
    /// Creates a list pushing to `sink`, with no renderer and no provider.
    pub fn new(sink: Arc<dyn ClientSink>) -> Self {
        let communicator = Arc::new(DataCommunicator::with_config(
            sink,
            CommunicatorConfig::new().paging_enabled(false),
        ));
        let renderer: Arc<RwLock<Option<ItemRenderer<T>>>> = Arc::new(RwLock::new(None));

        let render = renderer.clone();
        communicator.add_generator(Arc::new(ClosureGenerator::new(
            move |item: &T, target: &mut Map<String, Value>| {
                if let Some(renderer) = render.read().as_ref() {
                    renderer(item, target);
                }
            },
        )));

        Self {
            communicator,
            renderer,
        }
    }
}

impl<T> VirtualList<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Replaces the row renderer.
    ///
    /// Every previously pushed row was rendered with the old renderer, so
    /// all key mappings are dropped and a full refresh is queued.
    pub fn set_renderer(&self, renderer: ItemRenderer<T>) {
        *self.renderer.write() = Some(renderer);
        self.communicator.reset();
    }

    /// Binds an in-memory item list.
    pub fn set_items(&self, items: Vec<T>) {
        self.communicator
            .set_provider(Arc::new(ListDataProvider::new(items)), None);
    }

    /// Binds an arbitrary data provider.
    pub fn set_data_provider(&self, provider: Arc<dyn DataProvider<T, ItemPredicate<T>>>) {
        self.communicator.set_provider(provider, None);
    }

    /// A filter/sort-capable view; errors unless the bound provider is an
    /// in-memory list.
    pub fn list_data_view(&self) -> DataResult<ListDataView<T>> {
        ListDataView::new(self.communicator.clone())
    }

    /// A count-strategy-capable view; errors unless the bound provider is a
    /// backend callback.
    pub fn lazy_data_view(&self) -> DataResult<LazyDataView<T, ItemPredicate<T>>> {
        LazyDataView::new(self.communicator.clone())
    }

    /// A read-only view over whatever provider is bound.
    pub fn generic_data_view(&self) -> DataResult<GenericDataView<T, ItemPredicate<T>>> {
        GenericDataView::new(self.communicator.clone())
    }

    /// The widget renders one continuous scroller; paging cannot be turned
    /// on.
    pub fn set_paging_enabled(&self, enabled: bool) -> DataResult<()> {
        if enabled {
            return Err(DataError::PagingUnsupported);
        }
        Ok(())
    }

    /// Forwards the client's scroll window.
    pub fn request_range(&self, start: usize, length: usize) {
        self.communicator.request_range(start, length);
    }

    /// The component entered the live component tree.
    pub fn attach(&self) {
        self.communicator.attach();
    }

    /// The component left the live component tree.
    pub fn detach(&self) {
        self.communicator.detach();
    }

    /// End-of-turn flush; see
    /// [`DataCommunicator::flush`].
    pub fn flush(&self) {
        self.communicator.flush();
    }

    pub(crate) fn renderer(&self) -> Option<ItemRenderer<T>> {
        self.renderer.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CallbackDataProvider, Query, RecordingSink};
    use parking_lot::Mutex;

    #[test]
    fn test_enabling_paging_fails_fast() {
        let list: VirtualList<String> = VirtualList::new(Arc::new(RecordingSink::new()));
        assert_eq!(
            list.set_paging_enabled(true),
            Err(DataError::PagingUnsupported)
        );
        assert_eq!(list.set_paging_enabled(false), Ok(()));
    }

    #[test]
    fn test_rows_render_through_the_renderer() {
        let sink = Arc::new(RecordingSink::new());
        let list = VirtualList::new(sink.clone());
        list.set_renderer(Arc::new(|item: &String, target| {
            target.insert("label".into(), Value::String(item.to_uppercase()));
        }));
        list.set_items(vec!["apple".to_string()]);

        list.attach();
        list.request_range(0, 10);
        list.flush();

        let batch = sink.updates().pop().unwrap();
        assert_eq!(batch.items[0].data["label"], "APPLE");
    }

    #[test]
    fn test_scroll_window_fetches_exactly_once() {
        let sink = Arc::new(RecordingSink::new());
        let list = VirtualList::new(sink.clone());
        let fetches = Arc::new(Mutex::new(Vec::new()));
        let fetches_cb = fetches.clone();
        list.set_data_provider(Arc::new(CallbackDataProvider::new(
            Arc::new(move |query: &Query<String, ItemPredicate<String>>| {
                fetches_cb.lock().push((query.offset(), query.limit()));
                (query.offset()..query.offset().saturating_add(query.limit()))
                    .take_while(|i| *i < 1000)
                    .map(|i| format!("Item {i}"))
                    .collect()
            }),
            Arc::new(|_| 1000),
        )));
        list.lazy_data_view()
            .unwrap()
            .set_item_count_from_provider()
            .unwrap();

        list.attach();
        list.request_range(500, 100);
        list.flush();

        assert_eq!(*fetches.lock(), vec![(500, 100)]);
        assert_eq!(sink.last_count().unwrap().count, 1000);
    }

    #[test]
    fn test_replacing_renderer_resends_all_rows() {
        let sink = Arc::new(RecordingSink::new());
        let list = VirtualList::new(sink.clone());
        list.set_items(vec!["a".to_string(), "b".to_string()]);
        list.attach();
        list.request_range(0, 10);
        list.flush();
        assert_eq!(sink.updates().len(), 1);

        list.set_renderer(Arc::new(|item: &String, target| {
            target.insert("label".into(), Value::String(item.clone()));
        }));
        list.flush();

        let updates = sink.updates();
        assert_eq!(updates.len(), 2);
        assert!(updates[1].clear);
        assert_eq!(updates[1].items.len(), 2);
    }
}
