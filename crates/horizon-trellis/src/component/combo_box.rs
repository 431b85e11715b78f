//! ComboBox component integration.
//!
//! The combo box widget lets the user pick one item from a dropdown,
//! narrowing the list by typing. Its server-side filter type is therefore
//! the typed string; what reaches an in-memory provider is a
//! contains-predicate built from the item label generator by a
//! filter-converting wrapper.
//!
//! Two filter concepts meet here and must not be confused:
//!
//! - The **server-side filter** is bound into every query and changes the
//!   server-side count.
//! - The **client-side transient filter** exists when the dataset is small
//!   enough that every item is already pushed: the widget narrows the
//!   dropdown locally for one interaction cycle, the server-side count is
//!   untouched, and no count listener fires.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_trellis::component::ComboBox;
//! use horizon_trellis::data::RecordingSink;
//!
//! let sink = Arc::new(RecordingSink::new());
//! let combo: ComboBox<String> = ComboBox::new(sink);
//! combo.set_items(vec!["Apple".to_string(), "Banana".to_string()]);
//!
//! combo.set_value(Some("Banana".to_string())).unwrap();
//! assert_eq!(combo.value(), Some("Banana".to_string()));
//!
//! // Values outside the dataset are a usage error, not a silent accept.
//! assert!(combo.set_value(Some("Cherry".to_string())).is_err());
//! ```

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

use horizon_trellis_core::Signal;
use horizon_trellis_core::logging::targets;

use crate::data::{
    ClientSink, ClosureGenerator, CommunicatorConfig, ConvertingDataProvider, DataCommunicator,
    DataError, DataProvider, DataResult, GenericDataView, ItemPredicate, LazyDataView,
    ListDataProvider, ListDataView, ProviderKind,
};

/// Produces the dropdown label of an item.
pub type ItemLabelGenerator<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Server-side adapter for the combo-box browser widget.
///
/// The selected value's key is pinned in the communicator, so the client can
/// keep referencing it even after the dropdown scrolled the item out of the
/// active range.
pub struct ComboBox<T> {
    communicator: Arc<DataCommunicator<T, String>>,
    label: Arc<RwLock<ItemLabelGenerator<T>>>,
    value: Mutex<Option<(String, T)>>,
    /// Transient filter string, only meaningful in client-side mode.
    filter_text: Mutex<Option<String>>,
    /// Set when the whole dataset fits in one page and filtering happens in
    /// the browser.
    client_side_filtering: AtomicBool,
    value_changed: Arc<Signal<Option<T>>>,
}

impl<T> ComboBox<T>
where
    T: Clone + Display + Hash + Send + Sync + 'static,
{
    /// Creates a combo box pushing to `sink`, labeling items via their
    /// `Display` implementation.
    pub fn new(sink: Arc<dyn ClientSink>) -> Self {
        Self::with_label_generator(sink, Arc::new(|item: &T| item.to_string()))
    }
}

impl<T> ComboBox<T>
where
    T: Clone + Hash + Send + Sync + 'static,
{
    /// Creates a combo box with an explicit item label generator.
    pub fn with_label_generator(
        sink: Arc<dyn ClientSink>,
        label: ItemLabelGenerator<T>,
    ) -> Self {
        // The widget renders a flat dropdown; paging stays off.
        let communicator = Arc::new(DataCommunicator::with_config(
            sink,
            CommunicatorConfig::new().paging_enabled(false),
        ));
        let label = Arc::new(RwLock::new(label));

        let label_gen = label.clone();
        communicator.add_generator(Arc::new(ClosureGenerator::new(
            move |item: &T, target: &mut Map<String, Value>| {
                target.insert("label".into(), Value::String((label_gen.read())(item)));
            },
        )));

        Self {
            communicator,
            label,
            value: Mutex::new(None),
            filter_text: Mutex::new(None),
            client_side_filtering: AtomicBool::new(false),
            value_changed: Arc::new(Signal::new()),
        }
    }
}

impl<T> ComboBox<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Binds an in-memory item list.
    ///
    /// The list sits behind a filter-converting wrapper turning the typed
    /// string into a case-insensitive contains-predicate over item labels.
    /// When the whole list fits in one client page, every item is pushed and
    /// filtering switches to the client side.
    pub fn set_items(&self, items: Vec<T>) {
        let fits_one_page = items.len() <= self.communicator.page_size();
        let provider = Arc::new(ListDataProvider::new(items));

        let label = self.label.clone();
        let converting = Arc::new(ConvertingDataProvider::new(
            provider as Arc<dyn DataProvider<T, ItemPredicate<T>>>,
            Arc::new(move |text: &String| {
                let needle = text.to_lowercase();
                let label = label.clone();
                Arc::new(move |item: &T| {
                    (label.read())(item).to_lowercase().contains(&needle)
                }) as ItemPredicate<T>
            }),
        ));

        self.client_side_filtering
            .store(fits_one_page, Ordering::SeqCst);
        self.clear_value_silently();
        self.communicator.set_provider(converting, None);
    }

    /// Binds an arbitrary data provider with the typed string as its filter.
    ///
    /// Filtering is always server-side for an explicitly bound provider.
    pub fn set_data_provider(&self, provider: Arc<dyn DataProvider<T, String>>) {
        self.client_side_filtering.store(false, Ordering::SeqCst);
        self.clear_value_silently();
        self.communicator.set_provider(provider, None);
    }

    /// Handles the filter string the user typed into the widget.
    ///
    /// In client-side mode the string is recorded for the current
    /// interaction cycle only: the server-side count does not change and no
    /// count listener fires. Otherwise the string becomes the server-side
    /// filter bound into every query.
    pub fn set_filter_text(&self, text: impl Into<String>) {
        let text = text.into();
        let filter = if text.is_empty() { None } else { Some(text) };

        if self.client_side_filtering.load(Ordering::SeqCst) {
            tracing::trace!(
                target: targets::COMPONENT,
                filter = filter.as_deref().unwrap_or(""),
                "client-side filter, no server round trip"
            );
            *self.filter_text.lock() = filter;
        } else {
            self.communicator.set_filter(filter);
        }
    }

    /// The transient client-side filter string, if one is active.
    pub fn filter_text(&self) -> Option<String> {
        if self.client_side_filtering.load(Ordering::SeqCst) {
            self.filter_text.lock().clone()
        } else {
            self.communicator.filter()
        }
    }

    /// Whether filtering currently happens in the browser.
    pub fn is_client_side_filtering(&self) -> bool {
        self.client_side_filtering.load(Ordering::SeqCst)
    }

    /// Selects `value`, or clears the selection with `None`.
    ///
    /// For an in-memory dataset the value must be part of it,
    /// [`DataError::UnknownItem`] otherwise. The selected item's key is
    /// pinned until the selection changes.
    pub fn set_value(&self, value: Option<T>) -> DataResult<()> {
        if let Some(item) = &value
            && self
                .communicator
                .provider()
                .is_some_and(|provider| provider.kind() == ProviderKind::InMemory)
            && !self.communicator.contains(item)?
        {
            return Err(DataError::UnknownItem);
        }

        let identifier = self.communicator.identifier_provider();
        let changed = match (&*self.value.lock(), &value) {
            (None, None) => false,
            (Some((_, old)), Some(new)) => identifier(old) != identifier(new),
            _ => true,
        };
        if !changed {
            return Ok(());
        }

        if let Some((old_key, _)) = self.value.lock().take() {
            self.communicator.unpin_key(&old_key);
        }
        if let Some(item) = &value {
            let key = self.communicator.register_pinned(item);
            *self.value.lock() = Some((key, item.clone()));
        }
        self.value_changed.emit(value);
        Ok(())
    }

    /// The selected item, if any.
    pub fn value(&self) -> Option<T> {
        self.value.lock().as_ref().map(|(_, item)| item.clone())
    }

    /// The selected item's pinned key, if any.
    pub fn value_key(&self) -> Option<String> {
        self.value.lock().as_ref().map(|(key, _)| key.clone())
    }

    /// Fired whenever the selection changes.
    pub fn on_value_changed(&self) -> Arc<Signal<Option<T>>> {
        self.value_changed.clone()
    }

    /// Replaces the item label generator.
    ///
    /// Every cached label is invalid afterwards: all key mappings are
    /// dropped and a full refresh is queued. A pinned selection is re-keyed
    /// under the new mapping.
    pub fn set_item_label_generator(&self, label: ItemLabelGenerator<T>) {
        *self.label.write() = label;
        self.communicator.reset();
        // The wholesale clear dropped the selection's pin with everything
        // else; restore it under a fresh key.
        let mut value = self.value.lock();
        if let Some((_, item)) = value.take() {
            let new_key = self.communicator.register_pinned(&item);
            *value = Some((new_key, item));
        }
    }

    /// A filter/sort-capable view; errors unless the bound provider is an
    /// in-memory list.
    pub fn list_data_view(&self) -> DataResult<ListDataView<T, String>> {
        ListDataView::new(self.communicator.clone())
    }

    /// A count-strategy-capable view; errors unless the bound provider is a
    /// backend callback.
    pub fn lazy_data_view(&self) -> DataResult<LazyDataView<T, String>> {
        LazyDataView::new(self.communicator.clone())
    }

    /// A read-only view over whatever provider is bound.
    pub fn generic_data_view(&self) -> DataResult<GenericDataView<T, String>> {
        GenericDataView::new(self.communicator.clone())
    }

    /// The widget renders a flat dropdown; paging cannot be turned on.
    pub fn set_paging_enabled(&self, enabled: bool) -> DataResult<()> {
        if enabled {
            return Err(DataError::PagingUnsupported);
        }
        Ok(())
    }

    /// Forwards the dropdown's visible window.
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

    /// End-of-turn flush; see [`DataCommunicator::flush`].
    pub fn flush(&self) {
        self.communicator.flush();
    }

    /// Drops the selection without firing the value-changed signal; used
    /// when the dataset itself is replaced.
    fn clear_value_silently(&self) {
        if let Some((key, _)) = self.value.lock().take() {
            self.communicator.unpin_key(&key);
        }
    }
}
