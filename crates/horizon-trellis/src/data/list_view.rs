//! Data view over an in-memory list provider.

use std::sync::Arc;

use horizon_trellis_core::ConnectionId;

use crate::data::communicator::{DataCommunicator, ItemCountChange};
use crate::data::error::{DataError, DataResult};
use crate::data::list_provider::ListDataProvider;
use crate::data::provider::ProviderKind;
use crate::data::query::{
    IdentifierProvider, ItemComparator, ItemPredicate,
};
use crate::data::traits::{DataViewRead, FilterableView, SortableView, fetch_item};

/// A [`DataViewRead`] + [`FilterableView`] + [`SortableView`] façade over a
/// communicator bound to a [`ListDataProvider`].
///
/// Filter and sort mutations go to the provider's persistent state, so both
/// the communicator's pushes and this view's reads observe them; the
/// provider's refresh signal keeps the communicator's pushed state in sync.
///
/// The filter type parameter `F` is the owning component's server-side
/// filter type: a plain predicate for most components, the typed string for
/// a combo box whose in-memory provider sits behind a filter-converting
/// wrapper.
///
/// # Construction
///
/// [`ListDataView::new`] validates that the communicator's current provider
/// actually is a `ListDataProvider<T>` (looking through converting wrappers)
/// and rejects anything else with [`DataError::UnsupportedProvider`].
pub struct ListDataView<T, F = ItemPredicate<T>> {
    communicator: Arc<DataCommunicator<T, F>>,
    provider: Arc<ListDataProvider<T>>,
}

impl<T, F> ListDataView<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    /// Creates a view over the communicator's current provider.
    pub fn new(communicator: Arc<DataCommunicator<T, F>>) -> DataResult<Self> {
        let provider = communicator.provider().ok_or(DataError::NoProvider)?;
        let actual = provider.kind();
        let provider = provider
            .as_any_arc()
            .downcast::<ListDataProvider<T>>()
            .map_err(|_| DataError::UnsupportedProvider {
                expected: ProviderKind::InMemory,
                actual,
            })?;
        Ok(Self {
            communicator,
            provider,
        })
    }

    /// The backing in-memory provider.
    pub fn provider(&self) -> &Arc<ListDataProvider<T>> {
        &self.provider
    }

    /// Whether an identity-equal item is in the filtered item set.
    pub fn contains(&self, item: &T) -> DataResult<bool> {
        self.communicator.contains(item)
    }

    /// Appends an item to the backing list.
    pub fn add_item(&self, item: T) {
        self.provider.push(item);
    }

    /// Removes every identity-equal occurrence of `item` from the backing
    /// list; returns how many were removed.
    pub fn remove_item(&self, item: &T) -> usize {
        let identifier = self.communicator.identifier_provider();
        let id = identifier(item);
        self.provider
            .remove_where(|existing| identifier(existing) == id)
    }
}

impl<T, F> DataViewRead<T> for ListDataView<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    fn items(&self) -> DataResult<Box<dyn Iterator<Item = T>>> {
        Ok(Box::new(
            self.communicator
                .fetch_from_provider(0, usize::MAX)?
                .into_iter(),
        ))
    }

    fn item_count(&self) -> DataResult<usize> {
        self.communicator.resolve_count()
    }

    fn item(&self, index: usize) -> DataResult<T> {
        fetch_item(&self.communicator, index)
    }

    fn set_identifier_provider(&self, identifier: IdentifierProvider<T>) {
        self.communicator.set_identifier_provider(identifier);
    }

    fn on_item_count_changed<S>(&self, slot: S) -> ConnectionId
    where
        S: Fn(&ItemCountChange) + Send + Sync + 'static,
    {
        self.communicator.item_count_changed().connect(slot)
    }

    fn refresh_item(&self, item: &T) {
        self.communicator.refresh_item(item);
    }

    fn refresh_all(&self) {
        self.communicator.refresh_all();
    }
}

impl<T, F> FilterableView<T> for ListDataView<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    fn set_filter(&self, filter: Option<ItemPredicate<T>>) {
        self.provider.set_filter(filter);
    }

    fn add_filter(&self, filter: ItemPredicate<T>) {
        self.provider.add_filter(filter);
    }

    fn remove_filters(&self) {
        self.provider.clear_filters();
    }
}

impl<T, F> SortableView<T> for ListDataView<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    fn set_sort_comparator(&self, comparator: Option<ItemComparator<T>>) {
        self.provider.set_sort_comparator(comparator);
    }
}
