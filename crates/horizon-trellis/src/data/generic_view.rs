//! Provider-agnostic data view.

use std::sync::Arc;

use horizon_trellis_core::ConnectionId;

use crate::data::communicator::{DataCommunicator, ItemCountChange};
use crate::data::error::{DataError, DataResult};
use crate::data::query::IdentifierProvider;
use crate::data::traits::{DataViewRead, fetch_item};

/// A read-only [`DataViewRead`] façade working with any provider category.
///
/// For filter/sort mutation use [`ListDataView`](super::ListDataView); for
/// count-strategy control use [`LazyDataView`](super::LazyDataView). This
/// view exists for code that only reads and does not want to commit to a
/// provider category.
pub struct GenericDataView<T, F> {
    communicator: Arc<DataCommunicator<T, F>>,
}

impl<T, F> GenericDataView<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    /// Creates a view over the communicator's current provider.
    ///
    /// The only requirement is that a provider has been set.
    pub fn new(communicator: Arc<DataCommunicator<T, F>>) -> DataResult<Self> {
        if communicator.provider().is_none() {
            return Err(DataError::NoProvider);
        }
        Ok(Self { communicator })
    }
}

impl<T, F> DataViewRead<T> for GenericDataView<T, F>
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
