//! Data view over a backend (lazy) provider.

use std::sync::Arc;

use horizon_trellis_core::ConnectionId;

use crate::data::communicator::{DataCommunicator, ItemCountChange};
use crate::data::error::{DataError, DataResult};
use crate::data::provider::{CountCallback, ProviderKind};
use crate::data::query::IdentifierProvider;
use crate::data::traits::{DataViewRead, fetch_item};

/// A [`DataViewRead`] façade over a communicator bound to a backend
/// provider, with control over how the item count is resolved.
///
/// The four count-strategy setters are mutually displacing: each discards
/// the strategy set by any sibling, delegating to the communicator's count
/// state machine.
///
/// # Construction
///
/// [`LazyDataView::new`] rejects in-memory providers with
/// [`DataError::UnsupportedProvider`]: an in-memory provider's count is
/// exact by construction and its view is
/// [`ListDataView`](super::ListDataView).
pub struct LazyDataView<T, F> {
    communicator: Arc<DataCommunicator<T, F>>,
}

impl<T, F> LazyDataView<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    /// Creates a view over the communicator's current provider.
    pub fn new(communicator: Arc<DataCommunicator<T, F>>) -> DataResult<Self> {
        let provider = communicator.provider().ok_or(DataError::NoProvider)?;
        if provider.kind() != ProviderKind::Backend {
            return Err(DataError::UnsupportedProvider {
                expected: ProviderKind::Backend,
                actual: provider.kind(),
            });
        }
        Ok(Self { communicator })
    }

    /// Sources the exact count from `callback` instead of the provider.
    pub fn set_item_count_callback(&self, callback: CountCallback<T, F>) -> DataResult<()> {
        self.communicator.set_item_count_callback(callback)
    }

    /// Starts the count as an estimate of `estimate` items.
    pub fn set_item_count_estimate(&self, estimate: usize) -> DataResult<()> {
        self.communicator.set_item_count_estimate(estimate)
    }

    /// Grows the estimated count by `increase` whenever the client reaches
    /// it.
    pub fn set_item_count_estimate_increase(&self, increase: usize) -> DataResult<()> {
        self.communicator.set_item_count_estimate_increase(increase)
    }

    /// Declares the count unknown; a provisional bound grows as the client
    /// scrolls.
    pub fn set_item_count_unknown(&self) -> DataResult<()> {
        self.communicator.set_item_count_unknown()
    }

    /// Sources the exact count from the provider's own `size`.
    pub fn set_item_count_from_provider(&self) -> DataResult<()> {
        self.communicator.set_item_count_from_provider()
    }
}

impl<T, F> DataViewRead<T> for LazyDataView<T, F>
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
