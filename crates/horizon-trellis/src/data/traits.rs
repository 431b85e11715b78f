//! Capability traits for the data view family.
//!
//! A data view is a typed read/filter/sort façade over the provider bound to
//! one component. Instead of a deep view class hierarchy, capabilities are
//! split into small traits composed per concrete view:
//!
//! - [`DataViewRead`]: reading items and counts; implemented by every view.
//! - [`FilterableView`] and [`SortableView`]: mutating the persistent filter
//!   and sort of an in-memory provider; implemented only by
//!   [`ListDataView`](super::ListDataView), because a backend provider's
//!   filter lives in its callback.
//!
//! Which capabilities a view has is decided once, at construction, by the
//! provider's declared category; constructors reject mismatches.

use horizon_trellis_core::ConnectionId;

use crate::data::communicator::{DataCommunicator, ItemCountChange};
use crate::data::error::{DataError, DataResult};
use crate::data::query::{IdentifierProvider, ItemComparator, ItemPredicate};

/// Read access shared by every data view.
///
/// All reads go straight to the provider with the component's current
/// server-side filter and sort. The communicator's pushed window is never
/// consulted, so results reflect the full filtered set regardless of what
/// the client currently renders.
pub trait DataViewRead<T> {
    /// Every item under the current filter and sort, in provider order.
    ///
    /// Materialized by one direct provider fetch per call.
    fn items(&self) -> DataResult<Box<dyn Iterator<Item = T>>>;

    /// The item count under the current filter.
    ///
    /// Defined counts are queried from the provider or count callback,
    /// uncached; unknown/estimated counts report the current working count.
    fn item_count(&self) -> DataResult<usize>;

    /// The item at `index`, from a direct, uncached fetch of
    /// `[index, index + 1)`.
    ///
    /// Errors with [`DataError::OutOfRange`] when an authoritative count
    /// exists and `index` reaches it, and with [`DataError::PastEnd`] when a
    /// lazily sized set proves empty at `index`. An index merely beyond the
    /// communicator's pushed window is not an error.
    fn item(&self, index: usize) -> DataResult<T>;

    /// Replaces how item identity is computed.
    ///
    /// All existing key mappings are invalidated, since identity semantics
    /// changed with the provider.
    fn set_identifier_provider(&self, identifier: IdentifierProvider<T>);

    /// Connects a slot fired when the server-side item count (or its
    /// exactness) changes.
    ///
    /// Client-side-only filtering never fires this: it does not change the
    /// server-side count.
    fn on_item_count_changed<S>(&self, slot: S) -> ConnectionId
    where
        S: Fn(&ItemCountChange) + Send + Sync + 'static;

    /// Marks one item's pushed data stale for regeneration.
    fn refresh_item(&self, item: &T);

    /// Invalidates all pushed state; the next flush refetches and resends.
    fn refresh_all(&self);
}

/// Persistent-filter mutation, available on in-memory views only.
pub trait FilterableView<T> {
    /// Replaces every filter with `filter`.
    fn set_filter(&self, filter: Option<ItemPredicate<T>>);

    /// Adds a filter, AND-composed with any filters already present.
    fn add_filter(&self, filter: ItemPredicate<T>);

    /// Drops every filter.
    fn remove_filters(&self);
}

/// Sort mutation, available on in-memory views only.
pub trait SortableView<T> {
    /// Sets the comparator items are sorted with, or `None` for provider
    /// order.
    fn set_sort_comparator(&self, comparator: Option<ItemComparator<T>>);

    /// Restores provider order.
    fn remove_sorting(&self) {
        self.set_sort_comparator(None);
    }
}

/// Shared `item(index)` implementation: direct fetch plus the bounds
/// contract of [`DataViewRead::item`].
pub(crate) fn fetch_item<T, F>(
    communicator: &DataCommunicator<T, F>,
    index: usize,
) -> DataResult<T>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    if let Some(count) = communicator.authoritative_count()?
        && index >= count
    {
        return Err(DataError::OutOfRange { index, count });
    }
    let mut items = communicator.fetch_from_provider(index, 1)?;
    items.pop().ok_or(DataError::PastEnd { index })
}
