//! In-memory data provider over a process-local item list.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use horizon_trellis_core::Signal;

use crate::data::provider::{DataProvider, ProviderKind, RefreshEvent};
use crate::data::query::{ItemComparator, ItemPredicate, Query};

/// An in-memory [`DataProvider`] backed by a `Vec<T>`.
///
/// The provider carries its own persistent filter and sort comparator in
/// addition to whatever a query supplies; the two filters are AND-composed
/// and the query's comparator takes precedence over the provider's. Size is
/// always exact.
///
/// Mutation helpers (`push`, `set_items`, `remove_where`, ...) emit a
/// refresh signal so a bound communicator invalidates its pushed state
/// without the provider instance being replaced, and bump a version counter
/// used to invalidate downstream caches.
///
/// # Example
///
/// ```
/// use horizon_trellis::data::{DataProvider, ListDataProvider, Query};
///
/// let provider = ListDataProvider::new(vec!["A".to_string(), "B".to_string()]);
/// assert_eq!(provider.size(&Query::all()), 2);
///
/// provider.push("C".to_string());
/// assert_eq!(provider.size(&Query::all()), 3);
/// ```
pub struct ListDataProvider<T> {
    items: RwLock<Vec<T>>,
    filter: RwLock<Option<ItemPredicate<T>>>,
    comparator: RwLock<Option<ItemComparator<T>>>,
    version: AtomicU64,
    refresh: Signal<RefreshEvent<T>>,
}

impl<T: Clone + Send + Sync + 'static> ListDataProvider<T> {
    /// Creates a provider over the given items.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            filter: RwLock::new(None),
            comparator: RwLock::new(None),
            version: AtomicU64::new(0),
            refresh: Signal::new(),
        }
    }

    /// Creates an empty provider.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of items in the backing list, ignoring filters.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether the backing list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Read-only access to the backing list.
    pub fn items(&self) -> impl std::ops::Deref<Target = Vec<T>> + '_ {
        self.items.read()
    }

    /// Monotonic version of the backing data; bumped on every mutation and
    /// filter/sort change.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Replaces the backing list.
    pub fn set_items(&self, items: Vec<T>) {
        *self.items.write() = items;
        self.bump();
        self.refresh.emit(RefreshEvent::All);
    }

    /// Appends an item.
    pub fn push(&self, item: T) {
        self.items.write().push(item);
        self.bump();
        self.refresh.emit(RefreshEvent::All);
    }

    /// Removes every item matching the predicate; returns how many were
    /// removed.
    pub fn remove_where(&self, predicate: impl Fn(&T) -> bool) -> usize {
        let removed = {
            let mut items = self.items.write();
            let before = items.len();
            items.retain(|item| !predicate(item));
            before - items.len()
        };
        if removed > 0 {
            self.bump();
            self.refresh.emit(RefreshEvent::All);
        }
        removed
    }

    /// Sets the provider's persistent filter, replacing any prior one.
    pub fn set_filter(&self, filter: Option<ItemPredicate<T>>) {
        *self.filter.write() = filter;
        self.bump();
        self.refresh.emit(RefreshEvent::All);
    }

    /// Adds a filter, AND-composed with any existing provider filter.
    pub fn add_filter(&self, filter: ItemPredicate<T>) {
        {
            let mut current = self.filter.write();
            *current = Some(match current.take() {
                Some(existing) => {
                    Arc::new(move |item: &T| existing(item) && filter(item))
                }
                None => filter,
            });
        }
        self.bump();
        self.refresh.emit(RefreshEvent::All);
    }

    /// Drops every provider filter.
    pub fn clear_filters(&self) {
        self.set_filter(None);
    }

    /// The provider's persistent filter, if any.
    pub fn filter(&self) -> Option<ItemPredicate<T>> {
        self.filter.read().clone()
    }

    /// Sets the provider's sort comparator.
    pub fn set_sort_comparator(&self, comparator: Option<ItemComparator<T>>) {
        *self.comparator.write() = comparator;
        self.bump();
        self.refresh.emit(RefreshEvent::All);
    }

    /// Signals that one item's data changed in place.
    pub fn refresh_item(&self, item: &T) {
        self.refresh.emit(RefreshEvent::Item(item.clone()));
    }

    /// Signals that the whole dataset may have changed.
    pub fn refresh_all(&self) {
        self.bump();
        self.refresh.emit(RefreshEvent::All);
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Items passing both the provider filter and the query filter, sorted,
    /// before windowing.
    fn filtered_sorted(&self, query: &Query<T, ItemPredicate<T>>) -> Vec<T> {
        let provider_filter = self.filter.read().clone();
        let query_filter = query.filter().cloned();

        let mut matched: Vec<T> = self
            .items
            .read()
            .iter()
            .filter(|item| provider_filter.as_ref().is_none_or(|f| f(item)))
            .filter(|item| query_filter.as_ref().is_none_or(|f| f(item)))
            .cloned()
            .collect();

        // The query's comparator (set by the communicator from component
        // sort state) wins over the provider's own.
        let comparator = query
            .comparator()
            .cloned()
            .or_else(|| self.comparator.read().clone());
        if let Some(compare) = comparator {
            matched.sort_by(|a, b| compare(a, b));
        }
        matched
    }
}

impl<T: Clone + Send + Sync + 'static> DataProvider<T, ItemPredicate<T>> for ListDataProvider<T> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::InMemory
    }

    fn size(&self, query: &Query<T, ItemPredicate<T>>) -> usize {
        let provider_filter = self.filter.read().clone();
        let query_filter = query.filter().cloned();
        self.items
            .read()
            .iter()
            .filter(|item| provider_filter.as_ref().is_none_or(|f| f(item)))
            .filter(|item| query_filter.as_ref().is_none_or(|f| f(item)))
            .count()
    }

    fn fetch(&self, query: &Query<T, ItemPredicate<T>>) -> Box<dyn Iterator<Item = T> + '_> {
        let windowed: Vec<T> = self
            .filtered_sorted(query)
            .into_iter()
            .skip(query.offset())
            .take(query.limit())
            .collect();
        Box::new(windowed.into_iter())
    }

    fn refresh_signal(&self) -> Option<&Signal<RefreshEvent<T>>> {
        Some(&self.refresh)
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
