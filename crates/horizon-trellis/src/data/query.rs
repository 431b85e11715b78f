//! Immutable query descriptors passed to data providers.
//!
//! A [`Query`] captures everything a [`DataProvider`](super::DataProvider)
//! needs to answer one fetch or count request: the index window, the sort
//! state, the filter, and (for hierarchical variants) the parent key. Queries
//! are value objects; the communicator builds a fresh one per request and
//! providers never retain them.

use std::cmp::Ordering;
use std::sync::Arc;

/// An opaque item identity string, produced by an [`IdentifierProvider`].
pub type ItemId = String;

/// Extracts the stable identity of an item.
///
/// Identity must not change for the life of a client key mapped to the item;
/// items that are mutable in identity-relevant fields need a caller-supplied
/// extractor over an immutable id field.
pub type IdentifierProvider<T> = Arc<dyn Fn(&T) -> ItemId + Send + Sync>;

/// A predicate over items, used as the in-memory filter type.
pub type ItemPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A total ordering over items, used for in-memory sorting.
pub type ItemComparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Sort direction for a [`SortOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One sort criterion: a backend property name plus a direction.
///
/// Sort orders are what a backend provider sees; in-memory providers sort
/// with an [`ItemComparator`] instead, and the communicator carries both
/// flavors in the query.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SortOrder {
    property: String,
    direction: SortDirection,
}

impl SortOrder {
    /// Creates a sort order for the given backend property.
    pub fn new(property: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    /// Ascending sort on the given property.
    pub fn ascending(property: impl Into<String>) -> Self {
        Self::new(property, SortDirection::Ascending)
    }

    /// Descending sort on the given property.
    pub fn descending(property: impl Into<String>) -> Self {
        Self::new(property, SortDirection::Descending)
    }

    /// The backend property this order sorts by.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// The sort direction.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// An immutable request descriptor handed to a data provider.
///
/// `offset`/`limit` select the index window. Providers must tolerate windows
/// reaching past the end of the data and return fewer items; `offset +
/// limit` is never guaranteed to be bounded by the item count.
///
/// # Type Parameters
///
/// - `T`: the item type (needed for the in-memory comparator).
/// - `F`: the filter type. In-memory providers use [`ItemPredicate`];
///   components with typed client filters use their own type (e.g. the
///   string a user typed into a combo box).
pub struct Query<T, F> {
    offset: usize,
    limit: usize,
    sort_orders: Vec<SortOrder>,
    comparator: Option<ItemComparator<T>>,
    filter: Option<F>,
    parent_key: Option<String>,
}

impl<T, F: Clone> Clone for Query<T, F> {
    fn clone(&self) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit,
            sort_orders: self.sort_orders.clone(),
            comparator: self.comparator.clone(),
            filter: self.filter.clone(),
            parent_key: self.parent_key.clone(),
        }
    }
}

impl<T, F> Query<T, F> {
    /// Creates a query for the index window `[offset, offset + limit)` with
    /// no sort, filter, or parent.
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit,
            sort_orders: Vec::new(),
            comparator: None,
            filter: None,
            parent_key: None,
        }
    }

    /// Creates a query covering the entire item set.
    pub fn all() -> Self {
        Self::new(0, usize::MAX)
    }

    /// Sets the backend sort orders.
    pub fn with_sort_orders(mut self, sort_orders: Vec<SortOrder>) -> Self {
        self.sort_orders = sort_orders;
        self
    }

    /// Sets the in-memory sort comparator.
    pub fn with_comparator(mut self, comparator: Option<ItemComparator<T>>) -> Self {
        self.comparator = comparator;
        self
    }

    /// Sets the filter.
    pub fn with_filter(mut self, filter: Option<F>) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the parent key (hierarchical providers only).
    pub fn with_parent_key(mut self, parent_key: Option<String>) -> Self {
        self.parent_key = parent_key;
        self
    }

    /// First index of the requested window.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Maximum number of items to return.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Backend sort orders, outermost first.
    pub fn sort_orders(&self) -> &[SortOrder] {
        &self.sort_orders
    }

    /// In-memory sort comparator, if any.
    pub fn comparator(&self) -> Option<&ItemComparator<T>> {
        self.comparator.as_ref()
    }

    /// The filter, if any.
    pub fn filter(&self) -> Option<&F> {
        self.filter.as_ref()
    }

    /// The parent key, if any.
    pub fn parent_key(&self) -> Option<&str> {
        self.parent_key.as_deref()
    }

    /// Rebuilds this query with the filter mapped to another type.
    ///
    /// Used by filter-converting provider wrappers; everything except the
    /// filter is carried over unchanged.
    pub fn map_filter<F2>(&self, convert: impl FnOnce(&F) -> F2) -> Query<T, F2> {
        Query {
            offset: self.offset,
            limit: self.limit,
            sort_orders: self.sort_orders.clone(),
            comparator: self.comparator.clone(),
            filter: self.filter.as_ref().map(convert),
            parent_key: self.parent_key.clone(),
        }
    }
}
