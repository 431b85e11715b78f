//! The data provider abstraction.
//!
//! A [`DataProvider`] answers two questions for a collection component:
//! which items occupy a given index window (`fetch`) and how many items
//! exist (`size`), both under a [`Query`]'s filter and sort state. Providers
//! come in two categories:
//!
//! - [`ProviderKind::InMemory`]: backed by a collection held in process; the
//!   exact size is always known cheaply.
//!   See [`ListDataProvider`](super::ListDataProvider).
//! - [`ProviderKind::Backend`]: backed by a user callback (database page
//!   query, REST call, ...); the size may be unknown or expensive.
//!   See [`CallbackDataProvider`].
//!
//! Providers are stateless with respect to a single query: `fetch` returns a
//! finite, restartable sequence and every call re-executes; there is no
//! shared cursor. [`ConvertingDataProvider`] composes providers by
//! converting an outer filter type to the inner provider's filter type
//! per query.

use std::any::Any;
use std::sync::Arc;

use horizon_trellis_core::Signal;

use crate::data::query::Query;

/// The category a data provider declares itself as.
///
/// Data views and the communicator use the category to reject operations
/// that make no sense for the provider (e.g. a count estimate on an
/// in-memory provider) at the call site instead of degrading silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Items live in a process-local collection; size is exact and cheap.
    InMemory,
    /// Items come from a user callback; size may be unknown or expensive.
    Backend,
}

/// A change notification emitted by a provider whose backing data mutated.
///
/// The communicator subscribes to these to invalidate its pushed state
/// without the provider instance being replaced.
#[derive(Clone)]
pub enum RefreshEvent<T> {
    /// The whole dataset may have changed.
    All,
    /// One item's data changed; identity is unchanged.
    Item(T),
}

/// Polymorphic source of items for collection components.
///
/// # Contract
///
/// - `size` returns the authoritative count honoring the query's filter and
///   ignoring its offset/limit.
/// - `fetch` honors offset, limit, filter, and sort. The window may reach
///   past the end of the data; the provider returns fewer items in that
///   case, never an error.
/// - Both calls are synchronous and may block the processing turn; keeping
///   backend calls fast is the callback's responsibility.
pub trait DataProvider<T, F>: Send + Sync {
    /// The category this provider declares.
    fn kind(&self) -> ProviderKind;

    /// Authoritative item count for the query's filter.
    fn size(&self, query: &Query<T, F>) -> usize;

    /// The items in the query's window, in query order.
    fn fetch(&self, query: &Query<T, F>) -> Box<dyn Iterator<Item = T> + '_>;

    /// Whether `size` can be answered.
    ///
    /// Defaults to `true`; a callback provider created without a count
    /// callback returns `false` so the communicator can fail fast instead
    /// of reaching an unanswerable `size` call.
    fn supports_size_query(&self) -> bool {
        true
    }

    /// Change signal for the backing data, if the provider has one.
    ///
    /// Backend providers have no way to observe their source and return
    /// `None`.
    fn refresh_signal(&self) -> Option<&Signal<RefreshEvent<T>>> {
        None
    }

    /// Type-erased handle for the data-view supported-provider check.
    ///
    /// Wrappers that merely adapt another provider (filter conversion)
    /// forward to the wrapped provider, since the wrapped provider is where
    /// the data actually lives.
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Fetch callback type for [`CallbackDataProvider`].
pub type FetchCallback<T, F> = Arc<dyn Fn(&Query<T, F>) -> Vec<T> + Send + Sync>;

/// Count callback type for [`CallbackDataProvider`] and the communicator's
/// externally-supplied count strategy.
pub type CountCallback<T, F> = Arc<dyn Fn(&Query<T, F>) -> usize + Send + Sync>;

/// A lazy provider delegating to user callbacks.
///
/// # Example
///
/// ```
/// use horizon_trellis::data::{CallbackDataProvider, DataProvider, Query};
/// use std::sync::Arc;
///
/// let provider = CallbackDataProvider::<String, ()>::new(
///     Arc::new(|query| {
///         (query.offset()..query.offset() + query.limit())
///             .take_while(|i| *i < 1000)
///             .map(|i| format!("Item {i}"))
///             .collect()
///     }),
///     Arc::new(|_| 1000),
/// );
///
/// assert_eq!(provider.size(&Query::all()), 1000);
/// ```
pub struct CallbackDataProvider<T, F> {
    fetch: FetchCallback<T, F>,
    count: Option<CountCallback<T, F>>,
}

impl<T, F> CallbackDataProvider<T, F> {
    /// Creates a provider from fetch and count callbacks.
    pub fn new(fetch: FetchCallback<T, F>, count: CountCallback<T, F>) -> Self {
        Self {
            fetch,
            count: Some(count),
        }
    }

    /// Creates a provider from a fetch callback only.
    ///
    /// The resulting provider cannot answer `size`; the communicator keeps
    /// an unknown or estimated count strategy for it.
    pub fn from_fetch(fetch: FetchCallback<T, F>) -> Self {
        Self { fetch, count: None }
    }
}

impl<T, F> DataProvider<T, F> for CallbackDataProvider<T, F>
where
    T: Send + Sync + 'static,
    F: Send + Sync + 'static,
{
    fn kind(&self) -> ProviderKind {
        ProviderKind::Backend
    }

    /// # Panics
    ///
    /// Panics if the provider was created without a count callback. The
    /// communicator never routes a `size` call here in that configuration
    /// (it checks [`supports_size_query`](DataProvider::supports_size_query)
    /// first), so reaching the panic means the caller bypassed that check.
    fn size(&self, query: &Query<T, F>) -> usize {
        match &self.count {
            Some(count) => count(query),
            None => panic!("count callback not set; provide one or use an item count estimate"),
        }
    }

    fn fetch(&self, query: &Query<T, F>) -> Box<dyn Iterator<Item = T> + '_> {
        // Cap at the requested limit even if the callback returned more.
        Box::new((self.fetch)(query).into_iter().take(query.limit()))
    }

    fn supports_size_query(&self) -> bool {
        self.count.is_some()
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Filter conversion function for [`ConvertingDataProvider`].
pub type FilterConverter<F, F2> = Arc<dyn Fn(&F) -> F2 + Send + Sync>;

/// Adapts a provider with filter type `F2` to present filter type `F`.
///
/// The converter runs once per query and must be deterministic: the same
/// outer filter always yields the same inner filter, so the count and fetch
/// halves of one request observe identical inner filters.
///
/// Everything else (category, size, refresh notifications, the data-view
/// type check) is forwarded to the wrapped provider.
pub struct ConvertingDataProvider<T, F, F2> {
    inner: Arc<dyn DataProvider<T, F2>>,
    convert: FilterConverter<F, F2>,
}

impl<T, F, F2> ConvertingDataProvider<T, F, F2> {
    /// Wraps `inner`, converting each query's outer filter with `convert`.
    pub fn new(inner: Arc<dyn DataProvider<T, F2>>, convert: FilterConverter<F, F2>) -> Self {
        Self { inner, convert }
    }
}

impl<T, F, F2> DataProvider<T, F> for ConvertingDataProvider<T, F, F2>
where
    T: Send + Sync + 'static,
    F: Send + Sync + 'static,
    F2: Send + Sync + 'static,
{
    fn kind(&self) -> ProviderKind {
        self.inner.kind()
    }

    fn size(&self, query: &Query<T, F>) -> usize {
        self.inner.size(&query.map_filter(|f| (self.convert)(f)))
    }

    fn fetch(&self, query: &Query<T, F>) -> Box<dyn Iterator<Item = T> + '_> {
        let inner_query = query.map_filter(|f| (self.convert)(f));
        // Materialize so the iterator does not borrow the converted query.
        let items: Vec<T> = self.inner.fetch(&inner_query).collect();
        Box::new(items.into_iter())
    }

    fn supports_size_query(&self) -> bool {
        self.inner.supports_size_query()
    }

    fn refresh_signal(&self) -> Option<&Signal<RefreshEvent<T>>> {
        self.inner.refresh_signal()
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self.inner.clone().as_any_arc()
    }
}
