//! The central engine binding one collection component to its provider.
//!
//! A [`DataCommunicator`] owns, per component instance:
//!
//! - the active [`DataProvider`] and the server-side filter/sort state,
//! - the [`KeyMapper`] assigning client keys to backend items,
//! - the count strategy (defined, estimated, or unknown),
//! - the active range the client currently renders,
//! - the dirty state accumulated during the current processing turn.
//!
//! Mutations (`request_range`, `refresh_item`, `refresh_all`, filter/sort
//! changes, count-strategy changes) only mark state dirty. The surrounding
//! UI-tree layer calls [`flush`](DataCommunicator::flush) once at the end of
//! the processing turn, which performs at most one fetch, diffs the result
//! against what the client already has, and delivers at most one item batch
//! plus at most one count update through the [`ClientSink`]. Rapid
//! successive mutations therefore coalesce instead of producing one push
//! each.
//!
//! # Access model
//!
//! All calls are expected to happen on the owning UI's processing turn; the
//! internal lock makes stray cross-thread access memory safe but does not
//! arbitrate ordering. Fetch and count callbacks run with no internal lock
//! held, so a callback may re-enter the communicator (such a re-entrant
//! `refresh_all` supersedes the in-flight fetch, whose results are then
//! discarded by generation check). Identifier providers and data generators,
//! by contrast, run under the internal lock and must not call back in.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::ops::Range;
use std::sync::Arc;

use parking_lot::Mutex;

use horizon_trellis_core::logging::targets;
use horizon_trellis_core::{ConnectionId, Signal};

use crate::data::error::{DataError, DataResult};
use crate::data::generator::{DataGenerator, generate_item_data};
use crate::data::key_mapper::{KeyMapper, default_identifier_provider};
use crate::data::provider::{
    CountCallback, DataProvider, ProviderKind, RefreshEvent,
};
use crate::data::query::{IdentifierProvider, ItemComparator, Query, SortOrder};
use crate::data::sink::{ClientSink, CountMode, CountUpdate, ItemChange, UpdateBatch};

/// Construction-time settings for a [`DataCommunicator`].
#[derive(Clone, Debug)]
pub struct CommunicatorConfig {
    /// Number of items per client page. Also the unit the unknown-count
    /// policy grows by (four pages at a time).
    pub page_size: usize,
    /// Whether the defined-count size cache is active.
    pub paging_enabled: bool,
}

impl Default for CommunicatorConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            paging_enabled: true,
        }
    }
}

impl CommunicatorConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client page size.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Enables or disables paging.
    pub fn paging_enabled(mut self, enabled: bool) -> Self {
        self.paging_enabled = enabled;
        self
    }
}

/// The communicator's count-resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeState {
    /// No provider has been set.
    NoProvider,
    /// The count is unknown; a provisional bound is grown as the client
    /// scrolls.
    Unknown,
    /// The count is a caller-supplied estimate, grown by the configured
    /// increase when the client reaches it.
    Estimated,
    /// The count is authoritative, from the provider or a count callback.
    Defined,
}

/// Payload of the item-count-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemCountChange {
    /// The new count.
    pub count: usize,
    /// Whether the count is exact (as opposed to estimated/provisional).
    pub exact: bool,
}

/// Exactly one count strategy is active at a time; setting one discards the
/// state of the others entirely.
enum CountStrategy<T, F> {
    FromProvider,
    FromCallback(CountCallback<T, F>),
    Estimated { estimate: usize, increase: usize },
    Unknown,
}

struct State<T, F> {
    provider: Option<Arc<dyn DataProvider<T, F>>>,
    provider_connection: Option<ConnectionId>,
    key_mapper: KeyMapper<T>,
    generators: Vec<Arc<dyn DataGenerator<T>>>,
    attached: bool,

    filter: Option<F>,
    sort_orders: Vec<SortOrder>,
    comparator: Option<ItemComparator<T>>,

    strategy: CountStrategy<T, F>,
    /// Working count for the unknown/estimated strategies.
    assumed_size: usize,
    /// Whether the exact end was discovered by a short fetch.
    size_confirmed: bool,
    /// Defined-count cache, live only while paging is enabled.
    cached_size: Option<usize>,
    paging_enabled: bool,

    requested_range: Range<usize>,
    pushed_start: usize,
    pushed_keys: Vec<String>,
    /// Pin counts per key; pinned entries survive active-range eviction.
    pinned: HashMap<String, usize>,

    stale_keys: HashSet<String>,
    needs_full_push: bool,
    range_dirty: bool,
    size_dirty: bool,
    /// Bumped by every superseding mutation; stale fetches are discarded.
    generation: u64,
    last_count_pushed: Option<CountUpdate>,
}

impl<T, F> State<T, F> {
    fn is_dirty(&self) -> bool {
        self.needs_full_push || self.range_dirty || self.size_dirty || !self.stale_keys.is_empty()
    }

    fn clear_flags(&mut self) {
        self.needs_full_push = false;
        self.range_dirty = false;
        self.size_dirty = false;
        self.stale_keys.clear();
    }
}

/// Instructions for the lock-free half of a flush.
enum CountSource<T, F> {
    Value(usize),
    Provider(Arc<dyn DataProvider<T, F>>),
    Callback(CountCallback<T, F>),
}

/// The central data-binding engine for one collection component.
///
/// See the [module docs](self) for the turn/flush model. Type parameters:
/// `T` is the item type, `F` the component's server-side filter type.
pub struct DataCommunicator<T, F> {
    state: Mutex<State<T, F>>,
    sink: Arc<dyn ClientSink>,
    page_size: usize,
    item_count_changed: Arc<Signal<ItemCountChange>>,
}

impl<T, F> DataCommunicator<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    /// Creates a communicator with default configuration and `Hash`-derived
    /// item identity.
    pub fn new(sink: Arc<dyn ClientSink>) -> Self
    where
        T: Hash,
    {
        Self::with_config(sink, CommunicatorConfig::default())
    }

    /// Creates a communicator with the given configuration.
    pub fn with_config(sink: Arc<dyn ClientSink>, config: CommunicatorConfig) -> Self
    where
        T: Hash,
    {
        Self::with_identifier_provider(sink, config, default_identifier_provider())
    }

    /// Creates a communicator with an explicit item identifier provider.
    pub fn with_identifier_provider(
        sink: Arc<dyn ClientSink>,
        config: CommunicatorConfig,
        identifier: IdentifierProvider<T>,
    ) -> Self {
        let initial = config.page_size.saturating_mul(4).max(1);
        Self {
            state: Mutex::new(State {
                provider: None,
                provider_connection: None,
                key_mapper: KeyMapper::with_identifier_provider(identifier),
                generators: Vec::new(),
                attached: false,
                filter: None,
                sort_orders: Vec::new(),
                comparator: None,
                strategy: CountStrategy::Unknown,
                assumed_size: initial,
                size_confirmed: false,
                cached_size: None,
                paging_enabled: config.paging_enabled,
                requested_range: 0..0,
                pushed_start: 0,
                pushed_keys: Vec::new(),
                pinned: HashMap::new(),
                stale_keys: HashSet::new(),
                needs_full_push: false,
                range_dirty: false,
                size_dirty: false,
                generation: 0,
                last_count_pushed: None,
            }),
            sink,
            page_size: config.page_size,
            item_count_changed: Arc::new(Signal::new()),
        }
    }

    /// The client page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Initial provisional count (and growth step) for the unknown-count
    /// policy: four pages.
    fn initial_assumed(&self) -> usize {
        self.page_size.saturating_mul(4).max(1)
    }

    // -------------------------------------------------------------------------
    // Provider and query state
    // -------------------------------------------------------------------------

    /// Replaces the active data provider.
    ///
    /// Discards all key mappings, pins, and count state. The count strategy
    /// resets by provider category: in-memory providers get a defined count,
    /// backend providers start with an unknown count until the caller sets a
    /// count callback or estimate. If the provider exposes a refresh signal,
    /// the communicator subscribes to it for the lifetime of the binding.
    pub fn set_provider(
        self: &Arc<Self>,
        provider: Arc<dyn DataProvider<T, F>>,
        filter: Option<F>,
    ) {
        let mut s = self.state.lock();
        if let Some(conn) = s.provider_connection.take()
            && let Some(old) = &s.provider
            && let Some(signal) = old.refresh_signal()
        {
            signal.disconnect(conn);
        }

        s.key_mapper.remove_all();
        s.pinned.clear();
        s.stale_keys.clear();
        s.filter = filter;
        s.strategy = match provider.kind() {
            ProviderKind::InMemory => CountStrategy::FromProvider,
            ProviderKind::Backend => CountStrategy::Unknown,
        };
        s.assumed_size = self.initial_assumed();
        s.size_confirmed = false;
        s.cached_size = None;
        s.generation += 1;
        s.needs_full_push = true;
        s.size_dirty = true;

        let weak = Arc::downgrade(self);
        s.provider_connection = provider.refresh_signal().map(|signal| {
            signal.connect(move |event| {
                if let Some(communicator) = weak.upgrade() {
                    match event {
                        RefreshEvent::All => communicator.refresh_all(),
                        RefreshEvent::Item(item) => communicator.refresh_item(item),
                    }
                }
            })
        });
        s.provider = Some(provider);
        tracing::debug!(target: targets::COMMUNICATOR, "data provider replaced");
    }

    /// The active provider, if any.
    pub fn provider(&self) -> Option<Arc<dyn DataProvider<T, F>>> {
        self.state.lock().provider.clone()
    }

    /// Sets the server-side filter bound into every query.
    ///
    /// Invalidates the cached and discovered counts and queues a full push;
    /// any in-flight fetch is superseded.
    pub fn set_filter(&self, filter: Option<F>) {
        let mut s = self.state.lock();
        s.filter = filter;
        s.generation += 1;
        s.cached_size = None;
        s.size_confirmed = false;
        s.assumed_size = self.reset_assumed(&s.strategy);
        s.needs_full_push = true;
        s.size_dirty = true;
    }

    /// The current server-side filter.
    pub fn filter(&self) -> Option<F> {
        self.state.lock().filter.clone()
    }

    /// Sets the backend sort orders bound into every query.
    pub fn set_sort_orders(&self, sort_orders: Vec<SortOrder>) {
        let mut s = self.state.lock();
        s.sort_orders = sort_orders;
        s.generation += 1;
        s.cached_size = None;
        s.needs_full_push = true;
    }

    /// The current backend sort orders.
    pub fn sort_orders(&self) -> Vec<SortOrder> {
        self.state.lock().sort_orders.clone()
    }

    /// Sets the in-memory sort comparator bound into every query.
    pub fn set_sort_comparator(&self, comparator: Option<ItemComparator<T>>) {
        let mut s = self.state.lock();
        s.comparator = comparator;
        s.generation += 1;
        s.cached_size = None;
        s.needs_full_push = true;
    }

    /// Replaces the item identifier provider.
    ///
    /// Identity semantics change, so every key mapping and pin is dropped
    /// and a full push is queued.
    pub fn set_identifier_provider(&self, identifier: IdentifierProvider<T>) {
        let mut s = self.state.lock();
        s.key_mapper.set_identifier_provider(identifier);
        s.pinned.clear();
        s.needs_full_push = true;
    }

    /// Registers a data generator contributing properties to every pushed
    /// item.
    pub fn add_generator(&self, generator: Arc<dyn DataGenerator<T>>) {
        let mut s = self.state.lock();
        s.generators.push(generator);
        s.needs_full_push = true;
    }

    // -------------------------------------------------------------------------
    // Count strategy state machine
    // -------------------------------------------------------------------------

    /// The current count-resolution state.
    pub fn size_state(&self) -> SizeState {
        let s = self.state.lock();
        if s.provider.is_none() {
            return SizeState::NoProvider;
        }
        match s.strategy {
            CountStrategy::FromProvider | CountStrategy::FromCallback(_) => SizeState::Defined,
            CountStrategy::Estimated { .. } => SizeState::Estimated,
            CountStrategy::Unknown => SizeState::Unknown,
        }
    }

    /// Switches to an estimated count starting at `estimate`.
    ///
    /// Keeps a previously configured estimate increase; any other count
    /// strategy is discarded.
    pub fn set_item_count_estimate(&self, estimate: usize) -> DataResult<()> {
        let mut s = self.state.lock();
        Self::ensure_lazy_provider(&s)?;
        let increase = match s.strategy {
            CountStrategy::Estimated { increase, .. } => increase,
            _ => self.initial_assumed(),
        };
        s.strategy = CountStrategy::Estimated { estimate, increase };
        self.on_strategy_change(&mut s);
        Ok(())
    }

    /// Switches to an estimated count with the given growth step.
    ///
    /// Keeps a previously configured estimate; any other count strategy is
    /// discarded.
    pub fn set_item_count_estimate_increase(&self, increase: usize) -> DataResult<()> {
        let mut s = self.state.lock();
        Self::ensure_lazy_provider(&s)?;
        let estimate = match s.strategy {
            CountStrategy::Estimated { estimate, .. } => estimate,
            _ => self.initial_assumed(),
        };
        s.strategy = CountStrategy::Estimated { estimate, increase };
        self.on_strategy_change(&mut s);
        Ok(())
    }

    /// Switches to an externally supplied exact count.
    pub fn set_item_count_callback(&self, callback: CountCallback<T, F>) -> DataResult<()> {
        let mut s = self.state.lock();
        Self::ensure_lazy_provider(&s)?;
        s.strategy = CountStrategy::FromCallback(callback);
        self.on_strategy_change(&mut s);
        Ok(())
    }

    /// Switches to an unknown count, grown as the client scrolls.
    pub fn set_item_count_unknown(&self) -> DataResult<()> {
        let mut s = self.state.lock();
        Self::ensure_lazy_provider(&s)?;
        s.strategy = CountStrategy::Unknown;
        self.on_strategy_change(&mut s);
        Ok(())
    }

    /// Switches to the provider's own `size` as the exact count.
    pub fn set_item_count_from_provider(&self) -> DataResult<()> {
        let mut s = self.state.lock();
        if let Some(provider) = &s.provider
            && !provider.supports_size_query()
        {
            return Err(DataError::MissingCountCallback);
        }
        s.strategy = CountStrategy::FromProvider;
        self.on_strategy_change(&mut s);
        Ok(())
    }

    /// Count estimates make no sense for a provider whose count is exact by
    /// construction.
    fn ensure_lazy_provider(s: &State<T, F>) -> DataResult<()> {
        if let Some(provider) = &s.provider
            && provider.kind() == ProviderKind::InMemory
        {
            return Err(DataError::UnsupportedProvider {
                expected: ProviderKind::Backend,
                actual: ProviderKind::InMemory,
            });
        }
        Ok(())
    }

    fn on_strategy_change(&self, s: &mut State<T, F>) {
        s.size_confirmed = false;
        s.assumed_size = self.reset_assumed(&s.strategy);
        s.cached_size = None;
        s.size_dirty = true;
        s.needs_full_push = true;
    }

    fn reset_assumed(&self, strategy: &CountStrategy<T, F>) -> usize {
        match strategy {
            CountStrategy::Estimated { estimate, .. } => (*estimate).max(1),
            _ => self.initial_assumed(),
        }
    }

    // -------------------------------------------------------------------------
    // Paging
    // -------------------------------------------------------------------------

    /// Enables or disables paging. The defined-count size cache is only live
    /// while paging is enabled.
    pub fn set_paging_enabled(&self, enabled: bool) {
        let mut s = self.state.lock();
        s.paging_enabled = enabled;
        s.cached_size = None;
    }

    /// Whether paging is enabled.
    pub fn paging_enabled(&self) -> bool {
        self.state.lock().paging_enabled
    }

    // -------------------------------------------------------------------------
    // Mutation inputs
    // -------------------------------------------------------------------------

    /// Records the index window the client wants, `[start, start + length)`.
    ///
    /// The window may reach past the item count; the next flush truncates
    /// against an authoritative count or grows a provisional one.
    pub fn request_range(&self, start: usize, length: usize) {
        let mut s = self.state.lock();
        s.requested_range = start..start.saturating_add(length);
        s.range_dirty = true;
        tracing::trace!(
            target: targets::COMMUNICATOR,
            start,
            length,
            "range requested"
        );
    }

    /// The index window the client currently wants.
    pub fn requested_range(&self) -> Range<usize> {
        self.state.lock().requested_range.clone()
    }

    /// Marks one item's pushed data stale for regeneration.
    ///
    /// The item's key assignment is unchanged and the stored copy is
    /// replaced with `item`, so the next flush regenerates the row from the
    /// fresh state without a provider fetch. No-op if the item's identity is
    /// not currently mapped.
    pub fn refresh_item(&self, item: &T) {
        let mut s = self.state.lock();
        if let Some(key) = s.key_mapper.refresh(item) {
            s.stale_keys.insert(key);
        }
    }

    /// Invalidates all pushed state and cached counts.
    ///
    /// The next flush refetches the active range and resends it. Identity →
    /// key mappings are kept: items whose identity is unchanged keep their
    /// keys across the refresh.
    pub fn refresh_all(&self) {
        let mut s = self.state.lock();
        s.generation += 1;
        s.cached_size = None;
        s.size_confirmed = false;
        s.assumed_size = self.reset_assumed(&s.strategy);
        s.needs_full_push = true;
        s.size_dirty = true;
        tracing::debug!(target: targets::COMMUNICATOR, "refresh all");
    }

    /// Drops every key mapping and pin and queues a full push.
    ///
    /// For when cached per-item payload became globally invalid, e.g. a
    /// label generator changed. Count state is unaffected.
    pub fn reset(&self) {
        let mut s = self.state.lock();
        s.key_mapper.remove_all();
        s.pinned.clear();
        s.stale_keys.clear();
        s.pushed_keys.clear();
        s.needs_full_push = true;
    }

    // -------------------------------------------------------------------------
    // Keys and pinning
    // -------------------------------------------------------------------------

    /// The item behind a client key, or `None` for unknown/expired keys.
    pub fn item_by_key(&self, key: &str) -> Option<T> {
        self.state.lock().key_mapper.get(key).cloned()
    }

    /// The key of an item's identity, if currently mapped.
    pub fn key_for_item(&self, item: &T) -> Option<String> {
        self.state.lock().key_mapper.key_of(item)
    }

    /// The item identifier provider currently in use.
    pub fn identifier_provider(&self) -> IdentifierProvider<T> {
        self.state.lock().key_mapper.identifier_provider()
    }

    /// Whether an identity-equal item is part of the current dataset.
    ///
    /// Scans the provider under the current filter; intended for in-memory
    /// providers, where the scan is a cheap list walk.
    pub fn contains(&self, item: &T) -> DataResult<bool> {
        let identifier = self.state.lock().key_mapper.identifier_provider();
        let id = identifier(item);
        Ok(self
            .fetch_from_provider(0, usize::MAX)?
            .iter()
            .any(|existing| identifier(existing) == id))
    }

    /// Keys an item (allocating if needed) and pins the key.
    ///
    /// Pinned keys survive active-range eviction; used for state the client
    /// references independent of scrolling, e.g. a selected value.
    pub fn register_pinned(&self, item: &T) -> String {
        let mut s = self.state.lock();
        let key = s.key_mapper.key(item);
        *s.pinned.entry(key.clone()).or_insert(0) += 1;
        key
    }

    /// Drops one pin on `key`. The mapping becomes evictable once no pins
    /// remain.
    pub fn unpin_key(&self, key: &str) {
        let mut s = self.state.lock();
        if let Some(count) = s.pinned.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                s.pinned.remove(key);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Attach / detach
    // -------------------------------------------------------------------------

    /// Activates the binding: the component entered the live component tree.
    ///
    /// Everything the client may have missed while detached is resent by the
    /// next flush.
    pub fn attach(&self) {
        let mut s = self.state.lock();
        s.attached = true;
        s.needs_full_push = true;
        s.size_dirty = true;
    }

    /// Deactivates the binding; mutations keep accumulating but nothing is
    /// pushed until the next attach.
    pub fn detach(&self) {
        self.state.lock().attached = false;
    }

    /// Whether the binding is active.
    pub fn is_attached(&self) -> bool {
        self.state.lock().attached
    }

    // -------------------------------------------------------------------------
    // Direct provider access (data views)
    // -------------------------------------------------------------------------

    /// Fetches `[offset, offset + limit)` straight from the provider with
    /// the current filter/sort, bypassing all pushed/cached state.
    pub fn fetch_from_provider(&self, offset: usize, limit: usize) -> DataResult<Vec<T>> {
        let (provider, query) = {
            let s = self.state.lock();
            let provider = s.provider.clone().ok_or(DataError::NoProvider)?;
            (provider, Self::build_query(&s, offset, limit))
        };
        Ok(provider.fetch(&query).collect())
    }

    /// Resolves the current count per the active strategy.
    ///
    /// Defined strategies query the provider/callback directly (uncached);
    /// unknown/estimated strategies report the current working count.
    pub fn resolve_count(&self) -> DataResult<usize> {
        let source = {
            let s = self.state.lock();
            let provider = s.provider.clone().ok_or(DataError::NoProvider)?;
            match &s.strategy {
                CountStrategy::FromProvider => {
                    if !provider.supports_size_query() {
                        return Err(DataError::MissingCountCallback);
                    }
                    CountSource::Provider(provider)
                }
                CountStrategy::FromCallback(callback) => CountSource::Callback(callback.clone()),
                CountStrategy::Estimated { .. } | CountStrategy::Unknown => {
                    CountSource::Value(s.assumed_size)
                }
            }
        };
        Ok(self.resolve_count_source(source))
    }

    /// The count when it is authoritative: a defined strategy, or a
    /// discovered exact end under unknown/estimated. `None` while the count
    /// is still provisional.
    pub(crate) fn authoritative_count(&self) -> DataResult<Option<usize>> {
        let source = {
            let s = self.state.lock();
            let provider = s.provider.clone().ok_or(DataError::NoProvider)?;
            match &s.strategy {
                CountStrategy::FromProvider => {
                    if !provider.supports_size_query() {
                        return Err(DataError::MissingCountCallback);
                    }
                    CountSource::Provider(provider)
                }
                CountStrategy::FromCallback(callback) => CountSource::Callback(callback.clone()),
                CountStrategy::Estimated { .. } | CountStrategy::Unknown => {
                    if s.size_confirmed {
                        CountSource::Value(s.assumed_size)
                    } else {
                        return Ok(None);
                    }
                }
            }
        };
        Ok(Some(self.resolve_count_source(source)))
    }

    fn resolve_count_source(&self, source: CountSource<T, F>) -> usize {
        match source {
            CountSource::Value(value) => value,
            CountSource::Provider(provider) => provider.size(&self.count_query()),
            CountSource::Callback(callback) => callback(&self.count_query()),
        }
    }

    /// A query covering everything, for count resolution.
    fn count_query(&self) -> Query<T, F> {
        let s = self.state.lock();
        Self::build_query(&s, 0, usize::MAX)
    }

    fn build_query(s: &State<T, F>, offset: usize, limit: usize) -> Query<T, F> {
        Query::new(offset, limit)
            .with_sort_orders(s.sort_orders.clone())
            .with_comparator(s.comparator.clone())
            .with_filter(s.filter.clone())
    }

    /// The item-count-change signal, fired by flushes whose count or
    /// exactness differs from the previously pushed one.
    pub fn item_count_changed(&self) -> Arc<Signal<ItemCountChange>> {
        self.item_count_changed.clone()
    }

    // -------------------------------------------------------------------------
    // Flush
    // -------------------------------------------------------------------------

    /// Delivers everything this turn's mutations made necessary: at most one
    /// item batch and at most one count update.
    ///
    /// Called by the UI-tree layer once at the end of the processing turn.
    /// Does nothing while detached or clean. A fetch superseded mid-call
    /// (generation bump from a re-entrant mutation) is discarded; the dirty
    /// state survives for the next turn.
    pub fn flush(&self) {
        // Plan under the lock, fetch without it, apply under the lock again.
        let plan = {
            let mut s = self.state.lock();
            if !s.attached || !s.is_dirty() {
                return;
            }

            if !s.needs_full_push && !s.range_dirty && !s.size_dirty {
                // Item-level staleness only: regenerate from the stored
                // copies, no fetch, no count work.
                let batch = Self::build_stale_batch(&mut s);
                drop(s);
                if !batch.is_empty() {
                    tracing::debug!(
                        target: targets::COMMUNICATOR,
                        items = batch.items.len(),
                        "pushing refreshed items"
                    );
                    self.sink.push_update(batch);
                }
                return;
            }

            let Some(provider) = s.provider.clone() else {
                s.clear_flags();
                return;
            };

            let count_source = match &s.strategy {
                CountStrategy::FromProvider | CountStrategy::FromCallback(_)
                    if s.paging_enabled && s.cached_size.is_some() =>
                {
                    CountSource::Value(s.cached_size.unwrap_or_default())
                }
                CountStrategy::FromProvider => CountSource::Provider(provider.clone()),
                CountStrategy::FromCallback(callback) => CountSource::Callback(callback.clone()),
                CountStrategy::Estimated { estimate, increase } => {
                    let (estimate, increase) = (*estimate, *increase);
                    if !s.size_confirmed {
                        s.assumed_size = s.assumed_size.max(estimate.max(1));
                        while s.requested_range.end >= s.assumed_size {
                            s.assumed_size = s.assumed_size.saturating_add(increase.max(1));
                        }
                    }
                    CountSource::Value(s.assumed_size)
                }
                CountStrategy::Unknown => {
                    if !s.size_confirmed {
                        let step = self.initial_assumed();
                        while s.requested_range.end >= s.assumed_size {
                            s.assumed_size = s.assumed_size.saturating_add(step);
                        }
                    }
                    CountSource::Value(s.assumed_size)
                }
            };

            let provisional = matches!(
                s.strategy,
                CountStrategy::Unknown | CountStrategy::Estimated { .. }
            );
            (
                s.generation,
                provider,
                s.requested_range.clone(),
                count_source,
                s.needs_full_push,
                provisional,
                Self::build_query(&s, 0, 0), // window filled in below
            )
        };
        let (generation, provider, requested, count_source, full, provisional, template) = plan;

        // Resolve the count and fetch with no lock held; user callbacks may
        // re-enter the communicator from here.
        let count = self.resolve_count_source(count_source);
        let mut start = requested.start.min(count);
        let end = requested.end.min(count);
        let mut length = end - start;

        let window_query = |start: usize, length: usize| {
            Query::new(start, length)
                .with_sort_orders(template.sort_orders().to_vec())
                .with_comparator(template.comparator().cloned())
                .with_filter(template.filter().cloned())
        };

        let mut items: Vec<T> = if length > 0 {
            provider.fetch(&window_query(start, length)).collect()
        } else {
            Vec::new()
        };

        if provisional && items.is_empty() && length > 0 {
            // An empty window only proves the data ends at or before
            // `start`; probe earlier windows until the end is found.
            while items.is_empty() && start > 0 {
                let step = length.max(1);
                let new_start = start.saturating_sub(step);
                length = start - new_start;
                start = new_start;
                items = provider.fetch(&window_query(start, length)).collect();
            }
        }

        // Apply.
        let mut s = self.state.lock();
        if s.generation != generation {
            tracing::debug!(
                target: targets::COMMUNICATOR,
                "discarding superseded fetch"
            );
            return;
        }

        let mut count = count;
        if provisional && items.len() < length {
            // The backend ran out before the window was filled: the exact
            // end is now known. This also corrects a previously discovered
            // end downward if the backend has since shrunk.
            count = start + items.len();
            s.assumed_size = count;
            s.size_confirmed = true;
        }

        if s.paging_enabled
            && matches!(
                s.strategy,
                CountStrategy::FromProvider | CountStrategy::FromCallback(_)
            )
        {
            s.cached_size = Some(count);
        }

        let batch = Self::reconcile(&mut s, start, items, full);
        s.pushed_start = start;

        let mode = match s.strategy {
            CountStrategy::FromProvider | CountStrategy::FromCallback(_) => CountMode::Exact,
            CountStrategy::Estimated { .. } if s.size_confirmed => CountMode::Exact,
            CountStrategy::Estimated { .. } => CountMode::Estimated,
            CountStrategy::Unknown if s.size_confirmed => CountMode::Exact,
            CountStrategy::Unknown => CountMode::Unknown,
        };
        let count_update = CountUpdate { count, mode };
        let push_count = s.last_count_pushed != Some(count_update);
        if push_count {
            s.last_count_pushed = Some(count_update);
        }
        s.clear_flags();
        drop(s);

        if !batch.is_empty() {
            tracing::debug!(
                target: targets::COMMUNICATOR,
                start = batch.start,
                items = batch.items.len(),
                removed = batch.removed.len(),
                clear = batch.clear,
                "pushing item batch"
            );
            self.sink.push_update(batch);
        }
        if push_count {
            tracing::debug!(
                target: targets::COMMUNICATOR,
                count,
                ?mode,
                "pushing count update"
            );
            self.sink.push_count(count_update);
            self.item_count_changed.emit(ItemCountChange {
                count,
                exact: mode == CountMode::Exact,
            });
        }
    }

    /// Reconciles fetched items against the key mapper and the previously
    /// pushed window, evicting unpinned mappings that left the range.
    fn reconcile(s: &mut State<T, F>, start: usize, items: Vec<T>, full: bool) -> UpdateBatch {
        let new_entries: Vec<(String, T)> = items
            .into_iter()
            .map(|item| {
                let key = s.key_mapper.key(&item);
                (key, item)
            })
            .collect();

        let new_keys: HashSet<&String> = new_entries.iter().map(|(key, _)| key).collect();
        let old_keys = std::mem::take(&mut s.pushed_keys);
        let old_start = s.pushed_start;
        let old_positions: HashMap<&String, usize> = old_keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key, old_start + i))
            .collect();

        let mut removed = Vec::new();
        for old in &old_keys {
            if !new_keys.contains(old) && !s.pinned.contains_key(old) {
                s.key_mapper.remove_key(old);
                removed.push(old.clone());
            }
        }

        let mut changes = Vec::new();
        for (i, (key, item)) in new_entries.iter().enumerate() {
            let index = start + i;
            let include = full
                || s.stale_keys.contains(key)
                || old_positions.get(key) != Some(&index);
            if include {
                changes.push(ItemChange {
                    index,
                    key: key.clone(),
                    data: generate_item_data(&s.generators, item),
                });
            }
        }

        s.pushed_keys = new_entries.into_iter().map(|(key, _)| key).collect();

        UpdateBatch {
            start,
            items: changes,
            removed: if full { Vec::new() } else { removed },
            clear: full,
        }
    }

    /// Regenerates the rows whose keys were marked stale, from the stored
    /// item copies. Stale keys outside the pushed window have no row to
    /// update and are simply dropped.
    fn build_stale_batch(s: &mut State<T, F>) -> UpdateBatch {
        let stale = std::mem::take(&mut s.stale_keys);
        let mut items = Vec::new();
        for (i, key) in s.pushed_keys.iter().enumerate() {
            if !stale.contains(key) {
                continue;
            }
            if let Some(item) = s.key_mapper.get(key) {
                items.push(ItemChange {
                    index: s.pushed_start + i,
                    key: key.clone(),
                    data: generate_item_data(&s.generators, item),
                });
            }
        }
        UpdateBatch {
            start: s.pushed_start,
            items,
            removed: Vec::new(),
            clear: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::list_provider::ListDataProvider;
    use crate::data::provider::CallbackDataProvider;
    use crate::data::query::ItemPredicate;
    use crate::data::sink::RecordingSink;

    type ListCommunicator = DataCommunicator<String, ItemPredicate<String>>;

    fn attached(sink: &Arc<RecordingSink>) -> Arc<ListCommunicator> {
        let communicator = Arc::new(ListCommunicator::new(sink.clone()));
        communicator.attach();
        communicator
    }

    fn abc_provider() -> Arc<ListDataProvider<String>> {
        Arc::new(ListDataProvider::new(vec![
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
        ]))
    }

    /// A backend provider serving `total` synthetic rows, counting fetches.
    fn counting_backend(
        total: usize,
        fetches: Arc<Mutex<Vec<(usize, usize)>>>,
    ) -> Arc<CallbackDataProvider<String, ItemPredicate<String>>> {
        Arc::new(CallbackDataProvider::new(
            Arc::new(move |query: &Query<String, ItemPredicate<String>>| {
                fetches.lock().push((query.offset(), query.limit()));
                (query.offset()..query.offset().saturating_add(query.limit()))
                    .take_while(|i| *i < total)
                    .map(|i| format!("Item {i}"))
                    .collect()
            }),
            Arc::new(move |_| total),
        ))
    }

    #[test]
    fn test_in_memory_provider_gets_defined_count() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        assert_eq!(communicator.size_state(), SizeState::NoProvider);

        communicator.set_provider(abc_provider(), None);
        assert_eq!(communicator.size_state(), SizeState::Defined);

        communicator.request_range(0, 10);
        communicator.flush();

        let counts = sink.counts();
        assert_eq!(counts.len(), 1);
        assert_eq!(
            counts[0],
            CountUpdate {
                count: 3,
                mode: CountMode::Exact
            }
        );
        let updates = sink.updates();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].clear);
        assert_eq!(updates[0].items.len(), 3);
    }

    #[test]
    fn test_mutations_coalesce_into_one_push() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        communicator.set_provider(abc_provider(), None);

        // Many mutations within one turn...
        communicator.request_range(0, 10);
        communicator.request_range(0, 2);
        communicator.refresh_all();
        communicator.request_range(0, 3);
        communicator.flush();

        // ...yield exactly one item batch.
        assert_eq!(sink.update_count(), 1);

        // A clean flush pushes nothing further.
        communicator.flush();
        assert_eq!(sink.update_count(), 1);
    }

    #[test]
    fn test_exact_window_fetch_for_defined_backend() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        let fetches = Arc::new(Mutex::new(Vec::new()));
        communicator.set_provider(counting_backend(1000, fetches.clone()), None);
        communicator.set_item_count_from_provider().unwrap();

        communicator.request_range(500, 100);
        communicator.flush();

        assert_eq!(*fetches.lock(), vec![(500, 100)]);
        assert_eq!(sink.last_count().unwrap().count, 1000);
    }

    #[test]
    fn test_defined_count_truncates_over_range_request() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        communicator.set_provider(abc_provider(), None);

        communicator.request_range(2, 50);
        communicator.flush();

        let updates = sink.updates();
        assert_eq!(updates.last().unwrap().items.len(), 1);
        assert_eq!(updates.last().unwrap().items[0].index, 2);
    }

    #[test]
    fn test_unknown_count_grows_until_end_discovered() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        let fetches = Arc::new(Mutex::new(Vec::new()));
        // 130 real rows; the communicator does not know that.
        let provider = Arc::new(CallbackDataProvider::from_fetch(Arc::new(
            move |query: &Query<String, ItemPredicate<String>>| {
                fetches.lock().push((query.offset(), query.limit()));
                (query.offset()..query.offset().saturating_add(query.limit()))
                    .take_while(|i| *i < 130)
                    .map(|i| format!("Item {i}"))
                    .collect()
            },
        )));
        communicator.set_provider(provider, None);
        assert_eq!(communicator.size_state(), SizeState::Unknown);

        communicator.request_range(0, 50);
        communicator.flush();
        // Provisional bound: four pages.
        let first = sink.last_count().unwrap();
        assert_eq!(first.count, 200);
        assert_eq!(first.mode, CountMode::Unknown);

        // Scrolling to the provisional end grows the bound.
        communicator.request_range(150, 50);
        communicator.flush();
        let grown = sink.last_count().unwrap();
        assert_eq!(grown.mode, CountMode::Exact);
        // The fetch at [150, 200) came back empty-handed past 130, so the
        // exact end was discovered instead.
        assert_eq!(grown.count, 130);
        assert_eq!(communicator.authoritative_count().unwrap(), Some(130));
    }

    #[test]
    fn test_estimate_strategy_reports_estimated_mode() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        let fetches = Arc::new(Mutex::new(Vec::new()));
        communicator.set_provider(counting_backend(10_000, fetches), None);
        communicator.set_item_count_estimate(1000).unwrap();
        assert_eq!(communicator.size_state(), SizeState::Estimated);

        communicator.request_range(0, 50);
        communicator.flush();

        let count = sink.last_count().unwrap();
        assert_eq!(count.count, 1000);
        assert_eq!(count.mode, CountMode::Estimated);
    }

    #[test]
    fn test_count_strategies_displace_each_other() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        let fetches = Arc::new(Mutex::new(Vec::new()));
        communicator.set_provider(counting_backend(700, fetches), None);

        communicator.set_item_count_estimate(1000).unwrap();
        assert_eq!(communicator.size_state(), SizeState::Estimated);

        communicator
            .set_item_count_callback(Arc::new(|_| 42))
            .unwrap();
        assert_eq!(communicator.size_state(), SizeState::Defined);
        assert_eq!(communicator.resolve_count().unwrap(), 42);

        communicator.set_item_count_unknown().unwrap();
        assert_eq!(communicator.size_state(), SizeState::Unknown);

        communicator.set_item_count_from_provider().unwrap();
        assert_eq!(communicator.size_state(), SizeState::Defined);
        assert_eq!(communicator.resolve_count().unwrap(), 700);
    }

    #[test]
    fn test_count_estimate_rejected_for_in_memory_provider() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        communicator.set_provider(abc_provider(), None);

        assert!(matches!(
            communicator.set_item_count_estimate(100),
            Err(DataError::UnsupportedProvider { .. })
        ));
        assert!(matches!(
            communicator.set_item_count_unknown(),
            Err(DataError::UnsupportedProvider { .. })
        ));
    }

    #[test]
    fn test_count_from_provider_requires_count_support() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        let provider = Arc::new(CallbackDataProvider::<String, ItemPredicate<String>>::from_fetch(
            Arc::new(|_| Vec::new()),
        ));
        communicator.set_provider(provider, None);

        assert_eq!(
            communicator.set_item_count_from_provider(),
            Err(DataError::MissingCountCallback)
        );
    }

    #[test]
    fn test_keys_survive_refresh_all_for_stable_identities() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        communicator.set_provider(abc_provider(), None);
        communicator.request_range(0, 10);
        communicator.flush();

        let first_keys: Vec<String> = sink.updates()[0]
            .items
            .iter()
            .map(|change| change.key.clone())
            .collect();

        communicator.refresh_all();
        communicator.request_range(0, 10);
        communicator.flush();

        let second = sink.updates();
        let second_keys: Vec<String> = second
            .last()
            .unwrap()
            .items
            .iter()
            .map(|change| change.key.clone())
            .collect();
        assert_eq!(first_keys, second_keys);
    }

    #[test]
    fn test_new_provider_invalidates_keys() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        communicator.set_provider(abc_provider(), None);
        communicator.request_range(0, 10);
        communicator.flush();

        let first_keys: Vec<String> = sink.updates()[0]
            .items
            .iter()
            .map(|change| change.key.clone())
            .collect();

        // Same items, new provider instance: mappings are cleared wholesale.
        communicator.set_provider(abc_provider(), None);
        communicator.request_range(0, 10);
        communicator.flush();

        let second_keys: Vec<String> = sink
            .updates()
            .last()
            .unwrap()
            .items
            .iter()
            .map(|change| change.key.clone())
            .collect();
        assert!(first_keys.iter().all(|key| !second_keys.contains(key)));
    }

    #[test]
    fn test_refresh_item_regenerates_without_fetch() {
        #[derive(Clone, Hash, PartialEq, Eq)]
        struct Row {
            id: u32,
            name: String,
        }

        let sink = Arc::new(RecordingSink::new());
        let communicator = Arc::new(
            DataCommunicator::<Row, ItemPredicate<Row>>::with_identifier_provider(
                sink.clone(),
                CommunicatorConfig::default(),
                Arc::new(|row: &Row| row.id.to_string()),
            ),
        );
        communicator.attach();
        communicator.add_generator(Arc::new(crate::data::generator::ClosureGenerator::new(
            |row: &Row, target| {
                target.insert("name".into(), serde_json::Value::String(row.name.clone()));
            },
        )));

        let provider = Arc::new(ListDataProvider::new(vec![
            Row {
                id: 1,
                name: "one".into(),
            },
            Row {
                id: 2,
                name: "two".into(),
            },
        ]));
        communicator.set_provider(provider, None);
        communicator.request_range(0, 10);
        communicator.flush();
        let baseline_updates = sink.update_count();

        communicator.refresh_item(&Row {
            id: 2,
            name: "TWO".into(),
        });
        communicator.flush();

        let updates = sink.updates();
        assert_eq!(updates.len(), baseline_updates + 1);
        let batch = updates.last().unwrap();
        assert!(!batch.clear);
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].index, 1);
        assert_eq!(batch.items[0].data["name"], "TWO");
    }

    #[test]
    fn test_refresh_item_for_unmapped_identity_is_noop() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        communicator.set_provider(abc_provider(), None);
        communicator.request_range(0, 10);
        communicator.flush();
        let baseline = sink.update_count();

        communicator.refresh_item(&"Z".to_string());
        communicator.flush();
        assert_eq!(sink.update_count(), baseline);
    }

    #[test]
    fn test_scrolling_evicts_unpinned_and_keeps_pinned_mappings() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        let provider = Arc::new(ListDataProvider::new(
            (0..100).map(|i| format!("Item {i}")).collect::<Vec<_>>(),
        ));
        communicator.set_provider(provider, None);

        communicator.request_range(0, 10);
        communicator.flush();
        let pinned_key = communicator.register_pinned(&"Item 3".to_string());
        let unpinned_key = communicator.key_for_item(&"Item 4".to_string()).unwrap();

        communicator.request_range(50, 10);
        communicator.flush();

        assert_eq!(
            communicator.item_by_key(&pinned_key),
            Some("Item 3".to_string())
        );
        assert_eq!(communicator.item_by_key(&unpinned_key), None);
        let batch = sink.updates().last().unwrap().clone();
        assert!(batch.removed.contains(&unpinned_key));
        assert!(!batch.removed.contains(&pinned_key));
    }

    #[test]
    fn test_paging_caches_defined_size_per_query_state() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        let counts = Arc::new(Mutex::new(0usize));
        let counts_cb = counts.clone();
        let provider = Arc::new(CallbackDataProvider::new(
            Arc::new(|query: &Query<String, ItemPredicate<String>>| {
                (query.offset()..query.offset() + query.limit())
                    .take_while(|i| *i < 400)
                    .map(|i| format!("Item {i}"))
                    .collect()
            }),
            Arc::new(move |_: &Query<String, ItemPredicate<String>>| {
                *counts_cb.lock() += 1;
                400
            }),
        ));
        communicator.set_provider(provider, None);
        communicator.set_item_count_from_provider().unwrap();

        communicator.request_range(0, 50);
        communicator.flush();
        communicator.request_range(50, 50);
        communicator.flush();
        communicator.request_range(100, 50);
        communicator.flush();
        assert_eq!(*counts.lock(), 1);

        // A sort change invalidates the cache.
        communicator.set_sort_orders(vec![SortOrder::ascending("name")]);
        communicator.flush();
        assert_eq!(*counts.lock(), 2);

        // With paging disabled every scroll tick re-queries.
        communicator.set_paging_enabled(false);
        communicator.request_range(0, 50);
        communicator.flush();
        communicator.request_range(50, 50);
        communicator.flush();
        assert_eq!(*counts.lock(), 4);
    }

    #[test]
    fn test_reentrant_refresh_discards_stale_fetch() {
        let sink = Arc::new(RecordingSink::new());
        let communicator: Arc<ListCommunicator> = Arc::new(ListCommunicator::new(sink.clone()));
        communicator.attach();

        let reentered = Arc::new(Mutex::new(false));
        let weak = Arc::downgrade(&communicator);
        let reentered_cb = reentered.clone();
        let provider = Arc::new(CallbackDataProvider::new(
            Arc::new(move |query: &Query<String, ItemPredicate<String>>| {
                let mut reentered = reentered_cb.lock();
                if !*reentered {
                    *reentered = true;
                    drop(reentered);
                    // A mutation racing the fetch supersedes it.
                    weak.upgrade().unwrap().refresh_all();
                }
                (query.offset()..query.offset() + query.limit())
                    .take_while(|i| *i < 30)
                    .map(|i| format!("Item {i}"))
                    .collect()
            }),
            Arc::new(|_: &Query<String, ItemPredicate<String>>| 30),
        ));
        communicator.set_provider(provider, None);
        communicator.set_item_count_from_provider().unwrap();

        communicator.request_range(0, 10);
        communicator.flush();
        // First flush was superseded and discarded.
        assert_eq!(sink.update_count(), 0);

        // The dirty state survived; the next turn serves the new generation.
        communicator.flush();
        assert_eq!(sink.update_count(), 1);
        assert_eq!(sink.updates()[0].items.len(), 10);
    }

    #[test]
    fn test_nothing_pushes_while_detached() {
        let sink = Arc::new(RecordingSink::new());
        let communicator: Arc<ListCommunicator> = Arc::new(ListCommunicator::new(sink.clone()));
        communicator.set_provider(abc_provider(), None);
        communicator.request_range(0, 10);
        communicator.flush();
        assert_eq!(sink.update_count(), 0);
        assert!(sink.counts().is_empty());

        communicator.attach();
        communicator.flush();
        assert_eq!(sink.update_count(), 1);
    }

    #[test]
    fn test_provider_mutation_reaches_client_through_refresh_signal() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        let provider = abc_provider();
        communicator.set_provider(provider.clone(), None);
        communicator.request_range(0, 10);
        communicator.flush();
        assert_eq!(sink.last_count().unwrap().count, 3);

        provider.push("D".to_string());
        communicator.flush();
        assert_eq!(sink.last_count().unwrap().count, 4);
    }

    #[test]
    fn test_count_listener_fires_only_on_change() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        let events = Arc::new(Mutex::new(Vec::new()));
        let recv = events.clone();
        communicator.item_count_changed().connect(move |change| {
            recv.lock().push(*change);
        });

        let provider = abc_provider();
        communicator.set_provider(provider.clone(), None);
        communicator.request_range(0, 10);
        communicator.flush();

        // Re-sorting leaves the count untouched: no event.
        communicator.set_sort_comparator(Some(Arc::new(|a: &String, b: &String| b.cmp(a))));
        communicator.flush();

        provider.push("D".to_string());
        communicator.flush();

        let events = events.lock();
        assert_eq!(
            *events,
            vec![
                ItemCountChange {
                    count: 3,
                    exact: true
                },
                ItemCountChange {
                    count: 4,
                    exact: true
                },
            ]
        );
    }

    #[test]
    fn test_server_filter_changes_count_and_content() {
        let sink = Arc::new(RecordingSink::new());
        let communicator = attached(&sink);
        communicator.set_provider(abc_provider(), None);
        communicator.request_range(0, 10);
        communicator.flush();

        communicator.set_filter(Some(Arc::new(|s: &String| s != "B") as ItemPredicate<String>));
        communicator.flush();

        let count = sink.last_count().unwrap();
        assert_eq!(count.count, 2);
        let batch = sink.updates().last().unwrap().clone();
        assert!(batch.clear);
        let labels: Vec<usize> = batch.items.iter().map(|change| change.index).collect();
        assert_eq!(labels, vec![0, 1]);
    }
}
