//! Grid component integration.
//!
//! The grid widget renders rows in configured columns and supports sorting
//! by several columns at once. The server side owns the column model: each
//! [`Column`] contributes one cell value per row to the wire object, an
//! optional backend sort property, and an optional in-memory comparator.
//!
//! Sorting by columns translates into both sort flavors at once: a
//! [`SortOrder`] list for backend providers and a composed comparator for
//! in-memory ones, so the same grid works over either provider category.
//!
//! Grids page: the communicator's defined-count size cache is active, so
//! scrolling does not re-query the backend count per tick.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::Value;
//! use horizon_trellis::component::{Column, Grid, GridSortOrder};
//! use horizon_trellis::data::RecordingSink;
//!
//! let sink = Arc::new(RecordingSink::new());
//! let grid: Grid<(String, u32)> = Grid::new(sink);
//! grid.add_column(Column::new("name", |row: &(String, u32)| {
//!     Value::String(row.0.clone())
//! }));
//! grid.add_column(
//!     Column::new("age", |row: &(String, u32)| Value::from(row.1))
//!         .with_comparator(Arc::new(|a: &(String, u32), b: &(String, u32)| {
//!             a.1.cmp(&b.1)
//!         })),
//! );
//! grid.set_items(vec![("Ada".to_string(), 36), ("Grace".to_string(), 45)]);
//! grid.sort(vec![GridSortOrder::descending("age")]).unwrap();
//! ```

use std::cmp::Ordering;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::data::{
    ClientSink, ClosureGenerator, CommunicatorConfig, DataCommunicator, DataError, DataProvider,
    DataResult, GenericDataView, ItemComparator, ItemPredicate, LazyDataView, ListDataProvider,
    ListDataView, SortDirection, SortOrder,
};

/// One grid column: a cell-value extractor plus sort configuration.
pub struct Column<T> {
    key: String,
    value: Arc<dyn Fn(&T) -> Value + Send + Sync>,
    sort_property: Option<String>,
    comparator: Option<ItemComparator<T>>,
}

impl<T> Column<T> {
    /// Creates a column writing `value(row)` under `key` in each row's wire
    /// object.
    pub fn new(key: impl Into<String>, value: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        Self {
            key: key.into(),
            value: Arc::new(value),
            sort_property: None,
            comparator: None,
        }
    }

    /// Sets the backend property this column sorts by.
    ///
    /// Defaults to the column key.
    pub fn with_sort_property(mut self, property: impl Into<String>) -> Self {
        self.sort_property = Some(property.into());
        self
    }

    /// Sets the comparator this column sorts with on in-memory providers.
    pub fn with_comparator(mut self, comparator: ItemComparator<T>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// The column key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// One entry of a grid's (multi-)sort state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSortOrder {
    column: String,
    direction: SortDirection,
}

impl GridSortOrder {
    /// Sort by `column` in the given direction.
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Ascending sort by `column`.
    pub fn ascending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Ascending)
    }

    /// Descending sort by `column`.
    pub fn descending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Descending)
    }
}

/// Server-side adapter for the grid browser widget.
///
/// `F` is the server-side filter type, a plain item predicate unless the
/// grid is bound to a backend provider with its own filter type.
pub struct Grid<T, F = ItemPredicate<T>> {
    communicator: Arc<DataCommunicator<T, F>>,
    columns: Arc<RwLock<Vec<Column<T>>>>,
}

impl<T, F> Grid<T, F>
where
    T: Clone + Hash + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    /// Creates a grid pushing to `sink`, with paging enabled.
    pub fn new(sink: Arc<dyn ClientSink>) -> Self {
        Self::with_config(sink, CommunicatorConfig::new())
    }

    /// Creates a grid with explicit communicator settings.
    pub fn with_config(sink: Arc<dyn ClientSink>, config: CommunicatorConfig) -> Self {
        let communicator = Arc::new(DataCommunicator::with_config(sink, config));
        let columns: Arc<RwLock<Vec<Column<T>>>> = Arc::new(RwLock::new(Vec::new()));

        let cells = columns.clone();
        communicator.add_generator(Arc::new(ClosureGenerator::new(
            move |item: &T, target: &mut Map<String, Value>| {
                for column in cells.read().iter() {
                    target.insert(column.key.clone(), (column.value)(item));
                }
            },
        )));

        Self {
            communicator,
            columns,
        }
    }
}

impl<T> Grid<T, ItemPredicate<T>>
where
    T: Clone + Send + Sync + 'static,
{
    /// Binds an in-memory row list.
    pub fn set_items(&self, items: Vec<T>) {
        self.communicator
            .set_provider(Arc::new(ListDataProvider::new(items)), None);
    }
}

impl<T, F> Grid<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    /// Appends a column; returns its key.
    ///
    /// Already-pushed rows lack the new cell, so a full refresh is queued.
    pub fn add_column(&self, column: Column<T>) -> String {
        let key = column.key.clone();
        self.columns.write().push(column);
        self.communicator.refresh_all();
        key
    }

    /// Removes the column with `key`; returns whether one existed.
    pub fn remove_column(&self, key: &str) -> bool {
        let removed = {
            let mut columns = self.columns.write();
            let before = columns.len();
            columns.retain(|column| column.key != key);
            before != columns.len()
        };
        if removed {
            self.communicator.refresh_all();
        }
        removed
    }

    /// The configured column keys, in display order.
    pub fn column_keys(&self) -> Vec<String> {
        self.columns
            .read()
            .iter()
            .map(|column| column.key.clone())
            .collect()
    }

    /// Sorts by the given columns, outermost first.
    ///
    /// Every referenced column must exist,
    /// [`DataError::UnknownColumn`] otherwise, with no partial sort applied.
    /// Backend providers receive the columns' sort properties as
    /// [`SortOrder`]s; in-memory providers sort with the columns'
    /// comparators chained in order.
    pub fn sort(&self, orders: Vec<GridSortOrder>) -> DataResult<()> {
        let mut backend = Vec::with_capacity(orders.len());
        let mut comparators: Vec<ItemComparator<T>> = Vec::new();
        {
            let columns = self.columns.read();
            for order in &orders {
                let column = columns
                    .iter()
                    .find(|column| column.key == order.column)
                    .ok_or_else(|| DataError::UnknownColumn {
                        key: order.column.clone(),
                    })?;

                let property = column
                    .sort_property
                    .clone()
                    .unwrap_or_else(|| column.key.clone());
                backend.push(SortOrder::new(property, order.direction));

                if let Some(compare) = &column.comparator {
                    let compare = compare.clone();
                    comparators.push(match order.direction {
                        SortDirection::Ascending => compare,
                        SortDirection::Descending => {
                            Arc::new(move |a: &T, b: &T| compare(a, b).reverse())
                        }
                    });
                }
            }
        }

        let composed: Option<ItemComparator<T>> = if comparators.is_empty() {
            None
        } else {
            Some(Arc::new(move |a: &T, b: &T| {
                for compare in &comparators {
                    let ordering = compare(a, b);
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            }))
        };

        self.communicator.set_sort_orders(backend);
        self.communicator.set_sort_comparator(composed);
        Ok(())
    }

    /// Restores provider order.
    pub fn clear_sort(&self) {
        self.communicator.set_sort_orders(Vec::new());
        self.communicator.set_sort_comparator(None);
    }

    /// Binds an arbitrary data provider.
    pub fn set_data_provider(&self, provider: Arc<dyn DataProvider<T, F>>) {
        self.communicator.set_provider(provider, None);
    }

    /// Sets the server-side filter bound into every query.
    pub fn set_filter(&self, filter: Option<F>) {
        self.communicator.set_filter(filter);
    }

    /// A filter/sort-capable view; errors unless the bound provider is an
    /// in-memory list.
    pub fn list_data_view(&self) -> DataResult<ListDataView<T, F>> {
        ListDataView::new(self.communicator.clone())
    }

    /// A count-strategy-capable view; errors unless the bound provider is a
    /// backend callback.
    pub fn lazy_data_view(&self) -> DataResult<LazyDataView<T, F>> {
        LazyDataView::new(self.communicator.clone())
    }

    /// A read-only view over whatever provider is bound.
    pub fn generic_data_view(&self) -> DataResult<GenericDataView<T, F>> {
        GenericDataView::new(self.communicator.clone())
    }

    /// Enables or disables paging (the defined-count size cache).
    pub fn set_paging_enabled(&self, enabled: bool) {
        self.communicator.set_paging_enabled(enabled);
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

    /// End-of-turn flush; see [`DataCommunicator::flush`].
    pub fn flush(&self) {
        self.communicator.flush();
    }
}
