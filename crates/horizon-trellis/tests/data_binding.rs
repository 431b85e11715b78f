//! End-to-end tests of the data-binding core through the public component
//! API: a component bound to a provider, driven the way the UI-tree layer
//! drives it (attach, range requests, one flush per turn), observed through
//! a recording sink.

use std::sync::Arc;

use parking_lot::Mutex;

use horizon_trellis::component::{Column, ComboBox, Grid, GridSortOrder, VirtualList};
use horizon_trellis::data::{
    CallbackDataProvider, CountMode, DataError, DataViewRead, FilterableView, ItemPredicate,
    Query, RecordingSink, SortDirection,
};
use serde_json::Value;

/// A backend of `total` synthetic rows recording every fetch window.
fn synthetic_backend(
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
fn in_memory_filtering_end_to_end() {
    let sink = Arc::new(RecordingSink::new());
    let grid: Grid<String> = Grid::new(sink.clone());
    grid.add_column(Column::new("label", |s: &String| Value::String(s.clone())));
    grid.set_items(vec!["A".to_string(), "B".to_string(), "C".to_string()]);

    let view = grid.list_data_view().unwrap();
    assert_eq!(
        view.items().unwrap().collect::<Vec<_>>(),
        vec!["A", "B", "C"]
    );
    assert_eq!(view.item_count().unwrap(), 3);

    view.add_filter(Arc::new(|s: &String| s != "B"));
    assert_eq!(view.item_count().unwrap(), 2);
    assert_eq!(view.items().unwrap().collect::<Vec<_>>(), vec!["A", "C"]);

    // The filtered set is what reaches the client.
    grid.attach();
    grid.request_range(0, 10);
    grid.flush();
    let batch = sink.updates().pop().unwrap();
    let labels: Vec<&str> = batch
        .items
        .iter()
        .map(|change| change.data["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["A", "C"]);
    assert_eq!(
        sink.last_count().map(|update| update.count),
        Some(2)
    );
}

#[test]
fn scrolled_window_is_fetched_exactly_once() {
    let sink = Arc::new(RecordingSink::new());
    let list: VirtualList<String> = VirtualList::new(sink.clone());
    let fetches = Arc::new(Mutex::new(Vec::new()));
    list.set_data_provider(synthetic_backend(1000, fetches.clone()));
    list.lazy_data_view()
        .unwrap()
        .set_item_count_from_provider()
        .unwrap();

    list.attach();
    list.request_range(500, 100);
    list.flush();

    assert_eq!(*fetches.lock(), vec![(500, 100)]);
    let count = sink.last_count().unwrap();
    assert_eq!(count.count, 1000);
    assert_eq!(count.mode, CountMode::Exact);
}

#[test]
fn refresh_all_keeps_keys_for_stable_identities() {
    let sink = Arc::new(RecordingSink::new());
    let grid: Grid<String> = Grid::new(sink.clone());
    grid.add_column(Column::new("label", |s: &String| Value::String(s.clone())));
    grid.set_items(vec!["A".to_string(), "B".to_string(), "C".to_string()]);

    grid.attach();
    grid.request_range(0, 10);
    grid.flush();
    let first_keys: Vec<String> = sink
        .updates()
        .pop()
        .unwrap()
        .items
        .iter()
        .map(|change| change.key.clone())
        .collect();

    grid.generic_data_view().unwrap().refresh_all();
    grid.flush();

    let second = sink.updates().pop().unwrap();
    assert!(second.clear, "refresh_all resends the whole window");
    let second_keys: Vec<String> = second.items.iter().map(|change| change.key.clone()).collect();
    assert_eq!(
        first_keys, second_keys,
        "keys are reused on identity, not fetch generation"
    );
}

#[test]
fn coalescing_many_mutations_one_push() {
    let sink = Arc::new(RecordingSink::new());
    let grid: Grid<String> = Grid::new(sink.clone());
    grid.add_column(Column::new("label", |s: &String| Value::String(s.clone())));
    grid.set_items((0..30).map(|i| format!("Row {i}")).collect());
    grid.attach();

    // One turn of rapid mutations...
    grid.request_range(0, 10);
    grid.sort(vec![GridSortOrder::new("label", SortDirection::Ascending)])
        .unwrap();
    grid.request_range(0, 20);
    grid.generic_data_view()
        .unwrap()
        .refresh_item(&"Row 3".to_string());
    grid.flush();

    // ...one batch out.
    assert_eq!(sink.updates().len(), 1);

    // A clean turn pushes nothing.
    grid.flush();
    assert_eq!(sink.updates().len(), 1);
}

#[test]
fn typed_filter_reaches_count_and_fetch_consistently() {
    let sink = Arc::new(RecordingSink::new());
    let combo: ComboBox<String> = ComboBox::new(sink);

    let seen = Arc::new(Mutex::new(Vec::<Option<String>>::new()));
    let seen_fetch = seen.clone();
    let seen_count = seen.clone();
    combo.set_data_provider(Arc::new(CallbackDataProvider::new(
        Arc::new(move |query: &Query<String, String>| {
            seen_fetch.lock().push(query.filter().cloned());
            (query.offset()..query.offset().saturating_add(query.limit()))
                .take_while(|i| *i < 25)
                .map(|i| format!("Item {i}"))
                .collect()
        }),
        Arc::new(move |query: &Query<String, String>| {
            seen_count.lock().push(query.filter().cloned());
            25
        }),
    )));
    combo
        .lazy_data_view()
        .unwrap()
        .set_item_count_from_provider()
        .unwrap();

    combo.set_filter_text("it");
    combo.attach();
    combo.request_range(0, 50);
    combo.flush();

    let observed = seen.lock();
    assert!(!observed.is_empty());
    assert!(
        observed
            .iter()
            .all(|filter| filter.as_deref() == Some("it")),
        "count and fetch of one request observe the same filter"
    );
}

#[test]
fn count_strategies_displace_each_other_through_the_view() {
    let sink = Arc::new(RecordingSink::new());
    let list: VirtualList<String> = VirtualList::new(sink.clone());
    let fetches = Arc::new(Mutex::new(Vec::new()));
    list.set_data_provider(synthetic_backend(700, fetches));
    let view = list.lazy_data_view().unwrap();

    view.set_item_count_estimate(1000).unwrap();
    assert_eq!(view.item_count().unwrap(), 1000);

    view.set_item_count_callback(Arc::new(|_| 42)).unwrap();
    assert_eq!(view.item_count().unwrap(), 42);

    view.set_item_count_unknown().unwrap();
    list.attach();
    list.request_range(0, 50);
    list.flush();
    assert_eq!(sink.last_count().unwrap().mode, CountMode::Unknown);

    view.set_item_count_from_provider().unwrap();
    list.flush();
    let count = sink.last_count().unwrap();
    assert_eq!(count.count, 700);
    assert_eq!(count.mode, CountMode::Exact);
}

#[test]
fn unknown_count_grows_then_settles_on_the_exact_end() {
    let sink = Arc::new(RecordingSink::new());
    let list: VirtualList<String> = VirtualList::new(sink.clone());
    // 130 real rows behind a fetch-only callback; nothing knows the count
    // up front.
    let provider = Arc::new(CallbackDataProvider::from_fetch(Arc::new(
        |query: &Query<String, ItemPredicate<String>>| {
            (query.offset()..query.offset().saturating_add(query.limit()))
                .take_while(|i| *i < 130)
                .map(|i| format!("Item {i}"))
                .collect()
        },
    )));
    list.set_data_provider(provider);

    list.attach();
    list.request_range(0, 50);
    list.flush();
    let provisional = sink.last_count().unwrap();
    assert_eq!(provisional.mode, CountMode::Unknown);
    assert!(provisional.count > 130);

    // Scrolling past the end discovers the boundary.
    list.request_range(150, 50);
    list.flush();
    let settled = sink.last_count().unwrap();
    assert_eq!(settled.count, 130);
    assert_eq!(settled.mode, CountMode::Exact);
}

#[test]
fn item_reads_follow_the_bounds_contract() {
    let sink = Arc::new(RecordingSink::new());
    let grid: Grid<String> = Grid::new(sink);
    grid.set_items(vec!["A".to_string(), "B".to_string()]);

    let view = grid.generic_data_view().unwrap();
    assert_eq!(view.item(1).unwrap(), "B");
    assert_eq!(
        view.item(2),
        Err(DataError::OutOfRange { index: 2, count: 2 })
    );
}

#[test]
fn selected_value_key_outlives_the_active_range() {
    let sink = Arc::new(RecordingSink::new());
    let combo: ComboBox<String> = ComboBox::new(sink.clone());
    combo.set_items((0..200).map(|i| format!("Item {i}")).collect());
    combo.attach();

    combo.request_range(0, 10);
    combo.flush();
    combo.set_value(Some("Item 7".to_string())).unwrap();
    let pinned = combo.value_key().unwrap();

    combo.request_range(150, 10);
    combo.flush();

    // Unpinned rows from the old window were evicted, the selection was not.
    let removed = &sink.updates().pop().unwrap().removed;
    assert!(!removed.is_empty());
    assert!(!removed.contains(&pinned));
    assert_eq!(combo.value_key(), Some(pinned));
}

#[test]
fn detached_components_push_nothing_until_attached() {
    let sink = Arc::new(RecordingSink::new());
    let grid: Grid<String> = Grid::new(sink.clone());
    grid.add_column(Column::new("label", |s: &String| Value::String(s.clone())));
    grid.set_items(vec!["A".to_string()]);

    grid.request_range(0, 10);
    grid.flush();
    assert!(sink.updates().is_empty());
    assert!(sink.counts().is_empty());

    grid.attach();
    grid.flush();
    assert_eq!(sink.updates().len(), 1);
    assert_eq!(sink.counts().len(), 1);
}
