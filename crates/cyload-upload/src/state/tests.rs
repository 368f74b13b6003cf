//! Tests for the execution state store

use super::*;
use cyload_core::CounterKind;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

mod default_state_tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = ExecutionState::default();

        assert!(!state.is_running);
        assert_eq!(state.file_name, "");
        assert_eq!(state.total_statements, 0);
        assert_eq!(state.executed_statements, 0);
        assert_eq!(state.progress, 0);
        assert_eq!(state.status, ExecutionStatus::Idle);
        assert_eq!(state.batch_size, 100);
        assert!(state.counters.is_empty());
    }

    #[test]
    fn test_progress_labels() {
        let state = ExecutionState {
            executed_statements: 1200,
            total_statements: 1_234_567,
            progress: 42,
            ..ExecutionState::default()
        };
        assert_eq!(state.progress_label(), "Statement 1,200 of 1,234,567");
        assert_eq!(state.percent_label(), "42% complete");
    }

    #[test]
    fn test_progress_percent_rounds() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 200), 1);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(5, 3), 100);
    }
}

mod store_tests {
    use super::*;

    #[test]
    fn test_update_merges_fields() {
        let store = ExecutionStateStore::new();
        store.update(StatePatch::new().file_name("people.cypher").total_statements(10));
        store.update(StatePatch::new().executed(5, 10));

        let state = store.get();
        assert_eq!(state.file_name, "people.cypher");
        assert_eq!(state.total_statements, 10);
        assert_eq!(state.executed_statements, 5);
        assert_eq!(state.progress, 50);
        assert_eq!(state.status, ExecutionStatus::Idle);
    }

    #[test]
    fn test_update_replaces_counters() {
        let store = ExecutionStateStore::new();
        store.add_to_counters(&QueryCounters::new().with(CounterKind::NodesCreated, 3));
        store.update(
            StatePatch::new().counters(QueryCounters::new().with(CounterKind::LabelsAdded, 1)),
        );

        let counters = store.get().counters;
        assert_eq!(counters.nodes_created, 0);
        assert_eq!(counters.labels_added, 1);
    }

    #[test]
    fn test_add_to_counters_accumulates() {
        let store = ExecutionStateStore::new();
        store.add_to_counters(&QueryCounters::new().with(CounterKind::NodesCreated, 3));
        store.add_to_counters(
            &QueryCounters::new()
                .with(CounterKind::NodesCreated, 2)
                .with(CounterKind::PropertiesSet, 4),
        );

        let counters = store.get().counters;
        assert_eq!(counters.nodes_created, 5);
        assert_eq!(counters.properties_set, 4);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let store = ExecutionStateStore::new();
        let mut snapshot = store.get();
        snapshot.file_name = "mutated".to_string();
        snapshot.counters.nodes_created = 99;

        let state = store.get();
        assert_eq!(state.file_name, "");
        assert_eq!(state.counters.nodes_created, 0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let store = ExecutionStateStore::new();
        store.update(
            StatePatch::new()
                .running(true)
                .status(ExecutionStatus::Executing)
                .file_name("x.cypher")
                .batch_size(7),
        );
        store.reset();
        let once = store.get();
        store.reset();
        let twice = store.get();

        assert_eq!(once, ExecutionState::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_has_active_execution() {
        let store = ExecutionStateStore::new();
        assert!(!store.has_active_execution());
        store.update(StatePatch::new().running(true));
        assert!(store.has_active_execution());
    }
}

mod subscription_tests {
    use super::*;

    #[test]
    fn test_subscriber_receives_every_change() {
        let store = ExecutionStateStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = store.subscribe(move |state| sink.lock().push(state.progress));

        store.update(StatePatch::new().executed(1, 4));
        store.add_to_counters(&QueryCounters::new().with(CounterKind::NodesCreated, 1));
        store.update(StatePatch::new().executed(4, 4));
        store.reset();

        assert_eq!(*seen.lock(), vec![25, 25, 100, 0]);
    }

    #[test]
    fn test_subscribers_notified_in_registration_order() {
        let store = ExecutionStateStore::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let subscriptions: Vec<Subscription> = (0..16)
            .map(|i| {
                let sink = Arc::clone(&order);
                store.subscribe(move |_| sink.lock().push(i))
            })
            .collect();

        store.update(StatePatch::new().file_name("a"));
        assert_eq!(*order.lock(), (0..16).collect::<Vec<_>>());

        let mut subscriptions = subscriptions;
        subscriptions.remove(3).unsubscribe();
        order.lock().clear();
        store.update(StatePatch::new().file_name("b"));

        let expected: Vec<i32> = (0..16).filter(|i| *i != 3).collect();
        assert_eq!(*order.lock(), expected);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let store = ExecutionStateStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(store.subscriber_count(), 1);

        store.update(StatePatch::new().file_name("a"));
        subscription.unsubscribe();
        store.update(StatePatch::new().file_name("b"));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_store_is_harmless() {
        let store = ExecutionStateStore::new();
        let subscription = store.subscribe(|_| {});
        drop(store);
        drop(subscription);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let store = ExecutionStateStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let first = Arc::clone(&calls);
        let second = Arc::clone(&calls);

        let _a = store.subscribe(move |_| {
            first.fetch_add(1, Ordering::SeqCst);
        });
        let _b = store.subscribe(|_| panic!("observer failure"));
        let _c = store.subscribe(move |_| {
            second.fetch_add(1, Ordering::SeqCst);
        });

        store.update(StatePatch::new().file_name("script.cypher"));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.get().file_name, "script.cypher");
    }

    #[test]
    fn test_subscriber_can_read_store() {
        let store = Arc::new(ExecutionStateStore::new());
        let reader = Arc::clone(&store);
        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        let _subscription = store.subscribe(move |_| {
            *sink.lock() = Some(reader.get().file_name);
        });

        store.update(StatePatch::new().file_name("nested.cypher"));

        assert_eq!(observed.lock().as_deref(), Some("nested.cypher"));
    }
}
