//! Property-based checks of the universal invariants and round-trip
//! equalities from the design's testable-properties section.

use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use streamline::flavors::HotInput;
use streamline::{merge, Either, TerminationReason};

fn collect_values<T: Clone + Send + Sync + 'static>(
    stream: &Arc<streamline::StreamNode<T, String>>,
) -> Arc<Mutex<Vec<T>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen2 = seen.clone();
    let _watcher = stream.on(move |v| seen2.lock().push(v.clone()));
    seen
}

proptest! {
    #[test]
    fn map_identity_matches_the_original_sequence(values in prop::collection::vec(any::<i32>(), 0..32)) {
        let input: HotInput<i32, String> = HotInput::new("map-id");
        let mapped = input.stream().map(|v| v);
        let original = collect_values(&input.stream());
        let through = collect_values(&mapped);

        for v in &values {
            input.push(*v);
        }

        prop_assert_eq!(&*original.lock(), &*through.lock());
    }

    #[test]
    fn filter_true_matches_the_original_sequence(values in prop::collection::vec(any::<i32>(), 0..32)) {
        let input: HotInput<i32, String> = HotInput::new("filter-true");
        let filtered = input.stream().filter(|_| true);
        let original = collect_values(&input.stream());
        let through = collect_values(&filtered);

        for v in &values {
            input.push(*v);
        }

        prop_assert_eq!(&*original.lock(), &*through.lock());
    }

    #[test]
    fn terminated_stream_never_emits_again(values in prop::collection::vec(any::<i32>(), 1..16)) {
        let input: HotInput<i32, String> = HotInput::new("post-terminate");
        let seen = collect_values(&input.stream());
        let terminated = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let terminated2 = terminated.clone();
        let _watcher = input.stream().on_terminate(move |_| {
            terminated2.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        let split = values.len() / 2;
        for v in &values[..split] {
            input.push(*v);
        }
        input.terminate(TerminationReason::Completed);
        let count_before = seen.lock().len();
        for v in &values[split..] {
            input.push(*v);
        }

        prop_assert_eq!(seen.lock().len(), count_before);
        prop_assert_eq!(terminated.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn merge_of_a_stream_with_itself_duplicates_every_event(values in prop::collection::vec(any::<i32>(), 0..32)) {
        let input: HotInput<i32, String> = HotInput::new("merge-self");
        let merged = merge(&input.stream(), &input.stream());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let _watcher = merged.on(move |pair: &Either<i32, i32>| seen2.lock().push(*pair));

        for v in &values {
            input.push(*v);
        }

        let lefts = seen.lock().iter().filter(|e| matches!(e, Either::Left(_))).count();
        let rights = seen.lock().iter().filter(|e| matches!(e, Either::Right(_))).count();
        prop_assert_eq!(lefts, values.len());
        prop_assert_eq!(rights, values.len());
    }
}

#[test]
fn zip_buffers_never_exceed_the_configured_bound() {
    let left: HotInput<i32, String> = HotInput::new("zip-left");
    let right: HotInput<i32, String> = HotInput::new("zip-right");
    let zipped = streamline::zip_buffered(&left.stream(), &right.stream(), Some(3));
    let pairs = collect_values(&zipped);

    for v in 0..10 {
        left.push(v);
    }
    right.push(100);
    right.push(101);
    right.push(102);

    assert_eq!(*pairs.lock(), vec![(0, 100), (1, 101), (2, 102)]);
}
