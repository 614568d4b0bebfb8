//! End-to-end scenarios exercising the flavors and operators together.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use streamline::flavors::{Cold, FutureInput, HotInput, Promise};
use streamline::timer::CountingTimer;
use streamline::{combine_latest, Either, RetryPolicy, TerminationReason};

#[test]
fn map_then_observe_sees_incremented_values_and_one_completion() {
    let input: HotInput<i32, String> = HotInput::new("numbers");
    let mapped = input.stream().map(|v| v + 1);

    let observed = Arc::new(Mutex::new(Vec::new()));
    let terminations = Arc::new(Mutex::new(Vec::new()));
    let observed2 = observed.clone();
    let terminations2 = terminations.clone();
    let watched = mapped.on(move |v| observed2.lock().push(*v));
    let _watched = watched.on_terminate(move |r| {
        terminations2.lock().push(match r {
            TerminationReason::Completed => "Completed",
            TerminationReason::Cancelled => "Cancelled",
            TerminationReason::Error(_) => "Error",
        });
    });

    input.push(1);
    input.push(2);
    input.push(3);
    input.terminate(TerminationReason::Completed);

    assert_eq!(*observed.lock(), vec![2, 3, 4]);
    assert_eq!(*terminations.lock(), vec!["Completed"]);
}

#[test]
fn cold_share_broadcasts_one_computed_value_to_every_open_branch() {
    let cold: Cold<i32, i32, String> = Cold::new("doubler", |req, responder| {
        responder.push_shared(req * 2);
    });

    let branch_b = cold.request(0);
    let branch_a = cold.request(3);

    assert_eq!(branch_a.last_value(), Some(6));
    assert_eq!(branch_b.last_value(), Some(6));
}

#[tokio::test]
async fn promise_retry_runs_three_times_then_reports_the_final_error() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts2 = attempts.clone();
    let handle = tokio::runtime::Handle::current();

    let promise = Promise::<i32, String>::spawn("flaky", handle, move || {
        let attempts = attempts2.clone();
        async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err::<i32, String>("boom".to_string())
        }
    });
    let retried = promise.retry(2, RetryPolicy::fixed(Duration::from_millis(0)));

    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors2 = errors.clone();
    let stream = retried.stream().on_error(move |e| errors2.lock().push(e.clone()));

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(*errors.lock(), vec!["boom".to_string()]);
    assert!(!stream.is_active());
}

#[test]
fn completed_future_flat_mapped_emits_three_copies_then_completes() {
    let future = FutureInput::<i32, String>::new("seven");
    future.complete(7);

    let tripled = future.future().flat_map(|v| vec![v, v, v]);
    let collected = Arc::new(Mutex::new(Vec::new()));
    let collected2 = collected.clone();
    let _watched = tripled.on(move |v| collected2.lock().push(*v));

    assert_eq!(*collected.lock(), vec![7, 7, 7]);
    assert!(!tripled.is_active());
}

#[test]
fn combine_latest_pairs_every_update_with_the_other_sides_current_value() {
    let left: HotInput<i32, String> = HotInput::new("left");
    let right: HotInput<&str, String> = HotInput::new("right");
    let combined = combine_latest(&left.stream(), &right.stream());

    let pairs = Arc::new(Mutex::new(Vec::new()));
    let pairs2 = pairs.clone();
    let _watched = combined.on(move |pair| pairs2.lock().push(*pair));

    left.push(1);
    left.push(2);
    right.push("a");
    left.push(3);
    right.push("b");

    assert_eq!(*pairs.lock(), vec![(2, "a"), (3, "a"), (3, "b")]);
}

#[tokio::test(start_paused = true)]
async fn dropped_counting_timer_stops_ticking() {
    let handle = tokio::runtime::Handle::current();
    let timer = CountingTimer::new("ticker", Duration::from_millis(100), handle);
    let stream = timer.stream();
    timer.start(true);

    tokio::time::advance(Duration::from_millis(350)).await;
    let before_drop = stream.last_value().unwrap_or(0);
    assert!((2..=4).contains(&before_drop), "got {before_drop}");

    drop(timer);
    tokio::time::advance(Duration::from_millis(500)).await;
    assert_eq!(stream.last_value().unwrap_or(0), before_drop);
}

#[test]
fn either_from_merge_tags_each_sides_origin() {
    let e: Either<i32, &str> = Either::Left(1);
    assert!(e.is_left());
}
