use std::{
    cmp::Ordering,
    sync::{Arc, Mutex, mpsc},
    time::{Duration, Instant},
};

use kerma_common::error::ErrorKind;
use kerma_workflow::{BlockExecutor, ScalarReducer, WorkerPool, partition};

fn random_values(len: usize) -> Vec<i64> {
    (0..len).map(|_| fastrand::i64(-1_000..1_000)).collect()
}

fn check_against_sequential<E: BlockExecutor>(reducer: &ScalarReducer<E>, seed: u64) {
    fastrand::seed(seed);
    for _ in 0..200 {
        let len = fastrand::usize(1..300);
        let values = random_values(len);
        let threads = fastrand::usize(1..=len);

        let expected_max = *values.iter().max().unwrap();
        let expected_min = *values.iter().min().unwrap();
        assert_eq!(reducer.maximum(threads, &values, i64::cmp).unwrap(), expected_max);
        assert_eq!(reducer.minimum(threads, &values, i64::cmp).unwrap(), expected_min);

        let pivot = fastrand::i64(-1_000..1_000);
        assert_eq!(
            reducer.all(threads, &values, move |v| *v >= pivot).unwrap(),
            values.iter().all(|v| *v >= pivot)
        );
        assert_eq!(
            reducer.any(threads, &values, move |v| *v == pivot).unwrap(),
            values.iter().any(|v| *v == pivot)
        );
    }
}

#[test]
fn test_dedicated_threads_match_sequential() {
    check_against_sequential(&ScalarReducer::new(), 29_857_454);
}

#[test]
fn test_shared_pool_matches_sequential() {
    let pool = Arc::new(WorkerPool::new(4).unwrap());
    check_against_sequential(&ScalarReducer::with_pool(pool), 29_857_454);
}

#[test]
fn test_reversed_comparator_swaps_maximum_and_minimum() {
    fastrand::seed(7_331);
    let values = random_values(500);
    let reducer = ScalarReducer::new();
    let reversed = |a: &i64, b: &i64| -> Ordering { b.cmp(a) };
    assert_eq!(
        reducer.maximum(6, &values, reversed).unwrap(),
        reducer.minimum(6, &values, i64::cmp).unwrap()
    );
}

#[test]
fn test_reducers_share_one_pool() {
    let pool = Arc::new(WorkerPool::new(2).unwrap());
    let workers = (0..4)
        .map(|i| {
            let reducer = ScalarReducer::with_pool(pool.clone());
            std::thread::spawn(move || {
                let values = (0..100).map(|v| v * (i + 1)).collect::<Vec<i32>>();
                reducer.maximum(8, &values, i32::cmp).unwrap()
            })
        })
        .collect::<Vec<_>>();
    let maxima = workers
        .into_iter()
        .map(|w| w.join().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(maxima, vec![99, 198, 297, 396]);
}

#[test]
fn test_pool_reduction_after_shutdown_fails_fast() {
    let pool = Arc::new(WorkerPool::new(2).unwrap());
    let reducer = ScalarReducer::with_pool(pool.clone());
    pool.shutdown();
    let err = reducer.maximum(2, &[1, 2, 3], i32::cmp).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
    // Empty input never reaches the pool.
    assert!(reducer.all(2, &Vec::<i32>::new(), |_| false).unwrap());
}

#[test]
fn test_shutdown_interrupts_pool_reduction() {
    let pool = Arc::new(WorkerPool::new(1).unwrap());
    let reducer = ScalarReducer::with_pool(pool.clone());
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Arc::new(Mutex::new(release_rx));

    // Four blocks of two; the single worker stalls on the first element of block 0.
    let caller = std::thread::spawn(move || {
        let values = (0..8).collect::<Vec<i32>>();
        reducer.all(4, &values, move |v| {
            if *v == 0 {
                let _ = started_tx.send(());
                let _ = release_rx.lock().unwrap().recv();
            }
            *v >= 0
        })
    });

    started_rx.recv().unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while pool.queued_tasks() < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(pool.queued_tasks(), 3);
    pool.shutdown();
    release_tx.send(()).unwrap();

    let err = caller.join().unwrap().unwrap_err();
    assert!(err.is_interrupted());
    assert_eq!(err.interruption_count(), 3);
    assert_eq!(
        err.interruptions().map(|i| i.task_index).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_workers_exit_after_join() {
    let pool = WorkerPool::new(3).unwrap();
    assert_eq!(pool.map(|x: u8| x, vec![1, 2, 3]).unwrap(), vec![1, 2, 3]);
    let start = Instant::now();
    pool.join();
    assert_eq!(pool.live_workers(), 0);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_partition_matches_reduction_blocks() {
    let values = (0..11).collect::<Vec<usize>>();
    let reducer = ScalarReducer::new();
    let observed = reducer
        .reduce(
            3,
            &values,
            |block| (block[0], block.len()),
            |partials| partials,
        )
        .unwrap();
    let expected = partition(values.len(), 3)
        .unwrap()
        .into_iter()
        .map(|b| (b.start, b.len))
        .collect::<Vec<_>>();
    assert_eq!(observed, expected);
    assert_eq!(observed, vec![(0, 4), (4, 4), (8, 3)]);
}
