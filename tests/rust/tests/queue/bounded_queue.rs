//! Bounded queue behavior with many producers

use pretty_assertions::assert_eq;
use reqlog_core::QueueStats;
use std::sync::Arc;
use tests::fixtures::record;
use tests::BoundedLogQueue;

#[test]
fn test_no_loss_under_capacity() {
    let queue = BoundedLogQueue::new(100);
    for i in 0..100 {
        assert!(queue.enqueue(record(&format!("svc-{}", i), 60)));
    }

    let drained = queue.drain(100);
    assert_eq!(drained.len(), 100);
    for (i, record) in drained.iter().enumerate() {
        assert_eq!(record.service, format!("svc-{}", i));
    }
}

#[test]
fn test_capacity_plus_k_drops_k() {
    let queue = BoundedLogQueue::new(50);
    for i in 0..57 {
        queue.enqueue(record(&i.to_string(), 60));
    }

    assert_eq!(
        queue.stats(),
        QueueStats {
            len: 50,
            capacity: 50,
            success: 50,
            dropped: 7,
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_never_exceed_capacity() {
    let queue = Arc::new(BoundedLogQueue::new(500));

    let tasks: Vec<_> = (0..10)
        .map(|t| {
            let queue = queue.clone();
            tokio::spawn(async move {
                let mut accepted = 0u64;
                for i in 0..100 {
                    if queue.enqueue(record(&format!("{}-{}", t, i), 60)) {
                        accepted += 1;
                    }
                }
                accepted
            })
        })
        .collect();

    let mut accepted = 0;
    for task in tasks {
        accepted += task.await.unwrap();
    }

    assert_eq!(accepted, 500);
    assert_eq!(queue.success_count(), 500);
    assert_eq!(queue.drop_count(), 500);
    assert_eq!(queue.len(), 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_drain_while_producing() {
    let queue = Arc::new(BoundedLogQueue::new(10_000));

    let producer = {
        let queue = queue.clone();
        tokio::spawn(async move {
            for i in 0..2_000 {
                queue.enqueue(record(&i.to_string(), 60));
                if i % 100 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        })
    };

    let mut seen = Vec::new();
    loop {
        seen.extend(queue.drain(64).into_iter().map(|r| r.service));
        if producer.is_finished() && queue.is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    producer.await.unwrap();
    seen.extend(queue.drain(usize::MAX).into_iter().map(|r| r.service));

    let expected: Vec<String> = (0..2_000).map(|i| i.to_string()).collect();
    assert_eq!(seen, expected);
}
