use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tubeq::{Error, MemoryQueue, Message, Queue};

fn msgs(items: &[&str]) -> Vec<Message> {
    items.iter().map(|s| Message::from(*s)).collect()
}

#[tokio::test]
async fn test_enqueue_writes_length_prefixed_records() {
    let queue = MemoryQueue::new();

    queue.enqueue(msgs(&["a"])).await.unwrap();
    queue.enqueue(msgs(&["b"])).await.unwrap();
    queue.enqueue(msgs(&["c"])).await.unwrap();

    let want: &[u8] = &[0, 0, 0, 1, b'a', 0, 0, 0, 1, b'b', 0, 0, 0, 1, b'c'];
    assert_eq!(&queue.snapshot()[..], want);
    assert_eq!(queue.size(), 3);
}

#[tokio::test]
async fn test_dequeue_preserves_fifo_order_and_drains_buffer() {
    let queue = MemoryQueue::new();
    queue.enqueue(msgs(&["a", "b", "c"])).await.unwrap();

    assert_eq!(queue.dequeue().await.unwrap(), "a");
    assert_eq!(queue.buffered_len(), 10);
    assert_eq!(queue.dequeue().await.unwrap(), "b");
    assert_eq!(queue.buffered_len(), 5);
    assert_eq!(queue.dequeue().await.unwrap(), "c");
    assert_eq!(queue.buffered_len(), 0);
    assert_eq!(queue.size(), 0);
}

#[tokio::test]
async fn test_size_tracks_enqueues_minus_dequeues() {
    let queue = MemoryQueue::new();
    assert_eq!(queue.size(), 0);

    queue.enqueue(msgs(&["first string"])).await.unwrap();
    assert_eq!(queue.size(), 1);
    queue.enqueue(msgs(&["second string", "third"])).await.unwrap();
    assert_eq!(queue.size(), 3);

    queue.dequeue().await.unwrap();
    queue.dequeue().await.unwrap();
    assert_eq!(queue.size(), 1);
    assert_eq!(queue.stats().enqueued_total(), 3);
    assert_eq!(queue.stats().dequeued_total(), 2);
}

#[tokio::test]
async fn test_empty_and_binary_payloads_are_stored_verbatim() {
    let queue = MemoryQueue::new();
    let binary = Message::from(vec![0u8, 255, 0, 0, 0, 7]);

    queue.enqueue(vec![Message::from(""), binary.clone()]).await.unwrap();

    assert_eq!(queue.size(), 2);
    assert!(queue.dequeue().await.unwrap().is_empty());
    assert_eq!(queue.dequeue().await.unwrap(), binary);
}

#[tokio::test]
async fn test_try_dequeue_on_empty_queue_returns_none() {
    let queue = MemoryQueue::new();

    assert!(queue.try_dequeue().unwrap().is_none());

    queue.enqueue(msgs(&["x"])).await.unwrap();
    assert_eq!(queue.try_dequeue().unwrap().unwrap(), "x");
    assert!(queue.try_dequeue().unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dequeue_waits_for_enqueue() {
    let queue = Arc::new(MemoryQueue::new());

    let consumer = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.dequeue().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!consumer.is_finished());

    queue.enqueue(msgs(&["a"])).await.unwrap();

    let got = tokio::time::timeout(Duration::from_secs(2), consumer)
        .await
        .expect("dequeue never woke up")
        .unwrap()
        .unwrap();
    assert_eq!(got, "a");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_waiting_consumer_is_woken_by_a_batch() {
    let queue = Arc::new(MemoryQueue::new());

    let consumers: Vec<_> = (0..3)
        .map(|_| {
            let queue = queue.clone();
            tokio::spawn(async move { queue.dequeue().await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(50)).await;
    queue.enqueue(msgs(&["1", "2", "3"])).await.unwrap();

    let mut got = Vec::new();
    for consumer in consumers {
        let message = tokio::time::timeout(Duration::from_secs(2), consumer)
            .await
            .expect("consumer never woke up")
            .unwrap()
            .unwrap();
        got.push(message.to_string_lossy().into_owned());
    }
    got.sort();
    assert_eq!(got, vec!["1", "2", "3"]);
    assert_eq!(queue.size(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enqueues_lose_nothing() {
    let queue = Arc::new(MemoryQueue::new());

    let handles: Vec<_> = (0..100)
        .map(|i| {
            let queue = queue.clone();
            tokio::spawn(async move { queue.enqueue(vec![Message::from(format!("msg-{i}"))]).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(queue.size(), 100);

    let mut seen = Vec::new();
    for _ in 0..100 {
        seen.push(queue.dequeue().await.unwrap().to_string_lossy().into_owned());
    }
    seen.sort();
    let mut want: Vec<_> = (0..100).map(|i| format!("msg-{i}")).collect();
    want.sort();
    assert_eq!(seen, want);
    assert_eq!(queue.buffered_len(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batches_are_never_interleaved() {
    let queue = Arc::new(MemoryQueue::new());

    let handles: Vec<_> = (0..10)
        .map(|p| {
            let queue = queue.clone();
            tokio::spawn(async move {
                let batch = (0..10).map(|i| Message::from(format!("{p}:{i}"))).collect();
                queue.enqueue(batch).await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for _ in 0..10 {
        let first = queue.dequeue().await.unwrap().to_string_lossy().into_owned();
        let producer = first.split(':').next().unwrap().to_string();
        assert_eq!(first, format!("{producer}:0"));
        for i in 1..10 {
            assert_eq!(queue.dequeue().await.unwrap(), format!("{producer}:{i}").as_str());
        }
    }
}

#[tokio::test]
async fn test_from_buffer_counts_existing_records() {
    let buf = BytesMut::from(&[0u8, 0, 0, 2, b'h', b'i', 0, 0, 0, 0][..]);

    let queue = MemoryQueue::from_buffer(buf).unwrap();

    assert_eq!(queue.size(), 2);
    assert_eq!(queue.dequeue().await.unwrap(), "hi");
    assert!(queue.dequeue().await.unwrap().is_empty());
}

#[test]
fn test_from_buffer_rejects_partial_record() {
    let buf = BytesMut::from(&[0u8, 0, 0, 5, b'a', b'b'][..]);

    let result = MemoryQueue::from_buffer(buf);

    assert!(matches!(
        result,
        Err(Error::CorruptFrame {
            declared: 5,
            available: 2
        })
    ));
}
