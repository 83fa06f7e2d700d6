use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tubeq::{ChannelQueue, Client, MemoryQueue, Message, Queue, Server, ServerConfig};

/// Benchmark: Enqueue then dequeue 1000 messages on one task
fn bench_memory_roundtrip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("memory_roundtrip");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("1000_messages", |b| {
        let queue = MemoryQueue::new();
        b.iter(|| {
            rt.block_on(async {
                for _ in 0..1000 {
                    queue.enqueue(vec![Message::from("payload")]).await.unwrap();
                }
                for _ in 0..1000 {
                    black_box(queue.dequeue().await.unwrap());
                }
            });
        });
    });
    group.finish();
}

/// Benchmark: Concurrent producers against one memory queue
fn bench_concurrent_producers(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("concurrent_producers");

    for num_producers in [2u64, 4, 8, 16].iter() {
        group.throughput(Throughput::Elements(*num_producers * 1000));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_producers),
            num_producers,
            |b, &num_producers| {
                b.iter(|| {
                    rt.block_on(async {
                        let queue = Arc::new(MemoryQueue::new());

                        let mut handles = vec![];
                        for _ in 0..num_producers {
                            let queue = queue.clone();
                            handles.push(tokio::spawn(async move {
                                for _ in 0..1000 {
                                    queue.enqueue(vec![black_box(Message::from("data"))]).await.unwrap();
                                }
                            }));
                        }

                        for handle in handles {
                            handle.await.unwrap();
                        }
                    });
                });
            },
        );
    }
    group.finish();
}

/// Benchmark: Bounded channel producer/consumer pair
fn bench_channel_producer_consumer(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("channel_producer_consumer");

    for capacity in [16usize, 1024].iter() {
        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(BenchmarkId::from_parameter(capacity), capacity, |b, &capacity| {
            b.iter(|| {
                rt.block_on(async {
                    let queue = Arc::new(ChannelQueue::new(capacity));
                    let producer = {
                        let queue = queue.clone();
                        tokio::spawn(async move {
                            for _ in 0..1000 {
                                queue.enqueue(vec![Message::from("data")]).await.unwrap();
                            }
                        })
                    };
                    for _ in 0..1000 {
                        black_box(queue.dequeue().await.unwrap());
                    }
                    producer.await.unwrap();
                });
            });
        });
    }
    group.finish();
}

/// Benchmark: Message size impact on the memory buffer
fn bench_message_sizes(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("message_sizes");

    for size in [100usize, 1000, 10000, 100000].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let queue = MemoryQueue::new();
            let payload = Message::from(vec![b'x'; size]);

            b.iter(|| {
                rt.block_on(async {
                    queue.enqueue(vec![black_box(payload.clone())]).await.unwrap();
                    black_box(queue.dequeue().await.unwrap());
                });
            });
        });
    }
    group.finish();
}

/// Benchmark: Publish + receive over loopback TCP
fn bench_tcp_roundtrip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("tcp_roundtrip");

    let mut client = rt.block_on(async {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let server = Server::bind(&config, Arc::new(MemoryQueue::new())).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.serve());
        Client::connect(addr).await.unwrap()
    });

    group.bench_function("publish_receive", |b| {
        b.iter(|| {
            rt.block_on(async {
                client.publish("ping").await.unwrap();
                black_box(client.receive().await.unwrap());
            });
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_memory_roundtrip,
    bench_concurrent_producers,
    bench_channel_producer_consumer,
    bench_message_sizes,
    bench_tcp_roundtrip,
);

criterion_main!(benches);
