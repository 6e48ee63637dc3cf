//! Event-bus benchmarks: publish fan-out across subscriber counts and
//! filter matching throughput.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use shared_bus::{EventFilter, EventPublisher, EventTopic, InMemoryEventBus, LabEvent};

fn mined(network_id: u64) -> LabEvent {
    LabEvent::BlockMined {
        network_id,
        blocks: 1,
        node: "backend1".to_string(),
    }
}

fn bench_publish_fanout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("bus_publish");
    for subscribers in [1usize, 8, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, &n| {
                let bus = InMemoryEventBus::new();
                let _subs: Vec<_> = (0..n)
                    .map(|_| bus.subscribe(EventFilter::all()))
                    .collect();
                b.to_async(&rt).iter(|| async { bus.publish(mined(1)).await });
            },
        );
    }
    group.finish();
}

fn bench_filter_matching(c: &mut Criterion) {
    let filter = EventFilter {
        topics: vec![EventTopic::Chain, EventTopic::Channel],
        networks: vec![1, 2, 3],
    };
    let event = mined(2);
    c.bench_function("filter_match", |b| {
        b.iter(|| filter.matches(std::hint::black_box(&event)));
    });
}

criterion_group!(benches, bench_publish_fanout, bench_filter_matching);
criterion_main!(benches);
