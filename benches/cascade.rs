use arcsim::{Heap, Holder, ScenarioDriver, ScenarioKind};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn chain(length: usize) -> Heap {
    let mut heap = Heap::new();
    let head = heap.create("node 0");
    heap.set_strong(Holder::root("head"), head).unwrap();

    let mut previous = head;
    for index in 1..length {
        let node = heap.create(format!("node {}", index));
        heap.set_strong(Holder::field(previous, "next"), node).unwrap();
        previous = node;
    }
    heap
}

fn release_chain(c: &mut Criterion) {
    c.bench_function("release 10k chain", |b| {
        b.iter_batched(
            || chain(10_000),
            |mut heap| {
                heap.clear(&Holder::root("head")).unwrap();
                black_box(heap.deinit_count())
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn builtin_scenarios(c: &mut Criterion) {
    c.bench_function("all builtin scenarios", |b| {
        b.iter(|| {
            for kind in ScenarioKind::ALL {
                black_box(ScenarioDriver::new().run(kind));
            }
        })
    });
}

criterion_group!(benches, release_chain, builtin_scenarios);
criterion_main!(benches);
