//! # Battery Quota Admission Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | bq-01 Lock Client | acquire + release round trip |
//! | bq-03 Admission Engine | single admission, uncontended |
//! | bq-03 Admission Engine | burst of parallel admissions on one contract |
//! | bq-04 Event Broadcaster | outcome routing |

#![allow(clippy::excessive_nesting)]

use bq_01_lock_client::{DistributedLockClient, InMemoryLockBackend, LockClient, LockConfig};
use bq_03_admission_engine::{CreateShipment, OutcomeEvent, ShipmentAdmissionApi};
use bq_04_event_broadcaster::{route, BroadcastConfig};
use bq_tests::support::{admit_with_retry, contract_key, Stack};
use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use rand::Rng;
use shared_types::ActorId;
use std::time::Duration;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

// ============================================================================
// BQ-01: Lock Client
// ============================================================================

fn bench_lock_round_trip(c: &mut Criterion) {
    let rt = runtime();
    let locks = DistributedLockClient::new(InMemoryLockBackend::new(), LockConfig::default());
    let key = contract_key("BENCH-LOCK");

    let mut group = c.benchmark_group("bq-01-lock-client");
    group.bench_function("acquire_release", |b| {
        b.iter(|| {
            rt.block_on(async {
                let token = locks
                    .acquire(&key, Duration::from_secs(5))
                    .await
                    .unwrap()
                    .token()
                    .unwrap();
                locks.release(&key, &token).await.unwrap();
            })
        })
    });
    group.finish();
}

// ============================================================================
// BQ-03: Admission Engine
// ============================================================================

fn bench_single_admission(c: &mut Criterion) {
    let rt = runtime();
    let stack = rt.block_on(async {
        let stack = Stack::new();
        stack.seed("BENCH-1", 0, u64::MAX / 2).await;
        stack
    });

    let mut group = c.benchmark_group("bq-03-admission-engine");
    group.bench_function("admit_uncontended", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result = stack
                    .engine
                    .admit_shipment(CreateShipment::new("BENCH-1", 1, ActorId::new("bench")))
                    .await
                    .unwrap();
                black_box(result.status)
            })
        })
    });
    group.finish();
}

fn bench_parallel_burst(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("bq-03-admission-burst");
    group.measurement_time(Duration::from_secs(10));

    for size in [10usize, 50, 100] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("burst", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    rt.block_on(async {
                        let stack = Stack::new();
                        stack.seed("BENCH-BURST", 0, (size as u64) * 3).await;
                        stack
                    })
                },
                |stack| {
                    rt.block_on(async {
                        let mut tasks = tokio::task::JoinSet::new();
                        for _ in 0..size {
                            let engine = stack.engine.clone();
                            let qty = rand::thread_rng().gen_range(1..=5);
                            tasks.spawn(async move {
                                admit_with_retry(
                                    &engine,
                                    CreateShipment::new("BENCH-BURST", qty, ActorId::new("bench")),
                                    1_000,
                                )
                                .await
                                .is_ok()
                            });
                        }
                        let mut admitted = 0u32;
                        while let Some(done) = tasks.join_next().await {
                            if matches!(done, Ok(true)) {
                                admitted += 1;
                            }
                        }
                        black_box(admitted)
                    })
                },
                BatchSize::PerIteration,
            )
        });
    }

    group.finish();
}

// ============================================================================
// BQ-04: Event Broadcaster
// ============================================================================

fn bench_routing(c: &mut Criterion) {
    let rt = runtime();
    let (approved, blocked) = rt.block_on(async {
        let stack = Stack::new();
        stack.seed("BENCH-ROUTE", 0, 10).await;
        let approved = stack
            .engine
            .admit_shipment(CreateShipment::new("BENCH-ROUTE", 5, ActorId::new("bench")))
            .await
            .unwrap();
        let blocked = stack
            .engine
            .admit_shipment(CreateShipment::new("BENCH-ROUTE", 10, ActorId::new("bench")))
            .await
            .unwrap();
        (
            OutcomeEvent::Admission(approved),
            OutcomeEvent::Admission(blocked),
        )
    });
    let config = BroadcastConfig::default();

    let mut group = c.benchmark_group("bq-04-event-broadcaster");
    group.bench_function("route_approved", |b| {
        b.iter(|| black_box(route(&approved, &config)))
    });
    group.bench_function("route_blocked", |b| {
        b.iter(|| black_box(route(&blocked, &config)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_lock_round_trip,
    bench_single_admission,
    bench_parallel_burst,
    bench_routing,
);
criterion_main!(benches);
