// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for the session store and rewind.
//!
//! Run with: `cargo bench --bench session`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use hindsight::rewind::{rewind_candidates, RewindCoordinator};
use hindsight::session::{Message, Session, SessionService, SessionStorage};
use hindsight::ActiveSession;

fn conversation(session_id: &str, count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| {
            if i % 2 == 0 {
                Message::user(session_id, format!("User message {}", i))
            } else {
                Message::assistant(session_id, format!("Assistant response {}", i))
                    .with_usage(120, 40, 0.002)
            }
        })
        .collect()
}

fn seeded_storage(count: usize) -> (SessionStorage, Vec<Message>, TempDir) {
    let temp = TempDir::new().unwrap();
    let storage = SessionStorage::open_at(&temp.path().join("sessions.db")).unwrap();
    let session = Session::new("bench".to_string(), "Bench".to_string(), "/bench".to_string());
    storage.create_session(&session).unwrap();

    let messages = conversation(&session.id, count);
    for message in &messages {
        storage.add_message(message).unwrap();
    }
    (storage, messages, temp)
}

/// Benchmark reads that aggregate statistics in SQL.
fn bench_storage_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("session/storage");

    for count in [10, 100, 1000] {
        let (storage, _messages, _temp) = seeded_storage(count);

        group.bench_with_input(BenchmarkId::new("get_session", count), &storage, |b, s| {
            b.iter(|| s.get_session(black_box("bench")).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("list_messages", count), &storage, |b, s| {
            b.iter(|| s.list_messages(black_box("bench")).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the rewind candidate filter.
fn bench_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("session/candidates");

    for count in [10, 100, 1000] {
        let messages = conversation("bench", count);
        group.bench_with_input(BenchmarkId::new("rewind_candidates", count), &messages, |b, m| {
            b.iter(|| rewind_candidates(black_box(m)));
        });
    }

    group.finish();
}

/// Benchmark a full rewind of half the history, reseeding each iteration.
fn bench_rewind(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("session/rewind");
    group.sample_size(20);

    group.bench_function("rewind_to/100", |b| {
        b.iter_batched(
            || {
                let (storage, messages, temp) = seeded_storage(100);
                let target = messages[50].id.clone();
                let service = Arc::new(SessionService::with_storage(storage));
                (RewindCoordinator::new(service.clone(), service), target, temp)
            },
            |(coordinator, target, _temp)| {
                runtime.block_on(async {
                    coordinator
                        .rewind_to("bench", &target, &CancellationToken::new(), &ActiveSession::new())
                        .await
                        .unwrap()
                })
            },
            criterion::BatchSize::PerIteration,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_storage_reads, bench_candidates, bench_rewind);
criterion_main!(benches);
