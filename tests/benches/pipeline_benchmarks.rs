//! # Agent Council Pipeline Benchmarks
//!
//! Hot path of one inbound vote:
//!
//! | Stage | Crate | Expected cost |
//! |-------|-------|---------------|
//! | Frame decode | shared-types | O(frame size) |
//! | Dedup accept | ac-02 | O(1) amortized |
//! | Tally record | ac-02 | O(log rounds) |
//! | Evaluate | ac-03 | O(votes in decision round) |

use ac_02_vote_tally::{RoundTally, VoteDeduplicator};
use ac_03_consensus::{ConsensusEvaluator, QuorumPolicy};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use shared_types::{Vote, WireEvent};

fn random_votes(count: usize, rounds: u32) -> Vec<Vote> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            Vote::new(
                format!("validator-{}", i % 64),
                rng.gen_range(0..rounds),
                rng.gen_bool(0.7),
                "benchmark vote",
                i as i64,
            )
        })
        .collect()
}

// ============================================================================
// Frame decode
// ============================================================================

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire-decode");
    let frame = WireEvent::vote(&Vote::new("validator-1", 2, true, "looks sound", 1)).encode();

    group.bench_function("agent_vote_frame", |b| {
        b.iter(|| {
            let event = WireEvent::decode(black_box(&frame)).ok();
            black_box(event.and_then(|e| e.to_vote().ok()))
        })
    });

    group.finish();
}

// ============================================================================
// Dedup and tally
// ============================================================================

fn bench_dedup_and_tally(c: &mut Criterion) {
    let mut group = c.benchmark_group("ac-02-vote-tally");

    for size in [100, 1_000, 10_000] {
        let votes = random_votes(size, 4);
        // every vote delivered twice
        let replayed: Vec<Vote> = votes.iter().chain(votes.iter()).cloned().collect();

        group.throughput(Throughput::Elements(replayed.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("dedup_unbounded", size),
            &replayed,
            |b, replayed| {
                b.iter(|| {
                    let mut dedup = VoteDeduplicator::new();
                    let accepted = replayed.iter().filter(|v| dedup.accept(v)).count();
                    black_box(accepted)
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("dedup_bounded_256", size),
            &replayed,
            |b, replayed| {
                b.iter(|| {
                    let mut dedup = VoteDeduplicator::with_capacity(256);
                    let accepted = replayed.iter().filter(|v| dedup.accept(v)).count();
                    black_box(accepted)
                })
            },
        );

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("tally_record", size), &votes, |b, votes| {
            b.iter(|| {
                let mut tally = RoundTally::new();
                for vote in votes {
                    tally.record(vote.clone());
                }
                black_box(tally.current_round())
            })
        });
    }

    group.finish();
}

// ============================================================================
// Evaluation
// ============================================================================

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("ac-03-consensus");
    let evaluator = ConsensusEvaluator::new(QuorumPolicy::two_thirds());

    for size in [3, 30, 300, 3_000] {
        let votes = random_votes(size, 1);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("evaluate", size), &votes, |b, votes| {
            b.iter(|| black_box(evaluator.evaluate(votes)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_frame_decode, bench_dedup_and_tally, bench_evaluate);
criterion_main!(benches);
