//! # XMP Protocol Benchmarks
//!
//! | Component | Operation | Target |
//! |-----------|-----------|--------|
//! | xmp-01 Message Codec | encode + hash | < 10μs |
//! | xmp-02 Outbox | dispatch (tree insert + root) | < 50μs |
//! | xmp-02 Prover | proof generation | < 1ms |
//! | xmp-03 Validator Signer | sign checkpoint | < 1ms |
//! | xmp-04 Validator Manager | is_quorum, n signatures | < 1ms per signature |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use shared_types::{Checkpoint, H256};
use std::time::Duration;
use xmp_01_message_codec::Message;
use xmp_02_outbox::{Outbox, Prover};
use xmp_03_validator_signer::Validator;
use xmp_04_validator_manager::ValidatorManager;

const ORIGIN: u32 = 1000;

fn random_body(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

fn sorted_validators(count: u8) -> Vec<Validator> {
    let mut validators: Vec<Validator> = (1..=count)
        .map(|byte| Validator::from_hex(&hex::encode([byte; 32]), ORIGIN).unwrap())
        .collect();
    validators.sort_by_key(Validator::address);
    validators
}

// ============================================================================
// XMP-01: Message Codec
// ============================================================================

fn bench_message_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("xmp-01-message-codec");

    for size in [0usize, 256, 2048] {
        let message = Message {
            origin: ORIGIN,
            sender: H256::repeat_byte(0xaa),
            nonce: 7,
            destination: 2000,
            recipient: H256::repeat_byte(0xbb),
            body: random_body(size),
        };
        let encoded = message.encode();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::new("encode_hash", size), &message, |b, m| {
            b.iter(|| black_box(m.hash()))
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, bytes| {
            b.iter(|| black_box(Message::decode(bytes).unwrap()))
        });
    }

    group.finish();
}

// ============================================================================
// XMP-02: Outbox and Prover
// ============================================================================

fn bench_outbox(c: &mut Criterion) {
    let mut group = c.benchmark_group("xmp-02-outbox");

    group.bench_function("dispatch", |b| {
        let mut outbox = Outbox::new(ORIGIN);
        let body = random_body(128);
        b.iter(|| {
            black_box(
                outbox
                    .dispatch(H256::repeat_byte(0xaa), 2000, H256::repeat_byte(0xbb), body.clone())
                    .unwrap(),
            )
        })
    });

    for leaves in [16u32, 1024, 16_384] {
        let prover = Prover::from_leaves((0..leaves).map(|i| H256::from_low_u64_be(u64::from(i))));
        group.bench_with_input(BenchmarkId::new("prove", leaves), &prover, |b, p| {
            b.iter(|| black_box(p.prove(leaves / 2).unwrap()))
        });
        group.bench_with_input(
            BenchmarkId::new("prove_against_half", leaves),
            &prover,
            |b, p| b.iter(|| black_box(p.prove_against(0, leaves / 2).unwrap())),
        );
    }

    group.finish();
}

// ============================================================================
// XMP-03 / XMP-04: Signing and Quorum Verification
// ============================================================================

fn bench_quorum(c: &mut Criterion) {
    let mut group = c.benchmark_group("xmp-04-quorum");
    group.measurement_time(Duration::from_secs(10));

    let checkpoint = Checkpoint::new(H256::repeat_byte(0x42), 99);
    let validators = sorted_validators(16);

    group.bench_function("sign_checkpoint", |b| {
        b.iter(|| black_box(validators[0].sign(checkpoint).unwrap()))
    });

    for signers in [1usize, 4, 16] {
        let manager = ValidatorManager::new(
            ORIGIN,
            validators.iter().map(Validator::address),
            signers as u32,
        )
        .unwrap();
        let signatures: Vec<_> = validators[..signers]
            .iter()
            .map(|v| v.sign(checkpoint).unwrap().signature)
            .collect();

        group.throughput(Throughput::Elements(signers as u64));
        group.bench_with_input(
            BenchmarkId::new("is_quorum", signers),
            &signatures,
            |b, sigs| b.iter(|| black_box(manager.is_quorum(&checkpoint, sigs).unwrap())),
        );
    }

    // Below threshold returns before any recovery.
    let manager =
        ValidatorManager::new(ORIGIN, validators.iter().map(Validator::address), 16).unwrap();
    let one = vec![validators[0].sign(checkpoint).unwrap().signature];
    group.bench_function("is_quorum_short_circuit", |b| {
        b.iter(|| black_box(manager.is_quorum(&checkpoint, &one).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_message_codec, bench_outbox, bench_quorum);
criterion_main!(benches);
