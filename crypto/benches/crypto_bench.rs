use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sigrelay_crypto::{TypedDomain, TypedMessage, TypedPayload};
use sigrelay_types::{Address, U256};

fn payload() -> TypedPayload {
    TypedPayload::new(
        TypedDomain::new("Compound", 1, Address::repeat_byte(0xc0)),
        TypedMessage::Delegation {
            delegatee: Address::repeat_byte(0xbb),
            nonce: U256::from(3u64),
            expiry: 10_000_000_000,
        },
    )
}

fn signing_hash_bench(c: &mut Criterion) {
    let payload = payload();

    c.bench_function("eip712_signing_hash", |b| {
        b.iter(|| black_box(&payload).signing_hash())
    });
}

fn recover_bench(c: &mut Criterion) {
    let payload = payload();
    let sig = sigrelay_crypto::sign_payload(&payload, &[0x42; 32]).unwrap();

    c.bench_function("secp256k1_recover_signer", |b| {
        b.iter(|| sigrelay_crypto::recover_signer(black_box(&payload), black_box(&sig)))
    });
}

fn keccak_1kb_bench(c: &mut Criterion) {
    let data = vec![0xCDu8; 1024];

    c.bench_function("keccak256_1KB", |b| {
        b.iter(|| sigrelay_crypto::keccak256(black_box(&data)))
    });
}

criterion_group!(benches, signing_hash_bench, recover_bench, keccak_1kb_bench);
criterion_main!(benches);
