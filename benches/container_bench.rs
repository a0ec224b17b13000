use criterion::{black_box, criterion_group, criterion_main, Criterion};
use plank::crypto::generate_key;
use plank::{decode, encode, open, seal, KeyCipher};

fn sample_blobs(count: usize, size: usize) -> Vec<Vec<u8>> {
    (0..count).map(|i| vec![(i % 251) as u8; size]).collect()
}

fn bench_encode(c: &mut Criterion) {
    let few_large = sample_blobs(4, 256 * 1024);
    let many_small = sample_blobs(10_000, 64);

    c.bench_function("encode_4x256kb", |b| b.iter(|| encode(black_box(&few_large)).unwrap()));
    c.bench_function("encode_10k_small", |b| b.iter(|| encode(black_box(&many_small)).unwrap()));
}

fn bench_decode(c: &mut Criterion) {
    let many_small = encode(&sample_blobs(10_000, 64)).unwrap();

    c.bench_function("decode_10k_small", |b| b.iter(|| decode(black_box(&many_small)).unwrap()));
}

fn bench_sealed(c: &mut Criterion) {
    let blobs = sample_blobs(16, 64 * 1024);
    let cipher = KeyCipher::new(generate_key());
    let sealed = seal(&blobs, &cipher).unwrap();

    c.bench_function("seal_1mb_key", |b| b.iter(|| seal(black_box(&blobs), &cipher).unwrap()));
    c.bench_function("open_1mb_key", |b| b.iter(|| open(black_box(&sealed), &cipher).unwrap()));
}

criterion_group!(benches, bench_encode, bench_decode, bench_sealed);
criterion_main!(benches);
