use cryptal::bigint::BigInt;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn operands() -> (BigInt, BigInt) {
    // 2048-bit-ish operands: large enough to land well past the Karatsuba
    // threshold on both the multiply and square paths.
    let a = BigInt::from_hex(
        "1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2b\
         3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d\
         5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f",
    )
    .unwrap();
    let b = BigInt::from_hex(
        "9f8e7d6c5b4a39281706f5e4d3c2b1a0918273645fedcba0123456789abcdef\
         9f8e7d6c5b4a39281706f5e4d3c2b1a0918273645fedcba0123456789abcdef\
         9f8e7d6c5b4a39281706f5e4d3c2b1a0918273645fedcba0123456789abcdef",
    )
    .unwrap();
    (a, b)
}

fn bench_mul(c: &mut Criterion) {
    let (a, b) = operands();
    c.bench_function("bigint mul (~768 bit)", |bencher| bencher.iter(|| black_box(&a).mul(black_box(&b))));
}

fn bench_square(c: &mut Criterion) {
    let (a, _) = operands();
    c.bench_function("bigint square (~768 bit)", |bencher| bencher.iter(|| black_box(&a).square()));
}

criterion_group!(benches, bench_mul, bench_square);
criterion_main!(benches);
