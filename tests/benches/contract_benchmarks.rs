//! # Quantum-Chain Contract Benchmarks
//!
//! | Area | Measured |
//! |------|----------|
//! | Table store | emplace with age index, range scan, session undo |
//! | Address book | upsert of new and changed records |
//! | Hodl | deposit through the token contract |

use criterion::{criterion_group, criterion_main, Criterion};
use qc_tests::benchmarks::qc_11_native_contracts;

fn bench_native_contracts(c: &mut Criterion) {
    qc_11_native_contracts::register_benchmarks(c);
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(50);
    targets = bench_native_contracts
);
criterion_main!(benches);
