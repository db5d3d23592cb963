use criterion::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use avsrdo::bench::sad::*;

criterion_group!(sad, bench_sad, bench_satd, bench_ssd);

fn blocks(size: usize) -> (Vec<u16>, Vec<u16>) {
    let mut ra = ChaChaRng::from_seed([2; 32]);
    let a = (0..size * size).map(|_| ra.gen::<u8>() as u16).collect();
    let b = (0..size * size).map(|_| ra.gen::<u8>() as u16).collect();
    (a, b)
}

fn bench_sad(c: &mut Criterion) {
    let (a, b) = blocks(64);
    c.bench_function("sad_64x64", |bn| bn.iter(|| sad_16b(64, 64, black_box(&a), 64, black_box(&b), 64)));
}

fn bench_satd(c: &mut Criterion) {
    let (a, b) = blocks(64);
    c.bench_function("satd_64x64", |bn| bn.iter(|| satd_16b(64, 64, black_box(&a), 64, black_box(&b), 64)));
}

fn bench_ssd(c: &mut Criterion) {
    let (a, b) = blocks(64);
    c.bench_function("ssd_64x64", |bn| bn.iter(|| ssd_16b(64, 64, black_box(&a), 64, black_box(&b), 64)));
}
