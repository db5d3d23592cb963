use criterion::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use avsrdo::api::frame::*;
use avsrdo::bench::mc::*;

criterion_group!(mc, bench_mc_l_00, bench_mc_l_nn, bench_mc_c_nn);

fn new_plane(ra: &mut ChaChaRng, width: usize, height: usize, xpad: usize) -> Plane {
    let mut plane = Plane::new(width, height, xpad);
    for y in 0..height {
        for v in plane.row_mut(y) {
            *v = ra.gen::<u8>() as u16;
        }
    }
    plane.pad();
    plane
}

fn bench_mc_l(c: &mut Criterion, name: &str, gmv_x: i32, gmv_y: i32) {
    let mut ra = ChaChaRng::from_seed([0; 32]);
    let plane = new_plane(&mut ra, 640, 480, 80);
    let mut pred = vec![0u16; 64 * 64];
    c.bench_function(name, |b| {
        b.iter(|| {
            mc_l(&plane, black_box(gmv_x), black_box(gmv_y), &mut pred, 64, 64, 8);
        })
    });
}

fn bench_mc_l_00(c: &mut Criterion) {
    bench_mc_l(c, "mc_l_00", 64 << 2, 64 << 2);
}

fn bench_mc_l_nn(c: &mut Criterion) {
    bench_mc_l(c, "mc_l_nn", (64 << 2) + 1, (64 << 2) + 3);
}

fn bench_mc_c_nn(c: &mut Criterion) {
    let mut ra = ChaChaRng::from_seed([1; 32]);
    let plane = new_plane(&mut ra, 320, 240, 40);
    let mut pred = vec![0u16; 32 * 32];
    c.bench_function("mc_c_nn", |b| {
        b.iter(|| {
            mc_c(&plane, black_box((32 << 3) + 5), black_box((32 << 3) + 3), &mut pred, 32, 32, 8);
        })
    });
}
