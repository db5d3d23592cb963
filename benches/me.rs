use criterion::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use std::sync::Arc;

use avsrdo::api::*;

criterion_group! {
    name = me;
    config = Criterion::default().sample_size(10);
    targets = bench_encode_p_frame
}

/* a textured frame and the same frame panned by (dx, dy) */
fn frames(width: usize, height: usize, dx: usize, dy: usize) -> (Frame, Frame) {
    let mut ra = ChaChaRng::from_seed([3; 32]);
    let mut src = Frame::new(width + dx, height + dy);
    for p in src.planes.iter_mut() {
        for y in 0..p.height {
            for v in p.row_mut(y) {
                *v = ra.gen::<u8>() as u16;
            }
        }
    }
    let mut a = Frame::new(width, height);
    let mut b = Frame::new(width, height);
    for c in 0..3 {
        let s = (c != 0) as usize;
        for y in 0..a.planes[c].height {
            let w = a.planes[c].width;
            a.planes[c].row_mut(y).copy_from_slice(&src.planes[c].row(y)[..w]);
            b.planes[c]
                .row_mut(y)
                .copy_from_slice(&src.planes[c].row(y + (dy >> s))[dx >> s..(dx >> s) + w]);
        }
    }
    a.pad();
    b.pad();
    (a, b)
}

fn bench_encode_p_frame(c: &mut Criterion) {
    let (refp, org) = frames(256, 128, 6, 2);
    let mut refs = RefLists::new();
    refs.push(0, Arc::new(RefPic::from_frame(0, &refp, 8, None, Default::default())))
        .unwrap();

    let mut group = c.benchmark_group("encode_p_frame");
    for &method in [MeMethod::Full, MeMethod::Diamond, MeMethod::Hex, MeMethod::Tz, MeMethod::Umh].iter() {
        let mut cfg = EncoderConfig::new(256, 128);
        cfg.me_method = method;
        cfg.search_range = 16;
        let enc = FrameEncoder::new(cfg).unwrap();
        group.bench_function(format!("{:?}", method), |b| {
            b.iter(|| enc.encode_frame(&org, SliceType::ST_P, 1, &refs).unwrap())
        });
    }
    group.finish();
}
