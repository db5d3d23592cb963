use crate::api::frame::*;
use crate::def::*;

const MAC_SFT_N0: i32 = 6;
const MAC_ADD_N0: i32 = (1 << 5);
const MAC_SFT_0N: i32 = MAC_SFT_N0;
const MAC_ADD_0N: i32 = MAC_ADD_N0;

/* intermediate rows of the separable path */
const MC_IBUF_PAD_L: usize = 5;
const MC_IBUF_PAD_C: usize = 3;

#[rustfmt::skip]
static tbl_mc_l_coeff: [[i32; 6]; 4] = [
    [ 0,   0, 64,  0,   0, 0 ],
    [ 1,  -5, 52, 20,  -5, 1 ],
    [ 2, -10, 40, 40, -10, 2 ],
    [ 1,  -5, 20, 52,  -5, 1 ],
];

#[rustfmt::skip]
static tbl_mc_c_coeff: [[i32; 4]; 8] = [
    [  0, 64,  0,  0 ],
    [ -2, 58, 10, -2 ],
    [ -4, 52, 20, -4 ],
    [ -6, 46, 30, -6 ],
    [ -8, 40, 40, -8 ],
    [ -6, 30, 46, -6 ],
    [ -4, 20, 52, -4 ],
    [ -2, 10, 58, -2 ],
];

#[inline(always)]
pub const fn round_shift(value: i32, add: i32, shift: i32) -> i32 {
    (value + add) >> shift
}

#[inline(always)]
fn run_filter_h(src: &[pel], filter: &[i32]) -> i32 {
    src.iter()
        .zip(filter.iter())
        .map(|(&s, &f)| s as i32 * f)
        .sum()
}

#[inline(always)]
fn run_filter_v(rows: &[&[pel]], x: usize, filter: &[i32]) -> i32 {
    rows.iter()
        .zip(filter.iter())
        .map(|(r, &f)| r[x] as i32 * f)
        .sum()
}

#[inline(always)]
fn nn_shifts(bit_depth: usize) -> (i32, i32, i32, i32) {
    let s1 = bit_depth as i32 - 8;
    let a1 = if s1 > 0 { 1 << (s1 - 1) } else { 0 };
    let s2 = 12 - s1;
    let a2 = 1 << (s2 - 1);
    (a1, s1, a2, s2)
}

fn mc_copy<S: RowSource>(src: &S, x0: isize, y0: isize, pred: &mut [pel], w: usize, h: usize) {
    for (y, dst) in pred.chunks_mut(w).take(h).enumerate() {
        dst.copy_from_slice(&src.row_at(x0, y0 + y as isize)[..w]);
    }
}

fn mc_n0<S: RowSource>(
    src: &S,
    x0: isize,
    y0: isize,
    filter: &[i32],
    pred: &mut [pel],
    w: usize,
    h: usize,
    max_val: i32,
) {
    let taps = filter.len();
    let lead = (taps / 2 - 1) as isize;
    for (y, dst) in pred.chunks_mut(w).take(h).enumerate() {
        let row = src.row_at(x0 - lead, y0 + y as isize);
        for x in 0..w {
            dst[x] = round_shift(run_filter_h(&row[x..x + taps], filter), MAC_ADD_N0, MAC_SFT_N0)
                .max(0)
                .min(max_val) as pel;
        }
    }
}

fn mc_0n<S: RowSource>(
    src: &S,
    x0: isize,
    y0: isize,
    filter: &[i32],
    pred: &mut [pel],
    w: usize,
    h: usize,
    max_val: i32,
) {
    let taps = filter.len();
    let lead = (taps / 2 - 1) as isize;
    let mut rows: [&[pel]; 6] = [&[]; 6];
    for (y, dst) in pred.chunks_mut(w).take(h).enumerate() {
        for k in 0..taps {
            rows[k] = src.row_at(x0, y0 + y as isize - lead + k as isize);
        }
        for x in 0..w {
            dst[x] = round_shift(run_filter_v(&rows[..taps], x, filter), MAC_ADD_0N, MAC_SFT_0N)
                .max(0)
                .min(max_val) as pel;
        }
    }
}

fn mc_nn<S: RowSource>(
    src: &S,
    x0: isize,
    y0: isize,
    filter_h: &[i32],
    filter_v: &[i32],
    pred: &mut [pel],
    w: usize,
    h: usize,
    bit_depth: usize,
) {
    let mut intermediate = Aligned::new([0i32; (MAX_CU_SIZE + MC_IBUF_PAD_L) * MAX_CU_SIZE]);
    let tmp = &mut intermediate.data;
    let taps = filter_h.len();
    let lead = (taps / 2 - 1) as isize;
    let (a1, s1, a2, s2) = nn_shifts(bit_depth);
    let max_val = (1 << bit_depth) - 1;

    for r in 0..h + taps - 1 {
        let row = src.row_at(x0 - lead, y0 - lead + r as isize);
        for x in 0..w {
            tmp[r * w + x] = round_shift(run_filter_h(&row[x..x + taps], filter_h), a1, s1);
        }
    }

    for (y, dst) in pred.chunks_mut(w).take(h).enumerate() {
        for x in 0..w {
            let mut sum = 0;
            for k in 0..taps {
                sum += tmp[(y + k) * w + x] * filter_v[k];
            }
            dst[x] = round_shift(sum, a2, s2).max(0).min(max_val) as pel;
        }
    }
}

/// Luma prediction at the absolute quarter-pel position (gmv_x, gmv_y).
pub(crate) fn evc_mc_l<S: RowSource>(
    src: &S,
    gmv_x: i32,
    gmv_y: i32,
    pred: &mut [pel],
    w: usize,
    h: usize,
    bit_depth: usize,
) {
    debug_assert!(w <= MAX_CU_SIZE && h <= MAX_CU_SIZE);
    let dx = (gmv_x & 3) as usize;
    let dy = (gmv_y & 3) as usize;
    let x0 = (gmv_x >> 2) as isize;
    let y0 = (gmv_y >> 2) as isize;
    let max_val = (1 << bit_depth) - 1;

    match (dx != 0, dy != 0) {
        (false, false) => mc_copy(src, x0, y0, pred, w, h),
        (true, false) => mc_n0(src, x0, y0, &tbl_mc_l_coeff[dx], pred, w, h, max_val),
        (false, true) => mc_0n(src, x0, y0, &tbl_mc_l_coeff[dy], pred, w, h, max_val),
        (true, true) => mc_nn(
            src,
            x0,
            y0,
            &tbl_mc_l_coeff[dx],
            &tbl_mc_l_coeff[dy],
            pred,
            w,
            h,
            bit_depth,
        ),
    }
}

/// Chroma prediction at the absolute 1/8-pel position (gmv_x, gmv_y).
pub(crate) fn evc_mc_c<S: RowSource>(
    src: &S,
    gmv_x: i32,
    gmv_y: i32,
    pred: &mut [pel],
    w: usize,
    h: usize,
    bit_depth: usize,
) {
    let dx = (gmv_x & 7) as usize;
    let dy = (gmv_y & 7) as usize;
    let x0 = (gmv_x >> 3) as isize;
    let y0 = (gmv_y >> 3) as isize;
    let max_val = (1 << bit_depth) - 1;

    match (dx != 0, dy != 0) {
        (false, false) => mc_copy(src, x0, y0, pred, w, h),
        (true, false) => mc_n0(src, x0, y0, &tbl_mc_c_coeff[dx], pred, w, h, max_val),
        (false, true) => mc_0n(src, x0, y0, &tbl_mc_c_coeff[dy], pred, w, h, max_val),
        (true, true) => mc_nn(
            src,
            x0,
            y0,
            &tbl_mc_c_coeff[dx],
            &tbl_mc_c_coeff[dy],
            pred,
            w,
            h,
            bit_depth,
        ),
    }
}

/* average of two hypotheses, in place on the first */
pub(crate) fn evc_average_16b(pred0: &mut [pel], pred1: &[pel], len: usize) {
    for (a, &b) in pred0[..len].iter_mut().zip(pred1[..len].iter()) {
        *a = ((*a as u32 + b as u32 + 1) >> 1) as pel;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaChaRng;

    fn random_plane(w: usize, h: usize, seed: u8) -> Plane {
        let mut ra = ChaChaRng::from_seed([seed; 32]);
        let mut p = Plane::new(w, h, PIC_PAD_SIZE_L);
        for y in 0..h {
            for v in p.row_mut(y) {
                *v = ra.gen::<u8>() as pel;
            }
        }
        p.pad();
        p
    }

    #[test]
    fn integer_position_copies() {
        let p = random_plane(32, 32, 1);
        let mut pred = vec![0; 8 * 8];
        evc_mc_l(&p, 4 << 2, 3 << 2, &mut pred, 8, 8, 8);
        for y in 0..8 {
            assert_eq!(&pred[y * 8..y * 8 + 8], &p.row(3 + y)[4..12]);
        }
    }

    #[test]
    fn flat_plane_interpolates_flat() {
        let mut p = Plane::new(16, 16, PIC_PAD_SIZE_L);
        for y in 0..16 {
            for v in p.row_mut(y) {
                *v = 77;
            }
        }
        p.pad();
        let mut pred = vec![0; 8 * 8];
        for &(fx, fy) in &[(1, 0), (0, 2), (3, 1), (2, 2)] {
            evc_mc_l(&p, (2 << 2) + fx, (2 << 2) + fy, &mut pred, 8, 8, 8);
            assert!(pred.iter().all(|&v| v == 77));
        }
        for &(fx, fy) in &[(1, 0), (0, 5), (3, 7)] {
            evc_mc_c(&p, (2 << 3) + fx, (2 << 3) + fy, &mut pred, 4, 4, 8);
            assert!(pred[..16].iter().all(|&v| v == 77));
        }
    }

    #[test]
    fn half_pel_horizontal_matches_filter() {
        let p = random_plane(32, 32, 2);
        let mut pred = vec![0; 4 * 4];
        evc_mc_l(&p, (8 << 2) + 2, 8 << 2, &mut pred, 4, 4, 8);
        for y in 0..4 {
            for x in 0..4 {
                let r = p.row(8 + y);
                let s: i32 = (0..6)
                    .map(|k| r[8 + x + k - 2] as i32 * tbl_mc_l_coeff[2][k])
                    .sum();
                let v = ((s + 32) >> 6).max(0).min(255);
                assert_eq!(pred[y * 4 + x] as i32, v);
            }
        }
    }

    #[test]
    fn average_rounds_up() {
        let mut a = vec![1, 2, 3];
        evc_average_16b(&mut a, &[2, 2, 6], 3);
        assert_eq!(a, vec![2, 2, 5]);
    }
}
