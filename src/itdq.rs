use super::def::*;
use super::tbl::*;
use super::util::*;

const ITX_SHIFT1: i32 = 7; /* shift after 1st IT stage */

const MAX_TX_VAL: i32 = 32767;
const MIN_TX_VAL: i32 = -32768;

lazy_static! {
    /* DCT-II matrices for 2x2 .. 64x64, indexed by log2 size - 1 */
    pub(crate) static ref evc_tbl_tm: [Box<[i16]>; MAX_TR_LOG2] = [
        evc_init_multi_tbl(2),
        evc_init_multi_tbl(4),
        evc_init_multi_tbl(8),
        evc_init_multi_tbl(16),
        evc_init_multi_tbl(32),
        evc_init_multi_tbl(64),
    ];
}

#[inline]
fn ITX_CLIP(x: i64) -> i32 {
    if x < MIN_TX_VAL as i64 {
        MIN_TX_VAL
    } else if x > MAX_TX_VAL as i64 {
        MAX_TX_VAL
    } else {
        x as i32
    }
}

/* one inverse stage: `line` columns of `1 << log2_size` coefficients, output transposed */
fn itx_pb(src: &[i32], dst: &mut [i32], log2_size: usize, line: usize, shift: i32) {
    let n = 1 << log2_size;
    let tm = &evc_tbl_tm[log2_size - 1];
    let add = if shift == 0 { 0 } else { 1i64 << (shift - 1) };

    for j in 0..line {
        for i in 0..n {
            let mut sum = 0i64;
            for k in 0..n {
                sum += tm[k * n + i] as i64 * src[k * line + j] as i64;
            }
            dst[j * n + i] = ITX_CLIP((sum + add) >> shift);
        }
    }
}

pub(crate) fn evc_itrans(coef: &mut [i16], log2_w: usize, log2_h: usize, bit_depth: usize) {
    let w = 1 << log2_w;
    let h = 1 << log2_h;
    let mut src = [0i32; MAX_TR_DIM];
    let mut tb = [0i32; MAX_TR_DIM];
    for i in 0..w * h {
        src[i] = coef[i] as i32;
    }

    itx_pb(&src, &mut tb, log2_h, w, ITX_SHIFT1);
    itx_pb(&tb, &mut src, log2_w, h, 20 - bit_depth as i32);

    for i in 0..w * h {
        coef[i] = src[i] as i16;
    }
}

fn evc_dquant(coef: &mut [i16], log2_w: usize, log2_h: usize, scale: i32, offset: i64, shift: i32) {
    let ns_scale: i64 = if (log2_w + log2_h) & 1 != 0 { 181 } else { 1 };
    for i in 0..1 << (log2_w + log2_h) {
        let lev = (coef[i] as i64 * (scale as i64 * ns_scale) + offset) >> shift;
        coef[i] = EVC_CLIP3(-32768, 32767, lev) as i16;
    }
}

/// Dequantizes and inverse transforms a block in place.
pub(crate) fn evc_itdq(coef: &mut [i16], log2_w: usize, log2_h: usize, qp: u8, bit_depth: usize) {
    let log2_size = (log2_w + log2_h) >> 1;
    let ns_shift = if (log2_w + log2_h) & 1 != 0 { 8 } else { 0 };
    let scale = evc_tbl_dq_scale[qp as usize % 6] << (qp / 6);

    let tr_shift = MAX_TX_DYNAMIC_RANGE - bit_depth as i32 - log2_size as i32;
    let shift = QUANT_IQUANT_SHIFT - QUANT_SHIFT - tr_shift + ns_shift;
    let offset = if shift <= 0 { 0 } else { 1i64 << (shift - 1) };

    evc_dquant(coef, log2_w, log2_h, scale, offset, shift.max(0));
    evc_itrans(coef, log2_w, log2_h, bit_depth);
}
