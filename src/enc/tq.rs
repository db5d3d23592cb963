use crate::def::*;
use crate::itdq::*;
use crate::tbl::*;

const FAST_RDOQ_INTRA_RND_OFST: i64 = 171;
const FAST_RDOQ_INTER_RND_OFST: i64 = 85;

/// Residual transform and quantization service.
pub trait TransformQuant: Send + Sync {
    /// Transforms and quantizes a `1 << log2_w` x `1 << log2_h` residual in
    /// place; returns the number of non-zero levels.
    fn tq(
        &self,
        coef: &mut [i16],
        log2_w: usize,
        log2_h: usize,
        qp: u8,
        is_intra: bool,
        bit_depth: usize,
    ) -> usize;

    /// Dequantizes and inverse transforms the levels written by `tq`.
    fn itdq(&self, coef: &mut [i16], log2_w: usize, log2_h: usize, qp: u8, bit_depth: usize);

    /// Size of the level array `tq` produces for a block.
    fn coef_dims(&self, log2_w: usize, log2_h: usize) -> (usize, usize) {
        (log2_w, log2_h)
    }
}

/// Integer DCT with flat quantization. 64x64 blocks keep the LL band of a
/// one level Haar decomposition and transform it at 32x32.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTq;

/* one forward stage: `line` rows of `1 << log2_size` samples, output transposed */
fn tx_pb(src: &[i32], dst: &mut [i32], log2_size: usize, line: usize, shift: i32) {
    let n = 1 << log2_size;
    let tm = &evc_tbl_tm[log2_size - 1];
    let add = if shift <= 0 { 0 } else { 1i64 << (shift - 1) };

    for j in 0..line {
        let s = &src[j * n..j * n + n];
        for k in 0..n {
            let t = &tm[k * n..k * n + n];
            let sum: i64 = t.iter().zip(s.iter()).map(|(&a, &b)| a as i64 * b as i64).sum();
            dst[k * line + j] = ((sum + add) >> shift.max(0)) as i32;
        }
    }
}

pub(crate) fn evce_trans(coef: &mut [i16], log2_w: usize, log2_h: usize, bit_depth: usize) {
    let w = 1 << log2_w;
    let h = 1 << log2_h;
    let mut src = [0i32; MAX_TR_DIM];
    let mut tb = [0i32; MAX_TR_DIM];
    for i in 0..w * h {
        src[i] = coef[i] as i32;
    }

    tx_pb(&src, &mut tb, log2_w, h, log2_w as i32 + bit_depth as i32 - 9);
    tx_pb(&tb, &mut src, log2_h, w, log2_h as i32 + 6);

    for i in 0..w * h {
        coef[i] = src[i].max(-32768).min(32767) as i16;
    }
}

fn evce_quant_nnz(coef: &mut [i16], log2_w: usize, log2_h: usize, qp: u8, is_intra: bool, bit_depth: usize) -> usize {
    let mut nnz = 0;
    let log2_size = (log2_w + log2_h) >> 1;
    let ns_shift = if ((log2_w + log2_h) & 1) != 0 { 7 } else { 0 };
    let ns_scale: i64 = if ((log2_w + log2_h) & 1) != 0 { 181 } else { 1 };
    let tr_shift = MAX_TX_DYNAMIC_RANGE - bit_depth as i32 - log2_size as i32 + ns_shift;
    let shift = QUANT_SHIFT + tr_shift + (qp as i32 / 6);
    let scale = evc_tbl_quant_scale[qp as usize % 6] as i64;
    let offset = if is_intra {
        FAST_RDOQ_INTRA_RND_OFST
    } else {
        FAST_RDOQ_INTER_RND_OFST
    } << (shift - 9);

    for v in &mut coef[..1 << (log2_w + log2_h)] {
        let sign = *v < 0;
        let lev = (*v as i64).abs() * scale * ns_scale;
        let lev = ((lev + offset) >> shift).min(32767) as i16;
        *v = if sign { -lev } else { lev };
        if lev != 0 {
            nnz += 1;
        }
    }

    nnz
}

/* LL band of a one level Haar split, written to the front of the buffer */
fn wavelet_ll(coef: &mut [i16], size: usize) {
    let half = size >> 1;
    let mut ll = vec![0i16; half * half];
    for y in 0..half {
        for x in 0..half {
            let a = coef[(2 * y) * size + 2 * x] as i32;
            let b = coef[(2 * y) * size + 2 * x + 1] as i32;
            let c = coef[(2 * y + 1) * size + 2 * x] as i32;
            let d = coef[(2 * y + 1) * size + 2 * x + 1] as i32;
            ll[y * half + x] = ((a + b + c + d + 2) >> 2) as i16;
        }
    }
    coef[..half * half].copy_from_slice(&ll);
}

fn wavelet_expand(coef: &mut [i16], size: usize) {
    let half = size >> 1;
    let ll: Vec<i16> = coef[..half * half].to_vec();
    for y in 0..size {
        for x in 0..size {
            coef[y * size + x] = ll[(y >> 1) * half + (x >> 1)];
        }
    }
}

impl TransformQuant for DefaultTq {
    fn tq(
        &self,
        coef: &mut [i16],
        log2_w: usize,
        log2_h: usize,
        qp: u8,
        is_intra: bool,
        bit_depth: usize,
    ) -> usize {
        let (tw, th) = self.coef_dims(log2_w, log2_h);
        if (tw, th) != (log2_w, log2_h) {
            wavelet_ll(coef, 1 << log2_w);
        }
        evce_trans(coef, tw, th, bit_depth);
        evce_quant_nnz(coef, tw, th, qp, is_intra, bit_depth)
    }

    fn itdq(&self, coef: &mut [i16], log2_w: usize, log2_h: usize, qp: u8, bit_depth: usize) {
        let (tw, th) = self.coef_dims(log2_w, log2_h);
        evc_itdq(coef, tw, th, qp, bit_depth);
        if (tw, th) != (log2_w, log2_h) {
            wavelet_expand(coef, 1 << log2_w);
        }
    }

    fn coef_dims(&self, log2_w: usize, log2_h: usize) -> (usize, usize) {
        if log2_w == MAX_TR_LOG2 && log2_h == MAX_TR_LOG2 {
            (MAX_TR_LOG2 - 1, MAX_TR_LOG2 - 1)
        } else {
            (log2_w, log2_h)
        }
    }
}
