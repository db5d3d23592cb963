use super::sbac::*;
use super::tbl::*;
use crate::api::*;
use crate::def::*;

/// Everything the CU syntax depends on besides the CU itself.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CuSyntaxCtx {
    pub(crate) slice_type: SliceType,
    pub(crate) num_refp: [usize; REFP_NUM],
    /* coded values of the skip index */
    pub(crate) num_skip_idx: usize,
    /* left/up neighbors that are skipped */
    pub(crate) ctx_skip: u8,
    pub(crate) amp: bool,
    pub(crate) sdip: bool,
    pub(crate) mpm: [[IntraPredDir; 2]; 4],
}

pub(crate) fn evce_eco_split_flag<E: EntropyEstimator>(e: &mut E, split: bool, ctx: u8) {
    e.encode_bin(split as u32, CtxId::SplitFlag(ctx)); /* split_cu_flag */
}

pub(crate) fn evce_eco_skip_flag<E: EntropyEstimator>(e: &mut E, flag: bool, ctx: u8) {
    e.encode_bin(flag as u32, CtxId::SkipFlag(ctx));
}

pub(crate) fn evce_eco_skip_idx<E: EntropyEstimator>(e: &mut E, idx: usize, num_idx: usize) {
    e.write_truncate_unary_sym(idx as u32, CtxId::SkipIdx, num_idx as u32);
}

pub(crate) fn evce_eco_direct_flag<E: EntropyEstimator>(e: &mut E, flag: bool) {
    e.encode_bin(flag as u32, CtxId::DirectFlag);
}

pub(crate) fn evce_eco_pred_mode<E: EntropyEstimator>(e: &mut E, intra: bool) {
    e.encode_bin(intra as u32, CtxId::PredMode);
}

pub(crate) fn evce_eco_part_size<E: EntropyEstimator>(
    e: &mut E,
    cu_type: CuType,
    log2_size: usize,
    amp: bool,
    sdip: bool,
) {
    use CuType::*;
    match cu_type {
        SKIP => {}
        P2Nx2N => e.encode_bin(1, CtxId::PartSize(0)),
        P2NxN | PNx2N | P2NxnU | P2NxnD | PnLx2N | PnRx2N => {
            e.encode_bin(0, CtxId::PartSize(0));
            let hor = match cu_type {
                P2NxN | P2NxnU | P2NxnD => 1,
                _ => 0,
            };
            e.encode_bin(hor, CtxId::PartSize(1));
            if amp && log2_size > MIN_CU_LOG2 {
                e.encode_bin((!cu_type.is_amp()) as u32, CtxId::PartSize(2));
                if cu_type.is_amp() {
                    /* first or second quarter */
                    let second = (cu_type == P2NxnD || cu_type == PnRx2N) as u32;
                    e.encode_bin_ep(second, 1);
                }
            }
        }
        I2Nx2N | INxN | I2Nxn | Inx2N => {
            if log2_size == MIN_CU_LOG2 {
                e.encode_bin((cu_type == I2Nx2N) as u32, CtxId::PartSize(3));
            } else if sdip && log2_size < MAX_CU_LOG2 {
                e.encode_bin((cu_type == I2Nx2N) as u32, CtxId::PartSize(3));
                if cu_type != I2Nx2N {
                    e.encode_bin((cu_type == I2Nxn) as u32, CtxId::PartSize(1));
                }
            }
        }
    }
}

pub(crate) fn evce_eco_inter_dir<E: EntropyEstimator>(e: &mut E, dir: PredDir, slice_type: SliceType) {
    match slice_type {
        SliceType::ST_B => {
            let idx = match dir {
                PredDir::PRED_FWD => 0,
                PredDir::PRED_BWD => 1,
                PredDir::PRED_SYM => 2,
                _ => 3,
            };
            e.write_truncate_unary_sym(idx, CtxId::InterDir, 4);
        }
        SliceType::ST_F => {
            e.encode_bin((dir == PredDir::PRED_DUAL) as u32, CtxId::InterDir(0));
        }
        _ => {}
    }
}

pub(crate) fn evce_eco_refi<E: EntropyEstimator>(e: &mut E, num_refp: usize, refi: i8) {
    if num_refp > 1 {
        if refi == 0 {
            e.encode_bin(0, CtxId::Refi(0));
        } else {
            e.encode_bin(1, CtxId::Refi(0));
            if num_refp > 2 {
                for i in 2..num_refp {
                    let bin = if i as i8 == (refi + 1) { 0 } else { 1 };
                    if i == 2 {
                        e.encode_bin(bin, CtxId::Refi(1));
                    } else {
                        e.encode_bin_ep(bin, 1);
                    }
                    if bin == 0 {
                        break;
                    }
                }
            }
        }
    }
}

fn evce_eco_abs_mvd<E: EntropyEstimator>(e: &mut E, sym: u32, ctx: u8) {
    let val = sym;

    let mut nn = (val + 1) >> 1;
    let mut len_i = 0;
    while len_i < 16 && nn != 0 {
        nn >>= 1;
        len_i += 1;
    }

    let info = val + 1 - (1 << len_i);
    let code = (1 << len_i) | ((info) & ((1 << len_i) - 1));

    let len_c = (len_i << 1) + 1;

    for i in 0..len_c {
        let bin = (code >> (len_c - 1 - i)) & 0x01;
        if i <= 1 {
            e.encode_bin(bin, CtxId::Mvd(ctx)); /* use one context model for two bins */
        } else {
            e.encode_bin_ep(bin, 1);
        }
    }
}

pub(crate) fn evce_eco_mvd<E: EntropyEstimator>(e: &mut E, mvd: Mv) {
    for (ctx, &v) in [mvd.x, mvd.y].iter().enumerate() {
        let mv = (v as i32).abs() as u32;
        evce_eco_abs_mvd(e, mv, ctx as u8);
        if mv != 0 {
            e.encode_bin_ep((v < 0) as u32, 1);
        }
    }
}

pub(crate) fn evce_eco_intra_dir<E: EntropyEstimator>(e: &mut E, ipm: IntraPredDir, mpm: &[IntraPredDir; 2]) {
    if let Some(idx) = mpm.iter().position(|&m| m == ipm) {
        e.encode_bin(1, CtxId::IntraDir(0));
        e.encode_bin(idx as u32, CtxId::IntraDir(1));
    } else {
        e.encode_bin(0, CtxId::IntraDir(0));
        /* rank among the modes that are not most probable */
        let rem = IPD_ALL
            .iter()
            .filter(|&&m| !mpm.contains(&m))
            .position(|&m| m == ipm)
            .unwrap_or(0);
        e.encode_bin_ep(rem as u32, 2);
    }
}

/* chroma candidates after the luma-derived one */
pub(crate) static IPD_CHROMA: [IntraPredDir; 3] = [
    IntraPredDir::IPD_DC,
    IntraPredDir::IPD_HOR,
    IntraPredDir::IPD_VER,
];

pub(crate) fn evce_eco_intra_dir_c<E: EntropyEstimator>(e: &mut E, ipm_c: IntraPredDir, ipm_l: IntraPredDir) {
    let idx = if ipm_c == ipm_l {
        0
    } else {
        IPD_CHROMA.iter().position(|&m| m == ipm_c).map_or(0, |i| i + 1)
    };
    e.encode_bin((idx != 0) as u32, CtxId::IntraDirC(0));
    if idx != 0 {
        e.write_truncate_unary_sym(idx as u32 - 1, |i| CtxId::IntraDirC(1 + i), 3);
    }
}

pub(crate) fn evce_eco_tu_split<E: EntropyEstimator>(e: &mut E, split: TuSplit) {
    e.encode_bin((split == TuSplit::TU_QUAD_SPLIT) as u32, CtxId::TuSplit);
}

pub(crate) fn evce_eco_cbf<E: EntropyEstimator>(e: &mut E, cbp: u8, num_luma_tb: usize) {
    e.encode_bin((cbp & CBP_CB != 0) as u32, CtxId::Cbf(1));
    e.encode_bin((cbp & CBP_CR != 0) as u32, CtxId::Cbf(2));
    for i in 0..num_luma_tb {
        e.encode_bin(((cbp >> i) & 1) as u32, CtxId::Cbf(0));
    }
}

fn ctx_run_luma(i: u8) -> CtxId {
    CtxId::Run(i)
}
fn ctx_run_chroma(i: u8) -> CtxId {
    CtxId::Run(2 + i)
}
fn ctx_level_luma(i: u8) -> CtxId {
    CtxId::Level(i)
}
fn ctx_level_chroma(i: u8) -> CtxId {
    CtxId::Level(2 + i)
}

pub(crate) fn evce_eco_run_length_cc<E: EntropyEstimator>(
    e: &mut E,
    coef: &[i16],
    log2_w: usize,
    log2_h: usize,
    mut num_sig: usize,
    ch_type: usize,
) {
    let scanp = &evc_scan_tbl[log2_w - 1][log2_h - 1];
    let num_coeff = 1usize << (log2_w + log2_h);
    let mut run = 0;
    let luma = ch_type == Y_C;
    let ctx_run: fn(u8) -> CtxId = if luma { ctx_run_luma } else { ctx_run_chroma };
    let ctx_level: fn(u8) -> CtxId = if luma { ctx_level_luma } else { ctx_level_chroma };

    for scan_pos in 0..num_coeff {
        let coef_cur = coef[scanp[scan_pos] as usize];
        if coef_cur != 0 {
            let level = (coef_cur as i32).abs() as u32;
            let sign = if coef_cur > 0 { 0 } else { 1 };

            /* Run coding */
            e.write_unary_sym(run, ctx_run, 2);

            /* Level coding */
            e.write_unary_sym(level - 1, ctx_level, 2);

            /* Sign coding */
            e.encode_bin_ep(sign, 1);

            if scan_pos == num_coeff - 1 {
                break;
            }

            run = 0;
            num_sig -= 1;

            /* Last flag coding */
            let last_flag = num_sig == 0;
            e.encode_bin(last_flag as u32, CtxId::Last((ch_type != Y_C) as u8));

            if last_flag {
                break;
            }
        } else {
            run += 1;
        }
    }
}

/// Quantized levels of a CU with their coded sizes.
pub(crate) struct CoefView<'a> {
    pub(crate) coef: [&'a [i16]; N_C],
    /* coded log2 size of one luma and one chroma block */
    pub(crate) luma_dims: (usize, usize),
    pub(crate) chroma_dims: (usize, usize),
    /* luma blocks 0..4, Cb, Cr */
    pub(crate) nnz: [u16; 6],
}

/// Header, prediction and transform-tree syntax of a CU.
pub(crate) fn evce_eco_cu_info<E: EntropyEstimator>(e: &mut E, cu: &CuInfo, sctx: &CuSyntaxCtx) {
    let log2_size = cu.log2_size as usize;
    let intra_slice = sctx.slice_type.is_intra();

    if !intra_slice {
        evce_eco_skip_flag(e, cu.is_skip(), sctx.ctx_skip);
        if cu.cu_type == CuType::SKIP {
            if !cu.is_skip() {
                evce_eco_direct_flag(e, true);
            }
            let idx = cu.skip_mode.map_or(0, |m| m.code_index());
            evce_eco_skip_idx(e, idx, sctx.num_skip_idx);
            return;
        }
        evce_eco_direct_flag(e, false);
        evce_eco_pred_mode(e, cu.cu_type.is_intra());
    }

    evce_eco_part_size(e, cu.cu_type, log2_size, sctx.amp, sctx.sdip);

    if cu.cu_type.is_intra() {
        for i in 0..cu.num_parts() {
            evce_eco_intra_dir(e, cu.ipm[i], &sctx.mpm[i]);
        }
        evce_eco_intra_dir_c(e, cu.ipm_c, cu.ipm[0]);
        return;
    }

    for pu in cu.pu[..cu.num_parts()].iter() {
        evce_eco_inter_dir(e, pu.dir, sctx.slice_type);
        match pu.dir {
            PredDir::PRED_FWD | PredDir::PRED_SYM | PredDir::PRED_DUAL => {
                evce_eco_refi(e, sctx.num_refp[REFP_0], pu.refi[REFP_0]);
                evce_eco_mvd(e, pu.mvd[REFP_0]);
            }
            PredDir::PRED_BWD => {
                evce_eco_refi(e, sctx.num_refp[REFP_1], pu.refi[REFP_1]);
                evce_eco_mvd(e, pu.mvd[REFP_1]);
            }
            PredDir::PRED_BID => {
                evce_eco_refi(e, sctx.num_refp[REFP_0], pu.refi[REFP_0]);
                evce_eco_mvd(e, pu.mvd[REFP_0]);
                evce_eco_refi(e, sctx.num_refp[REFP_1], pu.refi[REFP_1]);
                evce_eco_mvd(e, pu.mvd[REFP_1]);
            }
        }
    }
}

/// Coded block flags, transform split and levels.
pub(crate) fn evce_eco_coef<E: EntropyEstimator>(e: &mut E, cu: &CuInfo, coef: &CoefView<'_>) {
    if cu.is_skip() {
        return;
    }
    /* inter CUs signal a root flag, direct CUs always carry residual */
    let root = cu.cu_type.is_inter() && cu.cu_type != CuType::SKIP;
    let num_luma_tb = cu.num_luma_tb();

    if root {
        e.encode_bin((cu.cbp != 0) as u32, CtxId::Cbf(3));
        if cu.cbp == 0 {
            return;
        }
    }
    if !cu.cu_type.has_pu_tu() {
        evce_eco_tu_split(e, cu.tu_split);
    }
    evce_eco_cbf(e, cu.cbp, num_luma_tb);

    let (lw, lh) = coef.luma_dims;
    let luma_len = 1 << (lw + lh);
    for i in 0..num_luma_tb {
        if coef.nnz[i] != 0 {
            let blk = &coef.coef[Y_C][i * luma_len..(i + 1) * luma_len];
            evce_eco_run_length_cc(e, blk, lw, lh, coef.nnz[i] as usize, Y_C);
        }
    }
    let (cw, ch) = coef.chroma_dims;
    for c in U_C..N_C {
        let n = coef.nnz[3 + c];
        if n != 0 {
            evce_eco_run_length_cc(e, coef.coef[c], cw, ch, n as usize, c);
        }
    }
}
