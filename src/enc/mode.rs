use super::ctu::CtuEncoder;
use super::eco::*;
use super::mvp::*;
use super::sad::*;
use super::sbac::*;
use super::skip::*;
use super::EncCtx;
use crate::api::*;
use crate::def::*;
use crate::tbl::*;

use std::cmp::Ordering;

/* neighbors and collocated unit that must be skipped or residual free to stop early */
pub(crate) const EARLY_SKIP_NUM: usize = 4;

/// Per `CuType` switch of the modes a CU evaluation may try.
pub(crate) type ModeMask = [bool; NUM_CU_TYPE];

static INTER_TYPES: [CuType; 7] = [
    CuType::P2Nx2N,
    CuType::P2NxN,
    CuType::PNx2N,
    CuType::P2NxnU,
    CuType::P2NxnD,
    CuType::PnLx2N,
    CuType::PnRx2N,
];

static INTRA_TYPES: [CuType; 4] = [CuType::I2Nx2N, CuType::INxN, CuType::I2Nxn, CuType::Inx2N];

/*****************************************************************************
 * CU trial data
 *****************************************************************************/
/// Decision, reconstruction, levels and entropy state of one CU trial.
#[derive(Clone)]
pub(crate) struct CuData<E> {
    pub(crate) info: CuInfo,
    pub(crate) cost: f64,
    pub(crate) reco: [Vec<pel>; N_C],
    pub(crate) coef: [Vec<i16>; N_C],
    pub(crate) nnz: [u16; 6],
    pub(crate) luma_dims: (usize, usize),
    pub(crate) chroma_dims: (usize, usize),
    /* estimator after the CU */
    pub(crate) sbac: E,
}

impl<E: EntropyEstimator> CuData<E> {
    pub(crate) fn new(log2_size: usize, sbac: E) -> Self {
        let n = 1 << (log2_size << 1);
        CuData {
            info: CuInfo::default(),
            cost: MAX_COST,
            reco: [vec![0; n], vec![0; n >> 2], vec![0; n >> 2]],
            coef: [vec![0; n], vec![0; n >> 2], vec![0; n >> 2]],
            nnz: [0; 6],
            luma_dims: (log2_size, log2_size),
            chroma_dims: (log2_size - 1, log2_size - 1),
            sbac,
        }
    }

    /* coded block pattern from the level counts */
    pub(crate) fn update_cbp(&mut self) {
        let mut cbp = 0;
        for i in 0..self.info.num_luma_tb() {
            if self.nnz[i] != 0 {
                cbp |= 1 << i;
            }
        }
        if self.nnz[4] != 0 {
            cbp |= CBP_CB;
        }
        if self.nnz[5] != 0 {
            cbp |= CBP_CR;
        }
        self.info.cbp = cbp;
    }
}

/*****************************************************************************
 * residual coding
 *****************************************************************************/
/// Codes one w x h transform block of plane `c` at absolute (px, py).
/// Levels go to `coef`, the reconstruction to `reco`.
pub(crate) fn code_tb(
    ctx: &EncCtx<'_>,
    c: usize,
    px: usize,
    py: usize,
    pred: &[pel],
    s_pred: usize,
    log2_w: usize,
    log2_h: usize,
    intra: bool,
    zero: bool,
    coef: &mut [i16],
    reco: &mut [pel],
    s_reco: usize,
) -> u16 {
    let fp = ctx.fp;
    let w = 1 << log2_w;
    let h = 1 << log2_h;
    let bd = fp.bit_depth;
    let qp = if c == Y_C { fp.qp } else { fp.qp_c[c - 1] };
    let coef = &mut coef[..w * h];

    let nnz = if zero {
        coef.fill(0);
        0
    } else {
        let (org, s_org) = ctx.org_block(c, px, py);
        evce_diff_16b(w, h, org, s_org, pred, s_pred, coef);
        ctx.tq.tq(coef, log2_w, log2_h, qp, intra, bd)
    };

    if nnz > 0 {
        let mut resi = coef.to_vec();
        ctx.tq.itdq(&mut resi, log2_w, log2_h, qp, bd);
        let max = (1i32 << bd) - 1;
        for j in 0..h {
            for i in 0..w {
                let v = pred[j * s_pred + i] as i32 + resi[j * w + i] as i32;
                reco[j * s_reco + i] = v.max(0).min(max) as pel;
            }
        }
    } else {
        for j in 0..h {
            reco[j * s_reco..j * s_reco + w].copy_from_slice(&pred[j * s_pred..j * s_pred + w]);
        }
    }
    nnz as u16
}

/* luma of a CU with one or four square transform blocks */
fn code_luma<E>(ctx: &EncCtx<'_>, pred: &[pel], split: TuSplit, intra: bool, zero: bool, data: &mut CuData<E>) {
    let x = data.info.x as usize;
    let y = data.info.y as usize;
    let log2_size = data.info.log2_size as usize;
    let size = 1 << log2_size;
    let log2_tb = if split == TuSplit::TU_QUAD_SPLIT {
        log2_size - 1
    } else {
        log2_size
    };
    let tb = 1 << log2_tb;
    let num = if split == TuSplit::TU_QUAD_SPLIT { 4 } else { 1 };

    data.info.tu_split = split;
    data.nnz[..4].copy_from_slice(&[0; 4]);
    for k in 0..num {
        let ox = (k & 1) * tb;
        let oy = (k >> 1) * tb;
        let o = oy * size + ox;
        data.nnz[k] = code_tb(
            ctx,
            Y_C,
            x + ox,
            y + oy,
            &pred[o..],
            size,
            log2_tb,
            log2_tb,
            intra,
            zero,
            &mut data.coef[Y_C][k * tb * tb..],
            &mut data.reco[Y_C][o..],
            size,
        );
    }
    data.luma_dims = ctx.tq.coef_dims(log2_tb, log2_tb);
}

/// One transform block per chroma component.
pub(crate) fn code_chroma<E>(ctx: &EncCtx<'_>, pred: &[Vec<pel>; N_C], intra: bool, zero: bool, data: &mut CuData<E>) {
    let x = data.info.x as usize >> 1;
    let y = data.info.y as usize >> 1;
    let log2 = data.info.log2_size as usize - 1;
    let s = 1 << log2;
    for c in U_C..N_C {
        data.nnz[3 + c] = code_tb(
            ctx,
            c,
            x,
            y,
            &pred[c],
            s,
            log2,
            log2,
            intra,
            zero,
            &mut data.coef[c],
            &mut data.reco[c],
            s,
        );
    }
    data.chroma_dims = ctx.tq.coef_dims(log2, log2);
}

/* split when one quadrant holds more than half of the prediction error */
fn one_depth_split(ctx: &EncCtx<'_>, pred: &[pel], x: usize, y: usize, log2_size: usize) -> TuSplit {
    let size = 1 << log2_size;
    let half = size >> 1;
    let (org, s_org) = ctx.org_block(Y_C, x, y);
    let mut q = [0u64; 4];
    for k in 0..4 {
        let o = (k >> 1) * half * size + (k & 1) * half;
        let oo = (k >> 1) * half * s_org + (k & 1) * half;
        q[k] = evce_ssd_16b(half, half, &org[oo..], s_org, &pred[o..], size);
    }
    let total: u64 = q.iter().sum();
    let max = q.iter().copied().max().unwrap_or(0);
    if max * 2 > total {
        TuSplit::TU_QUAD_SPLIT
    } else {
        TuSplit::TU_NO_SPLIT
    }
}

/// Bits and distortion of a coded trial; the estimator of `data` ends after the CU.
pub(crate) fn finish_cost<E: EntropyEstimator>(
    ctx: &EncCtx<'_>,
    sctx: &CuSyntaxCtx,
    entry: &E,
    data: &mut CuData<E>,
) -> f64 {
    let fp = ctx.fp;
    data.sbac.clone_from(entry);
    evce_eco_cu_info(&mut data.sbac, &data.info, sctx);
    let view = CoefView {
        coef: [&data.coef[Y_C], &data.coef[U_C], &data.coef[V_C]],
        luma_dims: data.luma_dims,
        chroma_dims: data.chroma_dims,
        nnz: data.nnz,
    };
    evce_eco_coef(&mut data.sbac, &data.info, &view);
    let bits = data.sbac.bits() - entry.bits();

    let x = data.info.x as usize;
    let y = data.info.y as usize;
    let size = data.info.size();
    let (org, s_org) = ctx.org_block(Y_C, x, y);
    let dist_y = evce_ssd_16b(size, size, org, s_org, &data.reco[Y_C], size);
    let mut dist_c = 0;
    for c in U_C..N_C {
        let (org, s_org) = ctx.org_block(c, x >> 1, y >> 1);
        dist_c += evce_ssd_16b(size >> 1, size >> 1, org, s_org, &data.reco[c], size >> 1);
    }

    data.cost = dist_y as f64
        + ctx.cfg.chroma_weight * dist_c as f64
        + fp.lambda * bits as f64 / (1 << BIT_FRAC_SHIFT) as f64;
    data.cost
}

/// Codes the residual of the prediction in `pred` under the transform split
/// policy and returns the cost of the trial.
pub(crate) fn rdo_residual<E: EntropyEstimator>(
    ctx: &EncCtx<'_>,
    sctx: &CuSyntaxCtx,
    entry: &E,
    pred: &[Vec<pel>; N_C],
    data: &mut CuData<E>,
    intra: bool,
    zero: bool,
) -> f64 {
    let x = data.info.x as usize;
    let y = data.info.y as usize;
    let log2_size = data.info.log2_size as usize;

    code_chroma(ctx, pred, intra, zero, data);

    let first = if zero {
        TuSplit::TU_NO_SPLIT
    } else {
        match ctx.cfg.tu_split_policy {
            TuSplitPolicy::TryBoth => TuSplit::TU_NO_SPLIT,
            TuSplitPolicy::OneDepth => one_depth_split(ctx, &pred[Y_C], x, y, log2_size),
        }
    };
    code_luma(ctx, &pred[Y_C], first, intra, zero, data);
    data.update_cbp();
    let cost = finish_cost(ctx, sctx, entry, data);

    if zero || ctx.cfg.tu_split_policy != TuSplitPolicy::TryBoth || data.info.cbp & CBP_LUMA == 0 {
        return cost;
    }

    let saved = (
        data.reco[Y_C].clone(),
        data.coef[Y_C].clone(),
        data.nnz,
        data.luma_dims,
        data.info.cbp,
        data.sbac.clone(),
    );
    code_luma(ctx, &pred[Y_C], TuSplit::TU_QUAD_SPLIT, intra, false, data);
    data.update_cbp();
    let cost_split = finish_cost(ctx, sctx, entry, data);
    if cost_split < cost {
        return cost_split;
    }

    let (reco, coef, nnz, dims, cbp, sbac) = saved;
    data.reco[Y_C] = reco;
    data.coef[Y_C] = coef;
    data.nnz = nnz;
    data.luma_dims = dims;
    data.info.cbp = cbp;
    data.info.tu_split = TuSplit::TU_NO_SPLIT;
    data.sbac = sbac;
    data.cost = cost;
    cost
}

/*****************************************************************************
 * mode decision
 *****************************************************************************/
impl<E: EntropyEstimator> CtuEncoder<E> {
    /* moves the trial of a level into the best slot when strictly cheaper */
    pub(crate) fn keep_if_better(&mut self, level: usize) -> bool {
        if self.temp[level].cost < self.best[level].cost {
            std::mem::swap(&mut self.best[level], &mut self.temp[level]);
            true
        } else {
            false
        }
    }

    pub(crate) fn syntax_ctx(&self, ctx: &EncCtx<'_>, nb: &NeighborCtx) -> CuSyntaxCtx {
        let skipped = [NB_A, NB_B]
            .iter()
            .filter(|&&i| nb.nb[i].map_or(false, |u| u.is_skip()))
            .count();
        CuSyntaxCtx {
            slice_type: ctx.fp.slice_type,
            num_refp: ctx.fp.num_refp,
            num_skip_idx: num_skip_idx(ctx),
            ctx_skip: skipped as u8,
            amp: ctx.cfg.enable_amp,
            sdip: ctx.cfg.enable_sdip,
            mpm: [[IntraPredDir::IPD_DC, IntraPredDir::IPD_VER]; 4],
        }
    }

    /// Neighbors (left, top, top-right, top-left) and the collocated unit
    /// that are skipped or coded without residual.
    pub(crate) fn skip_neighborhood(&self, ctx: &EncCtx<'_>, x: usize, y: usize, size: usize) -> usize {
        let (xi, yi) = (x as i32, y as i32);
        let spatial = [(xi - 1, yi), (xi, yi - 1), (xi + size as i32, yi - 1), (xi - 1, yi - 1)];
        let mut n = spatial
            .iter()
            .filter_map(|&(px, py)| self.win.unit(px, py))
            .filter(|u| u.is_skip() || u.is_zero_resi())
            .count();

        let col_list = if ctx.fp.slice_type.is_b() { REFP_1 } else { REFP_0 };
        if let Some(col) = ctx.refs[col_list].first() {
            if let Some(u) = col.map_unit(x >> MIN_UNIT_LOG2, y >> MIN_UNIT_LOG2) {
                if u.is_coded() && (u.is_skip() || u.is_zero_resi()) {
                    n += 1;
                }
            }
        }
        n
    }

    /* all available neighbors at least as large and coded as skip or 2Nx2N */
    fn simple_neighborhood(&self, nb: &NeighborCtx, log2_size: usize) -> bool {
        let avail: Vec<&MapUnit> = [NB_A, NB_B].iter().filter_map(|&i| nb.nb[i].as_ref()).collect();
        !avail.is_empty()
            && avail.iter().all(|u| {
                u.log2_size as usize >= log2_size && (u.cu_type == CuType::SKIP || u.cu_type == CuType::P2Nx2N)
            })
    }

    /// Modes worth trying for the CU at (x, y): the ones the slice allows at
    /// this size, narrowed by the neighborhood when enabled.
    pub(crate) fn mode_mask(&self, ctx: &EncCtx<'_>, x: usize, y: usize, log2_size: usize) -> ModeMask {
        let cfg = ctx.cfg;
        let size = 1 << log2_size;
        let mut mask = ctx.fp.valid_cu_type[log2_size - MIN_CU_LOG2];
        if cfg.heuristics.complexity_mask && self.simple_neighborhood(&self.win.neighbors(x, y, size, size), log2_size) {
            for t in INTER_TYPES.iter().chain(INTRA_TYPES.iter()) {
                if t.is_amp() || t.has_pu_tu() {
                    mask[*t as usize] = false;
                }
            }
        }
        mask
    }

    /* cost of the level winner if it beats the budget */
    fn within_budget(&self, level: usize, budget: f64) -> f64 {
        let cost = self.best[level].cost;
        if cost < budget {
            cost
        } else {
            MAX_COST
        }
    }

    /// Tries the modes of `available` the slice allows for the CU at (x, y).
    /// The winner stays in the best slot of its level; returns its cost, or
    /// `MAX_COST` when nothing could be coded below `budget`.
    pub(crate) fn evaluate_cu(
        &mut self,
        ctx: &EncCtx<'_>,
        x: usize,
        y: usize,
        log2_size: usize,
        entry: &E,
        available: &ModeMask,
        budget: f64,
    ) -> f64 {
        let cfg = ctx.cfg;
        let fp = ctx.fp;
        let level = log2_size - MIN_CU_LOG2;
        let size = 1 << log2_size;

        self.best[level].cost = MAX_COST;
        let nb = self.win.neighbors(x, y, size, size);
        let sctx = self.syntax_ctx(ctx, &nb);
        let mut mask = fp.valid_cu_type[level];
        for (m, a) in mask.iter_mut().zip(available.iter()) {
            *m &= *a;
        }

        if !fp.slice_type.is_intra() {
            if mask[CuType::SKIP as usize] {
                let cands = resolve_skip_candidates(ctx, &nb, x, y, size);
                for c in select_skip_candidates(ctx, cands, x, y, size, cfg.skip_rdo_num).iter() {
                    self.try_skip(ctx, &sctx, entry, x, y, log2_size, c);
                }
                if cfg.heuristics.early_skip
                    && self.best[level].cost < MAX_COST
                    && self.best[level].info.is_skip()
                    && self.skip_neighborhood(ctx, x, y, size) >= EARLY_SKIP_NUM
                {
                    return self.within_budget(level, budget);
                }
            }

            let mut best_inter: Option<(CuType, f64)> = None;
            for &t in INTER_TYPES.iter() {
                if !mask[t as usize] {
                    continue;
                }
                if cfg.heuristics.amp_bypass && t.is_amp() {
                    if best_inter.map(|(b, _)| b) != t.amp_sibling() {
                        continue;
                    }
                }
                let cost = self.analyze_inter(ctx, &sctx, entry, x, y, log2_size, t);
                if best_inter.map_or(true, |(_, c)| cost < c) {
                    best_inter = Some((t, cost));
                }
            }
        }

        for &t in INTRA_TYPES.iter() {
            if mask[t as usize] {
                self.analyze_intra(ctx, &sctx, entry, x, y, log2_size, t);
            }
        }

        self.within_budget(level, budget)
    }
}

/// Ranks `(cost, item)` pairs ascending; ties keep their order.
pub(crate) fn sort_by_cost<T>(v: &mut Vec<(f64, T)>) {
    v.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::enc::ctu::CtuEncoder;
    use crate::enc::test_util::*;
    use crate::picman::test::random_frame;
    use crate::picman::RefPic;
    use pretty_assertions::assert_eq;

    const ALL_MODES: ModeMask = [true; NUM_CU_TYPE];

    fn prepared(fx: &Fixture) -> CtuEncoder<SbacEstimator> {
        let pic = RefPic::new(0, fx.cfg.width, fx.cfg.height, 8, [vec![], vec![]]);
        let band = pic.empty_band(0);
        let mut enc = CtuEncoder::new(fx.cfg.width, fx.cfg.height, &SbacEstimator::new());
        enc.win.load(0, 0, &band, &pic, [None, None, None]);
        enc
    }

    #[test]
    fn evaluation_is_deterministic() {
        let org = random_frame(64, 64, 41);
        let refp = random_frame(64, 64, 42);
        let mut cfg = EncoderConfig::new(64, 64);
        cfg.search_range = 8;
        let fx = Fixture::new(cfg, SliceType::ST_P, &org, &[&refp], &[]);
        let ctx = fx.ctx(1);
        let e = SbacEstimator::new();

        let mut a = prepared(&fx);
        let ca = a.evaluate_cu(&ctx, 16, 16, 4, &e, &ALL_MODES, MAX_COST);
        let mut b = prepared(&fx);
        let cb = b.evaluate_cu(&ctx, 16, 16, 4, &e, &ALL_MODES, MAX_COST);
        assert_eq!(ca, cb);
        assert_eq!(a.best[1].info, b.best[1].info);
        assert_eq!(a.best[1].reco, b.best[1].reco);
    }

    #[test]
    fn static_block_is_skipped() {
        let org = random_frame(64, 64, 43);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_P, &org, &[&org], &[]);
        let ctx = fx.ctx(1);
        let e = SbacEstimator::new();
        let mut enc = prepared(&fx);
        let cost = enc.evaluate_cu(&ctx, 0, 0, 6, &e, &ALL_MODES, MAX_COST);

        let best = &enc.best[3];
        assert!(best.info.is_skip());
        assert_eq!(best.info.pu[0].mv[REFP_0], Mv::ZERO);
        /* no distortion, the cost is the rate alone */
        let bits = best.sbac.bits() - e.bits();
        let rate = fx.fp.lambda * bits as f64 / (1 << BIT_FRAC_SHIFT) as f64;
        assert!((cost - rate).abs() < 1e-6);
    }

    #[test]
    fn intra_slice_uses_intra_modes_only() {
        let org = random_frame(64, 64, 44);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_I, &org, &[], &[]);
        let ctx = fx.ctx(1);
        let mut enc = prepared(&fx);
        let cost = enc.evaluate_cu(&ctx, 8, 8, 3, &SbacEstimator::new(), &ALL_MODES, MAX_COST);
        assert!(cost < MAX_COST);
        assert!(enc.best[0].info.cu_type.is_intra());
    }

    #[test]
    fn available_modes_restrict_the_search() {
        let org = random_frame(64, 64, 47);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_P, &org, &[&org], &[]);
        let ctx = fx.ctx(1);
        let mut only_intra = [false; NUM_CU_TYPE];
        only_intra[CuType::I2Nx2N as usize] = true;
        let mut enc = prepared(&fx);
        let cost = enc.evaluate_cu(&ctx, 16, 16, 4, &SbacEstimator::new(), &only_intra, MAX_COST);
        assert!(cost < MAX_COST);
        assert_eq!(enc.best[1].info.cu_type, CuType::I2Nx2N);

        /* a mode the slice does not allow stays off */
        let mut skip_only = [false; NUM_CU_TYPE];
        skip_only[CuType::SKIP as usize] = true;
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_I, &org, &[], &[]);
        let mut enc = prepared(&fx);
        assert_eq!(enc.evaluate_cu(&fx.ctx(1), 16, 16, 4, &SbacEstimator::new(), &skip_only, MAX_COST), MAX_COST);
    }

    #[test]
    fn cost_budget_rejects_expensive_winner() {
        let org = random_frame(64, 64, 48);
        let refp = random_frame(64, 64, 49);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_P, &org, &[&refp], &[]);
        let ctx = fx.ctx(1);
        let e = SbacEstimator::new();
        let mut enc = prepared(&fx);
        let cost = enc.evaluate_cu(&ctx, 16, 16, 4, &e, &ALL_MODES, MAX_COST);
        assert!(cost < MAX_COST);
        let mut enc = prepared(&fx);
        assert_eq!(enc.evaluate_cu(&ctx, 16, 16, 4, &e, &ALL_MODES, cost), MAX_COST);
        let mut enc = prepared(&fx);
        assert_eq!(enc.evaluate_cu(&ctx, 16, 16, 4, &e, &ALL_MODES, cost + 1.0), cost);
    }

    #[test]
    fn quad_split_keeps_cheaper_residual() {
        let org = random_frame(64, 64, 46);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_I, &org, &[], &[]);
        let ctx = fx.ctx(1);
        let e = SbacEstimator::new();
        let sctx = CuSyntaxCtx {
            slice_type: SliceType::ST_I,
            num_refp: [0, 0],
            num_skip_idx: 0,
            ctx_skip: 0,
            amp: true,
            sdip: true,
            mpm: [[IntraPredDir::IPD_DC, IntraPredDir::IPD_VER]; 4],
        };
        let flat = 1 << (ctx.fp.bit_depth - 1);
        let pred = [vec![flat; 256], vec![flat; 64], vec![flat; 64]];
        let mut data = CuData::new(4, e.clone());
        data.info = CuInfo {
            x: 16,
            y: 16,
            log2_size: 4,
            cu_type: CuType::I2Nx2N,
            qp: ctx.fp.qp,
            ..Default::default()
        };
        let cost = rdo_residual(&ctx, &sctx, &e, &pred, &mut data, true, false);

        let mut single = CuData::new(4, e.clone());
        single.info = data.info.clone();
        code_chroma(&ctx, &pred, true, false, &mut single);
        code_luma(&ctx, &pred[Y_C], TuSplit::TU_NO_SPLIT, true, false, &mut single);
        single.update_cbp();
        let cost_single = finish_cost(&ctx, &sctx, &e, &mut single);
        assert!(cost <= cost_single);
        assert_eq!(cost, data.cost);
    }
}
