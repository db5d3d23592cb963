use super::ctu::CtuEncoder;
use super::eco::*;
use super::me::*;
use super::mode::*;
use super::mvp::*;
use super::sad::*;
use super::sbac::*;
use super::skip::*;
use super::util::*;
use super::EncCtx;
use crate::api::*;
use crate::def::*;
use crate::mc::*;
use crate::picman::*;
use crate::tbl::*;
use crate::tracer::*;
use crate::util::*;

/* alternating refinements of a bi-predicted pair */
const BI_ITER: usize = 4;

/*****************************************************************************
 * motion compensation of a motion tuple
 *****************************************************************************/
/// (list, reference index, mv) of each hypothesis a prediction direction uses.
pub(crate) fn hypotheses(dir: PredDir, refi: [i8; REFP_NUM], mv: [Mv; REFP_NUM]) -> [Option<(usize, i8, Mv)>; 2] {
    match dir {
        PredDir::PRED_FWD => [Some((REFP_0, refi[REFP_0], mv[REFP_0])), None],
        PredDir::PRED_BWD => [Some((REFP_1, refi[REFP_1], mv[REFP_1])), None],
        PredDir::PRED_SYM | PredDir::PRED_BID => [
            Some((REFP_0, refi[REFP_0], mv[REFP_0])),
            Some((REFP_1, refi[REFP_1], mv[REFP_1])),
        ],
        /* both hypotheses from list 0 */
        PredDir::PRED_DUAL => [
            Some((REFP_0, refi[REFP_0], mv[REFP_0])),
            Some((REFP_0, refi[REFP_1], mv[REFP_1])),
        ],
    }
}

fn hyp_view<'v, 'a>(refs: &'v [Vec<RefView<'a>>; REFP_NUM], lidx: usize, refi: i8) -> Option<&'v RefView<'a>> {
    if REFI_IS_VALID(refi) {
        refs[lidx].get(refi as usize)
    } else {
        None
    }
}

/// Every hypothesis exists and stays inside its legal range.
pub(crate) fn motion_is_legal(
    refs: &[Vec<RefView<'_>>; REFP_NUM],
    x: i32,
    y: i32,
    w: usize,
    h: usize,
    dir: PredDir,
    refi: [i8; REFP_NUM],
    mv: [Mv; REFP_NUM],
) -> bool {
    hypotheses(dir, refi, mv).iter().flatten().all(|&(l, r, m)| {
        hyp_view(refs, l, r).map_or(false, |v| v.legal_range(w, h).is_legal(x, y, m))
    })
}

/* prediction of plane c of the w x h luma block at (x, y); two hypotheses are averaged */
fn predict_plane(
    refs: &[Vec<RefView<'_>>; REFP_NUM],
    c: usize,
    x: i32,
    y: i32,
    w: usize,
    h: usize,
    dir: PredDir,
    refi: [i8; REFP_NUM],
    mv: [Mv; REFP_NUM],
    pred: &mut [pel],
    tmp: &mut [pel],
) -> bool {
    let mut n = 0;
    for &(l, r, m) in hypotheses(dir, refi, mv).iter().flatten() {
        let view = match hyp_view(refs, l, r) {
            Some(v) if v.legal_range(w, h).is_legal(x, y, m) => v,
            _ => return false,
        };
        let dst: &mut [pel] = if n == 0 { &mut pred[..] } else { &mut tmp[..] };
        if c == Y_C {
            view.pred_l((x << 2) + m.x as i32, (y << 2) + m.y as i32, dst, w, h);
        } else {
            view.pred_c(c, ((x >> 1) << 3) + m.x as i32, ((y >> 1) << 3) + m.y as i32, dst, w >> 1, h >> 1);
        }
        n += 1;
    }
    if n == 2 {
        let len = if c == Y_C { w * h } else { (w >> 1) * (h >> 1) };
        evc_average_16b(pred, tmp, len);
    }
    n > 0
}

pub(crate) fn predict_luma(
    refs: &[Vec<RefView<'_>>; REFP_NUM],
    x: i32,
    y: i32,
    w: usize,
    h: usize,
    dir: PredDir,
    refi: [i8; REFP_NUM],
    mv: [Mv; REFP_NUM],
    pred: &mut [pel],
    tmp: &mut [pel],
) -> bool {
    predict_plane(refs, Y_C, x, y, w, h, dir, refi, mv, pred, tmp)
}

/// Prediction of all PUs of a CU into CU sized buffers.
pub(crate) fn predict_cu(refs: &[Vec<RefView<'_>>; REFP_NUM], info: &CuInfo, pred: &mut [Vec<pel>; N_C]) -> bool {
    let size = info.size();
    let mut buf = vec![0 as pel; MAX_CU_DIM];
    let mut tmp = vec![0 as pel; MAX_CU_DIM];
    for pu in info.pu[..info.num_parts()].iter() {
        let g = pu.geom;
        let (gx, gy, w, h) = (g.x as usize, g.y as usize, g.w as usize, g.h as usize);
        let px = info.x as i32 + gx as i32;
        let py = info.y as i32 + gy as i32;
        for c in 0..N_C {
            if !predict_plane(refs, c, px, py, w, h, pu.dir, pu.refi, pu.mv, &mut buf, &mut tmp) {
                return false;
            }
            let s = c != Y_C;
            let (bw, bh, bx, by, stride) = (w >> s as usize, h >> s as usize, gx >> s as usize, gy >> s as usize, size >> s as usize);
            for j in 0..bh {
                let d = (by + j) * stride + bx;
                pred[c][d..d + bw].copy_from_slice(&buf[j * bw..(j + 1) * bw]);
            }
        }
    }
    true
}

/// Luma SAD of the prediction under the threshold of the CU size.
pub(crate) fn zero_resi(ctx: &EncCtx<'_>, pred: &[pel], x: usize, y: usize, log2_size: usize) -> bool {
    if !ctx.cfg.heuristics.zero_residual {
        return false;
    }
    let fp = ctx.fp;
    let size = 1 << log2_size;
    let (org, s_org) = ctx.org_block(Y_C, x, y);
    let sad = evce_sad_16b(size, size, org, s_org, pred, size);
    let thd = evc_tbl_zero_resi_thd[(fp.qp >> 3) as usize][log2_size - MIN_CU_LOG2] << (fp.bit_depth - 8);
    sad < thd
}

/* unit standing in for an already decided PU of the current CU */
fn pu_unit(cu_type: CuType, log2_size: usize, pu: &PuInfo) -> MapUnit {
    MapUnit {
        flags: MCU_CODED,
        cu_type,
        dir: pu.dir,
        refi: pu.refi,
        mv: pu.mv,
        log2_size: log2_size as u8,
        ..Default::default()
    }
}

#[inline]
fn mvd_of(mv: Mv, mvp: Mv) -> Option<Mv> {
    let dx = mv.x as i32 - mvp.x as i32;
    let dy = mv.y as i32 - mvp.y as i32;
    if dx.abs() <= MAX_MVD && dy.abs() <= MAX_MVD {
        Some(Mv::from_i32(dx, dy))
    } else {
        None
    }
}

/*****************************************************************************
 * inter analysis
 *****************************************************************************/
impl<E: EntropyEstimator> CtuEncoder<E> {
    /// Skip trial of a candidate, then the same motion with residual.
    pub(crate) fn try_skip(
        &mut self,
        ctx: &EncCtx<'_>,
        sctx: &CuSyntaxCtx,
        entry: &E,
        x: usize,
        y: usize,
        log2_size: usize,
        cand: &SkipCand,
    ) {
        let level = log2_size - MIN_CU_LOG2;
        let size = 1 << log2_size;
        let mut info = CuInfo {
            x: x as u16,
            y: y as u16,
            log2_size: log2_size as u8,
            cu_type: CuType::SKIP,
            qp: ctx.fp.qp,
            skip_mode: Some(cand.mode),
            ..Default::default()
        };
        info.pu[0] = PuInfo {
            geom: CuType::SKIP.part_geom(log2_size)[0],
            dir: cand.dir,
            refi: cand.refi,
            mv: cand.mv,
            mvd: [Mv::ZERO; REFP_NUM],
        };
        if !predict_cu(&ctx.refs, &info, &mut self.pred) {
            return;
        }

        {
            let t = &mut self.temp[level];
            t.info = info.clone();
            t.nnz = [0; 6];
            for c in 0..N_C {
                let n = (size * size) >> (2 * (c != Y_C) as usize);
                t.reco[c][..n].copy_from_slice(&self.pred[c][..n]);
            }
            finish_cost(ctx, sctx, entry, t);
        }
        self.keep_if_better(level);

        if zero_resi(ctx, &self.pred[Y_C], x, y, log2_size) {
            return;
        }
        let t = &mut self.temp[level];
        t.info = info;
        rdo_residual(ctx, sctx, entry, &self.pred, t, false, false);
        /* without residual it is the skip already tried */
        if t.info.cbp != 0 {
            self.keep_if_better(level);
        }
    }

    /// Motion search of every PU of `cu_type`, then residual coding.
    pub(crate) fn analyze_inter(
        &mut self,
        ctx: &EncCtx<'_>,
        sctx: &CuSyntaxCtx,
        entry: &E,
        x: usize,
        y: usize,
        log2_size: usize,
        cu_type: CuType,
    ) -> f64 {
        let level = log2_size - MIN_CU_LOG2;
        let size = 1 << log2_size;
        let geom = cu_type.part_geom(log2_size);
        let mut info = CuInfo {
            x: x as u16,
            y: y as u16,
            log2_size: log2_size as u8,
            cu_type,
            qp: ctx.fp.qp,
            ..Default::default()
        };

        for k in 0..cu_type.num_parts() {
            let g = geom[k];
            let (px, py) = (x + g.x as usize, y + g.y as usize);
            let (w, h) = (g.w as usize, g.h as usize);
            let first = info.pu[0];
            let (cx0, cy0) = (x as i32, y as i32);
            let win = &self.win;
            let nb = NeighborCtx::new(px as i32, py as i32, w as i32, h as i32, |qx, qy| {
                let inside = qx >= cx0 && qy >= cy0 && qx < cx0 + size as i32 && qy < cy0 + size as i32;
                if !inside {
                    return win.unit(qx, qy);
                }
                let g0 = first.geom;
                let in_first = k > 0
                    && qx < cx0 + (g0.x + g0.w) as i32
                    && qy < cy0 + (g0.y + g0.h) as i32;
                if in_first {
                    Some(pu_unit(cu_type, log2_size, &first))
                } else {
                    None
                }
            });
            let mut pu = self.search_pu(ctx, &nb, PuShape::of(cu_type, k), px, py, w, h, level);
            pu.geom = g;
            info.pu[k] = pu;
        }

        if !predict_cu(&ctx.refs, &info, &mut self.pred) {
            return MAX_COST;
        }
        let zero = zero_resi(ctx, &self.pred[Y_C], x, y, log2_size);
        let t = &mut self.temp[level];
        t.info = info;
        let cost = rdo_residual(ctx, sctx, entry, &self.pred, t, false, zero);
        self.keep_if_better(level);
        cost
    }

    /* uni searches of every reference, then the pairs the slice allows */
    fn search_pu(
        &mut self,
        ctx: &EncCtx<'_>,
        nb: &NeighborCtx,
        shape: PuShape,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        level: usize,
    ) -> PuInfo {
        let cfg = ctx.cfg;
        let fp = ctx.fp;
        let (org, s_org) = ctx.org_block(Y_C, x, y);
        let mut target = vec![0i16; w * h];
        for j in 0..h {
            for i in 0..w {
                target[j * w + i] = org[j * s_org + i] as i16;
            }
        }
        let (rx, ry) = (x - self.win.x0, y - self.win.y0);
        let lists = if fp.slice_type.is_b() { REFP_NUM } else { 1 };

        let mut uni = [[MeResult::INVALID; MAX_NUM_REF]; REFP_NUM];
        let mut mvp = [[Mv::ZERO; MAX_NUM_REF]; REFP_NUM];
        for lidx in 0..lists {
            for r in 0..fp.num_refp[lidx] {
                let refi = r as i8;
                mvp[lidx][r] = get_motion_predictor(nb, fp, cfg.field_coding, lidx, refi, shape);
                let same = |a: &Mv, b: &Mv| a == b;
                let mut cands = CandList::new();
                for mv in neighbor_mvs(nb, fp, cfg.field_coding, lidx, refi) {
                    cands.push_unique(mv, same);
                }
                if let Some(mv) = self.me_cost.uplayer_mv(level, rx, ry, lidx, refi) {
                    cands.push_unique(mv, same);
                }
                if let Some(mv) = collocated_mv(ctx, x, y, lidx, r) {
                    cands.push_unique(mv, same);
                }
                let cands = cands.into_vec();
                let p = MeParams {
                    target: &target,
                    shift: 0,
                    x: x as i32,
                    y: y as i32,
                    w,
                    h,
                    refp: &ctx.refs[lidx][r],
                    mvp: mvp[lidx][r],
                    cands: &cands,
                    lambda_mv: fp.lambda_mv,
                    num_refp: fp.num_refp[lidx],
                    refi,
                    extra_bits: 0,
                    search_range: cfg.search_range as i32,
                    me_level: cfg.me_level,
                    subpel_satd: cfg.subpel_satd,
                    level,
                    seeds: self.me_cost.seeds(level, rx, ry, w, h, lidx, refi),
                };
                let res = motion_search(&p, cfg.me_method);
                if res.is_valid() {
                    self.me_cost.store(level, rx, ry, w, h, lidx, refi, res.cost, res.mv);
                }
                uni[lidx][r] = res;
            }
        }

        let best_ref = |lidx: usize| -> Option<usize> {
            (0..fp.num_refp[lidx])
                .filter(|&r| uni[lidx][r].is_valid())
                .min_by_key(|&r| uni[lidx][r].cost)
        };

        let mut best = PuInfo {
            refi: [REFI_INVALID; REFP_NUM],
            ..Default::default()
        };
        let mut best_cost = MAX_DISTORTION;
        let mut consider = |cost: u32, pu: PuInfo| {
            if cost < best_cost {
                best_cost = cost;
                best = pu;
            }
        };

        let r0 = best_ref(REFP_0);
        let r1 = if lists > 1 { best_ref(REFP_1) } else { None };
        if let Some(r) = r0 {
            let mv = uni[REFP_0][r].mv;
            consider(
                uni[REFP_0][r].cost,
                PuInfo {
                    dir: PredDir::PRED_FWD,
                    refi: [r as i8, REFI_INVALID],
                    mv: [mv, Mv::ZERO],
                    mvd: [mv - mvp[REFP_0][r], Mv::ZERO],
                    ..Default::default()
                },
            );
        }
        if let Some(r) = r1 {
            let mv = uni[REFP_1][r].mv;
            consider(
                uni[REFP_1][r].cost,
                PuInfo {
                    dir: PredDir::PRED_BWD,
                    refi: [REFI_INVALID, r as i8],
                    mv: [Mv::ZERO, mv],
                    mvd: [Mv::ZERO, mv - mvp[REFP_1][r]],
                    ..Default::default()
                },
            );
        }

        let pair = PairSearch {
            ctx,
            org,
            s_org,
            x: x as i32,
            y: y as i32,
            w,
            h,
        };
        if let Some(r0) = r0 {
            if fp.slice_type.is_b() && fp.num_refp[REFP_1] > 0 {
                if let Some((cost, pu)) = pair.symmetric(uni[REFP_0][r0].mv, r0, mvp[REFP_0][r0]) {
                    consider(cost, pu);
                }
                if let Some(r1) = r1 {
                    let start = [uni[REFP_0][r0].mv, uni[REFP_1][r1].mv];
                    let mvps = [mvp[REFP_0][r0], mvp[REFP_1][r1]];
                    if let Some((cost, pu)) = pair.bidirectional(start, [r0, r1], mvps) {
                        consider(cost, pu);
                    }
                }
            }
            if fp.slice_type == SliceType::ST_F && fp.num_refp[REFP_0] > 1 {
                if let Some((cost, pu)) = pair.dual(uni[REFP_0][r0].mv, r0, mvp[REFP_0][r0]) {
                    consider(cost, pu);
                }
            }
        }

        TRACE_ME(x, y, w, h, 0, best.refi[REFP_0], mvp[REFP_0][0], best.mv[REFP_0], best_cost);
        best
    }
}

/* joint searches of one PU */
struct PairSearch<'c, 'a> {
    ctx: &'c EncCtx<'a>,
    org: &'a [pel],
    s_org: usize,
    x: i32,
    y: i32,
    w: usize,
    h: usize,
}

impl<'c, 'a> PairSearch<'c, 'a> {
    fn metric<A: Copy + Into<i32>>(&self, target: &[A], s_target: usize, pred: &[pel]) -> u32 {
        if self.ctx.cfg.subpel_satd {
            evce_satd_16b(self.w, self.h, target, s_target, pred, self.w)
        } else {
            evce_sad_16b(self.w, self.h, target, s_target, pred, self.w)
        }
    }

    /* distortion of a two hypothesis prediction plus the coded mv bits */
    fn pair_cost(&self, dir: PredDir, refi: [i8; REFP_NUM], mv: [Mv; REFP_NUM], bits: u32, buf: &mut [pel], tmp: &mut [pel]) -> u32 {
        if !predict_luma(&self.ctx.refs, self.x, self.y, self.w, self.h, dir, refi, mv, buf, tmp) {
            return MAX_DISTORTION;
        }
        self.metric(self.org, self.s_org, buf)
            .saturating_add(MV_COST(self.ctx.fp.lambda_mv, bits))
    }

    /* list 0 mv searched, the second mv derived by `derive` */
    fn derived<F>(&self, dir: PredDir, start: Mv, refi: [i8; REFP_NUM], mvp: Mv, derive: F) -> Option<(u32, PuInfo)>
    where
        F: Fn(Mv) -> Mv,
    {
        let fp = self.ctx.fp;
        let n = self.w * self.h;
        let mut buf = vec![0 as pel; n];
        let mut tmp = vec![0 as pel; n];
        let (mv, cost) = joint_refine(start, self.ctx.cfg.me_level, |mv0| match mvd_of(mv0, mvp) {
            Some(mvd) => {
                let bits = get_mv_bits(mvd.x as i32, mvd.y as i32, fp.num_refp[REFP_0], refi[REFP_0]);
                self.pair_cost(dir, refi, [mv0, derive(mv0)], bits, &mut buf, &mut tmp)
            }
            None => MAX_DISTORTION,
        })?;
        let mvd = mvd_of(mv, mvp)?;
        Some((
            cost,
            PuInfo {
                dir,
                refi,
                mv: [mv, derive(mv)],
                mvd: [mvd, Mv::ZERO],
                ..Default::default()
            },
        ))
    }

    /* list 1 mirrors list 0 reference 0 by distance */
    fn symmetric(&self, start: Mv, r0: usize, mvp: Mv) -> Option<(u32, PuInfo)> {
        let fp = self.ctx.fp;
        let d0 = fp.dist[REFP_0][r0];
        let d1 = fp.dist[REFP_1][0];
        self.derived(PredDir::PRED_SYM, start, [r0 as i8, 0], mvp, |mv0| evc_scale_mv(mv0, d1, d0))
    }

    /* second list 0 reference, mv scaled from the first */
    fn dual(&self, start: Mv, r0: usize, mvp: Mv) -> Option<(u32, PuInfo)> {
        let fp = self.ctx.fp;
        let r1 = if r0 == 0 { 1 } else { 0 };
        let d0 = fp.dist[REFP_0][r0];
        let d1 = fp.dist[REFP_0][r1];
        self.derived(PredDir::PRED_DUAL, start, [r0 as i8, r1 as i8], mvp, |mv0| evc_scale_mv(mv0, d1, d0))
    }

    /* alternating refinement of each list against 2 * org - other prediction */
    fn bidirectional(&self, start: [Mv; REFP_NUM], refs: [usize; REFP_NUM], mvp: [Mv; REFP_NUM]) -> Option<(u32, PuInfo)> {
        let ctx = self.ctx;
        let fp = ctx.fp;
        let n = self.w * self.h;
        let refi = [refs[REFP_0] as i8, refs[REFP_1] as i8];
        let mut mv = start;
        let mut pred_other = vec![0 as pel; n];
        let mut buf = vec![0 as pel; n];
        let mut org_bi = vec![0i16; n];
        let bits_of = |l: usize, m: Mv| {
            mvd_of(m, mvp[l]).map(|d| get_mv_bits(d.x as i32, d.y as i32, fp.num_refp[l], refi[l]))
        };

        let mut unchanged = 0;
        for it in 0..BI_ITER {
            let l = it & 1;
            let o = l ^ 1;
            let view_o = &ctx.refs[o][refs[o]];
            if !view_o.legal_range(self.w, self.h).is_legal(self.x, self.y, mv[o]) {
                return None;
            }
            view_o.pred_l((self.x << 2) + mv[o].x as i32, (self.y << 2) + mv[o].y as i32, &mut pred_other, self.w, self.h);
            get_org_bi(&mut org_bi, self.org, self.s_org, &pred_other, self.w, self.h);
            let bits_o = bits_of(o, mv[o])?;

            let view = &ctx.refs[l][refs[l]];
            let legal = view.legal_range(self.w, self.h);
            let refined = joint_refine(mv[l], ctx.cfg.me_level, |m| {
                if !legal.is_legal(self.x, self.y, m) {
                    return MAX_DISTORTION;
                }
                let bits = match bits_of(l, m) {
                    Some(b) => b,
                    None => return MAX_DISTORTION,
                };
                view.pred_l((self.x << 2) + m.x as i32, (self.y << 2) + m.y as i32, &mut buf, self.w, self.h);
                (self.metric(&org_bi, self.w, &buf) >> 1).saturating_add(MV_COST(fp.lambda_mv, bits + bits_o))
            });
            match refined {
                Some((m, _)) if m != mv[l] => {
                    mv[l] = m;
                    unchanged = 0;
                }
                _ => {
                    unchanged += 1;
                    if unchanged >= 2 {
                        break;
                    }
                }
            }
        }

        let mvd0 = mvd_of(mv[REFP_0], mvp[REFP_0])?;
        let mvd1 = mvd_of(mv[REFP_1], mvp[REFP_1])?;
        let bits = bits_of(REFP_0, mv[REFP_0])? + bits_of(REFP_1, mv[REFP_1])?;
        let mut tmp = vec![0 as pel; n];
        let cost = self.pair_cost(PredDir::PRED_BID, refi, mv, bits, &mut buf, &mut tmp);
        if cost == MAX_DISTORTION {
            return None;
        }
        Some((
            cost,
            PuInfo {
                dir: PredDir::PRED_BID,
                refi,
                mv,
                mvd: [mvd0, mvd1],
                ..Default::default()
            },
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::enc::test_util::*;
    use crate::picman::test::random_frame;

    fn shifted(src: &Frame, dx: usize) -> Frame {
        let mut f = src.clone();
        for c in 0..N_C {
            let d = dx >> (c != Y_C) as usize;
            let p = &src.planes[c];
            for y in 0..p.height {
                let row: Vec<pel> = (0..p.width).map(|x| p.p((x + d).min(p.width - 1), y)).collect();
                f.planes[c].row_mut(y).copy_from_slice(&row);
            }
        }
        f.pad();
        f
    }

    #[test]
    fn dual_hypothesis_is_the_average() {
        let a = random_frame(64, 64, 51);
        let b = random_frame(64, 64, 52);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_F, &a, &[&a, &b], &[]);
        let ctx = fx.ctx(1);
        let mut pred = vec![0; 64];
        let mut tmp = vec![0; 64];
        let ok = predict_luma(
            &ctx.refs,
            8,
            8,
            8,
            8,
            PredDir::PRED_DUAL,
            [0, 1],
            [Mv::ZERO, Mv::ZERO],
            &mut pred,
            &mut tmp,
        );
        assert!(ok);
        for j in 0..8 {
            for i in 0..8 {
                let avg = (a.planes[Y_C].p(8 + i, 8 + j) as u32 + b.planes[Y_C].p(8 + i, 8 + j) as u32 + 1) >> 1;
                assert_eq!(pred[j * 8 + i] as u32, avg);
            }
        }
    }

    #[test]
    fn illegal_motion_is_rejected() {
        let a = random_frame(64, 64, 53);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_P, &a, &[&a], &[]);
        let ctx = fx.ctx(1);
        let far = Mv::new(-4 * 200, 0);
        assert!(!motion_is_legal(&ctx.refs, 0, 0, 16, 16, PredDir::PRED_FWD, [0, REFI_INVALID], [far, Mv::ZERO]));
        assert!(!motion_is_legal(&ctx.refs, 0, 0, 16, 16, PredDir::PRED_BWD, [REFI_INVALID, 0], [Mv::ZERO; 2]));
        assert!(motion_is_legal(&ctx.refs, 0, 0, 16, 16, PredDir::PRED_FWD, [0, REFI_INVALID], [Mv::ZERO; 2]));
    }

    #[test]
    fn zero_residual_threshold_follows_qp() {
        let a = random_frame(64, 64, 54);
        let pred: Vec<pel> = (0..32 * 32).map(|i| a.planes[Y_C].p(i % 32, i / 32) + 1).collect();
        let mut cfg = EncoderConfig::new(64, 64);
        cfg.qp = 51;
        let fx = Fixture::new(cfg, SliceType::ST_P, &a, &[&a], &[]);
        assert!(zero_resi(&fx.ctx(1), &pred, 0, 0, 5));
        cfg.qp = 0;
        let fx = Fixture::new(cfg, SliceType::ST_P, &a, &[&a], &[]);
        assert!(!zero_resi(&fx.ctx(1), &pred, 0, 0, 5));
    }

    #[test]
    fn pan_is_found_by_inter_search() {
        let refp = random_frame(64, 64, 55);
        let org = shifted(&refp, 4);
        let mut cfg = EncoderConfig::new(64, 64);
        cfg.search_range = 8;
        cfg.me_method = MeMethod::Full;
        let fx = Fixture::new(cfg, SliceType::ST_P, &org, &[&refp], &[]);
        let ctx = fx.ctx(1);
        let mut enc = CtuEncoder::new(64, 64, &SbacEstimator::new());
        let pic = RefPic::new(0, 64, 64, 8, [vec![], vec![]]);
        enc.win.load(0, 0, &pic.empty_band(0), &pic, [None, None, None]);
        let e = SbacEstimator::new();
        let sctx = enc.syntax_ctx(&ctx, &NeighborCtx::default());
        let cost = enc.analyze_inter(&ctx, &sctx, &e, 16, 16, 4, CuType::P2Nx2N);
        assert!(cost < MAX_COST);
        let pu = enc.best[1].info.pu[0];
        assert_eq!(pu.dir, PredDir::PRED_FWD);
        assert_eq!(pu.mv[REFP_0], Mv::new(16, 0));
    }

    #[test]
    fn b_pu_considers_pairs() {
        let a = random_frame(64, 64, 56);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_B, &a, &[&a], &[&a]);
        let ctx = fx.ctx(1);
        let mut enc = CtuEncoder::new(64, 64, &SbacEstimator::new());
        let pic = RefPic::new(0, 64, 64, 8, [vec![], vec![]]);
        enc.win.load(0, 0, &pic.empty_band(0), &pic, [None, None, None]);
        let pu = enc.search_pu(&ctx, &NeighborCtx::default(), PuShape::Square, 16, 16, 16, 16, 1);
        /* identical references: every direction predicts perfectly, the cheapest syntax wins */
        assert!(REFI_IS_VALID(pu.refi[REFP_0]) || REFI_IS_VALID(pu.refi[REFP_1]));
        for l in 0..REFP_NUM {
            assert_eq!(pu.mv[l], Mv::ZERO);
        }
    }
}
