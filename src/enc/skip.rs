use super::mvp::*;
use super::pinter::*;
use super::sad::*;
use super::util::*;
use super::EncCtx;
use crate::api::*;
use crate::def::*;
use crate::picman::*;
use crate::tbl::*;
use crate::util::*;

/// Small candidate list without duplicates.
#[derive(Clone, Debug)]
pub(crate) struct CandList<T> {
    items: Vec<T>,
}

impl<T> CandList<T> {
    pub(crate) fn new() -> Self {
        CandList {
            items: Vec::with_capacity(MAX_CAND_NUM),
        }
    }

    /// Appends `c` unless the list is full or `same` matches an entry.
    pub(crate) fn push_unique<F>(&mut self, c: T, same: F) -> bool
    where
        F: Fn(&T, &T) -> bool,
    {
        if self.items.len() >= MAX_CAND_NUM || self.items.iter().any(|o| same(o, &c)) {
            return false;
        }
        self.items.push(c);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub(crate) fn into_vec(self) -> Vec<T> {
        self.items
    }
}

/// Motion of a skip or direct candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SkipCand {
    pub(crate) mode: SkipMode,
    pub(crate) dir: PredDir,
    pub(crate) refi: [i8; REFP_NUM],
    pub(crate) mv: [Mv; REFP_NUM],
}

impl SkipCand {
    fn same_motion(&self, o: &SkipCand) -> bool {
        self.dir == o.dir && self.refi == o.refi && self.mv == o.mv
    }
}

/* collocated motion scaled to reference `refi` of `lidx` */
fn temporal_mv(ctx: &EncCtx<'_>, col: &RefView<'_>, x: usize, y: usize, lidx: usize, refi: usize) -> Option<Mv> {
    let u = col.map_unit(x >> MIN_UNIT_LOG2, y >> MIN_UNIT_LOG2)?;
    if !u.is_inter() {
        return None;
    }
    let (cl, (crefi, cmv)) = match unit_motion(u, REFP_0) {
        Some(m) => (REFP_0, m),
        None => (REFP_1, unit_motion(u, REFP_1)?),
    };
    /* dual units keep their second reference in list 0 */
    let col_ref_poc = *col.pic.ref_poc[cl].get(crefi as usize)?;
    let dist_col = evc_poc_dist(col.poc(), col_ref_poc);
    Some(evc_scale_mv(cmv, ctx.fp.dist[lidx][refi], dist_col))
}

/// Motion of the collocated unit at (x, y), scaled to reference `refi` of
/// list `lidx`.
pub(crate) fn collocated_mv(ctx: &EncCtx<'_>, x: usize, y: usize, lidx: usize, refi: usize) -> Option<Mv> {
    let col = if ctx.fp.slice_type.is_b() {
        ctx.refs[REFP_1].first()?
    } else {
        ctx.refs[REFP_0].first()?
    };
    temporal_mv(ctx, col, x, y, lidx, refi)
}

fn motion_ok(ctx: &EncCtx<'_>, x: usize, y: usize, size: usize, c: &SkipCand) -> bool {
    motion_is_legal(&ctx.refs, x as i32, y as i32, size, size, c.dir, c.refi, c.mv)
}

/// Zero-syntax candidates of a CU in declaration order, duplicates and
/// candidates outside the legal range removed.
pub(crate) fn resolve_skip_candidates(
    ctx: &EncCtx<'_>,
    nb: &NeighborCtx,
    x: usize,
    y: usize,
    size: usize,
) -> CandList<SkipCand> {
    let fp = ctx.fp;
    let mut list = CandList::new();
    let mut push = |list: &mut CandList<SkipCand>, c: SkipCand| {
        if motion_ok(ctx, x, y, size, &c) {
            list.push_unique(c, SkipCand::same_motion);
        }
    };

    if fp.slice_type.is_intra() || fp.num_refp[REFP_0] == 0 {
        return list;
    }

    if fp.slice_type.is_b() {
        let col = &ctx.refs[REFP_1][0];
        let (mv0, mv1) = match (temporal_mv(ctx, col, x, y, REFP_0, 0), temporal_mv(ctx, col, x, y, REFP_1, 0)) {
            (Some(a), Some(b)) => (a, b),
            _ => (Mv::ZERO, Mv::ZERO),
        };
        push(
            &mut list,
            SkipCand {
                mode: SkipMode::SKIP_TEMPORAL,
                dir: PredDir::PRED_BID,
                refi: [0, 0],
                mv: [mv0, mv1],
            },
        );
        for c in spatial_direct(ctx, nb).iter() {
            push(&mut list, *c);
        }
    } else {
        let col = &ctx.refs[REFP_0][0];
        let mv0 = temporal_mv(ctx, col, x, y, REFP_0, 0).unwrap_or(Mv::ZERO);
        push(
            &mut list,
            SkipCand {
                mode: SkipMode::SKIP_TEMPORAL,
                dir: PredDir::PRED_FWD,
                refi: [0, REFI_INVALID],
                mv: [mv0, Mv::ZERO],
            },
        );
        if ctx.cfg.weighted_skip {
            for r in 1..fp.num_refp[REFP_0] {
                let mv1 = evc_scale_mv(mv0, fp.dist[REFP_0][r], fp.dist[REFP_0][0]);
                push(
                    &mut list,
                    SkipCand {
                        mode: SkipMode::SKIP_WEIGHTED(r as u8),
                        dir: PredDir::PRED_DUAL,
                        refi: [0, r as i8],
                        mv: [mv0, mv1],
                    },
                );
            }
        }
    }

    list
}

/* first neighbors in A..F order with motion in both lists, list 0 only, list 1 only */
fn classify(nb: &NeighborCtx) -> (Option<[(i8, Mv); 2]>, Option<(i8, Mv)>, Option<(i8, Mv)>) {
    let mut bid = None;
    let mut fwd = None;
    let mut bwd = None;
    for i in [NB_A, NB_B, NB_C, NB_D, NB_E, NB_F].iter() {
        if let Some(u) = nb.inter(*i) {
            match (unit_motion(u, REFP_0), unit_motion(u, REFP_1)) {
                (Some(m0), Some(m1)) => {
                    if bid.is_none() {
                        bid = Some([m0, m1]);
                    }
                }
                (Some(m0), None) => {
                    if fwd.is_none() {
                        fwd = Some(m0);
                    }
                }
                (None, Some(m1)) => {
                    if bwd.is_none() {
                        bwd = Some(m1);
                    }
                }
                (None, None) => {}
            }
        }
    }
    (bid, fwd, bwd)
}

/* the four spatial direct submodes of B slices: Bid, Bwd, Sym, Fwd */
fn spatial_direct(ctx: &EncCtx<'_>, nb: &NeighborCtx) -> [SkipCand; 4] {
    let fp = ctx.fp;
    let (bid, fwd, bwd) = classify(nb);
    let num1 = fp.num_refp[REFP_1];

    /* list 1 mv mirrored from a list 0 mv and the other way round */
    let to_bwd = |r0: i8, mv0: Mv| evc_scale_mv(mv0, fp.dist[REFP_1][0], fp.dist[REFP_0][r0 as usize]);
    let to_fwd = |r1: i8, mv1: Mv| evc_scale_mv(mv1, fp.dist[REFP_0][0], fp.dist[REFP_1][r1 as usize]);
    let refi_ok = |lidx: usize, r: i8| (r as usize) < fp.num_refp[lidx];
    let bid = bid.filter(|m| refi_ok(REFP_0, m[0].0) && refi_ok(REFP_1, m[1].0));
    let fwd = fwd.filter(|m| refi_ok(REFP_0, m.0));
    let bwd = bwd.filter(|m| refi_ok(REFP_1, m.0) && num1 > 0);

    let c_bid = match (bid, fwd, bwd) {
        (Some(m), _, _) => ([m[0].0, m[1].0], [m[0].1, m[1].1]),
        (None, Some(f), Some(b)) => ([f.0, b.0], [f.1, b.1]),
        (None, Some(f), None) => ([f.0, 0], [f.1, to_bwd(f.0, f.1)]),
        (None, None, Some(b)) => ([0, b.0], [to_fwd(b.0, b.1), b.1]),
        (None, None, None) => ([0, 0], [Mv::ZERO, Mv::ZERO]),
    };

    let c_bwd = match (bwd, bid) {
        (Some(b), _) => b,
        (None, Some(m)) => m[1],
        (None, None) => (0, Mv::ZERO),
    };

    let c_sym = match (bid, fwd, bwd) {
        (Some(m), _, _) => ([m[0].0, 0], [m[0].1, to_bwd(m[0].0, m[0].1)]),
        (None, Some(f), _) => ([f.0, 0], [f.1, to_bwd(f.0, f.1)]),
        (None, None, Some(b)) => {
            let mv0 = to_fwd(b.0, b.1);
            ([0, 0], [mv0, to_bwd(0, mv0)])
        }
        (None, None, None) => ([0, 0], [Mv::ZERO, Mv::ZERO]),
    };

    let c_fwd = match (fwd, bid) {
        (Some(f), _) => f,
        (None, Some(m)) => m[0],
        (None, None) => (0, Mv::ZERO),
    };

    [
        SkipCand {
            mode: SkipMode::SKIP_BID,
            dir: PredDir::PRED_BID,
            refi: c_bid.0,
            mv: c_bid.1,
        },
        SkipCand {
            mode: SkipMode::SKIP_BWD,
            dir: PredDir::PRED_BWD,
            refi: [REFI_INVALID, c_bwd.0],
            mv: [Mv::ZERO, c_bwd.1],
        },
        SkipCand {
            mode: SkipMode::SKIP_SYM,
            dir: PredDir::PRED_SYM,
            refi: c_sym.0,
            mv: c_sym.1,
        },
        SkipCand {
            mode: SkipMode::SKIP_FWD,
            dir: PredDir::PRED_FWD,
            refi: [c_fwd.0, REFI_INVALID],
            mv: [c_fwd.1, Mv::ZERO],
        },
    ]
}

/// Ranks candidates by luma SAD plus the submode bits and keeps the best `num`.
/// Ties keep declaration order.
pub(crate) fn select_skip_candidates(
    ctx: &EncCtx<'_>,
    cands: CandList<SkipCand>,
    x: usize,
    y: usize,
    size: usize,
    num: usize,
) -> Vec<SkipCand> {
    let mut pred = vec![0 as pel; size * size];
    let mut tmp = vec![0 as pel; size * size];
    let (org, s_org) = ctx.org_block(Y_C, x, y);

    let mut ranked: Vec<(u32, SkipCand)> = cands
        .into_vec()
        .into_iter()
        .filter_map(|c| {
            if !predict_luma(&ctx.refs, x as i32, y as i32, size, size, c.dir, c.refi, c.mv, &mut pred, &mut tmp) {
                return None;
            }
            let sad = evce_sad_16b(size, size, org, s_org, &pred, size);
            let idx = c.mode.code_index().min(evc_tbl_skip_mode_bits.len() - 1);
            Some((sad.saturating_add(MV_COST(ctx.fp.lambda_mv, evc_tbl_skip_mode_bits[idx])), c))
        })
        .collect();

    ranked.sort_by_key(|&(proxy, _)| proxy);
    ranked.into_iter().take(num).map(|(_, c)| c).collect()
}

/* number of coded skip indices of a slice */
pub(crate) fn num_skip_idx(ctx: &EncCtx<'_>) -> usize {
    let fp = ctx.fp;
    match fp.slice_type {
        SliceType::ST_B => 5,
        SliceType::ST_I => 0,
        _ => {
            if ctx.cfg.weighted_skip {
                fp.num_refp[REFP_0].max(1)
            } else {
                1
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::enc::test_util::*;
    use crate::picman::test::random_frame;
    use std::sync::Arc;

    #[test]
    fn single_temporal_candidate_is_selected() {
        let org = random_frame(64, 64, 21);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_P, &org, &[&org], &[]);
        let ctx = fx.ctx(0);
        let nb = NeighborCtx::default();
        let cands = resolve_skip_candidates(&ctx, &nb, 16, 16, 16);
        assert_eq!(cands.len(), 1);
        let sel = select_skip_candidates(&ctx, cands, 16, 16, 16, 2);
        assert_eq!(sel.len(), 1);
        assert_eq!(sel[0].mode, SkipMode::SKIP_TEMPORAL);
        assert_eq!(sel[0].mv[REFP_0], Mv::ZERO);
    }

    #[test]
    fn weighted_candidates_follow_references() {
        let org = random_frame(64, 64, 22);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_F, &org, &[&org, &org, &org], &[]);
        let ctx = fx.ctx(0);
        let cands = resolve_skip_candidates(&ctx, &NeighborCtx::default(), 0, 0, 16);
        let modes: Vec<SkipMode> = cands.iter().map(|c| c.mode).collect();
        assert_eq!(
            modes,
            vec![SkipMode::SKIP_TEMPORAL, SkipMode::SKIP_WEIGHTED(1), SkipMode::SKIP_WEIGHTED(2)]
        );
        assert_eq!(num_skip_idx(&ctx), 3);
    }

    #[test]
    fn spatial_direct_dedups_zero_motion() {
        let org = random_frame(64, 64, 23);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_B, &org, &[&org], &[&org]);
        let ctx = fx.ctx(0);
        let cands = resolve_skip_candidates(&ctx, &NeighborCtx::default(), 16, 16, 16);
        /* temporal and spatial bid are both zero bi-prediction */
        let modes: Vec<SkipMode> = cands.iter().map(|c| c.mode).collect();
        assert_eq!(
            modes,
            vec![SkipMode::SKIP_TEMPORAL, SkipMode::SKIP_BWD, SkipMode::SKIP_SYM, SkipMode::SKIP_FWD]
        );
    }

    #[test]
    fn spatial_direct_borrows_from_bid_neighbor() {
        let org = random_frame(64, 64, 24);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_B, &org, &[&org], &[&org]);
        let ctx = fx.ctx(0);
        let bid = MapUnit {
            flags: MCU_CODED,
            cu_type: CuType::P2Nx2N,
            dir: PredDir::PRED_BID,
            refi: [0, 0],
            mv: [Mv::new(8, 4), Mv::new(-6, 2)],
            ..Default::default()
        };
        let mut nb = NeighborCtx::default();
        nb.nb[NB_B] = Some(bid);
        let c = spatial_direct(&ctx, &nb);
        assert_eq!(c[0].mv, bid.mv);
        assert_eq!(c[1].mv[REFP_1], Mv::new(-6, 2));
        assert_eq!(c[3].mv[REFP_0], Mv::new(8, 4));
        /* symmetric: list 1 mirrored by distance */
        let d0 = ctx.fp.dist[REFP_0][0];
        let d1 = ctx.fp.dist[REFP_1][0];
        assert_eq!(c[2].mv[REFP_1], evc_scale_mv(Mv::new(8, 4), d1, d0));
    }

    #[test]
    fn collocated_motion_is_scaled_to_the_target() {
        let org = random_frame(64, 64, 25);
        let unit = MapUnit {
            flags: MCU_CODED,
            cu_type: CuType::P2Nx2N,
            dir: PredDir::PRED_FWD,
            refi: [0, REFI_INVALID],
            mv: [Mv::new(8, -4), Mv::ZERO],
            ..Default::default()
        };
        let map = vec![unit; 16 * 16];
        /* collocated picture at POC 7 points two pictures back */
        let col = RefPic::from_frame(7, &org, 8, Some(&map), [vec![5], vec![]]);
        let mut refs = RefLists::new();
        refs.push(REFP_0, Arc::new(col)).unwrap();
        let fx = Fixture::with_refs(EncoderConfig::new(64, 64), SliceType::ST_P, &org, refs);
        let ctx = fx.ctx(0);
        assert_eq!(collocated_mv(&ctx, 16, 16, REFP_0, 0), Some(Mv::new(4, -2)));

        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_P, &org, &[&org], &[]);
        assert_eq!(collocated_mv(&fx.ctx(0), 16, 16, REFP_0, 0), None);
    }

    #[test]
    fn cand_list_rejects_duplicates() {
        let mut l = CandList::new();
        assert!(l.push_unique(1, |a: &i32, b: &i32| a == b));
        assert!(!l.push_unique(1, |a: &i32, b: &i32| a == b));
        for i in 2..20 {
            l.push_unique(i, |a: &i32, b: &i32| a == b);
        }
        assert_eq!(l.len(), MAX_CAND_NUM);
    }
}
