use crate::def::*;
use crate::util::*;

use super::FrameParams;

/* neighbor positions around a block */
pub(crate) const NB_A: usize = 0; /* left */
pub(crate) const NB_B: usize = 1; /* top */
pub(crate) const NB_C: usize = 2; /* top-right */
pub(crate) const NB_D: usize = 3; /* top-left */
pub(crate) const NB_E: usize = 4; /* left-bottom */
pub(crate) const NB_F: usize = 5; /* top-right inside the block width */
pub(crate) const NB_NUM: usize = 6;

/// Coded 4x4 units adjacent to a block.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NeighborCtx {
    pub(crate) nb: [Option<MapUnit>; NB_NUM],
}

impl NeighborCtx {
    /// `unit(px, py)` returns the coded unit covering the luma sample, or
    /// `None` outside the picture or when not coded yet.
    pub(crate) fn new<F>(x: i32, y: i32, w: i32, h: i32, unit: F) -> Self
    where
        F: Fn(i32, i32) -> Option<MapUnit>,
    {
        let pos = [
            (x - 1, y),
            (x, y - 1),
            (x + w, y - 1),
            (x - 1, y - 1),
            (x - 1, y + h - 1),
            (x + w - 1, y - 1),
        ];
        let mut nb = [None; NB_NUM];
        for (n, &(px, py)) in nb.iter_mut().zip(pos.iter()) {
            *n = unit(px, py);
        }
        NeighborCtx { nb }
    }

    /* neighbor usable for motion */
    #[inline]
    pub(crate) fn inter(&self, i: usize) -> Option<&MapUnit> {
        self.nb[i].as_ref().filter(|u| u.is_inter())
    }

    pub(crate) fn is_available(&self, i: usize) -> bool {
        self.nb[i].is_some()
    }
}

/// Partition the predictor is derived for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PuShape {
    Square,
    Upper,
    Lower,
    Left,
    Right,
}

impl PuShape {
    pub(crate) fn of(cu_type: CuType, part: usize) -> PuShape {
        use CuType::*;
        match (cu_type, part) {
            (P2NxN, 0) | (P2NxnU, 0) | (P2NxnD, 0) => PuShape::Upper,
            (P2NxN, _) | (P2NxnU, _) | (P2NxnD, _) => PuShape::Lower,
            (PNx2N, 0) | (PnLx2N, 0) | (PnRx2N, 0) => PuShape::Left,
            (PNx2N, _) | (PnLx2N, _) | (PnRx2N, _) => PuShape::Right,
            _ => PuShape::Square,
        }
    }
}

/* reference and mv a unit holds for a list; dual units keep both hypotheses in list 0 */
#[inline]
pub(crate) fn unit_motion(u: &MapUnit, lidx: usize) -> Option<(i8, Mv)> {
    if lidx == REFP_0 {
        if REFI_IS_VALID(u.refi[REFP_0]) {
            return Some((u.refi[REFP_0], u.mv[REFP_0]));
        }
    } else if u.dir != PredDir::PRED_DUAL && REFI_IS_VALID(u.refi[REFP_1]) {
        return Some((u.refi[REFP_1], u.mv[REFP_1]));
    }
    None
}

/* vertical parity offset between field pictures, in quarter pel */
#[inline]
pub(crate) fn field_delta(cur_poc: i32, ref_poc: i32) -> i32 {
    match (cur_poc & 1, ref_poc & 1) {
        (1, 0) => -2,
        (0, 1) => 2,
        _ => 0,
    }
}

/* neighbor mv scaled to the target reference distance */
fn scaled_nb(fp: &FrameParams, field_coding: bool, lidx: usize, refi: i8, nb_refi: i8, mv: Mv) -> Mv {
    let dist_dst = fp.dist[lidx][refi as usize];
    let dist_src = fp.dist[lidx][nb_refi as usize];
    if field_coding {
        let delta_src = field_delta(fp.poc, fp.ref_poc[lidx][nb_refi as usize]);
        let delta_dst = field_delta(fp.poc, fp.ref_poc[lidx][refi as usize]);
        evc_scale_mv_field(mv, dist_dst, dist_src, delta_src, delta_dst)
    } else {
        evc_scale_mv(mv, dist_dst, dist_src)
    }
}

/// Motion vector predictor of list `lidx`, reference `refi`.
pub(crate) fn get_motion_predictor(
    nb: &NeighborCtx,
    fp: &FrameParams,
    field_coding: bool,
    lidx: usize,
    refi: i8,
    shape: PuShape,
) -> Mv {
    let pick = |i: usize| nb.inter(i).and_then(|u| unit_motion(u, lidx));

    let a = pick(NB_A);
    let b = pick(NB_B);
    let c = pick(NB_C).or_else(|| {
        if nb.is_available(NB_C) {
            None
        } else {
            pick(NB_D)
        }
    });

    let cand = [a, b, c];
    let mut mvs = [Mv::ZERO; 3];
    let mut matched = [false; 3];
    for k in 0..3 {
        if let Some((r, mv)) = cand[k] {
            mvs[k] = scaled_nb(fp, field_coding, lidx, refi, r, mv);
            matched[k] = r == refi;
        }
    }

    let preferred = match shape {
        PuShape::Upper => Some(1),
        PuShape::Lower | PuShape::Left => Some(0),
        PuShape::Right => Some(2),
        PuShape::Square => None,
    };
    if let Some(k) = preferred {
        if matched[k] {
            return mvs[k];
        }
    }

    let num_matched = matched.iter().filter(|&&m| m).count();
    if num_matched == 1 {
        if let Some(k) = matched.iter().position(|&m| m) {
            return mvs[k];
        }
    }
    if a.is_some() && b.is_none() && c.is_none() {
        return mvs[0];
    }

    Mv::from_i32(
        evc_mvp_median(mvs[0].x as i32, mvs[1].x as i32, mvs[2].x as i32),
        evc_mvp_median(mvs[0].y as i32, mvs[1].y as i32, mvs[2].y as i32),
    )
}

/// Motion of the left, top, top-right and top-left neighbors in list
/// `lidx`, scaled to reference `refi`.
pub(crate) fn neighbor_mvs<'n>(
    nb: &'n NeighborCtx,
    fp: &'n FrameParams,
    field_coding: bool,
    lidx: usize,
    refi: i8,
) -> impl Iterator<Item = Mv> + 'n {
    [NB_A, NB_B, NB_C, NB_D].iter().filter_map(move |&i| {
        nb.inter(i)
            .and_then(|u| unit_motion(u, lidx))
            .map(|(r, mv)| scaled_nb(fp, field_coding, lidx, refi, r, mv))
    })
}

/*****************************************************************************
 * ME cost memory
 *****************************************************************************/
const COST_UNITS: usize = MAX_CU_SIZE >> MIN_UNIT_LOG2;
const COST_REFS: usize = REFP_NUM * MAX_NUM_REF;

/// Best motion search cost per 4x4 unit of the CTU, per level and reference,
/// normalized to one unit, and the motion vector that reached it.
pub(crate) struct MeCostMap {
    cost: Vec<u32>,
    mv: Vec<Mv>,
}

impl Default for MeCostMap {
    fn default() -> Self {
        let n = NUM_CU_LEVEL * COST_UNITS * COST_UNITS * COST_REFS;
        MeCostMap {
            cost: vec![u32::MAX; n],
            mv: vec![Mv::ZERO; n],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct UmhSeeds {
    /* cost of the left or upper block of the same size */
    pub(crate) neighbor: Option<u32>,
    /* cost of the enclosing block one level up */
    pub(crate) uplayer: Option<u32>,
}

impl MeCostMap {
    pub(crate) fn reset(&mut self) {
        for c in self.cost.iter_mut() {
            *c = u32::MAX;
        }
    }

    #[inline]
    fn idx(level: usize, ux: usize, uy: usize, lidx: usize, refi: usize) -> usize {
        ((level * COST_UNITS + uy) * COST_UNITS + ux) * COST_REFS + lidx * MAX_NUM_REF + refi
    }

    /// Stores the cost and mv of a w x h block at (x, y) inside the CTU.
    pub(crate) fn store(&mut self, level: usize, x: usize, y: usize, w: usize, h: usize, lidx: usize, refi: i8, cost: u32, mv: Mv) {
        if level >= NUM_CU_LEVEL || !REFI_IS_VALID(refi) {
            return;
        }
        let area = (w * h) as u64;
        let norm = ((cost as u64 * 16) / area.max(1)).min(u32::MAX as u64 - 1) as u32;
        for uy in (y >> MIN_UNIT_LOG2)..((y + h) >> MIN_UNIT_LOG2).min(COST_UNITS) {
            for ux in (x >> MIN_UNIT_LOG2)..((x + w) >> MIN_UNIT_LOG2).min(COST_UNITS) {
                let i = Self::idx(level, ux, uy, lidx, refi as usize);
                self.cost[i] = norm;
                self.mv[i] = mv;
            }
        }
    }

    fn load(&self, level: usize, ux: usize, uy: usize, lidx: usize, refi: usize, area: usize) -> Option<u32> {
        if level >= NUM_CU_LEVEL || ux >= COST_UNITS || uy >= COST_UNITS {
            return None;
        }
        let c = self.cost[Self::idx(level, ux, uy, lidx, refi)];
        if c == u32::MAX {
            None
        } else {
            Some(((c as u64 * area as u64) >> 4).min(u32::MAX as u64) as u32)
        }
    }

    pub(crate) fn seeds(&self, level: usize, x: usize, y: usize, w: usize, h: usize, lidx: usize, refi: i8) -> UmhSeeds {
        if !REFI_IS_VALID(refi) {
            return UmhSeeds::default();
        }
        let refi = refi as usize;
        let area = w * h;
        let ux = x >> MIN_UNIT_LOG2;
        let uy = y >> MIN_UNIT_LOG2;
        let left = if ux > 0 {
            self.load(level, ux - 1, uy, lidx, refi, area)
        } else {
            None
        };
        let up = if uy > 0 {
            self.load(level, ux, uy - 1, lidx, refi, area)
        } else {
            None
        };
        UmhSeeds {
            neighbor: left.or(up),
            uplayer: self.load(level + 1, ux, uy, lidx, refi, area),
        }
    }

    /// Motion found for the enclosing block one level up.
    pub(crate) fn uplayer_mv(&self, level: usize, x: usize, y: usize, lidx: usize, refi: i8) -> Option<Mv> {
        let (ux, uy) = (x >> MIN_UNIT_LOG2, y >> MIN_UNIT_LOG2);
        if level + 1 >= NUM_CU_LEVEL || ux >= COST_UNITS || uy >= COST_UNITS || !REFI_IS_VALID(refi) {
            return None;
        }
        let i = Self::idx(level + 1, ux, uy, lidx, refi as usize);
        if self.cost[i] == u32::MAX {
            None
        } else {
            Some(self.mv[i])
        }
    }
}
