use super::eco::*;
use super::mode::*;
use super::mvp::*;
use super::sbac::*;
use super::EncCtx;
use crate::api::*;
use crate::def::*;
use crate::picman::*;
use crate::tracer::*;

use log::*;

/* split is abandoned once the children spend more than this share of the large cost early */
const SPLIT_GUARD_RATIO: f64 = 1.5;

/*****************************************************************************
 * CU quadtree
 *****************************************************************************/
/// One node of a CTU quadtree. Leaves carry the decision of the CU.
#[derive(Clone, Debug, PartialEq)]
pub struct CuNode {
    pub x: u16,
    pub y: u16,
    pub log2_size: u8,
    pub parent: Option<u32>,
    pub children: [Option<u32>; 4],
    pub leaf: Option<CuInfo>,
    /// Cost of the decision taken at this node.
    pub cost: f64,
    /// Cost of coding the node as one CU, `MAX_COST` when not possible or
    /// not below the budget the parent left.
    pub cost_large: f64,
    /// Cost of the four quadrants, `MAX_COST` when not tried or abandoned.
    pub cost_split: f64,
}

/// Quadtree of one CTU, nodes in depth-first order, root first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CuTree {
    pub(crate) nodes: Vec<CuNode>,
}

impl CuTree {
    pub fn nodes(&self) -> &[CuNode] {
        &self.nodes
    }

    pub fn root(&self) -> Option<&CuNode> {
        self.nodes.first()
    }

    /// Decided CUs in coding order.
    pub fn leaves(&self) -> impl Iterator<Item = &CuInfo> {
        self.nodes.iter().filter_map(|n| n.leaf.as_ref())
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    fn push(&mut self, x: usize, y: usize, log2_size: usize, parent: Option<u32>) -> u32 {
        self.nodes.push(CuNode {
            x: x as u16,
            y: y as u16,
            log2_size: log2_size as u8,
            parent,
            children: [None; 4],
            leaf: None,
            cost: MAX_COST,
            cost_large: MAX_COST,
            cost_split: MAX_COST,
        });
        (self.nodes.len() - 1) as u32
    }

    /* drops every node added after `node` */
    fn prune(&mut self, node: u32) {
        self.nodes.truncate(node as usize + 1);
        self.nodes[node as usize].children = [None; 4];
    }
}

/*****************************************************************************
 * reconstruction window
 *****************************************************************************/
/* samples of the CTU plus one row above (up to the above-right CTU) and one column left */
const WIN_W: [usize; N_C] = [2 * MAX_CU_SIZE + 1, MAX_CU_SIZE + 1, MAX_CU_SIZE + 1];
const WIN_H: [usize; N_C] = [MAX_CU_SIZE + 1, (MAX_CU_SIZE >> 1) + 1, (MAX_CU_SIZE >> 1) + 1];
const WIN_W_UNIT: usize = 2 * MAX_CU_UNITS + 1;
const WIN_H_UNIT: usize = MAX_CU_UNITS + 1;

/// Bottom samples and units of a finished CTU, read by the row below.
#[derive(Clone, Debug)]
pub(crate) struct CtuEdge {
    rec: [Vec<pel>; N_C],
    units: Vec<MapUnit>,
}

/// Reconstruction and 4x4 map around the CTU being encoded.
pub(crate) struct CtuWindow {
    pub(crate) x0: usize,
    pub(crate) y0: usize,
    pic_w: usize,
    pic_h: usize,
    rec: [Vec<pel>; N_C],
    map: Vec<MapUnit>,
}

#[inline]
fn csft(c: usize) -> usize {
    (c != Y_C) as usize
}

impl CtuWindow {
    pub(crate) fn new(pic_w: usize, pic_h: usize) -> Self {
        CtuWindow {
            x0: 0,
            y0: 0,
            pic_w,
            pic_h,
            rec: [
                vec![0; WIN_W[Y_C] * WIN_H[Y_C]],
                vec![0; WIN_W[U_C] * WIN_H[U_C]],
                vec![0; WIN_W[V_C] * WIN_H[V_C]],
            ],
            map: vec![MapUnit::default(); WIN_W_UNIT * WIN_H_UNIT],
        }
    }

    /* window index of a sample of plane c, absolute plane coordinates */
    #[inline]
    fn rec_idx(&self, c: usize, px: i32, py: i32) -> Option<usize> {
        let rx = px - (self.x0 >> csft(c)) as i32 + 1;
        let ry = py - (self.y0 >> csft(c)) as i32 + 1;
        if rx < 0 || ry < 0 || rx >= WIN_W[c] as i32 || ry >= WIN_H[c] as i32 {
            None
        } else {
            Some(ry as usize * WIN_W[c] + rx as usize)
        }
    }

    #[inline]
    fn unit_idx(&self, px: i32, py: i32) -> Option<usize> {
        let rx = (px >> MIN_UNIT_LOG2) - (self.x0 >> MIN_UNIT_LOG2) as i32 + 1;
        let ry = (py >> MIN_UNIT_LOG2) - (self.y0 >> MIN_UNIT_LOG2) as i32 + 1;
        if rx < 0 || ry < 0 || rx >= WIN_W_UNIT as i32 || ry >= WIN_H_UNIT as i32 {
            None
        } else {
            Some(ry as usize * WIN_W_UNIT + rx as usize)
        }
    }

    /// Coded unit covering luma sample (px, py).
    pub(crate) fn unit(&self, px: i32, py: i32) -> Option<MapUnit> {
        if px < 0 || py < 0 || px >= self.pic_w as i32 || py >= self.pic_h as i32 {
            return None;
        }
        self.unit_idx(px, py)
            .map(|i| self.map[i])
            .filter(|u| u.is_coded())
    }

    /// Whether a reconstructed sample of plane c is usable for prediction.
    #[inline]
    pub(crate) fn sample_avail(&self, c: usize, px: i32, py: i32) -> bool {
        self.unit(px << csft(c), py << csft(c)).is_some()
    }

    #[inline]
    pub(crate) fn sample(&self, c: usize, px: i32, py: i32) -> pel {
        self.rec_idx(c, px, py).map_or(0, |i| self.rec[c][i])
    }

    pub(crate) fn neighbors(&self, x: usize, y: usize, w: usize, h: usize) -> NeighborCtx {
        NeighborCtx::new(x as i32, y as i32, w as i32, h as i32, |px, py| self.unit(px, py))
    }

    /// Prepares the window for the CTU at (x0, y0): the left column comes from
    /// the row being built, the row above from the edges of the CTUs above.
    pub(crate) fn load(
        &mut self,
        x0: usize,
        y0: usize,
        band: &RowBand,
        pic: &RefPic,
        above: [Option<&CtuEdge>; 3],
    ) {
        self.x0 = x0;
        self.y0 = y0;
        for c in 0..N_C {
            for v in self.rec[c].iter_mut() {
                *v = 0;
            }
        }
        for u in self.map.iter_mut() {
            *u = MapUnit::default();
        }

        if x0 > 0 {
            for c in 0..N_C {
                let stride = pic.band_stride(c);
                let col = pic.pad(c) + (x0 >> csft(c)) - 1;
                for ry in 0..band.rows[c].min(WIN_H[c] - 1) {
                    self.rec[c][(ry + 1) * WIN_W[c]] = band.planes[c][ry * stride + col];
                }
            }
            let ux = (x0 >> MIN_UNIT_LOG2) - 1;
            let rows = band.map.len() / pic.w_unit;
            for uy in 0..rows.min(MAX_CU_UNITS) {
                self.map[(uy + 1) * WIN_W_UNIT] = band.map[uy * pic.w_unit + ux];
            }
        }

        if let Some(e) = above[0] {
            for c in 0..N_C {
                if let Some(&v) = e.rec[c].last() {
                    self.rec[c][0] = v;
                }
            }
            if let Some(&u) = e.units.last() {
                self.map[0] = u;
            }
        }
        for (k, e) in above[1..].iter().enumerate() {
            if let Some(e) = e {
                for c in 0..N_C {
                    let off = 1 + k * (MAX_CU_SIZE >> csft(c));
                    let n = e.rec[c].len().min(WIN_W[c] - off);
                    self.rec[c][off..off + n].copy_from_slice(&e.rec[c][..n]);
                }
                let off = 1 + k * MAX_CU_UNITS;
                let n = e.units.len().min(WIN_W_UNIT - off);
                self.map[off..off + n].copy_from_slice(&e.units[..n]);
            }
        }
    }

    /// Writes a w x h block of plane c at absolute (px, py).
    pub(crate) fn put_block(&mut self, c: usize, px: usize, py: usize, w: usize, h: usize, src: &[pel], s_src: usize) {
        for j in 0..h {
            if let Some(i) = self.rec_idx(c, px as i32, (py + j) as i32) {
                let n = w.min(WIN_W[c] - (i % WIN_W[c]));
                self.rec[c][i..i + n].copy_from_slice(&src[j * s_src..j * s_src + n]);
            }
        }
    }

    /// Sets every unit of the luma region.
    pub(crate) fn set_units(&mut self, x: usize, y: usize, w: usize, h: usize, unit: MapUnit) {
        let mut py = y;
        while py < y + h {
            let mut px = x;
            while px < x + w {
                if let Some(i) = self.unit_idx(px as i32, py as i32) {
                    self.map[i] = unit;
                }
                px += MIN_UNIT_SIZE;
            }
            py += MIN_UNIT_SIZE;
        }
    }

    /// Marks the region as not coded.
    pub(crate) fn clear(&mut self, x: usize, y: usize, size: usize) {
        self.set_units(x, y, size, size, MapUnit::default());
    }

    /// Stores the reconstruction and the motion of a decided CU.
    pub(crate) fn commit(&mut self, info: &CuInfo, reco: &[Vec<pel>; N_C]) {
        let x = info.x as usize;
        let y = info.y as usize;
        let size = info.size();
        self.put_block(Y_C, x, y, size, size, &reco[Y_C], size);
        for c in U_C..N_C {
            let s = size >> 1;
            self.put_block(c, x >> 1, y >> 1, s, s, &reco[c], s);
        }

        let intra = info.cu_type.is_intra();
        let mut flags = MCU_CODED;
        if intra {
            flags |= MCU_INTRA;
        } else {
            if info.is_skip() {
                flags |= MCU_SKIP;
            }
            if info.cbp == 0 {
                flags |= MCU_ZERO_RESI;
            }
        }
        let geom = info.cu_type.part_geom(info.log2_size as usize);
        for k in 0..info.num_parts() {
            let g = geom[k];
            let pu = &info.pu[k];
            let unit = MapUnit {
                flags,
                cu_type: info.cu_type,
                dir: pu.dir,
                refi: if intra { [REFI_INVALID; REFP_NUM] } else { pu.refi },
                mv: if intra { [Mv::ZERO; REFP_NUM] } else { pu.mv },
                ipm: info.ipm[k],
                log2_size: info.log2_size,
            };
            self.set_units(x + g.x as usize, y + g.y as usize, g.w as usize, g.h as usize, unit);
        }
    }

    /// Copies the CTU interior into the row being built.
    pub(crate) fn store_into(&self, band: &mut RowBand, pic: &RefPic) {
        for c in 0..N_C {
            let stride = pic.band_stride(c);
            let cx = self.x0 >> csft(c);
            let cols = (MAX_CU_SIZE >> csft(c)).min(pic.plane_width(c) - cx);
            for ry in 0..band.rows[c].min(WIN_H[c] - 1) {
                let src = (ry + 1) * WIN_W[c] + 1;
                let dst = ry * stride + pic.pad(c) + cx;
                band.planes[c][dst..dst + cols].copy_from_slice(&self.rec[c][src..src + cols]);
            }
        }
        let ux0 = self.x0 >> MIN_UNIT_LOG2;
        let cols = MAX_CU_UNITS.min(pic.w_unit - ux0);
        let rows = band.map.len() / pic.w_unit;
        for uy in 0..rows.min(MAX_CU_UNITS) {
            let src = (uy + 1) * WIN_W_UNIT + 1;
            let dst = uy * pic.w_unit + ux0;
            band.map[dst..dst + cols].copy_from_slice(&self.map[src..src + cols]);
        }
    }

    pub(crate) fn edge(&self) -> CtuEdge {
        let rec = [Y_C, U_C, V_C].map(|c| {
            let s = (WIN_H[c] - 1) * WIN_W[c] + 1;
            self.rec[c][s..s + (MAX_CU_SIZE >> csft(c))].to_vec()
        });
        let s = (WIN_H_UNIT - 1) * WIN_W_UNIT + 1;
        CtuEdge {
            rec,
            units: self.map[s..s + MAX_CU_UNITS].to_vec(),
        }
    }
}

/*****************************************************************************
 * CTU encoder
 *****************************************************************************/
/// Per-worker state of the CTU mode decision.
pub(crate) struct CtuEncoder<E: EntropyEstimator> {
    pub(crate) win: CtuWindow,
    /* per level, log2 size - MIN_CU_LOG2 */
    pub(crate) best: Vec<CuData<E>>,
    pub(crate) temp: Vec<CuData<E>>,
    pub(crate) me_cost: MeCostMap,
    pub(crate) tree: CuTree,
    /* CU sized prediction of the trial being coded */
    pub(crate) pred: [Vec<pel>; N_C],
}

impl<E: EntropyEstimator> CtuEncoder<E> {
    pub(crate) fn new(width: usize, height: usize, proto: &E) -> Self {
        let arena = || {
            (MIN_CU_LOG2..=MAX_CU_LOG2)
                .map(|l| CuData::new(l, proto.clone()))
                .collect::<Vec<_>>()
        };
        CtuEncoder {
            win: CtuWindow::new(width, height),
            best: arena(),
            temp: arena(),
            me_cost: MeCostMap::default(),
            tree: CuTree::default(),
            pred: [
                vec![0; MAX_CU_DIM],
                vec![0; MAX_CU_DIM >> 2],
                vec![0; MAX_CU_DIM >> 2],
            ],
        }
    }

    /// Decides the quadtree of the loaded CTU. `e` enters with the state
    /// before the CTU and leaves with the state after it.
    pub(crate) fn compress_ctu(&mut self, ctx: &EncCtx<'_>, e: &mut E) -> f64 {
        self.tree.clear();
        self.me_cost.reset();
        let (x0, y0) = (self.win.x0, self.win.y0);
        let (_, cost) = self.compress_cu(ctx, x0, y0, MAX_CU_LOG2, None, MAX_COST, e);
        cost
    }

    /* neighbors left and above that are smaller than the CU */
    fn split_ctx(&self, x: usize, y: usize, log2_size: usize) -> u8 {
        let mut ctx = 0;
        for &(px, py) in [(x as i32 - 1, y as i32), (x as i32, y as i32 - 1)].iter() {
            if let Some(u) = self.win.unit(px, py) {
                if (u.log2_size as usize) < log2_size {
                    ctx += 1;
                }
            }
        }
        ctx
    }

    fn compress_cu(
        &mut self,
        ctx: &EncCtx<'_>,
        x: usize,
        y: usize,
        log2_size: usize,
        parent: Option<u32>,
        budget: f64,
        e: &mut E,
    ) -> (u32, f64) {
        let cfg = ctx.cfg;
        let fp = ctx.fp;
        let size = 1 << log2_size;
        let level = log2_size - MIN_CU_LOG2;
        let node = self.tree.push(x, y, log2_size, parent);

        let inside = x + size <= fp.width && y + size <= fp.height;
        let can_code = inside && log2_size <= cfg.max_cu_log2;
        /* boundary CUs go below the configured minimum when forced */
        let can_split = log2_size > MIN_CU_LOG2 && (log2_size > cfg.min_cu_log2 || !inside);
        let signal_split = can_code && can_split;
        let split_ctx = self.split_ctx(x, y, log2_size);
        let entry = e.clone();
        let bits_cost = |s: &E| fp.lambda * (s.bits() - entry.bits()) as f64 / (1 << BIT_FRAC_SHIFT) as f64;

        let mut cost_large = MAX_COST;
        if can_code {
            let mut e_large = entry.clone();
            if signal_split {
                evce_eco_split_flag(&mut e_large, false, split_ctx);
            }
            let mask = self.mode_mask(ctx, x, y, log2_size);
            let cost = self.evaluate_cu(ctx, x, y, log2_size, &e_large, &mask, budget - bits_cost(&e_large));
            if cost < MAX_COST {
                cost_large = cost + bits_cost(&e_large);
            }
        }

        let stop_after_skip = cfg.heuristics.no_split_after_skip
            && cost_large < MAX_COST
            && self.best[level].info.is_skip()
            && self.skip_neighborhood(ctx, x, y, size) >= EARLY_SKIP_NUM;

        let mut cost_split = MAX_COST;
        let mut e_split = entry.clone();
        if can_split && !stop_after_skip {
            if signal_split {
                evce_eco_split_flag(&mut e_split, true, split_ctx);
            }
            let mut sum = bits_cost(&e_split);
            let half = size >> 1;
            let mut aborted = false;
            let limit = cost_large.min(budget);
            for k in 0..4 {
                let cx = x + (k & 1) * half;
                let cy = y + (k >> 1) * half;
                if cx >= fp.width || cy >= fp.height {
                    continue;
                }
                let (child, cost) = self.compress_cu(ctx, cx, cy, log2_size - 1, Some(node), limit - sum, &mut e_split);
                self.tree.nodes[node as usize].children[k] = Some(child);
                sum += cost;
                if sum > limit {
                    aborted = true;
                    break;
                }
                if cfg.heuristics.split_guard
                    && cost_large < MAX_COST
                    && k < 3
                    && sum > cost_large * (k + 1) as f64 / 4.0 * SPLIT_GUARD_RATIO
                {
                    aborted = true;
                    break;
                }
            }
            if !aborted {
                cost_split = sum;
            }
        }

        TRACE_SPLIT(x, y, log2_size, cost_large, cost_split);

        let cost = if cost_split < cost_large {
            *e = e_split;
            cost_split
        } else {
            self.tree.prune(node);
            self.win.clear(x, y, size);
            if cost_large < MAX_COST {
                let best = &self.best[level];
                self.win.commit(&best.info, &best.reco);
                e.clone_from(&best.sbac);
                TRACE_CU(&best.info, best.cost);
                self.tree.nodes[node as usize].leaf = Some(best.info.clone());
            }
            cost_large
        };

        let n = &mut self.tree.nodes[node as usize];
        n.cost_large = cost_large;
        n.cost_split = cost_split;
        n.cost = cost;
        (node, cost)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::enc::test_util::*;
    use crate::picman::test::random_frame;

    fn loaded(fx: &Fixture, x0: usize, y0: usize) -> CtuEncoder<SbacEstimator> {
        let pic = RefPic::new(0, fx.cfg.width, fx.cfg.height, 8, [vec![], vec![]]);
        let band = pic.empty_band(y0 >> MAX_CU_LOG2);
        let mut enc = CtuEncoder::new(fx.cfg.width, fx.cfg.height, &SbacEstimator::new());
        enc.win.load(x0, y0, &band, &pic, [None, None, None]);
        enc
    }

    fn encode_ctu(fx: &Fixture, x0: usize, y0: usize) -> (CtuEncoder<SbacEstimator>, f64) {
        let ctx = fx.ctx(fx.cfg.h_ctu());
        let mut enc = loaded(fx, x0, y0);
        let mut e = SbacEstimator::new();
        let cost = enc.compress_ctu(&ctx, &mut e);
        (enc, cost)
    }

    #[test]
    fn node_cost_is_the_cheaper_alternative() {
        let org = random_frame(64, 64, 31);
        let mut cfg = EncoderConfig::new(64, 64);
        cfg.search_range = 8;
        let fx = Fixture::new(cfg, SliceType::ST_P, &org, &[&org], &[]);
        let (enc, cost) = encode_ctu(&fx, 0, 0);
        assert!(cost < MAX_COST);
        for n in enc.tree.nodes() {
            assert_eq!(n.cost, n.cost_large.min(n.cost_split));
            assert_eq!(n.leaf.is_some(), n.children.iter().all(|c| c.is_none()));
        }
    }

    #[test]
    fn budget_below_the_decision_abandons_the_ctu() {
        let org = random_frame(64, 64, 34);
        let refp = random_frame(64, 64, 35);
        let mut cfg = EncoderConfig::new(64, 64);
        cfg.search_range = 8;
        cfg.me_method = MeMethod::Diamond;
        cfg.heuristics = EncoderHeuristics::none();
        let fx = Fixture::new(cfg, SliceType::ST_P, &org, &[&refp], &[]);
        let (_, cost) = encode_ctu(&fx, 0, 0);
        assert!(cost < MAX_COST);

        let ctx = fx.ctx(fx.cfg.h_ctu());
        let mut enc = loaded(&fx, 0, 0);
        let (_, tight) = enc.compress_cu(&ctx, 0, 0, MAX_CU_LOG2, None, cost - 1.0, &mut SbacEstimator::new());
        assert_eq!(tight, MAX_COST);
        assert!(enc.tree.leaves().next().is_none());

        let mut enc = loaded(&fx, 0, 0);
        let (_, loose) = enc.compress_cu(&ctx, 0, 0, MAX_CU_LOG2, None, cost + 1.0, &mut SbacEstimator::new());
        assert_eq!(loose, cost);
    }

    #[test]
    fn leaves_tile_the_ctu() {
        let org = random_frame(64, 64, 32);
        let mut cfg = EncoderConfig::new(64, 64);
        cfg.min_cu_log2 = 4;
        let fx = Fixture::new(cfg, SliceType::ST_I, &org, &[], &[]);
        let (enc, _) = encode_ctu(&fx, 0, 0);
        let area: usize = enc.tree.leaves().map(|cu| cu.size() * cu.size()).sum();
        assert_eq!(area, 64 * 64);
        for cu in enc.tree.leaves() {
            assert!(cu.log2_size >= 4);
            assert!(cu.cu_type.is_intra());
        }
    }

    #[test]
    fn boundary_ctu_is_split_to_fit() {
        let org = random_frame(72, 40, 33);
        let mut cfg = EncoderConfig::new(72, 40);
        cfg.min_cu_log2 = 5;
        let fx = Fixture::new(cfg, SliceType::ST_I, &org, &[], &[]);
        let (enc, _) = encode_ctu(&fx, 64, 0);
        let leaves: Vec<&CuInfo> = enc.tree.leaves().collect();
        /* an 8 x 40 strip forces 8x8 CUs */
        assert_eq!(leaves.len(), 5);
        for cu in leaves {
            assert_eq!(cu.log2_size, 3);
            assert!(cu.x as usize + cu.size() <= 72 && cu.y as usize + cu.size() <= 40);
        }
    }

    #[test]
    fn window_commit_and_clear() {
        let mut win = CtuWindow::new(128, 64);
        let pic = RefPic::new(0, 128, 64, 8, [vec![], vec![]]);
        let band = pic.empty_band(0);
        win.load(64, 0, &band, &pic, [None, None, None]);
        assert!(win.unit(63, 0).is_none());
        let info = CuInfo {
            x: 64,
            y: 0,
            log2_size: 4,
            cu_type: CuType::P2Nx2N,
            ..Default::default()
        };
        let reco = [vec![7; 256], vec![3; 64], vec![5; 64]];
        win.commit(&info, &reco);
        let u = win.unit(70, 10).unwrap();
        assert!(u.is_zero_resi() && !u.is_intra());
        assert_eq!(win.sample(Y_C, 79, 15), 7);
        assert!(win.sample_avail(U_C, 39, 7));
        assert!(!win.sample_avail(U_C, 40, 7));
        win.clear(64, 0, 16);
        assert!(win.unit(70, 10).is_none());
    }
}
